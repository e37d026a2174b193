//! Minimal DER reader and writer for SubjectPublicKeyInfo
//!
//! Covers SEQUENCE, BIT STRING and OBJECT IDENTIFIER with definite,
//! minimally encoded lengths. Anything else is rejected as malformed.
//! Signatures go through k256's own DER codec instead.

use crate::error::{Error, Result};

pub const TAG_BIT_STRING: u8 = 0x03;
pub const TAG_OBJECT_IDENTIFIER: u8 = 0x06;
pub const TAG_SEQUENCE: u8 = 0x30;

/// Forward-only cursor over DER-encoded TLVs
#[derive(Debug, Clone)]
pub struct DerReader<'a> {
    input: &'a [u8],
    pos: usize,
}

impl<'a> DerReader<'a> {
    pub fn new(input: &'a [u8]) -> Self {
        Self { input, pos: 0 }
    }

    /// True once every byte has been consumed
    pub fn is_empty(&self) -> bool {
        self.pos >= self.input.len()
    }

    pub fn peek_tag(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    /// Read one TLV and return its tag and content
    pub fn read_tlv(&mut self) -> Result<(u8, &'a [u8])> {
        let tag = self
            .next_byte()
            .ok_or_else(|| Error::malformed("unexpected end of input, expected tag"))?;
        let len = self.read_length()?;

        let end = self
            .pos
            .checked_add(len)
            .filter(|end| *end <= self.input.len())
            .ok_or_else(|| {
                Error::malformed(format!(
                    "truncated: tag 0x{:02x} declares {} bytes, {} available",
                    tag,
                    len,
                    self.input.len() - self.pos
                ))
            })?;

        let content = &self.input[self.pos..end];
        self.pos = end;
        Ok((tag, content))
    }

    /// Read one TLV, requiring a specific tag
    pub fn read_expected(&mut self, expected: u8, what: &str) -> Result<&'a [u8]> {
        match self.peek_tag() {
            Some(tag) if tag == expected => {}
            Some(tag) => {
                return Err(Error::malformed(format!(
                    "{}: expected tag 0x{:02x}, found 0x{:02x}",
                    what, expected, tag
                )))
            }
            None => {
                return Err(Error::malformed(format!(
                    "{}: unexpected end of input",
                    what
                )))
            }
        }
        let (_, content) = self.read_tlv()?;
        Ok(content)
    }

    /// Require that nothing follows the last element read
    pub fn finish(&self, what: &str) -> Result<()> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(Error::malformed(format!(
                "{}: {} trailing bytes",
                what,
                self.input.len() - self.pos
            )))
        }
    }

    fn next_byte(&mut self) -> Option<u8> {
        let b = self.input.get(self.pos).copied()?;
        self.pos += 1;
        Some(b)
    }

    fn read_length(&mut self) -> Result<usize> {
        let first = self
            .next_byte()
            .ok_or_else(|| Error::malformed("unexpected end of input, expected length"))?;

        if first < 0x80 {
            return Ok(first as usize);
        }
        if first == 0x80 {
            return Err(Error::malformed("indefinite length is not DER"));
        }

        let count = (first & 0x7f) as usize;
        if count > 4 {
            return Err(Error::malformed(format!("length of {} bytes is too large", count)));
        }

        let mut len = 0usize;
        for i in 0..count {
            let b = self
                .next_byte()
                .ok_or_else(|| Error::malformed("truncated length"))?;
            if i == 0 && b == 0 {
                return Err(Error::malformed("non-minimal length encoding"));
            }
            len = (len << 8) | b as usize;
        }
        if len < 0x80 {
            return Err(Error::malformed("long-form length used for short value"));
        }
        Ok(len)
    }
}

/// Append a DER length
pub fn write_length(len: usize, out: &mut Vec<u8>) {
    if len < 0x80 {
        out.push(len as u8);
        return;
    }
    let bytes = len.to_be_bytes();
    let skip = bytes.iter().take_while(|b| **b == 0).count();
    out.push(0x80 | (bytes.len() - skip) as u8);
    out.extend_from_slice(&bytes[skip..]);
}

/// Encode a full TLV
pub fn write_tlv(tag: u8, content: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(content.len() + 4);
    out.push(tag);
    write_length(content.len(), &mut out);
    out.extend_from_slice(content);
    out
}
