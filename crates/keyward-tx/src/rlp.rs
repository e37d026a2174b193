//! RLP helpers for legacy transactions
//!
//! Thin layer over `alloy_rlp` that appends item encodings to a flat
//! payload, which [`encode_list`] then wraps in a list header.

use alloy_rlp::{Encodable, Header};

/// Encode a byte string
pub fn encode_bytes(bytes: &[u8], out: &mut Vec<u8>) {
    Encodable::encode(bytes, out);
}

/// Encode an unsigned integer
pub fn encode_uint(value: u128, out: &mut Vec<u8>) {
    value.encode(out);
}

/// Encode a big-endian unsigned integer of any width
pub fn encode_uint_bytes(be: &[u8], out: &mut Vec<u8>) {
    let start = be.iter().position(|&b| b != 0).unwrap_or(be.len());
    encode_bytes(&be[start..], out);
}

/// Wrap concatenated item encodings in a list header
pub fn encode_list(payload: &[u8]) -> Vec<u8> {
    let header = Header {
        list: true,
        payload_length: payload.len(),
    };
    let mut out = Vec::with_capacity(header.length() + payload.len());
    header.encode(&mut out);
    out.extend_from_slice(payload);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bytes(input: &[u8]) -> String {
        let mut out = Vec::new();
        encode_bytes(input, &mut out);
        hex::encode(out)
    }

    fn uint(value: u128) -> String {
        let mut out = Vec::new();
        encode_uint(value, &mut out);
        hex::encode(out)
    }

    #[test]
    fn test_integers() {
        assert_eq!(uint(0), "80");
        assert_eq!(uint(1), "01");
        assert_eq!(uint(127), "7f");
        assert_eq!(uint(128), "8180");
        assert_eq!(uint(1024), "820400");
        assert_eq!(uint(50_000_000_000), "850ba43b7400");
        assert_eq!(uint(1_000_000_000_000_000_000), "880de0b6b3a7640000");
    }

    #[test]
    fn test_strings() {
        assert_eq!(bytes(&[]), "80");
        assert_eq!(bytes(&[0x00]), "00");
        assert_eq!(bytes(&[0x80]), "8180");
        assert_eq!(bytes(b"dog"), "83646f67");

        let long: Vec<u8> = (0..56).collect();
        assert!(bytes(&long).starts_with("b838000102"));
    }

    #[test]
    fn test_uint_bytes_strips_leading_zeros() {
        let mut out = Vec::new();
        encode_uint_bytes(&[0, 0, 0x12, 0x34], &mut out);
        assert_eq!(hex::encode(&out), "821234");

        out.clear();
        encode_uint_bytes(&[0u8; 32], &mut out);
        assert_eq!(hex::encode(&out), "80");
    }

    #[test]
    fn test_lists() {
        assert_eq!(hex::encode(encode_list(&[])), "c0");

        let mut payload = Vec::new();
        encode_bytes(b"cat", &mut payload);
        encode_bytes(b"dog", &mut payload);
        assert_eq!(hex::encode(encode_list(&payload)), "c88363617483646f67");

        let long = vec![0x01u8; 60];
        assert!(hex::encode(encode_list(&long)).starts_with("f83c"));
    }
}
