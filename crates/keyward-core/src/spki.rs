//! SubjectPublicKeyInfo decoding (RFC 5280 / RFC 5480)
//!
//! The custodian exports public keys as
//!
//! ```text
//! SEQUENCE {
//!     SEQUENCE { OBJECT IDENTIFIER id-ecPublicKey, OBJECT IDENTIFIER secp256k1 }
//!     BIT STRING { 0x00 (unused bits) || 0x04 || x (32) || y (32) }
//! }
//! ```
//!
//! Only the structure is checked. The curve OID is not validated.

use tracing::debug;

use crate::der::{self, DerReader, TAG_BIT_STRING, TAG_OBJECT_IDENTIFIER, TAG_SEQUENCE};
use crate::error::{Error, Result};
use crate::types::RawPublicKey;

/// SEC1 marker for an uncompressed point
pub const UNCOMPRESSED_POINT_MARKER: u8 = 0x04;

/// id-ecPublicKey (1.2.840.10045.2.1)
pub const OID_EC_PUBLIC_KEY: [u8; 7] = [0x2a, 0x86, 0x48, 0xce, 0x3d, 0x02, 0x01];

/// secp256k1 (1.3.132.0.10)
pub const OID_SECP256K1: [u8; 5] = [0x2b, 0x81, 0x04, 0x00, 0x0a];

/// Decode a DER SPKI public key into the raw 64-byte point
pub fn decode_public_key(der: &[u8]) -> Result<RawPublicKey> {
    let mut outer = DerReader::new(der);
    let spki = outer.read_expected(TAG_SEQUENCE, "SubjectPublicKeyInfo")?;
    outer.finish("SubjectPublicKeyInfo")?;

    let mut fields = DerReader::new(spki);

    let algorithm = fields.read_expected(TAG_SEQUENCE, "AlgorithmIdentifier")?;
    let mut algorithm = DerReader::new(algorithm);
    let oid = algorithm.read_expected(TAG_OBJECT_IDENTIFIER, "AlgorithmIdentifier.algorithm")?;
    if oid.is_empty() {
        return Err(Error::malformed("empty algorithm OBJECT IDENTIFIER"));
    }
    // Remaining parameters (the named curve) are walked but not validated
    while !algorithm.is_empty() {
        algorithm.read_tlv()?;
    }

    let bits = fields.read_expected(TAG_BIT_STRING, "subjectPublicKey")?;
    fields.finish("SubjectPublicKeyInfo")?;

    let (unused_bits, point) = bits
        .split_first()
        .ok_or_else(|| Error::malformed("empty subjectPublicKey BIT STRING"))?;
    if *unused_bits != 0 {
        return Err(Error::malformed(format!(
            "subjectPublicKey has {} unused bits",
            unused_bits
        )));
    }

    let (marker, coordinates) = point
        .split_first()
        .ok_or_else(|| Error::malformed("subjectPublicKey is empty"))?;
    if *marker != UNCOMPRESSED_POINT_MARKER {
        return Err(Error::malformed(format!(
            "expected uncompressed point marker 0x04, found 0x{:02x}",
            marker
        )));
    }

    let raw: [u8; 64] = coordinates.try_into().map_err(|_| {
        Error::malformed(format!(
            "uncompressed point must carry 64 bytes, found {}",
            coordinates.len()
        ))
    })?;

    debug!(public_key = %hex::encode(raw), "Decoded SPKI public key");
    Ok(RawPublicKey::new(raw))
}

/// Encode a raw point as a secp256k1 SPKI structure
pub fn encode_public_key(public_key: &RawPublicKey) -> Vec<u8> {
    let mut algorithm = der::write_tlv(TAG_OBJECT_IDENTIFIER, &OID_EC_PUBLIC_KEY);
    algorithm.extend(der::write_tlv(TAG_OBJECT_IDENTIFIER, &OID_SECP256K1));
    let algorithm = der::write_tlv(TAG_SEQUENCE, &algorithm);

    let mut bits = Vec::with_capacity(66);
    bits.push(0x00);
    bits.extend_from_slice(&public_key.to_sec1_uncompressed());
    let bits = der::write_tlv(TAG_BIT_STRING, &bits);

    let mut body = algorithm;
    body.extend(bits);
    der::write_tlv(TAG_SEQUENCE, &body)
}
