//! ECDSA-Sig-Value decoding and low-s canonicalization
//!
//! The custodian returns `SEQUENCE { INTEGER r, INTEGER s }` (RFC 3279
//! section 2.2.3) with no guarantee about which of `s` and `N - s` it picked.
//! The ledger only accepts `s <= N/2` (EIP-2), so every decoded signature is
//! folded onto the low member of the pair.

use k256::ecdsa::Signature;
use tracing::debug;

use crate::error::{Error, Result};
use crate::types::CanonicalSignature;
use crate::SECP256K1_HALF_ORDER;

/// Decode a DER ECDSA signature into its canonical low-s form
pub fn decode_signature(der: &[u8]) -> Result<CanonicalSignature> {
    let signature = Signature::from_der(der)
        .map_err(|e| Error::malformed(format!("ECDSA-Sig-Value: {}", e)))?;
    Ok(canonicalize(signature))
}

/// Validate r and s as curve scalars and fold s into the lower half
///
/// Idempotent, and `normalize(r, N - s) == normalize(r, s)`.
pub fn normalize(r: [u8; 32], s: [u8; 32]) -> Result<CanonicalSignature> {
    Ok(canonicalize(from_scalars(r, s)?))
}

/// True when `s <= N/2`
pub fn is_low_s(s: &[u8; 32]) -> bool {
    s <= &SECP256K1_HALF_ORDER
}

/// Encode r and s as a DER ECDSA-Sig-Value
pub fn encode_signature(r: &[u8; 32], s: &[u8; 32]) -> Result<Vec<u8>> {
    Ok(from_scalars(*r, *s)?.to_der().as_bytes().to_vec())
}

fn from_scalars(r: [u8; 32], s: [u8; 32]) -> Result<Signature> {
    Signature::from_scalars(r, s)
        .map_err(|_| Error::malformed("r and s must be non-zero and below the curve order"))
}

fn canonicalize(signature: Signature) -> CanonicalSignature {
    let signature = match signature.normalize_s() {
        Some(low) => {
            debug!("Signature had high s, replaced with N - s");
            low
        }
        None => signature,
    };

    let (r, s) = signature.split_bytes();
    CanonicalSignature {
        r: r.into(),
        s: s.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SECP256K1_ORDER;

    // Signature over the EIP-155 example transaction (already low-s)
    const LOW_S_DER: &str = "3044022028ef61340bd939bc2195fe537567866003e1a15d3c71ff63e1590620aa636276022067cbe9d8997f761aecb703304b3800ccf555c9f3dc64214b297fb1966a3b6d83";
    // Same signature with s replaced by N - s
    const HIGH_S_DER: &str = "3045022028ef61340bd939bc2195fe537567866003e1a15d3c71ff63e1590620aa63627602210098341627668089e51348fccfb4c7ff31c55912f2d2e47ef09652acf665fad3be";
    const R: &str = "28ef61340bd939bc2195fe537567866003e1a15d3c71ff63e1590620aa636276";
    const S: &str = "67cbe9d8997f761aecb703304b3800ccf555c9f3dc64214b297fb1966a3b6d83";

    #[test]
    fn test_decode_low_s() {
        let sig = decode_signature(&hex::decode(LOW_S_DER).unwrap()).unwrap();
        assert_eq!(hex::encode(sig.r()), R);
        assert_eq!(hex::encode(sig.s()), S);
    }

    #[test]
    fn test_decode_high_s_is_folded() {
        let low = decode_signature(&hex::decode(LOW_S_DER).unwrap()).unwrap();
        let high = decode_signature(&hex::decode(HIGH_S_DER).unwrap()).unwrap();
        assert_eq!(low, high);
        assert!(is_low_s(high.s()));
    }

    #[test]
    fn test_encode_roundtrip_matches_custodian_bytes() {
        let sig = decode_signature(&hex::decode(LOW_S_DER).unwrap()).unwrap();
        assert_eq!(
            hex::encode(encode_signature(sig.r(), sig.s()).unwrap()),
            LOW_S_DER
        );
    }

    #[test]
    fn test_half_order_boundary() {
        assert!(is_low_s(&SECP256K1_HALF_ORDER));

        let mut above = SECP256K1_HALF_ORDER;
        above[31] += 1;
        assert!(!is_low_s(&above));

        let r = [0x01; 32];
        let sig = normalize(r, above).unwrap();
        // N - (N/2 + 1) == N/2 because N is odd
        assert_eq!(sig.s(), &SECP256K1_HALF_ORDER);
    }

    #[test]
    fn test_rejects_zero_and_out_of_range() {
        assert!(normalize([0u8; 32], [0x01; 32]).is_err());
        assert!(normalize([0x01; 32], [0u8; 32]).is_err());
        assert!(normalize(SECP256K1_ORDER, [0x01; 32]).is_err());
    }

    #[test]
    fn test_rejects_wrong_outer_tag() {
        let mut der = hex::decode(LOW_S_DER).unwrap();
        der[0] = 0x31;
        assert!(matches!(
            decode_signature(&der),
            Err(Error::MalformedEncoding(_))
        ));
    }

    #[test]
    fn test_rejects_truncated() {
        let der = hex::decode(LOW_S_DER).unwrap();
        for len in [0, 1, 2, 10, der.len() - 1] {
            assert!(decode_signature(&der[..len]).is_err(), "length {} accepted", len);
        }
    }

    #[test]
    fn test_rejects_third_integer() {
        let der = [
            0x30, 0x09, 0x02, 0x01, 0x01, 0x02, 0x01, 0x02, 0x02, 0x01, 0x03,
        ];
        assert!(decode_signature(&der).is_err());
    }

    #[test]
    fn test_rejects_trailing_bytes() {
        let mut der = hex::decode(LOW_S_DER).unwrap();
        der.push(0x00);
        assert!(decode_signature(&der).is_err());
    }

    #[test]
    fn test_rejects_negative_integer() {
        // r = 0x80 encoded without the 0x00 sign byte
        let der = [0x30, 0x06, 0x02, 0x01, 0x80, 0x02, 0x01, 0x01];
        assert!(matches!(
            decode_signature(&der),
            Err(Error::MalformedEncoding(_))
        ));
    }

    #[test]
    fn test_rejects_non_minimal_integer() {
        // r = 0x01 with a redundant leading zero
        let der = [0x30, 0x07, 0x02, 0x02, 0x00, 0x01, 0x02, 0x01, 0x01];
        assert!(decode_signature(&der).is_err());
    }

    #[test]
    fn test_rejects_oversized_integer() {
        // r is 33 bytes wide
        let mut der = vec![0x30, 0x26, 0x02, 0x21];
        der.extend_from_slice(&[0x01; 33]);
        der.extend_from_slice(&[0x02, 0x01, 0x01]);
        assert!(decode_signature(&der).is_err());
    }

    #[test]
    fn test_rejects_zero_scalar() {
        let der = [0x30, 0x06, 0x02, 0x01, 0x00, 0x02, 0x01, 0x01];
        assert!(decode_signature(&der).is_err());
        assert!(encode_signature(&[0u8; 32], &[0x01; 32]).is_err());
    }
}
