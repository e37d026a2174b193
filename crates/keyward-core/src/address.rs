//! Ledger address derivation

use sha3::{Digest, Keccak256};
use tracing::trace;

use crate::types::{Address, RawPublicKey};

/// Keccak-256 of arbitrary bytes
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    Keccak256::digest(data).into()
}

/// Address = last 20 bytes of Keccak-256(x || y)
pub fn derive_address(public_key: &RawPublicKey) -> Address {
    let hash = keccak256(public_key.as_bytes());
    trace!(hash = %hex::encode(hash), "Public key hash");

    let mut address = [0u8; 20];
    address.copy_from_slice(&hash[12..]);
    Address::new(address)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spki::decode_public_key;

    #[test]
    fn test_keccak_empty() {
        assert_eq!(
            hex::encode(keccak256(b"")),
            "c5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470"
        );
    }

    #[test]
    fn test_generator_point_address() {
        // Public key of private key 1
        let der = hex::decode(
            "3056301006072a8648ce3d020106052b8104000a0342000479be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798483ada7726a3c4655da4fbfc0e1108a8fd17b448a68554199c47d08ffb10d4b8",
        )
        .unwrap();
        let address = derive_address(&decode_public_key(&der).unwrap());
        assert_eq!(address.to_hex(), "0x7e5f4552091a69125d5dfcb7b8c2659029395bdf");
    }

    #[test]
    fn test_derivation_is_deterministic() {
        let key = RawPublicKey::new([0x5a; 64]);
        assert_eq!(derive_address(&key), derive_address(&key));
        assert_ne!(derive_address(&key), derive_address(&RawPublicKey::new([0x5b; 64])));
    }
}
