//! Keyward Core - Pure building blocks for remote-custody signing
//!
//! This crate turns what a non-exportable key custodian gives back (a
//! DER/SPKI public key and DER ECDSA signatures without a recovery id) into
//! ledger-ready material:
//! - SPKI decoding to the raw uncompressed secp256k1 point
//! - Keccak-256 address derivation
//! - ECDSA-Sig-Value decoding with low-s canonicalization
//! - Recovery-id resolution against a known address
//!
//! Nothing here performs I/O. The custodian itself lives behind the
//! `KeyCustodian` trait in `keyward-custodian`.

pub mod address;
pub mod der;
pub mod error;
pub mod recovery;
pub mod signature;
pub mod spki;
pub mod types;

pub use address::derive_address;
pub use error::{Error, Result};
pub use recovery::{RecoveryCandidates, RecoveryIdScheme, Resolution};
pub use signature::decode_signature;
pub use spki::decode_public_key;
pub use types::{
    Address, CanonicalSignature, ChainId, KeyHandle, MessageHash, RawPublicKey,
    RecoverableSignature,
};

/// secp256k1 group order N (big-endian)
pub const SECP256K1_ORDER: [u8; 32] = [
    0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFE,
    0xBA, 0xAE, 0xDC, 0xE6, 0xAF, 0x48, 0xA0, 0x3B, 0xBF, 0xD2, 0x5E, 0x8C, 0xD0, 0x36, 0x41, 0x41,
];

/// N / 2, the largest s accepted by the low-s rule (big-endian)
pub const SECP256K1_HALF_ORDER: [u8; 32] = [
    0x7F, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF,
    0x5D, 0x57, 0x6E, 0x73, 0x57, 0xA4, 0x50, 0x1D, 0xDF, 0xE9, 0x2F, 0x46, 0x68, 0x1B, 0x20, 0xA0,
];

/// Custodian key spec for secp256k1 signing keys
pub const KEY_SPEC_SECP256K1: &str = "ECC_SECG_P256K1";

/// Custodian key usage for signing keys
pub const KEY_USAGE_SIGN_VERIFY: &str = "SIGN_VERIFY";
