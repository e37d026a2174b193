//! Keyward Tx - Legacy transaction encoding and signing
//!
//! This crate provides:
//! - A minimal RLP encoder
//! - `LegacyTransaction` with a builder and EIP-155 signing hashes
//! - `sign_transaction`, which signs a transaction through a `RemoteSigner`
//!   and returns the raw signed encoding

pub mod error;
pub mod rlp;
pub mod sign;
pub mod transaction;

pub use error::{Result, TxError};
pub use sign::{sign_transaction, SignedTransaction};
pub use transaction::{
    LegacyTransaction, TransactionBuilder, TransactionCodec, DEFAULT_GAS_LIMIT, DEFAULT_GAS_PRICE,
};
