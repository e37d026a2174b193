//! Error types for transaction encoding and signing

use thiserror::Error;

use keyward_custodian::SignerError;

pub type Result<T> = std::result::Result<T, TxError>;

#[derive(Error, Debug)]
pub enum TxError {
    #[error("Signing error: {0}")]
    Signer(#[from] SignerError),

    #[error("Invalid transaction: {0}")]
    InvalidTransaction(String),

    /// The recovery-id scheme cannot be carried by a legacy transaction
    #[error("Unsupported recovery scheme for legacy transactions: {0}")]
    UnsupportedScheme(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for TxError {
    fn from(e: serde_json::Error) -> Self {
        TxError::Serialization(e.to_string())
    }
}

impl From<keyward_core::Error> for TxError {
    fn from(e: keyward_core::Error) -> Self {
        TxError::InvalidTransaction(e.to_string())
    }
}
