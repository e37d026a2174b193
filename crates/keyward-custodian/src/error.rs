//! Error types for custodian-backed signing

use thiserror::Error;

use keyward_core::{Address, KeyHandle, MessageHash};

use crate::custodian::ProviderError;

/// Result type alias for signer operations
pub type Result<T> = std::result::Result<T, SignerError>;

/// Errors that can occur while provisioning keys or signing
#[derive(Debug, Error)]
pub enum SignerError {
    /// A custodian call failed; retry policy belongs to the caller
    #[error("Custodian unavailable: {0}")]
    SigningUnavailable(#[from] ProviderError),

    /// Custodian output did not match the expected DER schema
    #[error("Malformed encoding: {0}")]
    MalformedEncoding(String),

    /// Signature does not recover to the account address
    #[error("Recovery failed for key {key_handle}: signature over {digest} does not recover {address}")]
    RecoveryFailed {
        key_handle: KeyHandle,
        address: Address,
        digest: MessageHash,
    },

    /// Invalid textual input (hex addresses, digests)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl SignerError {
    /// Whether a caller-side retry can reasonably succeed
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            SignerError::SigningUnavailable(ProviderError::Unavailable(_))
        )
    }
}

impl From<keyward_core::Error> for SignerError {
    fn from(e: keyward_core::Error) -> Self {
        match e {
            keyward_core::Error::MalformedEncoding(msg) => SignerError::MalformedEncoding(msg),
            keyward_core::Error::InvalidHex(msg) => SignerError::InvalidInput(msg),
            e @ keyward_core::Error::InvalidChainId(_) => SignerError::Config(e.to_string()),
        }
    }
}

impl From<serde_json::Error> for SignerError {
    fn from(e: serde_json::Error) -> Self {
        SignerError::Serialization(e.to_string())
    }
}
