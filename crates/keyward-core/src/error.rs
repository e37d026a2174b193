//! Error types for keyward-core

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// DER, SPKI or ECDSA-Sig-Value did not match the expected schema
    #[error("Malformed encoding: {0}")]
    MalformedEncoding(String),

    #[error("Invalid hex: {0}")]
    InvalidHex(String),

    /// Chain id too large for EIP-155 recovery values
    #[error("Chain id {0} exceeds the EIP-2294 maximum")]
    InvalidChainId(u64),
}

impl Error {
    pub(crate) fn malformed(msg: impl Into<String>) -> Self {
        Error::MalformedEncoding(msg.into())
    }
}

impl From<hex::FromHexError> for Error {
    fn from(e: hex::FromHexError) -> Self {
        Error::InvalidHex(e.to_string())
    }
}
