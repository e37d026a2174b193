//! Custodian abstraction for non-exportable signing keys
//!
//! A custodian (cloud KMS, HSM, or the local software implementation in
//! [`crate::local`]) exposes exactly three operations. It never reveals
//! private key material.
//!
//! # Contract
//!
//! - `sign_digest` treats its input as an opaque 32-byte prehash and applies
//!   no further hashing.
//! - Signatures are DER `ECDSA-Sig-Value`s that verify under the key, with
//!   no recovery id and no promise of low-s form.
//! - Calls may be slow and may fail; implementations do not retry.

use async_trait::async_trait;
use thiserror::Error;

use keyward_core::{KeyHandle, MessageHash};

/// Failures reported by a custodian
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProviderError {
    /// Network or service failure; the caller may retry
    #[error("custodian unreachable: {0}")]
    Unavailable(String),

    /// The custodian refused the request (permissions, disabled key)
    #[error("request rejected: {0}")]
    Rejected(String),

    /// No key exists for the handle
    #[error("key not found: {0}")]
    KeyNotFound(String),

    /// The response lacked a required field
    #[error("incomplete response: {0}")]
    IncompleteResponse(String),
}

/// Trait for remote key custodians
#[async_trait]
pub trait KeyCustodian: Send + Sync {
    /// Create a new secp256k1 signing key and return its handle
    async fn create_key(&self) -> Result<KeyHandle, ProviderError>;

    /// Export the public key as DER SubjectPublicKeyInfo
    async fn export_public_key(&self, key: &KeyHandle) -> Result<Vec<u8>, ProviderError>;

    /// Sign a 32-byte digest, returning a DER ECDSA-Sig-Value
    async fn sign_digest(
        &self,
        key: &KeyHandle,
        digest: &MessageHash,
    ) -> Result<Vec<u8>, ProviderError>;

    /// Get the custodian type name
    fn custodian_type(&self) -> &'static str;
}
