//! Keyward Custodian - Remote-custody signing orchestration
//!
//! This crate provides:
//! - The `KeyCustodian` trait, the boundary to a non-exportable key service
//! - A local software custodian for development and tests
//! - `RemoteSigner`, which provisions keys and turns custodian signatures
//!   into ledger-ready `(r, s, v)` triples
//! - Signer configuration

pub mod config;
pub mod custodian;
pub mod error;
pub mod local;
pub mod signer;

pub use config::SignerConfig;
pub use custodian::{KeyCustodian, ProviderError};
pub use error::{Result, SignerError};
pub use local::LocalCustodian;
pub use signer::{ProvisionedKey, RemoteSigner};
