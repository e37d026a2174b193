//! Transaction-digest signing through a custodian
//!
//! Turns custodian output into ledger-ready material. Provisioning creates a
//! key and records its address; signing asks the custodian for a DER
//! signature, canonicalizes it to low-s and resolves the recovery value
//! against the recorded address.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use keyward_core::{
    decode_public_key, decode_signature, derive_address, recovery, Address, ChainId, KeyHandle,
    MessageHash, RecoverableSignature, RecoveryIdScheme, Resolution,
};

use crate::custodian::KeyCustodian;
use crate::error::{Result, SignerError};

/// A freshly provisioned signing account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvisionedKey {
    pub key_handle: KeyHandle,
    pub address: Address,
}

/// Stateless signer over a shared custodian
pub struct RemoteSigner<C: KeyCustodian + ?Sized> {
    custodian: Arc<C>,
    scheme: RecoveryIdScheme,
}

impl<C: KeyCustodian + ?Sized> Clone for RemoteSigner<C> {
    fn clone(&self) -> Self {
        Self {
            custodian: Arc::clone(&self.custodian),
            scheme: self.scheme,
        }
    }
}

impl<C: KeyCustodian + ?Sized> RemoteSigner<C> {
    /// Create a signer using EIP-155 recovery values
    pub fn new(custodian: Arc<C>) -> Self {
        Self {
            custodian,
            scheme: RecoveryIdScheme::default(),
        }
    }

    /// Use a different recovery-id numbering
    pub fn with_scheme(mut self, scheme: RecoveryIdScheme) -> Self {
        self.scheme = scheme;
        self
    }

    pub fn custodian(&self) -> &Arc<C> {
        &self.custodian
    }

    pub fn scheme(&self) -> RecoveryIdScheme {
        self.scheme
    }

    /// Create a custodian key and derive its address
    pub async fn provision_key(&self) -> Result<ProvisionedKey> {
        let key_handle = self.custodian.create_key().await?;
        let address = self.derive_address(&key_handle).await?;

        info!(
            key_id = %key_handle,
            address = %address.to_checksum(),
            custodian = self.custodian.custodian_type(),
            "Provisioned signing key"
        );

        Ok(ProvisionedKey {
            key_handle,
            address,
        })
    }

    /// Address of an existing custodian key
    pub async fn derive_address(&self, key_handle: &KeyHandle) -> Result<Address> {
        let spki = self.custodian.export_public_key(key_handle).await?;
        let public_key = decode_public_key(&spki)?;
        Ok(derive_address(&public_key))
    }

    /// Sign a transaction digest and resolve its recovery value
    ///
    /// `address` must be the one recorded when the key was provisioned. A
    /// signature that recovers to neither candidate is a hard failure and
    /// is never returned to the caller.
    pub async fn sign_transaction_digest(
        &self,
        key_handle: &KeyHandle,
        address: &Address,
        digest: &MessageHash,
        chain_id: Option<ChainId>,
    ) -> Result<RecoverableSignature> {
        let candidates = self.scheme.candidates(chain_id)?;
        debug!(key_id = %key_handle, digest = %digest, "Requesting custodian signature");

        let der = self.custodian.sign_digest(key_handle, digest).await?;
        let signature = decode_signature(&der)?;

        match recovery::resolve(address, digest, &signature, candidates) {
            Resolution::Resolved(v) => {
                info!(key_id = %key_handle, v, "Signed transaction digest");
                Ok(RecoverableSignature::new(signature, v))
            }
            Resolution::Unresolved => {
                error!(
                    key_id = %key_handle,
                    address = %address,
                    digest = %digest,
                    r = %hex::encode(signature.r()),
                    s = %hex::encode(signature.s()),
                    first = candidates.first,
                    second = candidates.second,
                    "Signature does not recover the account address"
                );
                Err(SignerError::RecoveryFailed {
                    key_handle: key_handle.clone(),
                    address: *address,
                    digest: *digest,
                })
            }
        }
    }
}
