//! Local software custodian
//!
//! Holds secp256k1 keys in process memory and behaves like a remote
//! custodian at the trait boundary: SPKI public keys out, DER signatures
//! without a recovery id out. Intended for development, CI and tests; keys
//! can be persisted to a JSON key store so the CLI works across runs.
//!
//! Real custodians return either member of the `{s, N - s}` pair. Set
//! [`LocalCustodian::with_high_s`] to always return the high member and
//! exercise the normalization path.

use std::collections::HashMap;
use std::path::Path;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use k256::ecdsa::{signature::hazmat::PrehashSigner, Signature, SigningKey};
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use zeroize::{Zeroize, ZeroizeOnDrop};

use keyward_core::{
    spki, KeyHandle, MessageHash, RawPublicKey, KEY_SPEC_SECP256K1, KEY_USAGE_SIGN_VERIFY,
};

use crate::custodian::{KeyCustodian, ProviderError};
use crate::error::{Result, SignerError};

/// Public description of a stored key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyMetadata {
    pub key_id: KeyHandle,
    pub key_spec: String,
    pub key_usage: String,
    pub created_at: DateTime<Utc>,
}

struct LocalKey {
    signing_key: SigningKey,
    metadata: KeyMetadata,
}

/// On-disk representation of one key
#[derive(Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
struct StoredKey {
    #[zeroize(skip)]
    metadata: KeyMetadata,
    /// Hex-encoded private scalar
    secret: String,
}

#[derive(Serialize, Deserialize, Default)]
struct KeyStoreFile {
    keys: Vec<StoredKey>,
}

/// In-process custodian backed by k256
#[derive(Default)]
pub struct LocalCustodian {
    keys: RwLock<HashMap<KeyHandle, LocalKey>>,
    high_s: bool,
}

impl LocalCustodian {
    /// Create an empty custodian
    pub fn new() -> Self {
        Self::default()
    }

    /// Always return the high-s member of each signature pair
    pub fn with_high_s(mut self, high_s: bool) -> Self {
        self.high_s = high_s;
        self
    }

    /// Import an existing private scalar (test fixtures, migrations)
    pub fn import_key(&self, secret: &[u8; 32]) -> std::result::Result<KeyHandle, ProviderError> {
        let signing_key = SigningKey::from_slice(secret).map_err(|_| {
            ProviderError::Rejected("secret is not a valid secp256k1 scalar".to_string())
        })?;
        self.insert(signing_key, Utc::now())
    }

    /// Metadata for every key, oldest first
    pub fn list_keys(&self) -> std::result::Result<Vec<KeyMetadata>, ProviderError> {
        let keys = self.read_keys()?;
        let mut out: Vec<KeyMetadata> = keys.values().map(|k| k.metadata.clone()).collect();
        out.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(out)
    }

    /// Number of keys held
    pub fn len(&self) -> std::result::Result<usize, ProviderError> {
        Ok(self.read_keys()?.len())
    }

    pub fn is_empty(&self) -> std::result::Result<bool, ProviderError> {
        Ok(self.len()? == 0)
    }

    /// Load a key store file; a missing file yields an empty custodian
    pub fn load(path: &Path) -> Result<Self> {
        let custodian = Self::new();
        if !path.exists() {
            debug!("No key store at {:?}, starting empty", path);
            return Ok(custodian);
        }

        let content = std::fs::read_to_string(path)?;
        let file: KeyStoreFile = serde_json::from_str(&content)?;

        for stored in &file.keys {
            let mut secret = [0u8; 32];
            hex::decode_to_slice(&stored.secret, &mut secret).map_err(|e| {
                SignerError::Serialization(format!("key {}: {}", stored.metadata.key_id, e))
            })?;
            let signing_key = SigningKey::from_slice(&secret).map_err(|_| {
                SignerError::Serialization(format!("key {}: invalid scalar", stored.metadata.key_id))
            });
            secret.zeroize();

            let local = LocalKey {
                signing_key: signing_key?,
                metadata: stored.metadata.clone(),
            };
            custodian
                .write_keys()?
                .insert(stored.metadata.key_id.clone(), local);
        }

        info!("Loaded {} keys from {:?}", file.keys.len(), path);
        Ok(custodian)
    }

    /// Write all keys to a key store file
    pub fn save(&self, path: &Path) -> Result<()> {
        let file = {
            let keys = self.read_keys()?;
            KeyStoreFile {
                keys: keys
                    .values()
                    .map(|k| StoredKey {
                        metadata: k.metadata.clone(),
                        secret: hex::encode(k.signing_key.to_bytes()),
                    })
                    .collect(),
            }
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(&file)?;
        std::fs::write(path, content)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))?;
        }

        debug!("Saved {} keys to {:?}", file.keys.len(), path);
        Ok(())
    }

    fn insert(
        &self,
        signing_key: SigningKey,
        created_at: DateTime<Utc>,
    ) -> std::result::Result<KeyHandle, ProviderError> {
        let key_id = KeyHandle::new(uuid::Uuid::new_v4().to_string());
        let metadata = KeyMetadata {
            key_id: key_id.clone(),
            key_spec: KEY_SPEC_SECP256K1.to_string(),
            key_usage: KEY_USAGE_SIGN_VERIFY.to_string(),
            created_at,
        };

        self.write_keys()?
            .insert(key_id.clone(), LocalKey { signing_key, metadata });
        Ok(key_id)
    }

    fn read_keys(
        &self,
    ) -> std::result::Result<std::sync::RwLockReadGuard<'_, HashMap<KeyHandle, LocalKey>>, ProviderError>
    {
        self.keys
            .read()
            .map_err(|_| ProviderError::Unavailable("key store lock poisoned".to_string()))
    }

    fn write_keys(
        &self,
    ) -> std::result::Result<std::sync::RwLockWriteGuard<'_, HashMap<KeyHandle, LocalKey>>, ProviderError>
    {
        self.keys
            .write()
            .map_err(|_| ProviderError::Unavailable("key store lock poisoned".to_string()))
    }

    fn sign_with_key(
        &self,
        signing_key: &SigningKey,
        digest: &MessageHash,
    ) -> std::result::Result<Vec<u8>, ProviderError> {
        // k256 always produces the low-s form
        let signature: Signature = signing_key
            .sign_prehash(digest.as_bytes())
            .map_err(|e| ProviderError::Rejected(format!("signing failed: {}", e)))?;

        let signature = if self.high_s {
            let high_s = -*signature.s();
            Signature::from_scalars(signature.r().to_bytes(), high_s.to_bytes())
                .map_err(|e| ProviderError::Rejected(format!("signing failed: {}", e)))?
        } else {
            signature
        };

        Ok(signature.to_der().as_bytes().to_vec())
    }
}

#[async_trait]
impl KeyCustodian for LocalCustodian {
    async fn create_key(&self) -> std::result::Result<KeyHandle, ProviderError> {
        let key_id = self.insert(SigningKey::random(&mut OsRng), Utc::now())?;
        info!(key_id = %key_id, "Created local signing key");
        Ok(key_id)
    }

    async fn export_public_key(
        &self,
        key: &KeyHandle,
    ) -> std::result::Result<Vec<u8>, ProviderError> {
        let keys = self.read_keys()?;
        let local = keys
            .get(key)
            .ok_or_else(|| ProviderError::KeyNotFound(key.to_string()))?;

        let encoded = local.signing_key.verifying_key().to_encoded_point(false);
        let raw: [u8; 64] = encoded.as_bytes()[1..].try_into().map_err(|_| {
            ProviderError::IncompleteResponse("public key is not uncompressed".to_string())
        })?;

        Ok(spki::encode_public_key(&RawPublicKey::new(raw)))
    }

    async fn sign_digest(
        &self,
        key: &KeyHandle,
        digest: &MessageHash,
    ) -> std::result::Result<Vec<u8>, ProviderError> {
        let keys = self.read_keys()?;
        let local = keys
            .get(key)
            .ok_or_else(|| ProviderError::KeyNotFound(key.to_string()))?;

        debug!(key_id = %key, digest = %digest, "Signing digest with local key");
        self.sign_with_key(&local.signing_key, digest)
    }

    fn custodian_type(&self) -> &'static str {
        "local"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use keyward_core::{decode_public_key, derive_address, signature::is_low_s};

    const SECRET: [u8; 32] = [0x46; 32];

    #[tokio::test]
    async fn test_export_matches_known_key() {
        let custodian = LocalCustodian::new();
        let key = custodian.import_key(&SECRET).unwrap();

        let der = custodian.export_public_key(&key).await.unwrap();
        let address = derive_address(&decode_public_key(&der).unwrap());
        assert_eq!(address.to_hex(), "0x9d8a62f656a8d1615c1294fd71e9cfb3e4855a4f");
    }

    #[tokio::test]
    async fn test_high_s_mode() {
        let custodian = LocalCustodian::new().with_high_s(true);
        let key = custodian.import_key(&SECRET).unwrap();
        let digest = MessageHash::new([0x11; 32]);

        let der = custodian.sign_digest(&key, &digest).await.unwrap();
        let signature = Signature::from_der(&der).unwrap();
        let s: [u8; 32] = signature.s().to_bytes().into();
        assert!(!is_low_s(&s));
    }

    #[tokio::test]
    async fn test_unknown_key() {
        let custodian = LocalCustodian::new();
        let missing = KeyHandle::new("missing");
        assert_eq!(
            custodian.export_public_key(&missing).await,
            Err(ProviderError::KeyNotFound("missing".to_string()))
        );
        assert!(custodian
            .sign_digest(&missing, &MessageHash::new([0u8; 32]))
            .await
            .is_err());
    }

    #[test]
    fn test_rejects_invalid_import() {
        let custodian = LocalCustodian::new();
        assert!(custodian.import_key(&[0u8; 32]).is_err());
        assert!(custodian.is_empty().unwrap());
    }

    #[tokio::test]
    async fn test_key_store_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("keys.json");

        let custodian = LocalCustodian::new();
        let imported = custodian.import_key(&SECRET).unwrap();
        let created = custodian.create_key().await.unwrap();
        custodian.save(&path).unwrap();

        let reloaded = LocalCustodian::load(&path).unwrap();
        assert_eq!(reloaded.len().unwrap(), 2);
        for key in [&imported, &created] {
            assert_eq!(
                custodian.export_public_key(key).await.unwrap(),
                reloaded.export_public_key(key).await.unwrap()
            );
        }
    }

    #[test]
    fn test_load_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let custodian = LocalCustodian::load(&dir.path().join("absent.json")).unwrap();
        assert!(custodian.is_empty().unwrap());
    }

    #[test]
    fn test_poisoned_lock_is_unavailable() {
        let custodian = std::sync::Arc::new(LocalCustodian::new());
        custodian.import_key(&SECRET).unwrap();

        let holder = std::sync::Arc::clone(&custodian);
        let _ = std::thread::spawn(move || {
            let _guard = holder.keys.write().unwrap();
            panic!("panic while holding the key store lock");
        })
        .join();

        assert!(matches!(custodian.len(), Err(ProviderError::Unavailable(_))));
        assert!(matches!(
            custodian.is_empty(),
            Err(ProviderError::Unavailable(_))
        ));
        assert!(custodian.list_keys().is_err());
    }
}
