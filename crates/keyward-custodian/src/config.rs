//! Signer configuration

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

use keyward_core::{
    ChainId, RecoveryCandidates, RecoveryIdScheme, KEY_SPEC_SECP256K1, KEY_USAGE_SIGN_VERIFY,
};

use crate::error::{Result, SignerError};

/// Environment variable naming the config file
pub const CONFIG_ENV: &str = "KEYWARD_CONFIG";

/// Environment variable overriding the chain id (0 disables EIP-155)
pub const CHAIN_ID_ENV: &str = "CHAIN_ID";

/// Signer configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignerConfig {
    /// Chain id for replay protection; `None` signs pre-EIP-155
    pub chain_id: Option<ChainId>,

    /// How recovery ids are numbered on the target network
    pub recovery_scheme: RecoveryIdScheme,

    /// Key store file used by the local custodian
    pub key_store_path: PathBuf,

    /// Key spec requested from the custodian
    pub key_spec: String,

    /// Key usage requested from the custodian
    pub key_usage: String,
}

impl Default for SignerConfig {
    fn default() -> Self {
        Self {
            chain_id: Some(ChainId::SEPOLIA),
            recovery_scheme: RecoveryIdScheme::default(),
            key_store_path: Self::default_key_store_path(),
            key_spec: KEY_SPEC_SECP256K1.to_string(),
            key_usage: KEY_USAGE_SIGN_VERIFY.to_string(),
        }
    }
}

impl SignerConfig {
    /// Config file location: `$KEYWARD_CONFIG`, else the platform config dir
    pub fn default_config_path() -> PathBuf {
        std::env::var_os(CONFIG_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| {
                dirs::config_dir()
                    .unwrap_or_else(|| PathBuf::from("."))
                    .join("keyward")
                    .join("config.json")
            })
    }

    fn default_key_store_path() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("keyward")
            .join("keys.json")
    }

    /// Load configuration from file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `path` if it exists, otherwise use defaults
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            debug!("No config at {:?}, using defaults", path);
            Ok(Self::default())
        }
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Apply the `CHAIN_ID` environment override
    pub fn apply_env(&mut self) -> Result<()> {
        if let Ok(value) = std::env::var(CHAIN_ID_ENV) {
            self.chain_id = parse_chain_id(&value)?;
            debug!(chain_id = ?self.chain_id, "Chain id taken from environment");
        }
        Ok(())
    }

    /// Candidate v values for the configured network
    pub fn recovery_candidates(&self) -> Result<RecoveryCandidates> {
        Ok(self.recovery_scheme.candidates(self.chain_id)?)
    }

    /// Create directories if they don't exist
    pub fn ensure_directories(&self) -> Result<()> {
        if let Some(parent) = self.key_store_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.key_spec != KEY_SPEC_SECP256K1 {
            return Err(SignerError::Config(format!(
                "unsupported key spec {}, expected {}",
                self.key_spec, KEY_SPEC_SECP256K1
            )));
        }
        if self.key_usage != KEY_USAGE_SIGN_VERIFY {
            return Err(SignerError::Config(format!(
                "unsupported key usage {}, expected {}",
                self.key_usage, KEY_USAGE_SIGN_VERIFY
            )));
        }
        match self.chain_id {
            Some(id) if id.as_u64() == 0 => Err(SignerError::Config(
                "chain id 0 is not valid, use null to disable replay protection".to_string(),
            )),
            Some(id) if !id.is_valid() => Err(chain_id_too_large(id.as_u64())),
            _ => Ok(()),
        }
    }
}

/// Parse a decimal chain id; `0` or an empty string means no chain id
pub fn parse_chain_id(value: &str) -> Result<Option<ChainId>> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(None);
    }
    let id: u64 = value
        .parse()
        .map_err(|_| SignerError::Config(format!("invalid chain id: {}", value)))?;
    if id > ChainId::MAX {
        return Err(chain_id_too_large(id));
    }
    Ok((id != 0).then_some(ChainId::new(id)))
}

fn chain_id_too_large(id: u64) -> SignerError {
    SignerError::Config(format!(
        "chain id {} exceeds the maximum of {}",
        id,
        ChainId::MAX
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SignerConfig::default();
        assert_eq!(config.chain_id, Some(ChainId::SEPOLIA));
        assert_eq!(config.recovery_scheme, RecoveryIdScheme::Eip155);
        assert_eq!(
            config.recovery_candidates().unwrap(),
            RecoveryCandidates::new(22310257, 22310258)
        );
        assert_eq!(config.key_spec, "ECC_SECG_P256K1");
        assert_eq!(config.key_usage, "SIGN_VERIFY");
    }

    #[test]
    fn test_save_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let config = SignerConfig {
            chain_id: Some(ChainId::ETHEREUM),
            recovery_scheme: RecoveryIdScheme::Legacy,
            key_store_path: dir.path().join("keys.json"),
            ..Default::default()
        };
        config.save(&path).unwrap();

        assert_eq!(SignerConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"chain_id": null, "recovery_scheme": "parity"}"#).unwrap();

        let config = SignerConfig::load(&path).unwrap();
        assert_eq!(config.chain_id, None);
        assert_eq!(
            config.recovery_candidates().unwrap(),
            RecoveryCandidates::new(0, 1)
        );
        assert_eq!(config.key_spec, KEY_SPEC_SECP256K1);
    }

    #[test]
    fn test_rejects_wrong_key_spec() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"key_spec": "ECC_NIST_P256"}"#).unwrap();

        assert!(matches!(
            SignerConfig::load(&path),
            Err(SignerError::Config(_))
        ));
    }

    #[test]
    fn test_missing_file_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = SignerConfig::load_or_default(&dir.path().join("absent.json")).unwrap();
        assert_eq!(config, SignerConfig::default());
    }

    #[test]
    fn test_parse_chain_id() {
        assert_eq!(parse_chain_id("11155111").unwrap(), Some(ChainId::SEPOLIA));
        assert_eq!(parse_chain_id(" 1 ").unwrap(), Some(ChainId::ETHEREUM));
        assert_eq!(parse_chain_id("0").unwrap(), None);
        assert_eq!(parse_chain_id("").unwrap(), None);
        assert!(parse_chain_id("sepolia").is_err());
    }

    #[test]
    fn test_chain_id_upper_bound() {
        let max = ChainId::MAX.to_string();
        assert_eq!(parse_chain_id(&max).unwrap(), Some(ChainId::new(ChainId::MAX)));

        let over = (ChainId::MAX + 1).to_string();
        assert!(matches!(parse_chain_id(&over), Err(SignerError::Config(_))));
        assert!(matches!(
            parse_chain_id(&u64::MAX.to_string()),
            Err(SignerError::Config(_))
        ));
    }

    #[test]
    fn test_rejects_oversized_chain_id_in_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, format!(r#"{{"chain_id": {}}}"#, u64::MAX / 2)).unwrap();

        assert!(matches!(
            SignerConfig::load(&path),
            Err(SignerError::Config(_))
        ));
    }

    #[test]
    fn test_oversized_chain_id_has_no_candidates() {
        let config = SignerConfig {
            chain_id: Some(ChainId::new(u64::MAX / 2)),
            ..Default::default()
        };
        assert!(matches!(
            config.recovery_candidates(),
            Err(SignerError::Config(_))
        ));
    }

    #[test]
    fn test_eip155_without_chain_id_falls_back() {
        let config = SignerConfig {
            chain_id: None,
            ..Default::default()
        };
        assert_eq!(
            config.recovery_candidates().unwrap(),
            RecoveryCandidates::legacy()
        );
    }
}
