//! `config.json` in the data directory.

use anyhow::{Context, Result};
use poachain_chain::BlockchainConfig;
use poachain_consensus::PoAConfig;
use poachain_core::PublicKey;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE: &str = "config.json";

/// Node settings persisted next to the database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeConfig {
    /// Chain id; prefixes every storage key.
    pub chain_id: String,
    /// Leading zero bytes required of block hashes.
    pub difficulty: u64,
    /// Packed public keys (hex) allowed to sign blocks. Empty means anyone.
    #[serde(default)]
    pub auth_miners: Vec<String>,
    /// Default log filter when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_log_level() -> String {
    "info".into()
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            chain_id: "main".into(),
            difficulty: 1,
            auth_miners: Vec::new(),
            log_level: default_log_level(),
        }
    }
}

impl NodeConfig {
    pub fn path(data_dir: &Path) -> PathBuf {
        data_dir.join(CONFIG_FILE)
    }

    /// Read `config.json` from `data_dir`.
    pub fn load(data_dir: &Path) -> Result<Self> {
        let path = Self::path(data_dir);
        let text = fs::read_to_string(&path).with_context(|| {
            format!(
                "Failed to read {}. Did you run 'poachain init'?",
                path.display()
            )
        })?;
        serde_json::from_str(&text).with_context(|| format!("Invalid config: {}", path.display()))
    }

    /// Write `config.json` into `data_dir`.
    pub fn save(&self, data_dir: &Path) -> Result<()> {
        let path = Self::path(data_dir);
        fs::write(&path, serde_json::to_string_pretty(self)?)
            .with_context(|| format!("Failed to write {}", path.display()))
    }

    /// Ledger configuration with the authority keys decoded.
    pub fn blockchain_config(&self) -> Result<BlockchainConfig> {
        let auth_miners = self
            .auth_miners
            .iter()
            .map(|k| {
                PublicKey::from_hex(k).with_context(|| format!("Invalid authority key: {}", k))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(BlockchainConfig {
            id: self.chain_id.clone(),
            difficulty: self.difficulty,
            poa: PoAConfig::new(auth_miners),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use poachain_core::Keypair;

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let kp = Keypair::generate().unwrap();
        let config = NodeConfig {
            chain_id: "devnet".into(),
            difficulty: 2,
            auth_miners: vec![kp.public_key.to_hex()],
            log_level: "debug".into(),
        };

        config.save(dir.path()).unwrap();
        assert_eq!(NodeConfig::load(dir.path()).unwrap(), config);
    }

    #[test]
    fn test_blockchain_config() {
        let kp = Keypair::generate().unwrap();
        let config = NodeConfig {
            auth_miners: vec![kp.public_key.to_hex()],
            ..NodeConfig::default()
        };

        let bc = config.blockchain_config().unwrap();
        assert_eq!(bc.id, "main");
        assert_eq!(bc.difficulty, 1);
        assert!(bc.poa.is_authorized(&kp.public_key));
    }

    #[test]
    fn test_optional_fields_default() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            NodeConfig::path(dir.path()),
            r#"{"chain_id":"x","difficulty":0}"#,
        )
        .unwrap();

        let config = NodeConfig::load(dir.path()).unwrap();
        assert!(config.auth_miners.is_empty());
        assert_eq!(config.log_level, "info");
        assert!(config.blockchain_config().unwrap().poa.is_dev_mode());
    }

    #[test]
    fn test_bad_authority_key() {
        let config = NodeConfig {
            auth_miners: vec!["zz".into()],
            ..NodeConfig::default()
        };
        assert!(config.blockchain_config().is_err());
    }

    #[test]
    fn test_missing_config() {
        let dir = tempfile::tempdir().unwrap();
        assert!(NodeConfig::load(dir.path()).is_err());
    }
}
