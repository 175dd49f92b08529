//! JSON key files under `keys/`.

use anyhow::{bail, Context, Result};
use poachain_core::Keypair;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// On-disk form of a keypair. All fields are hex.
#[derive(Debug, Serialize, Deserialize)]
pub struct KeyFile {
    pub address: String,
    pub public_key: String,
    pub private_key: String,
}

impl KeyFile {
    pub fn from_keypair(keypair: &Keypair) -> Self {
        Self {
            address: keypair.address().to_hex(),
            public_key: keypair.public_key.to_hex(),
            private_key: hex::encode(keypair.private_key()),
        }
    }

    /// Rebuild the keypair and check it matches the stored public key.
    pub fn to_keypair(&self) -> Result<Keypair> {
        let bytes = hex::decode(&self.private_key).context("Invalid private key hex")?;
        let bytes: [u8; 32] = match bytes.try_into() {
            Ok(b) => b,
            Err(_) => bail!("Private key must be 32 bytes"),
        };
        let keypair = Keypair::from_private_key(&bytes)?;
        if keypair.public_key.to_hex() != self.public_key {
            bail!("Public key does not match private key");
        }
        Ok(keypair)
    }
}

/// Path of the node key inside `data_dir`.
pub fn node_key_path(data_dir: &Path) -> PathBuf {
    data_dir.join("keys").join("node.json")
}

pub fn save_keypair(path: &Path, keypair: &Keypair) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(&KeyFile::from_keypair(keypair))?;
    fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))
}

pub fn load_keypair(path: &Path) -> Result<Keypair> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read key file {}", path.display()))?;
    let file: KeyFile = serde_json::from_str(&text)
        .with_context(|| format!("Invalid key file {}", path.display()))?;
    file.to_keypair()
}
