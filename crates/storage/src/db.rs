//! sled database wrapper with serialization helpers.

use poachain_core::{Address, CodecError, Hash};
use sled::Db;
use std::path::Path;
use thiserror::Error;

/// Storage errors.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] sled::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::Error),

    #[error("Stored record is corrupt: {0}")]
    Codec(#[from] CodecError),

    #[error("Key not found: {0}")]
    NotFound(String),

    #[error("Insufficient balance: address {address}, required {required}, available {available}")]
    InsufficientBalance {
        address: Address,
        required: u64,
        available: u64,
    },

    #[error("Balance overflow: address {address}, adding {amount} to {balance}")]
    BalanceOverflow {
        address: Address,
        balance: u64,
        amount: u64,
    },

    #[error("Invalid balance value: expected 8 bytes, got {0}")]
    InvalidBalance(usize),
}

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;

/// Wrapper around sled database with serialization helpers.
pub struct Storage {
    db: Db,
}

impl Storage {
    /// Open a database at the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let db = sled::open(path)?;
        Ok(Self { db })
    }

    /// Open an in-memory database (for testing).
    pub fn open_temporary() -> Result<Self> {
        let db = sled::Config::new().temporary(true).open()?;
        Ok(Self { db })
    }

    /// Store a serializable value.
    pub fn put<K, V>(&self, key: K, value: &V) -> Result<()>
    where
        K: AsRef<[u8]>,
        V: serde::Serialize,
    {
        let encoded = bincode::serialize(value)?;
        self.db.insert(key, encoded)?;
        Ok(())
    }

    /// Retrieve and deserialize a value.
    pub fn get<K, V>(&self, key: K) -> Result<Option<V>>
    where
        K: AsRef<[u8]>,
        V: serde::de::DeserializeOwned,
    {
        match self.db.get(key)? {
            Some(bytes) => {
                let value = bincode::deserialize(&bytes)?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    /// Store raw bytes as-is.
    pub fn put_raw<K: AsRef<[u8]>>(&self, key: K, value: &[u8]) -> Result<()> {
        self.db.insert(key, value)?;
        Ok(())
    }

    /// Retrieve raw bytes.
    pub fn get_raw<K: AsRef<[u8]>>(&self, key: K) -> Result<Option<Vec<u8>>> {
        Ok(self.db.get(key)?.map(|v| v.to_vec()))
    }

    /// Check if a key exists.
    pub fn contains<K: AsRef<[u8]>>(&self, key: K) -> Result<bool> {
        Ok(self.db.contains_key(key)?)
    }

    /// Apply multiple operations atomically.
    ///
    /// Either every operation lands or none does; sled's `apply_batch`
    /// provides the guarantee.
    pub fn batch(&self, operations: Vec<BatchOp>) -> Result<()> {
        let mut batch = sled::Batch::default();
        for op in operations {
            match op {
                BatchOp::Insert { key, value } => batch.insert(key, value),
                BatchOp::Remove { key } => batch.remove(key),
            }
        }
        self.db.apply_batch(batch)?;
        Ok(())
    }

    /// Flush all pending writes to disk.
    pub fn flush(&self) -> Result<()> {
        self.db.flush()?;
        Ok(())
    }

    // =========================================================================
    // Key Construction Helpers
    //
    // Every key starts with the chain id so several ledgers can share one
    // database without colliding.
    // =========================================================================

    /// Format: "{id}:block:" + hash_bytes
    pub fn block_key(id: &str, hash: &Hash) -> Vec<u8> {
        let mut key = format!("{}:block:", id).into_bytes();
        key.extend_from_slice(&hash.0);
        key
    }

    /// Format: "{id}:height:{height}"
    pub fn block_height_key(id: &str, height: u64) -> Vec<u8> {
        format!("{}:height:{}", id, height).into_bytes()
    }

    /// Format: "{id}:tx:" + tx_id_bytes
    pub fn tx_key(id: &str, tx_id: &Hash) -> Vec<u8> {
        let mut key = format!("{}:tx:", id).into_bytes();
        key.extend_from_slice(&tx_id.0);
        key
    }

    /// Format: "{id}:balance:" + address_bytes
    pub fn balance_key(id: &str, address: &Address) -> Vec<u8> {
        let mut key = format!("{}:balance:", id).into_bytes();
        key.extend_from_slice(&address.0);
        key
    }

    /// Format: "{id}:chain:head"
    pub fn head_key(id: &str) -> Vec<u8> {
        format!("{}:chain:head", id).into_bytes()
    }
}

/// Batch operation for atomic updates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchOp {
    Insert { key: Vec<u8>, value: Vec<u8> },
    Remove { key: Vec<u8> },
}

impl BatchOp {
    /// Insert raw bytes.
    pub fn insert(key: Vec<u8>, value: Vec<u8>) -> Self {
        BatchOp::Insert { key, value }
    }

    /// Insert a bincode-encoded value.
    pub fn put<V: serde::Serialize>(key: Vec<u8>, value: &V) -> Result<Self> {
        Ok(BatchOp::Insert {
            key,
            value: bincode::serialize(value)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_temporary() {
        let storage = Storage::open_temporary().unwrap();
        assert!(storage.db.is_empty());
    }

    #[test]
    fn test_open_on_disk_persists() {
        let dir = tempfile::tempdir().unwrap();
        {
            let storage = Storage::open(dir.path()).unwrap();
            storage.put("height", &7u64).unwrap();
            storage.flush().unwrap();
        }
        let storage = Storage::open(dir.path()).unwrap();
        let value: Option<u64> = storage.get("height").unwrap();
        assert_eq!(value, Some(7));
    }

    #[test]
    fn test_put_get() {
        let storage = Storage::open_temporary().unwrap();

        storage.put("key1", &42u64).unwrap();

        let value: Option<u64> = storage.get("key1").unwrap();
        assert_eq!(value, Some(42));

        let missing: Option<u64> = storage.get("missing").unwrap();
        assert_eq!(missing, None);
    }

    #[test]
    fn test_raw_put_get() {
        let storage = Storage::open_temporary().unwrap();

        storage.put_raw("raw", b"{\"a\":1}").unwrap();
        assert_eq!(storage.get_raw("raw").unwrap(), Some(b"{\"a\":1}".to_vec()));
        assert_eq!(storage.get_raw("none").unwrap(), None);
    }

    #[test]
    fn test_batch_operations() {
        let storage = Storage::open_temporary().unwrap();
        storage.put_raw("gone", b"x").unwrap();

        let ops = vec![
            BatchOp::put(b"a".to_vec(), &1u64).unwrap(),
            BatchOp::put(b"b".to_vec(), &2u64).unwrap(),
            BatchOp::insert(b"c".to_vec(), b"raw".to_vec()),
            BatchOp::Remove {
                key: b"gone".to_vec(),
            },
        ];
        storage.batch(ops).unwrap();

        let a: u64 = storage.get("a").unwrap().unwrap();
        let b: u64 = storage.get("b").unwrap().unwrap();
        assert_eq!(a, 1);
        assert_eq!(b, 2);
        assert_eq!(storage.get_raw("c").unwrap(), Some(b"raw".to_vec()));
        assert!(!storage.contains("gone").unwrap());
    }

    #[test]
    fn test_key_construction() {
        let address = Address([0xAA; 32]);
        let hash = Hash([0xBB; 32]);

        assert!(Storage::block_key("main", &hash).starts_with(b"main:block:"));
        assert!(Storage::tx_key("main", &hash).starts_with(b"main:tx:"));
        assert!(Storage::balance_key("main", &address).starts_with(b"main:balance:"));
        assert_eq!(Storage::block_height_key("main", 42), b"main:height:42");
        assert_eq!(Storage::head_key("main"), b"main:chain:head");
    }

    #[test]
    fn test_keys_are_namespaced() {
        let hash = Hash([0x01; 32]);
        assert_ne!(Storage::block_key("a", &hash), Storage::block_key("b", &hash));
        assert_ne!(Storage::head_key("a"), Storage::head_key("b"));
    }
}
