//! Block structure, hashing and proof-of-work.

use crate::codec::{self, CodecError};
use crate::crypto::{verify_signature, Address, PublicKey, Signature};
use crate::hash::{hash, Hash};
use crate::pow::{self, check_pow, PowData, PowError};
use crate::transaction::Transaction;
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// A block: a batch of transactions linked to its predecessor by hash.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Block {
    /// Position in the chain; the first real block has height 1.
    pub height: u64,
    /// Hash of the previous block, zero for the first block.
    pub prev_hash: Hash,
    pub txs: Vec<Transaction>,
    /// Address of the producer.
    pub miner: Address,
    /// Packed public key of the producer.
    pub miner_pub_key: PublicKey,
    /// Unix timestamp in seconds.
    pub timestamp: u64,
    pub nonce: u64,
    /// Hash of the block with `hash` zeroed and `signature` emptied.
    pub hash: Hash,
    /// Producer's signature over `hash`, `r || s`.
    #[serde(with = "hex")]
    pub signature: Vec<u8>,
}

impl Block {
    /// Create an unsigned, unhashed block.
    pub fn new(
        height: u64,
        prev_hash: Hash,
        txs: Vec<Transaction>,
        miner_pub_key: PublicKey,
        timestamp: u64,
    ) -> Self {
        Self {
            height,
            prev_hash,
            txs,
            miner: miner_pub_key.to_address(),
            miner_pub_key,
            timestamp,
            nonce: 0,
            hash: Hash::ZERO,
            signature: Vec::new(),
        }
    }

    /// Get the current Unix timestamp.
    pub fn current_timestamp() -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0)
    }

    /// Canonical encoding of every field.
    pub fn to_bytes(&self) -> Vec<u8> {
        codec::encode(self)
    }

    /// Decode the canonical encoding.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CodecError> {
        codec::decode(bytes)
    }

    /// Encoding of a copy with `hash` zeroed and `signature` emptied. This
    /// is what both the block hash and the PoW search cover.
    pub fn scratch_bytes(&self) -> Vec<u8> {
        let scratch = Self {
            hash: Hash::ZERO,
            signature: Vec::new(),
            ..self.clone()
        };
        scratch.to_bytes()
    }

    /// Hash of the block content, leaving `hash` untouched.
    pub fn content_hash(&self) -> Hash {
        hash(&self.scratch_bytes())
    }

    /// Hash the block content and store the result in `hash`.
    pub fn calculate_hash(&mut self) -> Hash {
        self.hash = self.content_hash();
        self.hash
    }

    /// True when the embedded `hash` matches the content.
    pub fn has_valid_hash(&self) -> bool {
        self.hash == self.content_hash()
    }

    /// Search for a nonce meeting `difficulty`. The search runs on a copy;
    /// only the winning `nonce` and `hash` are written back.
    pub fn calculate_pow(&mut self, difficulty: u64) -> Result<Hash, PowError> {
        let mut scratch = self.clone();
        let found = pow::calculate_pow(&mut scratch, difficulty)?;
        self.nonce = scratch.nonce;
        self.hash = found;
        Ok(found)
    }

    /// Check the producer's signature over `hash`.
    pub fn verify_signature(&self) -> bool {
        match Signature::from_bytes(&self.signature) {
            Ok(sig) => verify_signature(&self.miner_pub_key, self.hash.as_bytes(), &sig),
            Err(_) => false,
        }
    }

    /// True when the first transaction is a genesis mint.
    pub fn is_genesis(&self) -> bool {
        self.txs.first().is_some_and(Transaction::is_genesis)
    }
}

impl PowData for Block {
    fn pow_bytes(&self) -> Vec<u8> {
        self.scratch_bytes()
    }

    fn nonce(&self) -> u64 {
        self.nonce
    }

    fn increment_nonce(&mut self) {
        self.nonce += 1;
    }
}

/// Re-derive the block hash from its content and check it meets
/// `difficulty`. The embedded `hash` is not trusted.
pub fn check_block_pow(block: &Block, difficulty: u64) -> bool {
    check_pow(&block.content_hash(), difficulty)
}
