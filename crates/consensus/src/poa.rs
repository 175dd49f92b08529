//! Proof of Authority (PoA) rules.
//!
//! A fixed set of pre-approved public keys may sign blocks. An empty set
//! puts the chain in development mode, where any signer is accepted but the
//! signature must still be valid.

use poachain_core::{Address, Block, Hash, PublicKey};
use thiserror::Error;

/// The reason a block failed verification.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConsensusError {
    #[error("miner {0} is not an authority")]
    UnauthorizedMiner(Address),

    #[error("block hash {got} does not match its content ({expected})")]
    InvalidHash { expected: Hash, got: Hash },

    #[error("invalid block signature")]
    InvalidSignature,

    #[error("block timestamp {block} is earlier than parent {parent}")]
    TimestampTooEarly { block: u64, parent: u64 },

    #[error("block prev_hash {got} does not match tip {expected}")]
    InvalidPrevHash { expected: Hash, got: Hash },

    #[error("block height mismatch (expected {expected}, got {got})")]
    InvalidHeight { expected: u64, got: u64 },

    #[error("transaction {index} ({tx_id}) does not conserve value")]
    InvalidTransaction { index: usize, tx_id: Hash },

    #[error("transaction {index} id {tx_id} does not match its content")]
    InvalidTxId { index: usize, tx_id: Hash },
}

pub type Result<T> = std::result::Result<T, ConsensusError>;

/// Proof of Authority configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PoAConfig {
    /// Public keys allowed to sign blocks.
    pub auth_miners: Vec<PublicKey>,
}

impl PoAConfig {
    /// Create a new PoA configuration with the given authorities.
    pub fn new(auth_miners: Vec<PublicKey>) -> Self {
        Self { auth_miners }
    }

    /// True when no authorities are configured and anyone may sign.
    pub fn is_dev_mode(&self) -> bool {
        self.auth_miners.is_empty()
    }

    /// Check if a key may sign blocks. Keys compare in packed form.
    pub fn is_authorized(&self, public_key: &PublicKey) -> bool {
        self.is_dev_mode()
            || self
                .auth_miners
                .iter()
                .any(|k| k.pack() == public_key.pack())
    }
}

/// Authority checks for PoA consensus.
#[derive(Debug, Clone)]
pub struct Authority {
    config: PoAConfig,
}

impl Authority {
    /// Create a new Authority with the given configuration.
    pub fn new(config: PoAConfig) -> Self {
        Self { config }
    }

    /// Get the configuration.
    pub fn config(&self) -> &PoAConfig {
        &self.config
    }

    /// Verify that the block was produced by an authority.
    pub fn verify_block_authority(&self, block: &Block) -> Result<()> {
        if !self.config.is_authorized(&block.miner_pub_key) {
            return Err(ConsensusError::UnauthorizedMiner(block.miner));
        }
        Ok(())
    }

    /// Verify the embedded hash matches the block content. The signature
    /// only covers the embedded hash.
    pub fn verify_block_hash(&self, block: &Block) -> Result<()> {
        let expected = block.content_hash();
        if block.hash != expected {
            return Err(ConsensusError::InvalidHash {
                expected,
                got: block.hash,
            });
        }
        Ok(())
    }

    /// Verify the block signature against the miner's key.
    pub fn verify_block_signature(&self, block: &Block) -> Result<()> {
        if !block.verify_signature() {
            return Err(ConsensusError::InvalidSignature);
        }
        Ok(())
    }

    /// Verify the block timestamp does not go back in time. Equal
    /// timestamps are allowed.
    pub fn verify_block_timestamp(&self, block: &Block, parent_timestamp: u64) -> Result<()> {
        if block.timestamp < parent_timestamp {
            return Err(ConsensusError::TimestampTooEarly {
                block: block.timestamp,
                parent: parent_timestamp,
            });
        }
        Ok(())
    }

    /// Verify authority, hash, signature and timestamp, in that order.
    pub fn verify_block(&self, block: &Block, parent_timestamp: u64) -> Result<()> {
        self.verify_block_authority(block)?;
        self.verify_block_hash(block)?;
        self.verify_block_signature(block)?;
        self.verify_block_timestamp(block, parent_timestamp)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use poachain_core::{Keypair, Transaction};

    fn signed_block(keypair: &Keypair, timestamp: u64) -> Block {
        let mut block = Block::new(1, Hash::ZERO, vec![], keypair.public_key.clone(), timestamp);
        let h = block.calculate_hash();
        block.signature = keypair.sign(h.as_bytes()).unwrap().to_bytes().to_vec();
        block
    }

    #[test]
    fn test_poa_config_membership() {
        let kp1 = Keypair::generate().unwrap();
        let kp2 = Keypair::generate().unwrap();
        let config = PoAConfig::new(vec![kp1.public_key.clone()]);

        assert!(!config.is_dev_mode());
        assert!(config.is_authorized(&kp1.public_key));
        assert!(!config.is_authorized(&kp2.public_key));
    }

    #[test]
    fn test_dev_mode_allows_anyone() {
        let config = PoAConfig::default();
        let kp = Keypair::generate().unwrap();

        assert!(config.is_dev_mode());
        assert!(config.is_authorized(&kp.public_key));
    }

    #[test]
    fn test_verify_authorized_block() {
        let kp = Keypair::generate().unwrap();
        let authority = Authority::new(PoAConfig::new(vec![kp.public_key.clone()]));

        let block = signed_block(&kp, 10);
        assert!(authority.verify_block(&block, 10).is_ok());
    }

    #[test]
    fn test_unauthorized_miner() {
        let kp = Keypair::generate().unwrap();
        let outsider = Keypair::generate().unwrap();
        let authority = Authority::new(PoAConfig::new(vec![kp.public_key.clone()]));

        let block = signed_block(&outsider, 10);
        assert_eq!(
            authority.verify_block(&block, 0),
            Err(ConsensusError::UnauthorizedMiner(outsider.address()))
        );
    }

    #[test]
    fn test_dev_mode_still_checks_signature() {
        let kp = Keypair::generate().unwrap();
        let authority = Authority::new(PoAConfig::default());

        let mut block = signed_block(&kp, 10);
        block.signature[0] ^= 0xFF;
        assert_eq!(
            authority.verify_block(&block, 0),
            Err(ConsensusError::InvalidSignature)
        );
    }

    #[test]
    fn test_signature_by_other_key() {
        let kp = Keypair::generate().unwrap();
        let other = Keypair::generate().unwrap();
        let authority = Authority::new(PoAConfig::new(vec![kp.public_key.clone()]));

        // claims to be kp but signed by other
        let mut block = Block::new(1, Hash::ZERO, vec![], kp.public_key.clone(), 0);
        let h = block.calculate_hash();
        block.signature = other.sign(h.as_bytes()).unwrap().to_bytes().to_vec();

        assert_eq!(
            authority.verify_block(&block, 0),
            Err(ConsensusError::InvalidSignature)
        );
    }

    #[test]
    fn test_content_swapped_under_signed_hash() {
        let kp = Keypair::generate().unwrap();
        let authority = Authority::new(PoAConfig::new(vec![kp.public_key.clone()]));

        let mut block = signed_block(&kp, 10);
        block.txs = vec![Transaction::genesis(kp.public_key.clone(), 1_000_000)];
        assert!(block.verify_signature());
        assert_eq!(
            authority.verify_block(&block, 0),
            Err(ConsensusError::InvalidHash {
                expected: block.content_hash(),
                got: block.hash,
            })
        );
    }

    #[test]
    fn test_timestamp_validation() {
        let kp = Keypair::generate().unwrap();
        let authority = Authority::new(PoAConfig::default());
        let block = signed_block(&kp, 100);

        assert!(authority.verify_block_timestamp(&block, 99).is_ok());
        assert!(authority.verify_block_timestamp(&block, 100).is_ok());
        assert_eq!(
            authority.verify_block_timestamp(&block, 101),
            Err(ConsensusError::TimestampTooEarly {
                block: 100,
                parent: 101
            })
        );
    }

    #[test]
    fn test_authority_checked_before_signature() {
        let kp = Keypair::generate().unwrap();
        let outsider = Keypair::generate().unwrap();
        let authority = Authority::new(PoAConfig::new(vec![kp.public_key.clone()]));

        let mut block = signed_block(&outsider, 0);
        block.signature.clear();
        assert!(matches!(
            authority.verify_block(&block, 0),
            Err(ConsensusError::UnauthorizedMiner(_))
        ));
    }
}
