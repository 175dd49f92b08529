//! Proof of Authority consensus rules for poachain.
//!
//! This crate provides:
//! - The authority set and block signature checks
//! - Block linkage rules (prev hash, height, timestamp)
//! - Transaction value-conservation checks
//!
//! # Example
//!
//! ```rust,no_run
//! use poachain_consensus::{Authority, BlockValidator, PoAConfig};
//! use poachain_core::{Block, Hash, Keypair};
//!
//! let keypair = Keypair::generate().unwrap();
//! let authority = Authority::new(PoAConfig::new(vec![keypair.public_key.clone()]));
//!
//! let mut block = Block::new(1, Hash::ZERO, vec![], keypair.public_key.clone(), 0);
//! let hash = block.calculate_hash();
//! block.signature = keypair.sign(hash.as_bytes()).unwrap().to_bytes().to_vec();
//!
//! authority.verify_block(&block, 0).unwrap();
//! BlockValidator::validate_block_extends_parent(&block, Hash::ZERO, 0).unwrap();
//! ```

pub mod poa;
pub mod validator;

// Re-export commonly used types
pub use poa::{Authority, ConsensusError, PoAConfig};
pub use validator::BlockValidator;
