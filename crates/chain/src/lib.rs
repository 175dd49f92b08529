//! Ledger state machine and node orchestration for poachain.
//!
//! This crate brings the other crates together:
//! - **Blockchain**: verifies blocks and applies them to the balance ledger
//! - **PendingPool**: transactions waiting for a block
//! - **Node**: builds, mines, signs and receives blocks
//!
//! # Example
//!
//! ```rust,no_run
//! use poachain_chain::{Blockchain, BlockchainConfig, Node};
//! use poachain_consensus::PoAConfig;
//! use poachain_core::Keypair;
//! use poachain_storage::Storage;
//!
//! // Setup storage
//! let storage = Storage::open("./poachain_data").unwrap();
//!
//! // Configure the chain with a single authority
//! let keypair = Keypair::generate().unwrap();
//! let config = BlockchainConfig {
//!     id: "main".into(),
//!     difficulty: 1,
//!     poa: PoAConfig::new(vec![keypair.public_key.clone()]),
//! };
//! let blockchain = Blockchain::new(&storage, config).unwrap();
//!
//! // Mint the initial supply and append it
//! let mut node = Node::new(keypair.clone(), blockchain);
//! let genesis = node.create_genesis(keypair.public_key.clone(), 100).unwrap();
//! node.process_block(&genesis).unwrap();
//! ```

pub mod blockchain;
pub mod mempool;
pub mod node;

// Re-export commonly used types
pub use blockchain::{BlockIter, Blockchain, BlockchainConfig, LedgerError, RejectReason};
pub use mempool::PendingPool;
pub use node::{Node, NodeError};
