//! Persistent storage layer for poachain.
//!
//! This crate provides the storage backend for the ledger:
//! - Block storage (by hash and height) and the chain head
//! - Transactions by id
//! - Account balances
//!
//! Every key is prefixed with a chain id, so several ledgers can share one
//! database.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                    Application Layer                     │
//! │                 (Blockchain, Node, CLI)                  │
//! └────────────────────────┬────────────────────────────────┘
//!                          │
//! ┌────────────────────────▼────────────────────────────────┐
//! │                   Storage Layer                          │
//! │  ┌─────────────┐  ┌─────────────┐  ┌─────────────────┐  │
//! │  │ BalanceStore│  │ ChainStore  │  │ Storage (DB)    │  │
//! │  │  - Balances │  │  - Blocks   │  │  - sled wrapper │  │
//! │  │  - Staging  │  │  - Txs      │  │  - batches      │  │
//! │  │             │  │  - Head     │  │  - key helpers  │  │
//! │  └─────────────┘  └─────────────┘  └─────────────────┘  │
//! └────────────────────────┬────────────────────────────────┘
//!                          │
//! ┌────────────────────────▼────────────────────────────────┐
//! │                    sled Database                         │
//! │              (Embedded Key-Value Store)                  │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```rust,no_run
//! use poachain_storage::{BalanceStore, ChainStore, Storage};
//! use poachain_core::Address;
//!
//! // Open database
//! let storage = Storage::open("./poachain_data").unwrap();
//!
//! // Stage balance changes, then write them in one batch
//! let balances = BalanceStore::new(&storage, "main");
//! let alice = Address([0xAA; 32]);
//! let mut changes = balances.stage();
//! changes.credit(&alice, 1_000).unwrap();
//! storage.batch(changes.into_ops()).unwrap();
//! assert_eq!(balances.get_balance(&alice).unwrap(), 1_000);
//!
//! // Work with blocks
//! let chain = ChainStore::new(&storage, "main");
//! assert_eq!(chain.get_head().unwrap(), None);
//! ```

pub mod chain;
pub mod db;
pub mod state;

// Re-export commonly used types
pub use chain::ChainStore;
pub use db::{BatchOp, Result, Storage, StorageError};
pub use state::{BalanceChanges, BalanceStore};
