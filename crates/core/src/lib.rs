//! Core ledger primitives for poachain.
//!
//! This crate provides the fundamental types used throughout the node:
//! - Hashing and P-256 signing primitives
//! - Transactions with value-conservation checks
//! - Blocks and their canonical encoding
//! - The proof-of-work search

pub mod block;
pub mod codec;
pub mod crypto;
pub mod hash;
pub mod pow;
pub mod transaction;

// Re-export commonly used types at the crate root
pub use block::{check_block_pow, Block};
pub use codec::CodecError;
pub use crypto::{
    sign, verify_signature, Address, CryptoError, Keypair, PublicKey, Signature, Signer,
};
pub use hash::{genesis_tx_input, hash, Hash};
pub use pow::{calculate_pow, calculate_pow_cancellable, check_pow, PowData, PowError};
pub use transaction::{check_tx, Input, Output, Transaction};
