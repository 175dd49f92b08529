//! Pool of transactions waiting for a block.
//!
//! Transactions are kept in arrival order. The pool neither deduplicates
//! nor validates; a transaction leaves it when a block containing it is
//! appended.

use poachain_core::{Hash, Transaction};
use std::collections::HashSet;

/// FIFO pool of pending transactions.
#[derive(Debug, Clone, Default)]
pub struct PendingPool {
    transactions: Vec<Transaction>,
}

impl PendingPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a transaction.
    pub fn add(&mut self, tx: Transaction) {
        self.transactions.push(tx);
    }

    /// Pending transactions in arrival order.
    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    /// Copy of the pending transactions, for building a block.
    pub fn snapshot(&self) -> Vec<Transaction> {
        self.transactions.clone()
    }

    /// Drop every pending transaction whose id appears in `included`.
    /// Returns how many were removed.
    pub fn remove_included(&mut self, included: &[Transaction]) -> usize {
        let ids: HashSet<Hash> = included.iter().map(|tx| tx.tx_id).collect();
        let before = self.transactions.len();
        self.transactions.retain(|tx| !ids.contains(&tx.tx_id));
        before - self.transactions.len()
    }

    /// Remove all transactions.
    pub fn clear(&mut self) {
        self.transactions.clear();
    }
}
