//! Account balances.
//!
//! Balances are stored as 8-byte little-endian integers under
//! `{id}:balance:{address}`. An address that was never credited reads as 0.

use crate::db::{BatchOp, Result, Storage, StorageError};
use poachain_core::Address;
use std::collections::BTreeMap;

/// Read/write access to the balance table of one chain id.
pub struct BalanceStore<'a> {
    storage: &'a Storage,
    id: String,
}

impl<'a> BalanceStore<'a> {
    /// Create a new BalanceStore for chain `id` wrapping the given storage.
    pub fn new(storage: &'a Storage, id: impl Into<String>) -> Self {
        Self {
            storage,
            id: id.into(),
        }
    }

    /// Get the balance of `address`, 0 if it was never credited.
    pub fn get_balance(&self, address: &Address) -> Result<u64> {
        match self.storage.get_raw(Storage::balance_key(&self.id, address))? {
            Some(bytes) => decode_balance(&bytes),
            None => Ok(0),
        }
    }

    /// Operation writing `balance` for `address`.
    pub fn balance_op(&self, address: &Address, balance: u64) -> BatchOp {
        BatchOp::insert(
            Storage::balance_key(&self.id, address),
            balance.to_le_bytes().to_vec(),
        )
    }

    /// Start staging balance changes on top of the stored values.
    pub fn stage(&self) -> BalanceChanges<'_, 'a> {
        BalanceChanges {
            store: self,
            staged: BTreeMap::new(),
        }
    }
}

fn decode_balance(bytes: &[u8]) -> Result<u64> {
    let arr: [u8; 8] = bytes
        .try_into()
        .map_err(|_| StorageError::InvalidBalance(bytes.len()))?;
    Ok(u64::from_le_bytes(arr))
}

/// Balance changes held in memory until they are turned into batch
/// operations. Dropping it discards every change.
pub struct BalanceChanges<'s, 'a> {
    store: &'s BalanceStore<'a>,
    staged: BTreeMap<Address, u64>,
}

impl BalanceChanges<'_, '_> {
    /// Current balance including staged changes.
    pub fn balance(&self, address: &Address) -> Result<u64> {
        match self.staged.get(address) {
            Some(balance) => Ok(*balance),
            None => self.store.get_balance(address),
        }
    }

    /// Add `amount` to `address`.
    pub fn credit(&mut self, address: &Address, amount: u64) -> Result<u64> {
        let balance = self.balance(address)?;
        let updated = balance
            .checked_add(amount)
            .ok_or(StorageError::BalanceOverflow {
                address: *address,
                balance,
                amount,
            })?;
        self.staged.insert(*address, updated);
        Ok(updated)
    }

    /// Subtract `amount` from `address`.
    /// Returns error if insufficient balance.
    pub fn debit(&mut self, address: &Address, amount: u64) -> Result<u64> {
        let balance = self.balance(address)?;
        if balance < amount {
            return Err(StorageError::InsufficientBalance {
                address: *address,
                required: amount,
                available: balance,
            });
        }
        let updated = balance - amount;
        self.staged.insert(*address, updated);
        Ok(updated)
    }

    /// Addresses touched so far, with their staged balances.
    pub fn changes(&self) -> impl Iterator<Item = (&Address, &u64)> {
        self.staged.iter()
    }

    /// Batch operations writing every staged balance.
    pub fn into_ops(self) -> Vec<BatchOp> {
        self.staged
            .iter()
            .map(|(address, balance)| self.store.balance_op(address, *balance))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> Storage {
        Storage::open_temporary().unwrap()
    }

    fn seed(storage: &Storage, balances: &BalanceStore, address: &Address, balance: u64) {
        storage
            .batch(vec![balances.balance_op(address, balance)])
            .unwrap();
    }

    #[test]
    fn test_missing_balance_is_zero() {
        let storage = setup();
        let balances = BalanceStore::new(&storage, "test");
        assert_eq!(balances.get_balance(&Address([0xAA; 32])).unwrap(), 0);
    }

    #[test]
    fn test_balance_op_writes_le_bytes() {
        let storage = setup();
        let balances = BalanceStore::new(&storage, "test");
        let address = Address([0xBB; 32]);

        seed(&storage, &balances, &address, 1000);
        assert_eq!(balances.get_balance(&address).unwrap(), 1000);

        let raw = storage
            .get_raw(Storage::balance_key("test", &address))
            .unwrap()
            .unwrap();
        assert_eq!(raw, 1000u64.to_le_bytes());
    }

    #[test]
    fn test_corrupt_balance() {
        let storage = setup();
        let balances = BalanceStore::new(&storage, "test");
        let address = Address([0xCC; 32]);

        storage
            .put_raw(Storage::balance_key("test", &address), &[1, 2, 3])
            .unwrap();
        assert!(matches!(
            balances.get_balance(&address),
            Err(StorageError::InvalidBalance(3))
        ));
    }

    #[test]
    fn test_staged_changes_are_invisible_until_applied() {
        let storage = setup();
        let balances = BalanceStore::new(&storage, "test");
        let alice = Address([0xAA; 32]);
        let bob = Address([0xBB; 32]);
        seed(&storage, &balances, &alice, 100);

        let mut changes = balances.stage();
        changes.debit(&alice, 30).unwrap();
        changes.credit(&bob, 30).unwrap();
        assert_eq!(changes.balance(&alice).unwrap(), 70);
        assert_eq!(balances.get_balance(&alice).unwrap(), 100);
        assert_eq!(balances.get_balance(&bob).unwrap(), 0);

        storage.batch(changes.into_ops()).unwrap();
        assert_eq!(balances.get_balance(&alice).unwrap(), 70);
        assert_eq!(balances.get_balance(&bob).unwrap(), 30);
    }

    #[test]
    fn test_debit_underflow() {
        let storage = setup();
        let balances = BalanceStore::new(&storage, "test");
        let alice = Address([0xAA; 32]);

        let mut changes = balances.stage();
        changes.credit(&alice, 10).unwrap();
        let result = changes.debit(&alice, 11);
        assert!(matches!(
            result,
            Err(StorageError::InsufficientBalance {
                required: 11,
                available: 10,
                ..
            })
        ));
        assert_eq!(changes.balance(&alice).unwrap(), 10);
    }

    #[test]
    fn test_credit_overflow() {
        let storage = setup();
        let balances = BalanceStore::new(&storage, "test");
        let alice = Address([0xAA; 32]);
        seed(&storage, &balances, &alice, u64::MAX);

        let mut changes = balances.stage();
        assert!(matches!(
            changes.credit(&alice, 1),
            Err(StorageError::BalanceOverflow { .. })
        ));
    }

    #[test]
    fn test_chain_ids_are_isolated() {
        let storage = setup();
        let main = BalanceStore::new(&storage, "main");
        let side = BalanceStore::new(&storage, "side");
        let address = Address([0xDD; 32]);

        seed(&storage, &main, &address, 5);
        assert_eq!(side.get_balance(&address).unwrap(), 0);
    }
}
