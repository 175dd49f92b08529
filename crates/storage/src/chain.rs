//! Block and transaction storage plus chain head tracking.

use crate::db::{BatchOp, Result, Storage};
use poachain_core::{Block, Hash, Transaction};

/// Manages block storage and the chain head for one chain id.
///
/// Blocks and transactions are stored in their canonical encoding, so the
/// bytes on disk are the bytes that were hashed.
pub struct ChainStore<'a> {
    storage: &'a Storage,
    id: String,
}

impl<'a> ChainStore<'a> {
    /// Create a new ChainStore for chain `id` wrapping the given storage.
    pub fn new(storage: &'a Storage, id: impl Into<String>) -> Self {
        Self {
            storage,
            id: id.into(),
        }
    }

    /// Chain id used as the key prefix.
    pub fn id(&self) -> &str {
        &self.id
    }

    // =========================================================================
    // Block Storage
    // =========================================================================

    /// Operations that persist a block, its transactions, the height index
    /// and the new head. Nothing is written until the caller applies them.
    ///
    /// - Primary: `{id}:block:{hash}` → canonical block bytes
    /// - Secondary: `{id}:height:{height}` → hash
    /// - `{id}:tx:{tx_id}` → canonical transaction bytes, one per tx
    /// - `{id}:chain:head` → hash
    pub fn append_ops(&self, block: &Block) -> Result<Vec<BatchOp>> {
        let mut ops = Vec::with_capacity(block.txs.len() + 3);
        ops.push(BatchOp::insert(
            Storage::block_key(&self.id, &block.hash),
            block.to_bytes(),
        ));
        for tx in &block.txs {
            ops.push(BatchOp::insert(
                Storage::tx_key(&self.id, &tx.tx_id),
                tx.to_bytes(),
            ));
        }
        ops.push(BatchOp::put(
            Storage::block_height_key(&self.id, block.height),
            &block.hash,
        )?);
        ops.push(BatchOp::put(Storage::head_key(&self.id), &block.hash)?);
        Ok(ops)
    }

    /// Get a block by its hash.
    pub fn get_block(&self, hash: &Hash) -> Result<Option<Block>> {
        match self.storage.get_raw(Storage::block_key(&self.id, hash))? {
            Some(bytes) => Ok(Some(Block::from_bytes(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Get a block by its height.
    ///
    /// This performs two lookups:
    /// 1. height → hash (secondary index)
    /// 2. hash → block (primary storage)
    pub fn get_block_by_height(&self, height: u64) -> Result<Option<Block>> {
        let height_key = Storage::block_height_key(&self.id, height);
        let hash: Option<Hash> = self.storage.get(&height_key)?;

        match hash {
            Some(h) => self.get_block(&h),
            None => Ok(None),
        }
    }

    /// Check if a block exists by hash.
    pub fn has_block(&self, hash: &Hash) -> Result<bool> {
        self.storage.contains(Storage::block_key(&self.id, hash))
    }

    // =========================================================================
    // Transactions
    // =========================================================================

    /// Get a transaction by id.
    pub fn get_transaction(&self, tx_id: &Hash) -> Result<Option<Transaction>> {
        match self.storage.get_raw(Storage::tx_key(&self.id, tx_id))? {
            Some(bytes) => Ok(Some(Transaction::from_bytes(&bytes)?)),
            None => Ok(None),
        }
    }

    // =========================================================================
    // Chain Head Tracking
    // =========================================================================

    /// Get the current chain head hash.
    pub fn get_head(&self) -> Result<Option<Hash>> {
        self.storage.get(Storage::head_key(&self.id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use poachain_core::{Keypair, Output, Transaction};

    fn setup() -> Storage {
        Storage::open_temporary().unwrap()
    }

    fn append(storage: &Storage, chain: &ChainStore, block: &Block) {
        storage.batch(chain.append_ops(block).unwrap()).unwrap();
    }

    fn block(height: u64, prev_hash: Hash, kp: &Keypair) -> Block {
        let tx = Transaction::new(
            kp.public_key.clone(),
            kp.public_key.clone(),
            vec![],
            vec![Output::new(height)],
        );
        let mut b = Block::new(height, prev_hash, vec![tx], kp.public_key.clone(), height);
        b.calculate_hash();
        b
    }

    #[test]
    fn test_empty_chain() {
        let storage = setup();
        let chain = ChainStore::new(&storage, "test");

        assert_eq!(chain.get_head().unwrap(), None);
        assert!(chain.get_block_by_height(1).unwrap().is_none());
    }

    #[test]
    fn test_append_and_lookup() {
        let storage = setup();
        let chain = ChainStore::new(&storage, "test");
        let kp = Keypair::generate().unwrap();

        let b1 = block(1, Hash::ZERO, &kp);
        append(&storage, &chain, &b1);

        assert_eq!(chain.get_head().unwrap(), Some(b1.hash));
        assert!(chain.has_block(&b1.hash).unwrap());
        assert_eq!(chain.get_block(&b1.hash).unwrap(), Some(b1.clone()));
        assert_eq!(chain.get_block_by_height(1).unwrap(), Some(b1.clone()));
        assert!(chain.get_block_by_height(2).unwrap().is_none());
    }

    #[test]
    fn test_transactions_are_indexed() {
        let storage = setup();
        let chain = ChainStore::new(&storage, "test");
        let kp = Keypair::generate().unwrap();

        let b1 = block(1, Hash::ZERO, &kp);
        append(&storage, &chain, &b1);

        let tx = &b1.txs[0];
        assert_eq!(chain.get_transaction(&tx.tx_id).unwrap(), Some(tx.clone()));
        assert!(chain.get_transaction(&Hash([9; 32])).unwrap().is_none());
    }

    #[test]
    fn test_stored_bytes_are_canonical() {
        let storage = setup();
        let chain = ChainStore::new(&storage, "test");
        let kp = Keypair::generate().unwrap();

        let b1 = block(1, Hash::ZERO, &kp);
        append(&storage, &chain, &b1);

        let raw = storage
            .get_raw(Storage::block_key("test", &b1.hash))
            .unwrap()
            .unwrap();
        assert_eq!(raw, b1.to_bytes());
    }

    #[test]
    fn test_chain_ids_are_isolated() {
        let storage = setup();
        let main = ChainStore::new(&storage, "main");
        let side = ChainStore::new(&storage, "side");
        let kp = Keypair::generate().unwrap();

        let b1 = block(1, Hash::ZERO, &kp);
        append(&storage, &main, &b1);

        assert!(main.has_block(&b1.hash).unwrap());
        assert!(!side.has_block(&b1.hash).unwrap());
        assert_eq!(side.get_head().unwrap(), None);
    }

    #[test]
    fn test_height_index_follows_appends() {
        let storage = setup();
        let chain = ChainStore::new(&storage, "test");
        let kp = Keypair::generate().unwrap();

        let b1 = block(1, Hash::ZERO, &kp);
        append(&storage, &chain, &b1);
        let b2 = block(2, b1.hash, &kp);
        append(&storage, &chain, &b2);

        assert_eq!(chain.get_block_by_height(1).unwrap(), Some(b1));
        assert_eq!(chain.get_block_by_height(2).unwrap(), Some(b2.clone()));
        assert_eq!(chain.get_head().unwrap(), Some(b2.hash));
    }

    #[test]
    fn test_append_ops_are_not_applied() {
        let storage = setup();
        let chain = ChainStore::new(&storage, "test");
        let kp = Keypair::generate().unwrap();

        let b1 = block(1, Hash::ZERO, &kp);
        let ops = chain.append_ops(&b1).unwrap();
        assert_eq!(ops.len(), b1.txs.len() + 3);
        assert!(!chain.has_block(&b1.hash).unwrap());
    }
}
