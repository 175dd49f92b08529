//! The ledger state machine.
//!
//! A `Blockchain` owns the tip of one chain id and decides whether a block
//! may extend it. Appending a block writes the block, its transactions, the
//! balance changes and the new head in a single atomic batch.

use poachain_consensus::{Authority, BlockValidator, ConsensusError, PoAConfig};
use poachain_core::{genesis_tx_input, Address, Block, Hash, PublicKey, Transaction};
use poachain_storage::{BalanceChanges, BalanceStore, ChainStore, Storage, StorageError};
use thiserror::Error;
use tracing::{info, warn};

/// Why a block was refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RejectReason {
    #[error(transparent)]
    Consensus(#[from] ConsensusError),

    #[error("balance underflow: {address} has {available}, debit of {required}")]
    BalanceUnderflow {
        address: Address,
        required: u64,
        available: u64,
    },

    #[error("balance overflow: {address} has {balance}, credit of {amount}")]
    BalanceOverflow {
        address: Address,
        balance: u64,
        amount: u64,
    },
}

/// Errors that can occur during ledger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("block rejected: {0}")]
    BlockRejected(RejectReason),

    #[error("block not found: {0}")]
    BlockNotFound(Hash),

    #[error("transaction not found: {0}")]
    TransactionNotFound(Hash),

    #[error("block {0} is the oldest block")]
    OldestBlock(Hash),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

impl LedgerError {
    /// True when the error is about the block itself rather than local I/O.
    pub fn is_rejection(&self) -> bool {
        matches!(self, LedgerError::BlockRejected(_))
    }
}

impl From<ConsensusError> for LedgerError {
    fn from(err: ConsensusError) -> Self {
        LedgerError::BlockRejected(RejectReason::Consensus(err))
    }
}

pub type Result<T> = std::result::Result<T, LedgerError>;

/// Blockchain configuration.
#[derive(Debug, Clone)]
pub struct BlockchainConfig {
    /// Chain id; prefixes every storage key.
    pub id: String,
    /// Leading zero bytes required of every block hash.
    pub difficulty: u64,
    /// PoA consensus configuration.
    pub poa: PoAConfig,
}

impl Default for BlockchainConfig {
    fn default() -> Self {
        Self {
            id: "main".into(),
            difficulty: 1,
            poa: PoAConfig::default(),
        }
    }
}

/// One chain: its tip, its stores and its consensus rules.
pub struct Blockchain<'a> {
    /// Storage backend.
    storage: &'a Storage,
    /// Chain store for blocks and transactions.
    chain: ChainStore<'a>,
    /// Balance table.
    balances: BalanceStore<'a>,
    /// Consensus authority.
    authority: Authority,
    /// Configuration.
    config: BlockchainConfig,
    /// Tip. Height 0 with a zero hash until the first block is appended.
    last_block: Block,
}

impl<'a> Blockchain<'a> {
    /// Open the chain `config.id` in `storage`, resuming from the persisted
    /// head if there is one.
    pub fn new(storage: &'a Storage, config: BlockchainConfig) -> Result<Self> {
        let chain = ChainStore::new(storage, config.id.clone());
        let balances = BalanceStore::new(storage, config.id.clone());
        let authority = Authority::new(config.poa.clone());

        let last_block = match chain.get_head()? {
            Some(head) => chain
                .get_block(&head)?
                .ok_or_else(|| StorageError::NotFound(format!("chain head {}", head)))?,
            None => Block::default(),
        };
        if last_block.height > 0 {
            info!(id = %config.id, height = last_block.height, hash = %last_block.hash, "resumed chain");
        }

        Ok(Self {
            storage,
            chain,
            balances,
            authority,
            config,
            last_block,
        })
    }

    /// Chain id.
    pub fn id(&self) -> &str {
        &self.config.id
    }

    /// Required PoW difficulty.
    pub fn difficulty(&self) -> u64 {
        self.config.difficulty
    }

    /// Seed hash of genesis transactions.
    pub fn genesis(&self) -> Hash {
        genesis_tx_input()
    }

    /// The authority set.
    pub fn poa(&self) -> &PoAConfig {
        self.authority.config()
    }

    /// Get the configuration.
    pub fn config(&self) -> &BlockchainConfig {
        &self.config
    }

    /// Current chain height, 0 for an empty chain.
    pub fn height(&self) -> u64 {
        self.last_block.height
    }

    /// The tip.
    pub fn last_block(&self) -> &Block {
        &self.last_block
    }

    /// Check whether `block` may extend the tip.
    ///
    /// Checks run in order and stop at the first failure: authority, hash,
    /// signature, timestamp, prev hash, height, transactions. PoW is left to
    /// the caller.
    pub fn verify_block(&self, block: &Block) -> std::result::Result<(), ConsensusError> {
        let tip = &self.last_block;
        self.authority.verify_block(block, tip.timestamp)?;
        BlockValidator::validate_block_extends_parent(block, tip.hash, tip.height)?;
        BlockValidator::validate_block_transactions(block)?;
        Ok(())
    }

    pub fn is_valid_block(&self, block: &Block) -> bool {
        self.verify_block(block).is_ok()
    }

    /// Verify `block`, apply its transactions and make it the new tip.
    ///
    /// Nothing is written unless every check passes and every balance
    /// change is applicable.
    pub fn add_block(&mut self, block: &Block) -> Result<()> {
        if let Err(reason) = self.verify_block(block) {
            warn!(height = block.height, hash = %block.hash, %reason, "block rejected");
            return Err(reason.into());
        }

        let mut changes = self.balances.stage();
        for (index, tx) in block.txs.iter().enumerate() {
            let mint = index == 0 && tx.is_genesis();
            if let Err(err) = apply_transaction(&mut changes, tx, mint) {
                let err = staging_error(err);
                if let LedgerError::BlockRejected(reason) = &err {
                    warn!(height = block.height, hash = %block.hash, %reason, "block rejected");
                }
                return Err(err);
            }
        }

        for (address, balance) in changes.changes() {
            info!(%address, balance, "balance updated");
        }
        let mut ops = self.chain.append_ops(block)?;
        ops.extend(changes.into_ops());
        self.storage.batch(ops)?;

        self.last_block = block.clone();
        info!(
            id = %self.config.id,
            height = block.height,
            hash = %block.hash,
            txs = block.txs.len(),
            "block appended"
        );
        Ok(())
    }

    /// Get a block by hash.
    pub fn get_block(&self, hash: &Hash) -> Result<Block> {
        self.chain
            .get_block(hash)?
            .ok_or(LedgerError::BlockNotFound(*hash))
    }

    /// Get a block by height, `None` above the tip.
    pub fn get_block_by_height(&self, height: u64) -> Result<Option<Block>> {
        Ok(self.chain.get_block_by_height(height)?)
    }

    /// Get the predecessor of the block `hash`.
    pub fn get_prev_block(&self, hash: &Hash) -> Result<Block> {
        let block = self.get_block(hash)?;
        if block.prev_hash.is_zero() {
            return Err(LedgerError::OldestBlock(*hash));
        }
        self.get_block(&block.prev_hash)
    }

    /// Get a transaction by id.
    pub fn get_transaction(&self, tx_id: &Hash) -> Result<Transaction> {
        self.chain
            .get_transaction(tx_id)?
            .ok_or(LedgerError::TransactionNotFound(*tx_id))
    }

    /// Check if a block exists by hash.
    pub fn has_block(&self, hash: &Hash) -> Result<bool> {
        Ok(self.chain.has_block(hash)?)
    }

    /// Balance of the holder of `public_key`.
    pub fn get_balance(&self, public_key: &PublicKey) -> Result<u64> {
        self.get_address_balance(&public_key.to_address())
    }

    /// Balance of `address`, 0 if it was never credited.
    pub fn get_address_balance(&self, address: &Address) -> Result<u64> {
        Ok(self.balances.get_balance(address)?)
    }

    /// Walk from the tip back to the first block.
    pub fn iter_back(&self) -> BlockIter<'_, 'a> {
        let cursor = (self.last_block.height > 0).then_some(self.last_block.hash);
        BlockIter {
            blockchain: self,
            cursor,
        }
    }
}

/// Debit `from` once per input, then credit `to` once per output. A mint
/// skips the debits.
fn apply_transaction(
    changes: &mut BalanceChanges<'_, '_>,
    tx: &Transaction,
    mint: bool,
) -> std::result::Result<(), StorageError> {
    if !mint {
        let from = tx.from.to_address();
        for input in &tx.inputs {
            changes.debit(&from, input.value)?;
        }
    }
    let to = tx.to.to_address();
    for output in &tx.outputs {
        changes.credit(&to, output.value)?;
    }
    Ok(())
}

fn staging_error(err: StorageError) -> LedgerError {
    match err {
        StorageError::InsufficientBalance {
            address,
            required,
            available,
        } => LedgerError::BlockRejected(RejectReason::BalanceUnderflow {
            address,
            required,
            available,
        }),
        StorageError::BalanceOverflow {
            address,
            balance,
            amount,
        } => LedgerError::BlockRejected(RejectReason::BalanceOverflow {
            address,
            balance,
            amount,
        }),
        other => LedgerError::Storage(other),
    }
}

/// Iterator from the tip towards the first block.
pub struct BlockIter<'c, 'a> {
    blockchain: &'c Blockchain<'a>,
    cursor: Option<Hash>,
}

impl Iterator for BlockIter<'_, '_> {
    type Item = Result<Block>;

    fn next(&mut self) -> Option<Self::Item> {
        let hash = self.cursor.take()?;
        match self.blockchain.get_block(&hash) {
            Ok(block) => {
                if !block.prev_hash.is_zero() {
                    self.cursor = Some(block.prev_hash);
                }
                Some(Ok(block))
            }
            Err(err) => Some(Err(err)),
        }
    }
}
