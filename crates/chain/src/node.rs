//! A ledger participant: a signing key, a chain and a pending pool.

use crate::blockchain::{Blockchain, LedgerError};
use crate::mempool::PendingPool;
use poachain_core::{
    check_block_pow, Address, Block, CodecError, CryptoError, Hash, Keypair, PowError,
    PublicKey, Signature, Signer, Transaction,
};
use thiserror::Error;
use tracing::{debug, warn};

/// Errors that can occur while producing or receiving blocks.
#[derive(Debug, Error)]
pub enum NodeError {
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error("proof of work failed: {0}")]
    Pow(#[from] PowError),

    #[error("signing failed: {0}")]
    Crypto(#[from] CryptoError),

    #[error("block {hash} does not meet difficulty {difficulty}")]
    InsufficientWork { hash: Hash, difficulty: u64 },

    #[error("malformed block: {0}")]
    Codec(#[from] CodecError),
}

impl NodeError {
    /// True when the error is about the block itself rather than local I/O.
    pub fn is_rejection(&self) -> bool {
        match self {
            NodeError::Ledger(err) => err.is_rejection(),
            NodeError::InsufficientWork { .. } | NodeError::Codec(_) => true,
            NodeError::Pow(_) | NodeError::Crypto(_) => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, NodeError>;

/// A node producing and receiving blocks for one chain.
pub struct Node<'a, S: Signer = Keypair> {
    signer: S,
    address: Address,
    blockchain: Blockchain<'a>,
    pending: PendingPool,
}

impl<'a, S: Signer> Node<'a, S> {
    pub fn new(signer: S, blockchain: Blockchain<'a>) -> Self {
        let address = signer.public_key().to_address();
        Self {
            signer,
            address,
            blockchain,
            pending: PendingPool::new(),
        }
    }

    /// Address of the node key.
    pub fn address(&self) -> Address {
        self.address
    }

    pub fn public_key(&self) -> PublicKey {
        self.signer.public_key()
    }

    pub fn blockchain(&self) -> &Blockchain<'a> {
        &self.blockchain
    }

    pub fn blockchain_mut(&mut self) -> &mut Blockchain<'a> {
        &mut self.blockchain
    }

    /// Sign `hash(message)` with the node key.
    pub fn sign(&self, message: &[u8]) -> Result<Signature> {
        Ok(self.signer.sign(message)?)
    }

    /// Recompute the block hash, then sign it.
    pub fn sign_block(&self, block: &mut Block) -> Result<()> {
        let hash = block.calculate_hash();
        let signature = self.signer.sign(hash.as_bytes())?;
        block.signature = signature.to_bytes().to_vec();
        Ok(())
    }

    /// Queue a transaction for the next block.
    pub fn add_to_pending_txs(&mut self, tx: Transaction) {
        self.pending.add(tx);
    }

    pub fn pending_txs(&self) -> &[Transaction] {
        self.pending.transactions()
    }

    pub fn clear_pending(&mut self) {
        self.pending.clear();
    }

    /// Build a signed block on top of the tip. No proof of work is done.
    pub fn new_block(&self, txs: Vec<Transaction>) -> Result<Block> {
        let tip = self.blockchain.last_block();
        let timestamp = Block::current_timestamp().max(tip.timestamp);
        let mut block = Block::new(
            tip.height + 1,
            tip.hash,
            txs,
            self.signer.public_key(),
            timestamp,
        );
        self.sign_block(&mut block)?;
        Ok(block)
    }

    /// Build, mine and sign a block holding every pending transaction. The
    /// pool is left as is.
    pub fn block_from_pending_txs(&self) -> Result<Block> {
        let block = self.new_block(self.pending.snapshot())?;
        self.seal(block)
    }

    /// Build, mine and sign the block minting `amount` to `to`.
    pub fn create_genesis(&self, to: PublicKey, amount: u64) -> Result<Block> {
        let block = self.new_block(vec![Transaction::genesis(to, amount)])?;
        self.seal(block)
    }

    fn seal(&self, mut block: Block) -> Result<Block> {
        block.prev_hash = self.blockchain.last_block().hash;
        block.calculate_pow(self.blockchain.difficulty())?;
        self.sign_block(&mut block)?;
        debug!(height = block.height, nonce = block.nonce, hash = %block.hash, "sealed block");
        Ok(block)
    }

    /// Accept a block from anywhere: check its work, append it and drop
    /// its transactions from the pending pool.
    pub fn process_block(&mut self, block: &Block) -> Result<()> {
        let difficulty = self.blockchain.difficulty();
        if !check_block_pow(block, difficulty) {
            warn!(height = block.height, hash = %block.hash, difficulty, "insufficient work");
            return Err(NodeError::InsufficientWork {
                hash: block.hash,
                difficulty,
            });
        }
        self.blockchain.add_block(block)?;
        let removed = self.pending.remove_included(&block.txs);
        if removed > 0 {
            debug!(removed, "pending transactions included");
        }
        Ok(())
    }

    /// Decode canonical block bytes and process the block.
    pub fn process_block_bytes(&mut self, bytes: &[u8]) -> Result<Block> {
        let block = Block::from_bytes(bytes)?;
        self.process_block(&block)?;
        Ok(block)
    }

    /// Mine the pending transactions into a block and append it.
    pub fn propose(&mut self) -> Result<Block> {
        let block = self.block_from_pending_txs()?;
        self.process_block(&block)?;
        Ok(block)
    }
}
