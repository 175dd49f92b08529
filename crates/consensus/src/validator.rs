//! Transaction and block validation rules.
//!
//! This module checks how a block links to its parent and whether its
//! transactions conserve value.

use crate::poa::{ConsensusError, Result};
use poachain_core::{check_tx, Block, Hash};

/// Block validator.
pub struct BlockValidator;

impl BlockValidator {
    /// Validate block extends the parent correctly: `prev_hash` first, then
    /// height.
    pub fn validate_block_extends_parent(
        block: &Block,
        parent_hash: Hash,
        parent_height: u64,
    ) -> Result<()> {
        if block.prev_hash != parent_hash {
            return Err(ConsensusError::InvalidPrevHash {
                expected: parent_hash,
                got: block.prev_hash,
            });
        }

        let expected = parent_height + 1;
        if block.height != expected {
            return Err(ConsensusError::InvalidHeight {
                expected,
                got: block.height,
            });
        }

        Ok(())
    }

    /// Check every transaction carries the id of its content and conserves
    /// value. A genesis transaction in first position mints and is exempt.
    ///
    /// Note: transaction signatures are not verified, and nothing stops an
    /// input from being spent twice.
    pub fn validate_block_transactions(block: &Block) -> Result<()> {
        let skip = usize::from(block.is_genesis());
        for (index, tx) in block.txs.iter().enumerate().skip(skip) {
            if tx.tx_id != tx.compute_tx_id() {
                return Err(ConsensusError::InvalidTxId {
                    index,
                    tx_id: tx.tx_id,
                });
            }
            if !check_tx(tx) {
                return Err(ConsensusError::InvalidTransaction {
                    index,
                    tx_id: tx.tx_id,
                });
            }
        }
        Ok(())
    }
}
