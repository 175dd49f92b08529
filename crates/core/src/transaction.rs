//! Transaction types and the value-conservation check.

use crate::codec::{self, CodecError};
use crate::crypto::PublicKey;
use crate::hash::{genesis_tx_input, hash, Hash};
use serde::{Deserialize, Serialize};

/// Reference to an output of an earlier transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Input {
    /// Id of the transaction that created the output.
    pub source_tx_id: Hash,
    /// Position of the output inside that transaction.
    pub output_index: u32,
    /// Value carried by the referenced output.
    pub value: u64,
}

impl Input {
    pub fn new(source_tx_id: Hash, output_index: u32, value: u64) -> Self {
        Self {
            source_tx_id,
            output_index,
            value,
        }
    }
}

/// A value payable to the transaction's `to` key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Output {
    pub value: u64,
}

impl Output {
    pub fn new(value: u64) -> Self {
        Self { value }
    }
}

/// A transaction moving value from `from` to `to`.
///
/// There is one recipient per transaction; every output pays `to`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Hash of the canonical encoding with this field zeroed.
    pub tx_id: Hash,
    /// Sender's public key.
    pub from: PublicKey,
    /// Recipient's public key.
    pub to: PublicKey,
    pub inputs: Vec<Input>,
    pub outputs: Vec<Output>,
    /// Sender signature. Carried but not checked by the ledger.
    #[serde(with = "hex")]
    pub signature: Vec<u8>,
}

impl Transaction {
    /// Build a transaction and freeze its id.
    pub fn new(from: PublicKey, to: PublicKey, inputs: Vec<Input>, outputs: Vec<Output>) -> Self {
        let mut tx = Self {
            tx_id: Hash::ZERO,
            from,
            to,
            inputs,
            outputs,
            signature: Vec::new(),
        };
        tx.tx_id = tx.compute_tx_id();
        tx
    }

    /// The bootstrap transaction: mints `amount` to `to` out of the
    /// sentinel input. Its id is the sentinel itself.
    pub fn genesis(to: PublicKey, amount: u64) -> Self {
        Self {
            tx_id: genesis_tx_input(),
            from: PublicKey::default(),
            to,
            inputs: vec![Input::new(genesis_tx_input(), 0, amount)],
            outputs: vec![Output::new(amount)],
            signature: Vec::new(),
        }
    }

    /// True when this has the shape of a genesis mint: the sentinel id, no
    /// sender, a single sentinel input and a single output.
    pub fn is_genesis(&self) -> bool {
        let sentinel = genesis_tx_input();
        self.tx_id == sentinel
            && self.from.is_empty()
            && self.outputs.len() == 1
            && matches!(self.inputs.as_slice(), [input] if input.source_tx_id == sentinel)
    }

    /// True when `tx_id` matches the content. A genesis transaction's id is
    /// the sentinel instead.
    pub fn has_valid_id(&self) -> bool {
        if self.is_genesis() {
            return true;
        }
        self.tx_id == self.compute_tx_id()
    }

    /// Hash of the canonical encoding with `tx_id` cleared.
    pub fn compute_tx_id(&self) -> Hash {
        let scratch = Self {
            tx_id: Hash::ZERO,
            ..self.clone()
        };
        hash(&scratch.to_bytes())
    }

    /// Sum of input values, `None` on overflow.
    pub fn total_input(&self) -> Option<u64> {
        self.inputs
            .iter()
            .try_fold(0u64, |acc, input| acc.checked_add(input.value))
    }

    /// Sum of output values, `None` on overflow.
    pub fn total_output(&self) -> Option<u64> {
        self.outputs
            .iter()
            .try_fold(0u64, |acc, output| acc.checked_add(output.value))
    }

    /// Canonical encoding.
    pub fn to_bytes(&self) -> Vec<u8> {
        codec::encode(self)
    }

    /// Decode the canonical encoding.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CodecError> {
        codec::decode(bytes)
    }
}

/// Balance conservation: inputs sum exactly to outputs and no input is
/// worth zero.
///
/// This says nothing about who authorized the transfer; the signature is
/// not verified here.
pub fn check_tx(tx: &Transaction) -> bool {
    if tx.inputs.iter().any(|input| input.value == 0) {
        return false;
    }
    match (tx.total_input(), tx.total_output()) {
        (Some(total_in), Some(total_out)) => total_in == total_out,
        _ => false,
    }
}
