//! Proof-of-Work search over anything that carries a nonce.
//!
//! Difficulty counts leading zero *bytes* of the hash, so each step is a
//! factor of 256 in expected work.

use crate::hash::{hash, Hash};
use std::sync::atomic::{AtomicBool, Ordering};
use thiserror::Error;
use tracing::debug;

/// Difficulty above which no 32-byte hash can qualify.
pub const MAX_DIFFICULTY: u64 = 32;

/// Errors that can occur during the nonce search.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PowError {
    #[error("difficulty {0} exceeds the hash length")]
    InvalidDifficulty(u64),

    #[error("nonce space exhausted")]
    NonceExhausted,

    #[error("nonce search cancelled")]
    Cancelled,
}

/// Data that can be mined: it encodes itself and exposes a nonce to bump.
pub trait PowData {
    /// Bytes hashed at each attempt.
    fn pow_bytes(&self) -> Vec<u8>;

    /// Current nonce.
    fn nonce(&self) -> u64;

    /// Move to the next nonce.
    fn increment_nonce(&mut self);
}

/// True iff the first `difficulty` bytes of `hash` are zero.
pub fn check_pow(hash: &Hash, difficulty: u64) -> bool {
    if difficulty > MAX_DIFFICULTY {
        return false;
    }
    hash.0[..difficulty as usize].iter().all(|b| *b == 0)
}

/// Bump the nonce of `data` until its hash meets `difficulty`.
///
/// Returns the winning hash; the winning nonce is left in `data`. Runs until
/// it succeeds, so callers that need to observe the chain meanwhile should
/// use [`calculate_pow_cancellable`] from another thread.
pub fn calculate_pow<T: PowData + ?Sized>(data: &mut T, difficulty: u64) -> Result<Hash, PowError> {
    search(data, difficulty, None)
}

/// Like [`calculate_pow`], but gives up with [`PowError::Cancelled`] once
/// `cancel` is set.
pub fn calculate_pow_cancellable<T: PowData + ?Sized>(
    data: &mut T,
    difficulty: u64,
    cancel: &AtomicBool,
) -> Result<Hash, PowError> {
    search(data, difficulty, Some(cancel))
}

fn search<T: PowData + ?Sized>(
    data: &mut T,
    difficulty: u64,
    cancel: Option<&AtomicBool>,
) -> Result<Hash, PowError> {
    if difficulty > MAX_DIFFICULTY {
        return Err(PowError::InvalidDifficulty(difficulty));
    }

    let start = data.nonce();
    let mut current = hash(&data.pow_bytes());
    while !check_pow(&current, difficulty) {
        if cancel.is_some_and(|flag| flag.load(Ordering::Relaxed)) {
            return Err(PowError::Cancelled);
        }
        if data.nonce() == u64::MAX {
            return Err(PowError::NonceExhausted);
        }
        data.increment_nonce();
        current = hash(&data.pow_bytes());
    }

    debug!(
        difficulty,
        nonce = data.nonce(),
        attempts = data.nonce() - start + 1,
        "proof of work found"
    );
    Ok(current)
}
