//! This file implements the bitmap directory that records, for every row
//! of the source table, where that row stands in the split migration.
//!
//! Each row is identified by a dense non-negative eid and owns two bits,
//! packed pairwise into 64-bit words: a lock bit, set by the worker that
//! claims the row, and a migrated bit, set once the row has been copied
//! into both projection tables. A word therefore covers 32 consecutive
//! eids. All words are preallocated when the directory is created and are
//! zero until the campaign touches them.
//!
//! The bit-address arithmetic lives here and nowhere else. Readers on the
//! fast path load a word without holding any lock and may observe a stale
//! value; every transition re-reads the word under the eid's partition
//! lock before acting on it.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::errors::{MigrateErr, MigrateResult};

/// Dense row identifier derived from the composite business key.
pub type Eid = u32;

/// Number of eids covered by one bitmap word, two bits apiece.
pub const EIDS_PER_WORD: u32 = 32;

/// Index of the word holding the bits for eid `e`.
pub const fn wordid(e: Eid) -> usize {
    (e / EIDS_PER_WORD) as usize
}

/// Position of the lock bit for eid `e` within its word.
pub const fn lockbit(e: Eid) -> u32 {
    2 * (e % EIDS_PER_WORD)
}

/// Position of the migrated bit for eid `e` within its word.
pub const fn migratebit(e: Eid) -> u32 {
    2 * (e % EIDS_PER_WORD) + 1
}

/// Test the k-th bit of a bitmap word.
pub const fn getbit(word: u64, k: u32) -> bool {
    (word >> k) & 1 != 0
}

/// The bitmap directory. Size is fixed at creation; the words perform no
/// allocation afterwards.
pub struct Bitmap {
    words: Vec<AtomicU64>,
    capacity: u32,
}

impl Bitmap {
    /// Create a directory covering eids `0..capacity`, all bits clear.
    /// Surfaces an allocation failure as `NoMem`.
    pub fn new(capacity: u32) -> MigrateResult<Bitmap> {
        if capacity == 0 {
            return Err(MigrateErr::Range);
        }
        let nwords = wordid(capacity - 1) + 1;
        let mut words = Vec::new();
        words
            .try_reserve_exact(nwords)
            .map_err(|_| MigrateErr::NoMem)?;
        words.resize_with(nwords, || AtomicU64::new(0));
        Ok(Bitmap { words, capacity })
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    /// Load the word covering `e`. Callers not holding `e`'s partition lock
    /// may observe a stale value.
    pub fn word(&self, e: Eid) -> u64 {
        assert!(e < self.capacity, "eid {} out of range", e);
        self.words[wordid(e)].load(Ordering::Acquire)
    }

    /// Set the k-th bit of the word covering `e`. Callers must hold `e`'s
    /// partition lock.
    pub fn set(&self, e: Eid, k: u32) {
        assert!(e < self.capacity, "eid {} out of range", e);
        self.words[wordid(e)].fetch_or(1u64 << k, Ordering::Release);
    }

    /// Current `(lock, migrated)` pair for `e`.
    pub fn state(&self, e: Eid) -> (bool, bool) {
        let word = self.word(e);
        (getbit(word, lockbit(e)), getbit(word, migratebit(e)))
    }
}
