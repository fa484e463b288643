//! The migration decision routine and the shared state it runs against.
//!
//! `MigrateShared` owns everything that outlives a single session: the
//! bitmap directory, the partition lock table, the campaign flags, and the
//! migrated-tuple counter. It is constructed once at startup and handed
//! explicitly to the scan path and the driver.
//!
//! `migrate_tuple` decides, for one tuple of the source table, whether the
//! caller may use it now. The fast paths consult the caller's deferral
//! lists and an unsynchronised read of the bitmap word; only a tuple that
//! looks unclaimed and unmigrated pays for the partition lock, where the
//! word is re-read and ownership is taken by setting the lock bit. Per
//! eid the bit pair moves `00 → 10 → 11` and never back.

use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};

use log::{debug, info};

use crate::bitmap::{getbit, lockbit, migratebit, Bitmap, Eid};
use crate::config::{MigrateConfig, MigrateFlags};
use crate::errors::{MigrateErr, MigrateResult};
use crate::lock::PartitionLocks;
use crate::record::{Tuple, TupleSlot};
use crate::worker::WorkerState;

pub struct MigrateShared {
    cfg: MigrateConfig,
    bitmap: Bitmap,
    locks: PartitionLocks,
    flags: AtomicU32,
    tuple_migrate_count: AtomicU64,
}

impl MigrateShared {
    /// Allocate the bitmap and lock table for the configured eid space.
    /// Failure here is fatal to the campaign.
    pub fn new(cfg: MigrateConfig) -> MigrateResult<MigrateShared> {
        if !cfg.validate() {
            return Err(MigrateErr::Misuse);
        }
        let bitmap = Bitmap::new(cfg.eid_capacity())?;
        let locks = PartitionLocks::new(cfg.lock_parts)?;
        info!(
            "migration state initialised: {} eids, {} lock partitions",
            bitmap.capacity(),
            locks.parts()
        );
        Ok(MigrateShared {
            cfg,
            bitmap,
            locks,
            flags: AtomicU32::new(0),
            tuple_migrate_count: AtomicU64::new(0),
        })
    }

    pub fn config(&self) -> &MigrateConfig {
        &self.cfg
    }

    /// Whether the scan-time protocol is enabled.
    pub fn migrate_flag(&self) -> bool {
        MigrateFlags::from_bits_truncate(self.flags.load(Ordering::Acquire))
            .contains(MigrateFlags::SCAN)
    }

    /// Operational switch for the campaign.
    pub fn set_migrate_flag(&self, on: bool) {
        let bit = MigrateFlags::SCAN.bits();
        if on {
            self.flags.fetch_or(bit, Ordering::Release);
        } else {
            self.flags.fetch_and(!bit, Ordering::Release);
        }
    }

    /// Tuples returned to foreground callers after an on-demand migration.
    pub fn tuple_migrate_count(&self) -> u64 {
        self.tuple_migrate_count.load(Ordering::Relaxed)
    }

    pub(crate) fn bump_tuple_migrate_count(&self) {
        self.tuple_migrate_count.fetch_add(1, Ordering::Relaxed);
    }

    /// Map a composite key to its dense row identifier:
    /// `(k1·k2_max + k2)·⌈k3_max/P⌉ + (k3−1)/P` for page size `P`.
    /// `k3` is 1-based.
    pub fn eid(&self, k1: u32, k2: u32, k3: u32) -> Eid {
        let pages = self.cfg.pages_per_group();
        (k1 * self.cfg.k2_max + k2) * pages + (k3 - 1) / self.cfg.page_size
    }

    /// Current `(lock, migrated)` pair for an eid.
    pub fn bit_state(&self, e: Eid) -> (bool, bool) {
        self.bitmap.state(e)
    }

    /// Decide whether the caller may use this tuple now.
    ///
    /// Returns true when the tuple is vacuously usable (empty slot), when
    /// this worker already owns its row, or when the worker claims the row
    /// here. Returns false when the row is already migrated or is in
    /// flight elsewhere; the deferral lists and tracking table are updated
    /// so the row is revisited or dropped as appropriate. The caller is
    /// never blocked for longer than one partition-lock critical section.
    pub fn migrate_tuple(
        &self,
        worker: &mut WorkerState,
        slot: TupleSlot<'_>,
        k1: u32,
        k2: u32,
        k3: u32,
    ) -> bool {
        let tuple = slot.tuple();
        if tuple.is_none() || tuple.map_or(false, Tuple::is_empty) {
            return true;
        }

        let e = self.eid(k1, k2, k3);
        let lockbitid = lockbit(e);
        let migratebitid = migratebit(e);

        // Sampled once at entry; only the local-delete branches consult it.
        let size = if worker.in_copy_proc() {
            worker.tracking.size()
        } else {
            0
        };

        if worker.inprog0.contains(e) {
            return true;
        }

        if worker.inprog1.contains(e) {
            if worker.in_copy_proc() {
                worker.tracking.insert(e);
            }
            return false;
        }

        let word = self.bitmap.word(e);
        if !getbit(word, migratebitid) {
            if getbit(word, lockbitid) {
                worker.defer(e);
                return false;
            }

            let guard = self.locks.acquire(e);
            let word = self.bitmap.word(e);
            if !getbit(word, migratebitid) {
                if !getbit(word, lockbitid) {
                    self.bitmap.set(e, lockbitid);
                    drop(guard);
                    worker.claim(e);
                    return true;
                }
                drop(guard);
                worker.defer(e);
                return false;
            }
            drop(guard);
            if size != 0 {
                worker.tracking.delete(e);
            }
        } else if size != 0 {
            worker.tracking.delete(e);
        }
        false
    }

    /// Complete every row this worker has claimed: set the migrated bit
    /// and drop the tracking entry. The caller guarantees that the
    /// projection inserts for those rows have been performed within the
    /// surrounding transaction.
    pub fn complete_claims(&self, worker: &mut WorkerState) {
        let claimed = worker.inprog0.take();
        if claimed.is_empty() {
            return;
        }
        for &e in &claimed {
            let _guard = self.locks.acquire(e);
            self.bitmap.set(e, migratebit(e));
        }
        for &e in &claimed {
            worker.tracking.delete(e);
        }
        debug!("completed {} claimed rows", claimed.len());
    }

    /// Replay migrated state from a scan of the projection tables. The
    /// bitmap is ephemeral; after a restart the host feeds every key found
    /// in both projections back through here.
    pub fn restore_migrated<I>(&self, keys: I)
    where
        I: IntoIterator<Item = (u32, u32, u32)>,
    {
        for (k1, k2, k3) in keys {
            let e = self.eid(k1, k2, k3);
            let _guard = self.locks.acquire(e);
            self.bitmap.set(e, lockbit(e));
            self.bitmap.set(e, migratebit(e));
        }
    }
}
