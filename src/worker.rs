//! Per-worker session state for the migration protocol: the two deferral
//! lists and the tracking table.
//!
//! `InProg0` holds eids this worker has claimed and must finish copying.
//! `InProg1` holds eids the worker observed locked by someone else; the
//! worker revisits them on a later pass. The tracking table is the set of
//! eids with work still pending from this worker's point of view, and is
//! what the micro-transaction driver polls to decide whether another pass
//! is required.
//!
//! All three structures are owned by one worker and need no
//! synchronisation. An eid can never be on both deferral lists.

use rustc_hash::FxHashSet;

use crate::bitmap::Eid;
use crate::config::MigrateFlags;

/// Ordered, append-only list of eids with set-membership lookup. Lookup is
/// a linear scan; per-query cardinality is expected to stay small.
/// Insertion order is preserved.
#[derive(Debug, Default)]
pub struct InProgList {
    eids: Vec<Eid>,
}

impl InProgList {
    pub fn contains(&self, e: Eid) -> bool {
        self.eids.iter().any(|&x| x == e)
    }

    pub fn append(&mut self, e: Eid) {
        self.eids.push(e);
    }

    pub fn len(&self) -> usize {
        self.eids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.eids.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = Eid> + '_ {
        self.eids.iter().copied()
    }

    pub(crate) fn clear(&mut self) {
        self.eids.clear();
    }

    pub(crate) fn take(&mut self) -> Vec<Eid> {
        std::mem::take(&mut self.eids)
    }
}

/// Hash set of eids observed with pending work during this session.
#[derive(Debug, Default)]
pub struct TrackingTable {
    eids: FxHashSet<Eid>,
}

impl TrackingTable {
    pub fn insert(&mut self, e: Eid) {
        self.eids.insert(e);
    }

    pub fn delete(&mut self, e: Eid) {
        self.eids.remove(&e);
    }

    pub fn size(&self) -> usize {
        self.eids.len()
    }

    pub fn contains(&self, e: Eid) -> bool {
        self.eids.contains(&e)
    }
}

/// One worker's view of the campaign. Created per copy-procedure
/// invocation or per foreground query, released at session end.
#[derive(Debug, Default)]
pub struct WorkerState {
    pub(crate) inprog0: InProgList,
    pub(crate) inprog1: InProgList,
    pub(crate) tracking: TrackingTable,
    flags: MigrateFlags,
}

impl WorkerState {
    pub fn new() -> WorkerState {
        WorkerState::default()
    }

    pub fn inprog0(&self) -> &InProgList {
        &self.inprog0
    }

    pub fn inprog1(&self) -> &InProgList {
        &self.inprog1
    }

    pub fn tracking(&self) -> &TrackingTable {
        &self.tracking
    }

    pub fn tracking_mut(&mut self) -> &mut TrackingTable {
        &mut self.tracking
    }

    /// True while this session is executing inside a copy procedure.
    pub fn in_copy_proc(&self) -> bool {
        self.flags.contains(MigrateFlags::UDF)
    }

    pub(crate) fn set_in_copy_proc(&mut self, on: bool) {
        self.flags.set(MigrateFlags::UDF, on);
    }

    /// Record that this worker claimed `e` (observed `lock` 0→1).
    pub(crate) fn claim(&mut self, e: Eid) {
        debug_assert!(!self.inprog1.contains(e), "eid {} on both lists", e);
        self.inprog0.append(e);
    }

    /// Record that `e` was observed locked by another worker.
    pub(crate) fn defer(&mut self, e: Eid) {
        debug_assert!(!self.inprog0.contains(e), "eid {} on both lists", e);
        self.inprog1.append(e);
    }

    /// Reset per-query state at a pass boundary. The tracking table
    /// survives across passes. Claims abandoned by a failed earlier call
    /// are dropped here; their rows stay locked until the bitmap is
    /// rebuilt from the projections.
    pub(crate) fn begin_pass(&mut self) {
        self.inprog0.clear();
        self.inprog1.clear();
    }
}
