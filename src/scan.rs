//! Scan integration hook. This is the single executor entry point the
//! protocol owns: the per-tuple loop of a generic relation scan, with the
//! migration gate spliced in on both the direct-return path and the
//! post-qualification path.
//!
//! The access method, the qualification, and the projection are supplied
//! by the host executor. With the campaign's scan flag clear the loop
//! behaves exactly as the plain scan; with it set, every candidate tuple
//! passes through the migration decision routine and only tuples the
//! routine approves flow to the caller.

use std::sync::atomic::{AtomicBool, Ordering};

use crate::errors::{MigrateErr, MigrateResult};
use crate::migrate::MigrateShared;
use crate::record::{Tuple, TupleSlot};
use crate::worker::WorkerState;

pub type Qual<'a> = Box<dyn FnMut(&Tuple) -> bool + 'a>;
pub type Projection<'a> = Box<dyn FnMut(&Tuple) -> Tuple + 'a>;

/// State for one relation scan. `fetch` is the access method: it yields
/// the next candidate tuple, or None when the relation is exhausted.
pub struct ScanState<'a, F> {
    fetch: F,
    qual: Option<Qual<'a>>,
    project: Option<Projection<'a>>,
    interrupt: Option<&'a AtomicBool>,
    filtered: u64,
}

impl<'a, F> ScanState<'a, F>
where
    F: FnMut() -> MigrateResult<Option<Tuple>>,
{
    pub fn new(fetch: F) -> ScanState<'a, F> {
        ScanState {
            fetch,
            qual: None,
            project: None,
            interrupt: None,
            filtered: 0,
        }
    }

    pub fn qual(mut self, qual: impl FnMut(&Tuple) -> bool + 'a) -> Self {
        self.qual = Some(Box::new(qual));
        self
    }

    pub fn projection(mut self, project: impl FnMut(&Tuple) -> Tuple + 'a) -> Self {
        self.project = Some(Box::new(project));
        self
    }

    /// Host cancellation flag, checked once per fetched tuple.
    pub fn interrupt(mut self, flag: &'a AtomicBool) -> Self {
        self.interrupt = Some(flag);
        self
    }

    /// Tuples that failed the qualification so far.
    pub fn filtered(&self) -> u64 {
        self.filtered
    }

    /// Check interrupts and fetch the next candidate tuple.
    fn fetch_one(&mut self) -> MigrateResult<Option<Tuple>> {
        if let Some(flag) = self.interrupt {
            if flag.load(Ordering::Relaxed) {
                return Err(MigrateErr::Interrupt);
            }
        }
        (self.fetch)()
    }

    /// Return the next qualifying tuple, or None at end of scan.
    ///
    /// When the scan flag is set, a qualifying tuple is returned only if
    /// the migration decision routine approves it; approved returns bump
    /// the shared migrated-tuple counter. Declined tuples are skipped and
    /// the loop continues with the next candidate.
    pub fn next(
        &mut self,
        shared: &MigrateShared,
        worker: &mut WorkerState,
    ) -> MigrateResult<Option<Tuple>> {
        loop {
            let tuple = match self.fetch_one()? {
                Some(tuple) => tuple,
                None => return Ok(None),
            };

            if let Some(qual) = self.qual.as_mut() {
                if !qual(&tuple) {
                    self.filtered += 1;
                    continue;
                }
            }

            if shared.migrate_flag() {
                let (k1, k2, k3) = tuple.keys().ok_or(MigrateErr::Misuse)?;
                if shared.migrate_tuple(worker, TupleSlot::holding(&tuple), k1, k2, k3) {
                    shared.bump_tuple_migrate_count();
                    return Ok(Some(self.projected(tuple)));
                }
                continue;
            }

            return Ok(Some(self.projected(tuple)));
        }
    }

    fn projected(&mut self, tuple: Tuple) -> Tuple {
        match self.project.as_mut() {
            Some(project) => project(&tuple),
            None => tuple,
        }
    }
}
