//! Micro-transaction driver. A copy procedure hands it an ordered list of
//! copy statements; the driver executes each statement once per pass,
//! completes the rows the worker claimed during the pass, and repeats
//! until the worker's tracking table is empty.
//!
//! Each pass runs fresh statements, so the per-query deferral lists reset
//! at the pass boundary. A row parked in `InProg1` during one pass is
//! re-examined on the next; once it is observed migrated its tracking
//! entry is dropped, which is what lets the `size` monitor reach zero.
//! Passes are capped; exhausting the cap with work still tracked is an
//! error, not a hang.

use log::{debug, warn};

use crate::errors::{MigrateErr, MigrateResult};
use crate::migrate::MigrateShared;
use crate::spi::{SpiExecutor, Statement};
use crate::worker::WorkerState;

/// Run the statements in passes until the worker's tracking table is
/// empty. Returns the number of passes taken. Any statement failure is
/// fatal to the call and propagates unchanged.
pub fn exec_txns<E: SpiExecutor>(
    exec: &mut E,
    shared: &MigrateShared,
    worker: &mut WorkerState,
    stmts: &[Statement],
) -> MigrateResult<u32> {
    if stmts.is_empty() {
        return Err(MigrateErr::Misuse);
    }

    worker.set_in_copy_proc(true);
    let res = run_passes(exec, shared, worker, stmts);
    worker.set_in_copy_proc(false);
    res
}

fn run_passes<E: SpiExecutor>(
    exec: &mut E,
    shared: &MigrateShared,
    worker: &mut WorkerState,
    stmts: &[Statement],
) -> MigrateResult<u32> {
    let cap = shared.config().max_passes;
    let mut passes = 0;

    loop {
        if passes == cap {
            warn!("pass cap {} reached with {} rows tracked", cap, worker.tracking().size());
            return Err(MigrateErr::PassLimit(passes));
        }
        passes += 1;

        worker.begin_pass();
        for stmt in stmts {
            exec.execute(stmt, shared, worker)?;
        }
        shared.complete_claims(worker);

        let pending = worker.tracking().size();
        debug!("pass {} done, {} rows still tracked", passes, pending);
        if pending == 0 {
            return Ok(passes);
        }
    }
}
