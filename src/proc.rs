//! Callable procedures of the split migration, as registered with the
//! host engine, and the service handle that owns the campaign state.
//!
//! The host registers each procedure under its SQL-visible name, e.g.
//!
//! ```sql
//! CREATE FUNCTION customer_proj1_q1(integer, integer, integer, integer)
//!     RETURNS integer AS 'split_migration', 'customer_proj1_q1';
//! ```
//!
//! Every procedure builds its projection-insert statements with `$n`
//! placeholders, then hands them to the micro-transaction driver under
//! the caller's worker session. `add_one` stays as the registration
//! sanity probe.

use parking_lot::{Mutex, MutexGuard};

use crate::config::MigrateConfig;
use crate::driver::exec_txns;
use crate::errors::{MigrateErr, MigrateResult};
use crate::migrate::MigrateShared;
use crate::record::Datum;
use crate::spi::{SpiExecutor, Statement};
use crate::worker::WorkerState;

/// Columns `customer_proj1` takes from the source table: the key plus the
/// payment profile.
const PROJ1_COLS: &str = "c_w_id, c_d_id, c_id, c_discount, c_credit, c_last, c_first, \
     c_balance, c_ytd_payment, c_payment_cnt, c_delivery_cnt, c_data";

/// Columns `customer_proj2` takes: the key plus the contact card.
const PROJ2_COLS: &str = "c_w_id, c_d_id, c_id, c_last, c_first, c_street_1, c_city, c_state, c_zip";

const BY_ID: &str = "c_w_id = $1 and c_d_id = $2 and c_id = $3";
const BY_LAST: &str = "c_w_id = $1 and c_d_id = $2 and c_last = $3";
const BY_RANGE_OPEN: &str = "c_w_id = $1 and c_d_id = $2 and c_id >= $3 and c_id < $4";
const BY_RANGE_CLOSED: &str = "c_w_id = $1 and c_d_id = $2 and c_id >= $3 and c_id <= $4";

fn copy_stmt(target: &str, cols: &str, pred: &str, params: Vec<Datum>) -> Statement {
    Statement::new(
        format!("insert into {target}({cols}) (select {cols} from customer where {pred})"),
        params,
    )
}

fn id_params(c_w_id: u32, c_d_id: u32, c_id: u32) -> Vec<Datum> {
    vec![
        Datum::Int(i64::from(c_w_id)),
        Datum::Int(i64::from(c_d_id)),
        Datum::Int(i64::from(c_id)),
    ]
}

fn last_params(c_w_id: u32, c_d_id: u32, c_last: &str) -> Vec<Datum> {
    vec![
        Datum::Int(i64::from(c_w_id)),
        Datum::Int(i64::from(c_d_id)),
        Datum::Text(c_last.into()),
    ]
}

fn range_params(c_w_id: u32, c_d_id: u32, lo: u32, hi: u32) -> Vec<Datum> {
    vec![
        Datum::Int(i64::from(c_w_id)),
        Datum::Int(i64::from(c_d_id)),
        Datum::Int(i64::from(lo)),
        Datum::Int(i64::from(hi)),
    ]
}

/// Registration sanity probe.
pub fn add_one(arg: i32) -> i32 {
    arg + 1
}

/// The campaign's service handle: the shared migration state plus one
/// pre-allocated session per worker id. Procedures look their worker up
/// by id and hold it for the duration of the call.
pub struct MigrateService {
    shared: MigrateShared,
    workers: Vec<Mutex<WorkerState>>,
}

impl MigrateService {
    pub fn new(cfg: MigrateConfig) -> MigrateResult<MigrateService> {
        let shared = MigrateShared::new(cfg)?;
        let mut workers = Vec::new();
        workers
            .try_reserve_exact(shared.config().max_workers)
            .map_err(|_| MigrateErr::NoMem)?;
        workers.resize_with(shared.config().max_workers, || {
            Mutex::new(WorkerState::new())
        });
        Ok(MigrateService { shared, workers })
    }

    pub fn shared(&self) -> &MigrateShared {
        &self.shared
    }

    pub(crate) fn worker(&self, worker_id: u32) -> MigrateResult<MutexGuard<'_, WorkerState>> {
        self.workers
            .get(worker_id as usize)
            .map(Mutex::lock)
            .ok_or(MigrateErr::Range)
    }

    fn run<E: SpiExecutor>(
        &self,
        exec: &mut E,
        worker_id: u32,
        stmts: &[Statement],
    ) -> MigrateResult<()> {
        let mut worker = self.worker(worker_id)?;
        exec_txns(exec, &self.shared, &mut worker, stmts)?;
        Ok(())
    }

    /// Copy one row, by key, into `customer_proj1`.
    pub fn customer_proj1_q1<E: SpiExecutor>(
        &self,
        exec: &mut E,
        c_w_id: u32,
        c_d_id: u32,
        c_id: u32,
        worker_id: u32,
    ) -> MigrateResult<()> {
        let stmts = [copy_stmt(
            "customer_proj1",
            PROJ1_COLS,
            BY_ID,
            id_params(c_w_id, c_d_id, c_id),
        )];
        self.run(exec, worker_id, &stmts)
    }

    /// Copy the rows matching a last name into `customer_proj1`.
    pub fn customer_proj1_q2<E: SpiExecutor>(
        &self,
        exec: &mut E,
        c_w_id: u32,
        c_d_id: u32,
        c_last: &str,
        worker_id: u32,
    ) -> MigrateResult<()> {
        let stmts = [copy_stmt(
            "customer_proj1",
            PROJ1_COLS,
            BY_LAST,
            last_params(c_w_id, c_d_id, c_last),
        )];
        self.run(exec, worker_id, &stmts)
    }

    /// Copy one row, by key, into `customer_proj2`.
    pub fn customer_proj2_q1<E: SpiExecutor>(
        &self,
        exec: &mut E,
        c_w_id: u32,
        c_d_id: u32,
        c_id: u32,
        worker_id: u32,
    ) -> MigrateResult<()> {
        let stmts = [copy_stmt(
            "customer_proj2",
            PROJ2_COLS,
            BY_ID,
            id_params(c_w_id, c_d_id, c_id),
        )];
        self.run(exec, worker_id, &stmts)
    }

    /// Copy the rows matching a last name into `customer_proj2`.
    pub fn customer_proj2_q2<E: SpiExecutor>(
        &self,
        exec: &mut E,
        c_w_id: u32,
        c_d_id: u32,
        c_last: &str,
        worker_id: u32,
    ) -> MigrateResult<()> {
        let stmts = [copy_stmt(
            "customer_proj2",
            PROJ2_COLS,
            BY_LAST,
            last_params(c_w_id, c_d_id, c_last),
        )];
        self.run(exec, worker_id, &stmts)
    }

    /// Copy one row, by key, into both projections. Two statements per
    /// pass; the second sees the rows the first claimed.
    pub fn customer_proj_q1<E: SpiExecutor>(
        &self,
        exec: &mut E,
        c_w_id: u32,
        c_d_id: u32,
        c_id: u32,
        worker_id: u32,
    ) -> MigrateResult<()> {
        let stmts = [
            copy_stmt(
                "customer_proj1",
                PROJ1_COLS,
                BY_ID,
                id_params(c_w_id, c_d_id, c_id),
            ),
            copy_stmt(
                "customer_proj2",
                PROJ2_COLS,
                BY_ID,
                id_params(c_w_id, c_d_id, c_id),
            ),
        ];
        self.run(exec, worker_id, &stmts)
    }

    /// Copy the rows matching a last name into both projections.
    pub fn customer_proj_q2<E: SpiExecutor>(
        &self,
        exec: &mut E,
        c_w_id: u32,
        c_d_id: u32,
        c_last: &str,
        worker_id: u32,
    ) -> MigrateResult<()> {
        let stmts = [
            copy_stmt(
                "customer_proj1",
                PROJ1_COLS,
                BY_LAST,
                last_params(c_w_id, c_d_id, c_last),
            ),
            copy_stmt(
                "customer_proj2",
                PROJ2_COLS,
                BY_LAST,
                last_params(c_w_id, c_d_id, c_last),
            ),
        ];
        self.run(exec, worker_id, &stmts)
    }

    /// Background migration of the half-open id range `[lo, hi)` into both
    /// projections.
    pub fn customer_proj_background<E: SpiExecutor>(
        &self,
        exec: &mut E,
        c_w_id: u32,
        c_d_id: u32,
        c_id_lo: u32,
        c_id_hi: u32,
        worker_id: u32,
    ) -> MigrateResult<()> {
        let stmts = [
            copy_stmt(
                "customer_proj1",
                PROJ1_COLS,
                BY_RANGE_OPEN,
                range_params(c_w_id, c_d_id, c_id_lo, c_id_hi),
            ),
            copy_stmt(
                "customer_proj2",
                PROJ2_COLS,
                BY_RANGE_OPEN,
                range_params(c_w_id, c_d_id, c_id_lo, c_id_hi),
            ),
        ];
        self.run(exec, worker_id, &stmts)
    }

    /// Page migration of the closed id range `[lo, hi]` into both
    /// projections.
    pub fn customer_proj_page<E: SpiExecutor>(
        &self,
        exec: &mut E,
        c_w_id: u32,
        c_d_id: u32,
        c_id_lo: u32,
        c_id_hi: u32,
        worker_id: u32,
    ) -> MigrateResult<()> {
        let stmts = [
            copy_stmt(
                "customer_proj1",
                PROJ1_COLS,
                BY_RANGE_CLOSED,
                range_params(c_w_id, c_d_id, c_id_lo, c_id_hi),
            ),
            copy_stmt(
                "customer_proj2",
                PROJ2_COLS,
                BY_RANGE_CLOSED,
                range_params(c_w_id, c_d_id, c_id_lo, c_id_hi),
            ),
        ];
        self.run(exec, worker_id, &stmts)
    }
}
