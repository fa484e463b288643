//! In-memory host double. Stands in for the engine around the protocol: a
//! miniature `customer` table, the two projection tables, and a statement
//! executor that runs the known copy-statement shapes the way the host's
//! scan path would, gating every selected row through the migration
//! decision routine.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::errors::{MigrateErr, MigrateResult};
use crate::migrate::MigrateShared;
use crate::record::{Datum, Tuple, TupleSlot};
use crate::spi::{SpiExecutor, Statement};
use crate::worker::WorkerState;

pub(crate) fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[derive(Clone, Debug)]
pub(crate) struct CustomerRow {
    pub w: u32,
    pub d: u32,
    pub id: u32,
    pub last: String,
}

impl CustomerRow {
    fn tuple(&self) -> Tuple {
        Tuple::new(vec![
            Datum::Int(i64::from(self.w)),
            Datum::Int(i64::from(self.d)),
            Datum::Int(i64::from(self.id)),
            Datum::Text(self.last.clone()),
        ])
    }
}

#[derive(Clone, Debug, Default)]
pub(crate) struct MemDb {
    pub customer: Vec<CustomerRow>,
    pub proj1: Vec<(u32, u32, u32)>,
    pub proj2: Vec<(u32, u32, u32)>,
}

enum Target {
    Proj1,
    Proj2,
}

enum Predicate {
    ById(u32, u32, u32),
    ByLast(u32, u32, String),
    Range(u32, u32, u32, u32, bool),
}

impl Predicate {
    fn matches(&self, row: &CustomerRow) -> bool {
        match *self {
            Predicate::ById(w, d, id) => row.w == w && row.d == d && row.id == id,
            Predicate::ByLast(w, d, ref last) => row.w == w && row.d == d && row.last == *last,
            Predicate::Range(w, d, lo, hi, closed) => {
                row.w == w
                    && row.d == d
                    && row.id >= lo
                    && if closed { row.id <= hi } else { row.id < hi }
            }
        }
    }
}

fn int_param(stmt: &Statement, i: usize) -> MigrateResult<u32> {
    stmt.params()
        .get(i)
        .and_then(Datum::as_u32)
        .ok_or_else(|| MigrateErr::Exec(format!("bad parameter ${}", i + 1)))
}

fn text_param(stmt: &Statement, i: usize) -> MigrateResult<String> {
    match stmt.params().get(i) {
        Some(Datum::Text(s)) => Ok(s.clone()),
        _ => Err(MigrateErr::Exec(format!("bad parameter ${}", i + 1))),
    }
}

impl MemDb {
    pub fn with_customers<I>(rows: I) -> MemDb
    where
        I: IntoIterator<Item = (u32, u32, u32, String)>,
    {
        MemDb {
            customer: rows
                .into_iter()
                .map(|(w, d, id, last)| CustomerRow { w, d, id, last })
                .collect(),
            proj1: Vec::new(),
            proj2: Vec::new(),
        }
    }

    /// A raw range-copy statement in the shape the procedures build.
    pub fn range_stmt(target: &str, w: u32, d: u32, lo: u32, hi: u32, closed: bool) -> Statement {
        let cmp = if closed { "<=" } else { "<" };
        Statement::new(
            format!(
                "insert into {target}(c_w_id, c_d_id, c_id) \
                 (select c_w_id, c_d_id, c_id from customer \
                 where c_w_id = $1 and c_d_id = $2 and c_id >= $3 and c_id {cmp} $4)"
            ),
            vec![
                Datum::Int(i64::from(w)),
                Datum::Int(i64::from(d)),
                Datum::Int(i64::from(lo)),
                Datum::Int(i64::from(hi)),
            ],
        )
    }

    pub fn assert_no_duplicates(&self) {
        for proj in [&self.proj1, &self.proj2] {
            let mut seen = proj.clone();
            seen.sort_unstable();
            let before = seen.len();
            seen.dedup();
            assert_eq!(before, seen.len(), "duplicate rows in a projection");
        }
    }

    fn target(stmt: &Statement) -> MigrateResult<Target> {
        if stmt.sql().contains("customer_proj1(") {
            Ok(Target::Proj1)
        } else if stmt.sql().contains("customer_proj2(") {
            Ok(Target::Proj2)
        } else {
            Err(MigrateErr::Exec(format!("unknown target: {}", stmt.sql())))
        }
    }

    fn predicate(stmt: &Statement) -> MigrateResult<Predicate> {
        let sql = stmt.sql();
        if sql.contains("c_last = $3") {
            Ok(Predicate::ByLast(
                int_param(stmt, 0)?,
                int_param(stmt, 1)?,
                text_param(stmt, 2)?,
            ))
        } else if sql.contains("c_id <= $4") {
            Ok(Predicate::Range(
                int_param(stmt, 0)?,
                int_param(stmt, 1)?,
                int_param(stmt, 2)?,
                int_param(stmt, 3)?,
                true,
            ))
        } else if sql.contains("c_id < $4") {
            Ok(Predicate::Range(
                int_param(stmt, 0)?,
                int_param(stmt, 1)?,
                int_param(stmt, 2)?,
                int_param(stmt, 3)?,
                false,
            ))
        } else if sql.contains("c_id = $3") {
            Ok(Predicate::ById(
                int_param(stmt, 0)?,
                int_param(stmt, 1)?,
                int_param(stmt, 2)?,
            ))
        } else {
            Err(MigrateErr::Exec(format!("unknown predicate: {sql}")))
        }
    }

    fn apply(
        &mut self,
        stmt: &Statement,
        shared: &MigrateShared,
        worker: &mut WorkerState,
    ) -> MigrateResult<u64> {
        let target = Self::target(stmt)?;
        let pred = Self::predicate(stmt)?;

        let selected: Vec<CustomerRow> = self
            .customer
            .iter()
            .filter(|row| pred.matches(row))
            .cloned()
            .collect();

        let mut inserted = 0;
        for row in selected {
            let tuple = row.tuple();
            let slot = TupleSlot::holding(&tuple);
            if shared.migrate_tuple(worker, slot, row.w, row.d, row.id) {
                let key = (row.w, row.d, row.id);
                match target {
                    Target::Proj1 => self.proj1.push(key),
                    Target::Proj2 => self.proj2.push(key),
                }
                inserted += 1;
            }
        }
        Ok(inserted)
    }
}

/// Shareable handle so several workers can hit one database, the way
/// several backends share one engine.
#[derive(Clone)]
pub(crate) struct MemHandle(Arc<Mutex<MemDb>>);

impl MemHandle {
    pub fn new(db: MemDb) -> MemHandle {
        MemHandle(Arc::new(Mutex::new(db)))
    }

    pub fn into_inner(self) -> MemDb {
        self.0.lock().clone()
    }
}

impl SpiExecutor for MemHandle {
    fn execute(
        &mut self,
        stmt: &Statement,
        shared: &MigrateShared,
        worker: &mut WorkerState,
    ) -> MigrateResult<u64> {
        self.0.lock().apply(stmt, shared, worker)
    }
}
