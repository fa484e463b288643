//! Host statement-execution seam. The embedding engine runs each copy
//! statement inside the ambient transaction of the calling procedure;
//! the protocol never opens or closes transactions itself.

use crate::errors::MigrateResult;
use crate::migrate::MigrateShared;
use crate::record::Datum;
use crate::worker::WorkerState;

/// One parameterised SQL statement. The text carries `$1..$n`
/// placeholders; values travel separately and are bound by the host.
#[derive(Clone, Debug, PartialEq)]
pub struct Statement {
    sql: String,
    params: Vec<Datum>,
}

impl Statement {
    pub fn new(sql: impl Into<String>, params: Vec<Datum>) -> Statement {
        Statement {
            sql: sql.into(),
            params,
        }
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn params(&self) -> &[Datum] {
        &self.params
    }
}

/// Statement executor provided by the host engine.
///
/// The executor receives the calling worker's session state because the
/// scans it runs underneath the statement consult and update that state,
/// exactly as the engine's own scan path does for a foreground query.
/// Implementations surface failures as `MigrateErr::Exec`; the driver
/// propagates them unchanged.
pub trait SpiExecutor {
    /// Execute one copy statement, returning the number of rows processed.
    fn execute(
        &mut self,
        stmt: &Statement,
        shared: &MigrateShared,
        worker: &mut WorkerState,
    ) -> MigrateResult<u64>;
}
