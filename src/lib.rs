//! Online, non-blocking split of a wide `customer` table into two
//! narrower projection tables, running concurrently with live foreground
//! traffic.
//!
//! A shared bitmap directory gives every source row two bits, lock and
//! migrated. Foreground scans consult the bits per tuple: a row nobody
//! has touched is claimed and migrated on demand, a row someone else is
//! copying is skipped and revisited later, a migrated row is left alone.
//! Background workers drive the same protocol over key ranges through the
//! micro-transaction driver until no work remains.
//!
//! The host engine stays behind two seams: the scan hook's access-method
//! closures and the `SpiExecutor` statement interface. Everything shared
//! lives in an explicitly constructed `MigrateShared`; everything
//! per-worker lives in a `WorkerState` session.

pub mod bitmap;
pub mod config;
pub mod driver;
pub mod errors;
pub mod lock;
pub mod migrate;
pub mod proc;
pub mod record;
pub mod scan;
pub mod spi;
pub mod worker;

#[cfg(test)]
mod testutil;

pub use config::{MigrateConfig, MigrateFlags};
pub use errors::{MigrateErr, MigrateResult};
pub use migrate::MigrateShared;
pub use proc::{add_one, MigrateService};
pub use worker::WorkerState;
