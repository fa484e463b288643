pub type MigrateResult<T> = Result<T, MigrateErr>;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MigrateErr {
    /// Bitmap or lock-table allocation failed at startup
    NoMem,
    /// An eid, worker id, or fan-out value is outside the configured space
    Range,
    /// Operation terminated by the host's interrupt check
    Interrupt,
    /// A copy statement failed in the host executor
    Exec(String),
    /// The micro-transaction driver exhausted its pass cap with work pending
    PassLimit(u32),
    /// Library used incorrectly
    Misuse,
}
