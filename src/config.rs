use bitflags::bitflags;

/// Deployment constants of a migration campaign.
///
/// The composite business key `(k1, k2, k3)` of the source table is mapped
/// to a dense row identifier sized by these bounds; the bitmap directory and
/// the partition lock table are allocated from them once at startup.
#[derive(Clone, Debug)]
pub struct MigrateConfig {
    /// Number of distinct `k1` values (`c_w_id` in the reference deployment)
    pub k1_max: u32,
    /// Number of distinct `k2` values per `k1` (`c_d_id`)
    pub k2_max: u32,
    /// Number of distinct `k3` values per `(k1, k2)` group (`c_id`, 1-based)
    pub k3_max: u32,
    /// Rows per atomically-migrated unit. 1 migrates row by row; larger
    /// values group consecutive `k3` values into pages.
    pub page_size: u32,
    /// Fan-out of the partition lock table
    pub lock_parts: u32,
    /// Number of worker sessions the service pre-allocates
    pub max_workers: usize,
    /// Pass cap for the micro-transaction driver
    pub max_passes: u32,
}

impl Default for MigrateConfig {
    fn default() -> MigrateConfig {
        MigrateConfig {
            k1_max: 50,
            k2_max: 10,
            k3_max: 3000,
            page_size: 1,
            lock_parts: 16,
            max_workers: 8,
            max_passes: 64,
        }
    }
}

impl MigrateConfig {
    /// Number of migrated units per `(k1, k2)` group: `⌈k3_max / page_size⌉`.
    /// A partial trailing page still occupies a full unit.
    pub const fn pages_per_group(&self) -> u32 {
        (self.k3_max + self.page_size - 1) / self.page_size
    }

    /// Total number of eids the bitmap must cover.
    pub const fn eid_capacity(&self) -> u32 {
        self.k1_max * self.k2_max * self.pages_per_group()
    }

    pub(crate) fn validate(&self) -> bool {
        self.k1_max > 0
            && self.k2_max > 0
            && self.k3_max > 0
            && self.page_size > 0
            && self.lock_parts > 0
            && self.max_workers > 0
            && self.max_passes > 0
    }
}

bitflags! {
    /// Campaign flags. `SCAN` enables the per-tuple migration protocol in
    /// the scan path and is held process-wide on the service handle; `UDF`
    /// marks a worker session currently inside a copy procedure and lives
    /// on that session only.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct MigrateFlags: u32 {
        const SCAN = 1 << 0;
        const UDF = 1 << 1;
    }
}
