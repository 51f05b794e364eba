use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Engine configuration.
///
/// The engine needs only three locations: two candidate roots for yearly
/// transaction partitions (a project-local override and the external
/// canonical store) and the precomputed fiscal calendar source. A missing
/// root or calendar file is a degraded-but-valid state, not a config error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Project-local partition root, checked first.
    pub local_root: PathBuf,
    /// External canonical partition root, checked second.
    pub canonical_root: PathBuf,
    /// Precomputed fiscal calendar CSV (one row per calendar date).
    pub calendar_path: PathBuf,
    /// Default row cap applied to every result set.
    pub max_result_rows: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            local_root: PathBuf::from("data/partitions"),
            canonical_root: PathBuf::from("/srv/pos/partitions"),
            calendar_path: PathBuf::from("data/fiscal_calendar.csv"),
            max_result_rows: 10_000,
        }
    }
}
