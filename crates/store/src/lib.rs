//! Partition location and query execution for the FYQ analytics engine.
//!
//! Architecture role:
//! - resolves each fiscal-year label to a backing parquet file, preferring a
//!   local override over the external canonical location, tolerating partial
//!   availability
//! - registers resolvable partitions into one logical `transactions`
//!   relation on a DataFusion session and executes bound-parameter queries
//!   against it
//! - guards the freeform query path with a conservative read-only allow-list
//!
//! Key modules:
//! - [`locate`]
//! - [`store`]
//! - [`guard`]
//! - [`rows`]

pub mod guard;
pub mod locate;
pub mod rows;
pub mod store;

pub use guard::validate_freeform_sql;
pub use locate::{discover_partitions, partition_file_name, resolve_partition, PartitionRoots};
pub use store::{
    line_item_schema, PartitionSummary, PluPerformance, Store, StoreSummary, TrendGrain,
    UNION_TABLE,
};
