use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use fyq_common::{EngineConfig, FyqError, Result};
use tracing::{debug, warn};

/// The two candidate roots a partition may resolve from, in preference
/// order: local override first, then the external canonical location.
#[derive(Debug, Clone)]
pub struct PartitionRoots {
    pub local: PathBuf,
    pub canonical: PathBuf,
}

impl From<&EngineConfig> for PartitionRoots {
    fn from(config: &EngineConfig) -> Self {
        Self {
            local: config.local_root.clone(),
            canonical: config.canonical_root.clone(),
        }
    }
}

/// Canonical file name of a fiscal-year partition.
pub fn partition_file_name(year: i32) -> String {
    format!("transactions_fy{year}.parquet")
}

/// Ordered resolution of one fiscal-year label to a backing file.
///
/// Tries the local root, then the canonical root; `None` marks the year
/// unavailable. "Not found" is an expected outcome here, not an error.
pub fn resolve_partition(roots: &PartitionRoots, year: i32) -> Option<PathBuf> {
    let file = partition_file_name(year);
    for root in [&roots.local, &roots.canonical] {
        let candidate = root.join(&file);
        if candidate.is_file() {
            return Some(candidate);
        }
    }
    None
}

/// Discover every resolvable fiscal-year partition under the two roots.
///
/// The canonical root is scanned first and the local root second, so a local
/// override shadows the canonical file for the same year. A missing root is
/// a normal partial-availability state; a root that exists but is not a
/// directory is a configuration error.
pub fn discover_partitions(roots: &PartitionRoots) -> Result<BTreeMap<i32, PathBuf>> {
    let mut found = BTreeMap::new();
    for root in [&roots.canonical, &roots.local] {
        if !root.exists() {
            debug!(root = %root.display(), "partition root absent, skipping");
            continue;
        }
        if !root.is_dir() {
            return Err(FyqError::InvalidConfig(format!(
                "partition root is not a directory: {}",
                root.display()
            )));
        }
        for entry in std::fs::read_dir(root)? {
            let entry = entry?;
            let path = entry.path();
            match parse_partition_year(&path) {
                Some(year) => {
                    found.insert(year, path);
                }
                None => {
                    debug!(path = %path.display(), "ignoring non-partition file");
                }
            }
        }
    }
    if found.is_empty() {
        warn!(
            local = %roots.local.display(),
            canonical = %roots.canonical.display(),
            "no transaction partitions resolved from either root"
        );
    }
    Ok(found)
}

/// Extract the fiscal year from a `transactions_fy<YEAR>.parquet` path.
fn parse_partition_year(path: &Path) -> Option<i32> {
    if !path.is_file() {
        return None;
    }
    let name = path.file_name()?.to_str()?;
    let year = name
        .strip_prefix("transactions_fy")?
        .strip_suffix(".parquet")?;
    year.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;

    fn roots(dir: &Path) -> PartitionRoots {
        PartitionRoots {
            local: dir.join("local"),
            canonical: dir.join("canonical"),
        }
    }

    fn touch(path: &Path) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        File::create(path).unwrap();
    }

    #[test]
    fn local_override_wins_over_canonical() {
        let dir = tempfile::tempdir().unwrap();
        let roots = roots(dir.path());
        touch(&roots.canonical.join(partition_file_name(2023)));
        touch(&roots.local.join(partition_file_name(2023)));
        touch(&roots.canonical.join(partition_file_name(2024)));

        let found = discover_partitions(&roots).unwrap();
        assert_eq!(found.len(), 2);
        assert_eq!(
            found[&2023],
            roots.local.join(partition_file_name(2023)),
            "local copy must shadow canonical"
        );
        assert_eq!(found[&2024], roots.canonical.join(partition_file_name(2024)));

        assert_eq!(
            resolve_partition(&roots, 2023),
            Some(roots.local.join(partition_file_name(2023)))
        );
        assert_eq!(resolve_partition(&roots, 2020), None);
    }

    #[test]
    fn absent_roots_resolve_to_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let roots = roots(dir.path());
        let found = discover_partitions(&roots).unwrap();
        assert!(found.is_empty());
    }

    #[test]
    fn non_partition_files_are_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let roots = roots(dir.path());
        touch(&roots.local.join("notes.txt"));
        touch(&roots.local.join("transactions_fyXX.parquet"));
        touch(&roots.local.join(partition_file_name(2022)));

        let found = discover_partitions(&roots).unwrap();
        assert_eq!(found.keys().copied().collect::<Vec<_>>(), vec![2022]);
    }

    #[test]
    fn file_as_root_is_a_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut roots = roots(dir.path());
        touch(&dir.path().join("rootfile"));
        roots.local = dir.path().join("rootfile");
        let err = discover_partitions(&roots).unwrap_err();
        assert!(matches!(err, FyqError::InvalidConfig(_)));
    }
}
