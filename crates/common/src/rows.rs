use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Name and rendered type of one result column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnInfo {
    pub name: String,
    pub data_type: String,
}

/// An ordered sequence of string-keyed value records.
///
/// This is the stable shape external callers (HTTP handlers, report
/// generators) consume. Row order carries no guarantee beyond what a query's
/// own ORDER BY specifies; `truncated` marks that the mandatory row cap cut
/// the result short.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueryResult {
    pub columns: Vec<ColumnInfo>,
    pub rows: Vec<Vec<Value>>,
    pub row_count: usize,
    pub truncated: bool,
}

impl QueryResult {
    /// Column index by name.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    /// Value at `(row, column-name)`, if both exist.
    pub fn value(&self, row: usize, column: &str) -> Option<&Value> {
        let idx = self.column_index(column)?;
        self.rows.get(row)?.get(idx)
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
