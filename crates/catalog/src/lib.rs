//! Immutable registry of named, parameterized analytic query templates.
//!
//! Each entry declares a stable name, a domain grouping, a non-empty
//! description, a SQL template, and a parameter contract. Templates share a
//! common filter vocabulary (date range, store, department/category,
//! channel) rendered by one binder, so filter logic is written once rather
//! than re-derived per query.
//!
//! Supplied values are validated against the contract and emitted as bind
//! parameters only — they never enter SQL text, even for internal trusted
//! call paths.

mod builtin;

use std::collections::HashMap;

use fyq_common::{FyqError, ParamKind, ParamValue, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Domain grouping for catalog browsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryDomain {
    Sales,
    Customer,
    OutOfStock,
    Basket,
    Channel,
}

/// One declared parameter of a catalog query.
///
/// `filter` carries the optional WHERE fragment this parameter contributes
/// to the shared `{where}` block; parameters referenced directly inside the
/// template body (HAVING clauses, CASE arms, extra window bounds) have no
/// fragment and must be required, so the template never retains an unbound
/// placeholder.
#[derive(Debug, Clone)]
pub struct ParamSpec {
    pub name: &'static str,
    pub kind: ParamKind,
    pub required: bool,
    pub filter: Option<&'static str>,
}

/// A named, pre-vetted analytic query template.
#[derive(Debug, Clone)]
pub struct NamedQuery {
    pub name: &'static str,
    pub domain: QueryDomain,
    pub description: &'static str,
    pub sql: &'static str,
    pub params: Vec<ParamSpec>,
}

/// A validated template with values ready to bind.
///
/// `limit` carries the caller's requested row cap (from a declared `limit`
/// parameter); it is applied structurally by the execution layer rather than
/// spliced into the statement.
#[derive(Debug, Clone)]
pub struct PreparedQuery {
    pub name: String,
    pub sql: String,
    pub params: Vec<(String, ParamValue)>,
    pub limit: Option<usize>,
}

/// The immutable query catalog, built once at startup.
#[derive(Debug)]
pub struct QueryCatalog {
    entries: Vec<NamedQuery>,
    index: HashMap<&'static str, usize>,
}

impl QueryCatalog {
    /// The built-in catalog.
    pub fn builtin() -> Self {
        let entries = builtin::entries();
        let mut index = HashMap::with_capacity(entries.len());
        for (i, entry) in entries.iter().enumerate() {
            debug_assert!(
                !entry.description.trim().is_empty(),
                "catalog entry {} has an empty description",
                entry.name
            );
            let previous = index.insert(entry.name, i);
            debug_assert!(previous.is_none(), "duplicate catalog entry {}", entry.name);
        }
        debug!(entries = entries.len(), "query catalog built");
        Self { entries, index }
    }

    /// Look up a template; unknown names are a distinct error since the
    /// catalog is a closed, enumerable namespace.
    pub fn get(&self, name: &str) -> Result<&NamedQuery> {
        self.index
            .get(name)
            .map(|&i| &self.entries[i])
            .ok_or_else(|| FyqError::UnknownQuery(name.to_string()))
    }

    /// All entries, in registration order.
    pub fn entries(&self) -> &[NamedQuery] {
        &self.entries
    }

    /// Sorted query names.
    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.entries.iter().map(|e| e.name).collect();
        names.sort_unstable();
        names
    }

    /// Validate supplied parameters against the declared contract and render
    /// the shared filter block. Values are returned for out-of-band binding.
    pub fn prepare(
        &self,
        name: &str,
        params: &HashMap<String, ParamValue>,
    ) -> Result<PreparedQuery> {
        let entry = self.get(name)?;

        for (supplied, value) in params {
            let spec = entry
                .params
                .iter()
                .find(|s| s.name == supplied)
                .ok_or_else(|| {
                    FyqError::InvalidParameter(format!(
                        "parameter {supplied} is not declared by query {name}"
                    ))
                })?;
            if value.kind() != spec.kind {
                return Err(FyqError::InvalidParameter(format!(
                    "parameter {supplied} of query {name} expects {}, got {}",
                    spec.kind,
                    value.kind()
                )));
            }
        }
        for spec in &entry.params {
            if spec.required && !params.contains_key(spec.name) {
                return Err(FyqError::InvalidParameter(format!(
                    "missing required parameter {} ({}) for query {name}",
                    spec.name, spec.kind
                )));
            }
        }

        let fragments: Vec<&str> = entry
            .params
            .iter()
            .filter(|s| params.contains_key(s.name))
            .filter_map(|s| s.filter)
            .collect();
        let where_clause = if fragments.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", fragments.join(" AND "))
        };
        let sql = entry.sql.replace("{where}", &where_clause);

        let mut limit = None;
        let mut bound = Vec::with_capacity(params.len());
        for (supplied, value) in params {
            if supplied == "limit" {
                match value {
                    ParamValue::Int(n) if *n > 0 => limit = Some(*n as usize),
                    _ => {
                        return Err(FyqError::InvalidParameter(format!(
                            "limit for query {name} must be a positive integer"
                        )))
                    }
                }
                continue;
            }
            bound.push((supplied.clone(), value.clone()));
        }

        Ok(PreparedQuery {
            name: name.to_string(),
            sql,
            params: bound,
            limit,
        })
    }
}

impl Default for QueryCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> ParamValue {
        ParamValue::Date(NaiveDate::from_ymd_opt(y, m, d).unwrap())
    }

    fn range_params() -> HashMap<String, ParamValue> {
        HashMap::from([
            ("start".to_string(), date(2024, 7, 1)),
            ("end".to_string(), date(2024, 7, 8)),
        ])
    }

    /// Synthesize a value of the declared kind.
    fn value_for(kind: ParamKind) -> ParamValue {
        match kind {
            ParamKind::Date => date(2024, 7, 1),
            ParamKind::Int => ParamValue::Int(5),
            ParamKind::Float => ParamValue::Float(1.0),
            ParamKind::Text => ParamValue::Text("x".to_string()),
        }
    }

    /// Collect `$name` placeholders from rendered SQL.
    fn placeholders(sql: &str) -> Vec<String> {
        let mut out = Vec::new();
        let bytes = sql.as_bytes();
        let mut i = 0;
        while i < bytes.len() {
            if bytes[i] == b'$' {
                let start = i + 1;
                let mut end = start;
                while end < bytes.len()
                    && (bytes[end].is_ascii_alphanumeric() || bytes[end] == b'_')
                {
                    end += 1;
                }
                if end > start {
                    out.push(sql[start..end].to_string());
                }
                i = end;
            } else {
                i += 1;
            }
        }
        out.sort();
        out.dedup();
        out
    }

    #[test]
    fn catalog_is_populated_with_described_entries() {
        let catalog = QueryCatalog::builtin();
        assert!(catalog.entries().len() >= 24);
        for entry in catalog.entries() {
            assert!(
                !entry.description.trim().is_empty(),
                "{} lacks a description",
                entry.name
            );
        }
    }

    #[test]
    fn unknown_query_is_a_distinct_error() {
        let catalog = QueryCatalog::builtin();
        let err = catalog.prepare("unknown_query_xyz", &range_params()).unwrap_err();
        assert!(matches!(err, FyqError::UnknownQuery(_)));
    }

    #[test]
    fn missing_required_parameter_is_rejected() {
        let catalog = QueryCatalog::builtin();
        let err = catalog.prepare("top_items", &HashMap::new()).unwrap_err();
        assert!(matches!(err, FyqError::InvalidParameter(_)));
    }

    #[test]
    fn undeclared_parameter_is_rejected() {
        let catalog = QueryCatalog::builtin();
        let mut params = range_params();
        params.insert("surprise".to_string(), ParamValue::Int(1));
        let err = catalog.prepare("top_items", &params).unwrap_err();
        assert!(matches!(err, FyqError::InvalidParameter(_)));
    }

    #[test]
    fn kind_mismatch_is_rejected() {
        let catalog = QueryCatalog::builtin();
        let mut params = range_params();
        params.insert("store_id".to_string(), ParamValue::Int(7));
        let err = catalog.prepare("top_items", &params).unwrap_err();
        assert!(matches!(err, FyqError::InvalidParameter(_)));
    }

    #[test]
    fn optional_filters_render_only_when_supplied() {
        let catalog = QueryCatalog::builtin();

        let bare = catalog.prepare("top_items", &range_params()).unwrap();
        assert!(!bare.sql.contains("store_id"));
        assert!(!bare.sql.contains("{where}"));
        assert!(bare.sql.contains("WHERE sold_date >= $start"));

        let mut params = range_params();
        params.insert("store_id".to_string(), ParamValue::from("S1"));
        let filtered = catalog.prepare("top_items", &params).unwrap();
        assert!(filtered.sql.contains("store_id = $store_id"));
        // The value itself must never appear in SQL text.
        assert!(!filtered.sql.contains("S1"));
        assert!(filtered
            .params
            .iter()
            .any(|(n, v)| n == "store_id" && *v == ParamValue::from("S1")));
    }

    #[test]
    fn limit_parameter_routes_to_the_structural_cap() {
        let catalog = QueryCatalog::builtin();
        let mut params = range_params();
        params.insert("limit".to_string(), ParamValue::Int(5));
        let prepared = catalog.prepare("top_items", &params).unwrap();
        assert_eq!(prepared.limit, Some(5));
        assert!(prepared.params.iter().all(|(n, _)| n != "limit"));
        assert!(!prepared.sql.contains("$limit"));

        params.insert("limit".to_string(), ParamValue::Int(0));
        assert!(matches!(
            catalog.prepare("top_items", &params).unwrap_err(),
            FyqError::InvalidParameter(_)
        ));
    }

    /// Every template must be internally consistent: with all declared
    /// parameters supplied, the rendered SQL has no leftover `{where}` token
    /// and every `$placeholder` is covered by a bound parameter.
    #[test]
    fn every_template_binds_cleanly_with_full_parameters() {
        let catalog = QueryCatalog::builtin();
        for entry in catalog.entries() {
            let params: HashMap<String, ParamValue> = entry
                .params
                .iter()
                .map(|s| (s.name.to_string(), value_for(s.kind)))
                .collect();
            let prepared = catalog
                .prepare(entry.name, &params)
                .unwrap_or_else(|e| panic!("{} failed to prepare: {e}", entry.name));
            assert!(
                !prepared.sql.contains("{where}"),
                "{} retains a filter token",
                entry.name
            );
            let bound: Vec<&str> = prepared.params.iter().map(|(n, _)| n.as_str()).collect();
            for ph in placeholders(&prepared.sql) {
                assert!(
                    bound.contains(&ph.as_str()),
                    "{} leaves placeholder ${ph} unbound",
                    entry.name
                );
            }
        }
    }

    /// Parameters embedded directly in a template body (no filter fragment)
    /// must be required, so a partial parameter set can never leave a
    /// dangling placeholder.
    #[test]
    fn embedded_parameters_are_always_required() {
        let catalog = QueryCatalog::builtin();
        for entry in catalog.entries() {
            for spec in &entry.params {
                if spec.filter.is_none() && spec.name != "limit" {
                    assert!(
                        spec.required,
                        "{}.{} is embedded but optional",
                        entry.name, spec.name
                    );
                }
            }
        }
    }
}
