use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use arrow::array::RecordBatch;
use arrow::datatypes::{DataType, Field, Schema, TimeUnit};
use chrono::NaiveDate;
use datafusion::common::ParamValues;
use datafusion::datasource::MemTable;
use datafusion::prelude::{ParquetReadOptions, SessionContext};
use datafusion::scalar::ScalarValue;
use fyq_common::{EngineConfig, FyqError, ParamValue, QueryResult, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use crate::guard::validate_freeform_sql;
use crate::locate::{discover_partitions, PartitionRoots};
use crate::rows::batches_to_result;

/// Name of the unified logical relation over all registered partitions.
pub const UNION_TABLE: &str = "transactions";

/// Schema of the per-year line-item partitions (and of [`UNION_TABLE`]).
pub fn line_item_schema() -> Schema {
    Schema::new(vec![
        Field::new("fin_year", DataType::Int32, false),
        Field::new("fin_week", DataType::Int32, false),
        Field::new("sold_date", DataType::Date32, false),
        Field::new(
            "sold_at",
            DataType::Timestamp(TimeUnit::Microsecond, None),
            false,
        ),
        Field::new("store_id", DataType::Utf8, false),
        Field::new("store_name", DataType::Utf8, false),
        Field::new("item_id", DataType::Int64, false),
        Field::new("item_name", DataType::Utf8, false),
        Field::new("dept_code", DataType::Utf8, false),
        Field::new("category_code", DataType::Utf8, false),
        Field::new("channel", DataType::Utf8, false),
        Field::new("basket_id", DataType::Utf8, false),
        Field::new("customer_id", DataType::Utf8, true),
        Field::new("quantity", DataType::Float64, false),
        Field::new("revenue", DataType::Float64, false),
        Field::new("margin", DataType::Float64, false),
    ])
}

/// Availability and liveness metadata for one registered fiscal-year
/// partition, captured by a lightweight aggregate probe at registration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PartitionSummary {
    pub fin_year: i32,
    pub path: PathBuf,
    pub rows: i64,
    pub revenue: f64,
    pub stores: i64,
    pub first_date: Option<NaiveDate>,
    pub last_date: Option<NaiveDate>,
}

/// Per-year and total statistics; the liveness/sanity surface.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreSummary {
    pub partitions: Vec<PartitionSummary>,
    pub total_rows: i64,
    pub total_revenue: f64,
}

/// Time-bucketing grain for [`Store::store_trend`]. A closed enum: any other
/// requested grain is a usage error, not a silent fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendGrain {
    Daily,
    Monthly,
}

impl std::str::FromStr for TrendGrain {
    type Err = FyqError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "daily" | "day" => Ok(TrendGrain::Daily),
            "monthly" | "month" => Ok(TrendGrain::Monthly),
            other => Err(FyqError::InvalidParameter(format!(
                "unsupported trend grain: {other} (expected daily or monthly)"
            ))),
        }
    }
}

/// Single-item rollup plus per-store breakdown.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PluPerformance {
    pub item_id: i64,
    pub item_name: Option<String>,
    pub quantity: f64,
    pub revenue: f64,
    pub margin: f64,
    pub by_store: QueryResult,
}

/// Read-only query execution engine over the yearly transaction partitions.
///
/// All resolvable partitions are registered once at construction into a
/// single UNION ALL view; after that the store is effectively stateless per
/// call and safe for concurrent callers — the session, summaries, and
/// registered tables are immutable reads.
pub struct Store {
    ctx: SessionContext,
    partitions: Vec<PartitionSummary>,
    default_max_rows: usize,
}

impl Store {
    /// Register every resolvable partition and probe per-year availability
    /// metadata. Partial coverage is a normal, expected state; an
    /// unregisterable or unprobeable file is excluded (and logged), never
    /// fatal.
    pub async fn open(config: &EngineConfig) -> Result<Self> {
        let roots = PartitionRoots::from(config);
        let discovered = discover_partitions(&roots)?;

        let ctx = SessionContext::new();
        let mut partitions = Vec::new();
        for (year, path) in discovered {
            let table = partition_table_name(year);
            let register = ctx
                .register_parquet(
                    &table,
                    path.to_string_lossy().as_ref(),
                    ParquetReadOptions::default(),
                )
                .await;
            if let Err(e) = register {
                warn!(year, path = %path.display(), error = %e, "partition unavailable, excluded from logical relation");
                continue;
            }
            match probe_partition(&ctx, year, &path).await {
                Ok(summary) => {
                    info!(year, rows = summary.rows, path = %path.display(), "registered transaction partition");
                    partitions.push(summary);
                }
                Err(e) => {
                    warn!(year, path = %path.display(), error = %e, "partition probe failed, excluded from logical relation");
                    let _ = ctx.deregister_table(table.as_str());
                }
            }
        }

        if partitions.is_empty() {
            // Keep the logical relation queryable even with zero coverage.
            let schema = Arc::new(line_item_schema());
            let empty = RecordBatch::new_empty(schema.clone());
            let table = MemTable::try_new(schema, vec![vec![empty]])
                .map_err(FyqError::execution)?;
            ctx.register_table(UNION_TABLE, Arc::new(table))
                .map_err(FyqError::execution)?;
        } else {
            let selects = partitions
                .iter()
                .map(|p| format!("SELECT * FROM {}", partition_table_name(p.fin_year)))
                .collect::<Vec<_>>()
                .join(" UNION ALL ");
            let view_sql = format!("CREATE VIEW {UNION_TABLE} AS {selects}");
            ctx.sql(&view_sql).await.map_err(FyqError::execution)?;
        }

        Ok(Self {
            ctx,
            partitions,
            default_max_rows: config.max_result_rows,
        })
    }

    /// Per-year and total statistics, from the registration-time probes.
    pub fn summary(&self) -> StoreSummary {
        StoreSummary {
            total_rows: self.partitions.iter().map(|p| p.rows).sum(),
            total_revenue: self.partitions.iter().map(|p| p.revenue).sum(),
            partitions: self.partitions.clone(),
        }
    }

    /// Fiscal years currently backing the logical relation.
    pub fn available_years(&self) -> Vec<i32> {
        self.partitions.iter().map(|p| p.fin_year).collect()
    }

    pub fn default_max_rows(&self) -> usize {
        self.default_max_rows
    }

    /// Execute a statement with out-of-band bound parameters and a mandatory
    /// row cap. This is the single execution path shared by the catalog, the
    /// convenience methods, and the guarded freeform path; parameter values
    /// never enter SQL text.
    pub async fn execute_bound(
        &self,
        sql: &str,
        params: &[(String, ParamValue)],
        max_rows: usize,
    ) -> Result<QueryResult> {
        let mut df = self.ctx.sql(sql).await.map_err(FyqError::execution)?;
        if !params.is_empty() {
            let values: HashMap<String, ScalarValue> = params
                .iter()
                .map(|(name, value)| (name.clone(), to_scalar(value)))
                .collect();
            df = df
                .with_param_values(ParamValues::Map(values))
                .map_err(FyqError::execution)?;
        }
        // Fetch one row past the cap so truncation is detectable.
        let df = df
            .limit(0, Some(max_rows + 1))
            .map_err(FyqError::execution)?;
        let batches = df.collect().await.map_err(FyqError::execution)?;
        batches_to_result(&batches, max_rows)
    }

    /// Freeform read-only statement, always routed through the SQL guard.
    /// Intended for trusted internal tooling only.
    pub async fn query(&self, sql: &str, max_rows: usize) -> Result<QueryResult> {
        validate_freeform_sql(sql)?;
        self.execute_bound(sql, &[], max_rows).await
    }

    /// Revenue per item over `[start, end)`, optional single-store filter,
    /// descending, truncated to `limit`. Tie order follows scan order and is
    /// not guaranteed stable.
    pub async fn top_items(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        store_id: Option<&str>,
        limit: usize,
    ) -> Result<QueryResult> {
        let mut conditions = vec!["sold_date >= $start", "sold_date < $end"];
        let mut params = vec![
            ("start".to_string(), ParamValue::Date(start)),
            ("end".to_string(), ParamValue::Date(end)),
        ];
        if let Some(store) = store_id {
            conditions.push("store_id = $store_id");
            params.push(("store_id".to_string(), ParamValue::from(store)));
        }
        let sql = format!(
            "SELECT item_id, MAX(item_name) AS item_name, SUM(quantity) AS quantity, \
             SUM(revenue) AS revenue FROM {UNION_TABLE} WHERE {} \
             GROUP BY item_id ORDER BY revenue DESC",
            conditions.join(" AND ")
        );
        self.execute_bound(&sql, &params, limit).await
    }

    /// Ordered time series of `{period, transactions, revenue}` for one
    /// store, bucketed by the requested grain.
    pub async fn store_trend(
        &self,
        store_id: &str,
        start: NaiveDate,
        end: NaiveDate,
        grain: TrendGrain,
    ) -> Result<QueryResult> {
        let bucket = match grain {
            TrendGrain::Daily => "sold_date",
            TrendGrain::Monthly => "date_trunc('month', sold_at)",
        };
        let sql = format!(
            "SELECT {bucket} AS period, COUNT(DISTINCT basket_id) AS transactions, \
             SUM(revenue) AS revenue FROM {UNION_TABLE} \
             WHERE store_id = $store_id AND sold_date >= $start AND sold_date < $end \
             GROUP BY {bucket} ORDER BY period"
        );
        let params = vec![
            ("store_id".to_string(), ParamValue::from(store_id)),
            ("start".to_string(), ParamValue::Date(start)),
            ("end".to_string(), ParamValue::Date(end)),
        ];
        self.execute_bound(&sql, &params, self.default_max_rows).await
    }

    /// Single-item rollup plus a per-store breakdown enriched with display
    /// names.
    pub async fn plu_performance(
        &self,
        item_id: i64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<PluPerformance> {
        let params = vec![
            ("item_id".to_string(), ParamValue::Int(item_id)),
            ("start".to_string(), ParamValue::Date(start)),
            ("end".to_string(), ParamValue::Date(end)),
        ];

        let rollup_sql = format!(
            "SELECT MAX(item_name) AS item_name, COALESCE(SUM(quantity), 0.0) AS quantity, \
             COALESCE(SUM(revenue), 0.0) AS revenue, COALESCE(SUM(margin), 0.0) AS margin \
             FROM {UNION_TABLE} \
             WHERE item_id = $item_id AND sold_date >= $start AND sold_date < $end"
        );
        let rollup = self.execute_bound(&rollup_sql, &params, 1).await?;

        let by_store_sql = format!(
            "SELECT store_id, MAX(store_name) AS store_name, SUM(quantity) AS quantity, \
             SUM(revenue) AS revenue, SUM(margin) AS margin FROM {UNION_TABLE} \
             WHERE item_id = $item_id AND sold_date >= $start AND sold_date < $end \
             GROUP BY store_id ORDER BY revenue DESC"
        );
        let by_store = self
            .execute_bound(&by_store_sql, &params, self.default_max_rows)
            .await?;

        Ok(PluPerformance {
            item_id,
            item_name: rollup
                .value(0, "item_name")
                .and_then(Value::as_str)
                .map(str::to_string),
            quantity: json_f64(rollup.value(0, "quantity")),
            revenue: json_f64(rollup.value(0, "revenue")),
            margin: json_f64(rollup.value(0, "margin")),
            by_store,
        })
    }
}

fn partition_table_name(year: i32) -> String {
    format!("tx_fy{year}")
}

/// One aggregate pass per partition: row count, revenue sum, distinct-store
/// count, and date bounds.
async fn probe_partition(
    ctx: &SessionContext,
    year: i32,
    path: &std::path::Path,
) -> Result<PartitionSummary> {
    let sql = format!(
        "SELECT COUNT(*) AS row_count, COALESCE(SUM(revenue), 0.0) AS revenue, \
         COUNT(DISTINCT store_id) AS stores, MIN(sold_date) AS first_date, \
         MAX(sold_date) AS last_date FROM {}",
        partition_table_name(year)
    );
    let df = ctx.sql(&sql).await.map_err(FyqError::execution)?;
    let batches = df.collect().await.map_err(FyqError::execution)?;
    let probe = batches_to_result(&batches, 1)?;

    Ok(PartitionSummary {
        fin_year: year,
        path: path.to_path_buf(),
        rows: json_i64(probe.value(0, "row_count")),
        revenue: json_f64(probe.value(0, "revenue")),
        stores: json_i64(probe.value(0, "stores")),
        first_date: json_date(probe.value(0, "first_date")),
        last_date: json_date(probe.value(0, "last_date")),
    })
}

fn to_scalar(value: &ParamValue) -> ScalarValue {
    match value {
        ParamValue::Date(d) => ScalarValue::Date32(Some(date32_days(*d))),
        ParamValue::Int(i) => ScalarValue::Int64(Some(*i)),
        ParamValue::Float(f) => ScalarValue::Float64(Some(*f)),
        ParamValue::Text(s) => ScalarValue::Utf8(Some(s.clone())),
    }
}

fn date32_days(date: NaiveDate) -> i32 {
    let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).expect("epoch is a valid date");
    (date - epoch).num_days() as i32
}

fn json_i64(value: Option<&Value>) -> i64 {
    value.and_then(Value::as_i64).unwrap_or(0)
}

fn json_f64(value: Option<&Value>) -> f64 {
    value.and_then(Value::as_f64).unwrap_or(0.0)
}

fn json_date(value: Option<&Value>) -> Option<NaiveDate> {
    value
        .and_then(Value::as_str)
        .and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok())
}
