//! The FYQ engine facade: one handle combining the fiscal calendar, the
//! partition-backed store, and the named-query catalog.
//!
//! Architecture role:
//! - opens the calendar and store once and shares them per process
//! - translates symbolic fiscal periods into half-open date ranges before
//!   execution, turning an unresolvable period into
//!   [`FyqError::PeriodNotFound`] at this boundary
//! - routes all catalog and freeform execution through the store's single
//!   bound-parameter path

use std::collections::HashMap;
use std::sync::Arc;

use fyq_calendar::{ComparisonRange, DayContext, FiscalCalendar, FiscalPeriod, Granularity};
use fyq_catalog::QueryCatalog;
use fyq_common::{EngineConfig, FyqError, ParamValue, QueryResult, Result};
use fyq_store::{Store, StoreSummary};
use tracing::warn;

/// Read-only analytic engine over the fiscal-year transaction partitions.
///
/// Construction is the only fallible-expensive step; afterwards the engine is
/// immutable and safe to share across tasks.
pub struct Engine {
    calendar: Arc<FiscalCalendar>,
    catalog: QueryCatalog,
    store: Store,
}

impl Engine {
    /// Open the engine: load the fiscal calendar and register every
    /// resolvable partition.
    ///
    /// A missing calendar source degrades to an empty calendar (period
    /// resolution will report `PeriodNotFound`); missing partitions narrow
    /// the logical relation. Neither is fatal here.
    pub async fn open(config: &EngineConfig) -> Result<Self> {
        let calendar = Arc::new(FiscalCalendar::load(&config.calendar_path));
        if calendar.is_empty() {
            warn!(
                path = %config.calendar_path.display(),
                "fiscal calendar unavailable; period resolution is disabled"
            );
        }
        let store = Store::open(config).await?;
        Ok(Self {
            calendar,
            catalog: QueryCatalog::builtin(),
            store,
        })
    }

    pub fn calendar(&self) -> &FiscalCalendar {
        &self.calendar
    }

    pub fn catalog(&self) -> &QueryCatalog {
        &self.catalog
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Per-partition availability and totals.
    pub fn summary(&self) -> StoreSummary {
        self.store.summary()
    }

    /// Execute a named catalog query with typed parameters.
    pub async fn run(
        &self,
        name: &str,
        params: HashMap<String, ParamValue>,
    ) -> Result<QueryResult> {
        let prepared = self.catalog.prepare(name, &params)?;
        let max_rows = prepared
            .limit
            .unwrap_or_else(|| self.store.default_max_rows());
        self.store
            .execute_bound(&prepared.sql, &prepared.params, max_rows)
            .await
    }

    /// Execute a named catalog query over a symbolic fiscal period: the
    /// period's half-open bounds are injected as the `start`/`end`
    /// parameters.
    pub async fn run_in_period(
        &self,
        name: &str,
        granularity: Granularity,
        year: i32,
        ordinal: Option<u32>,
        mut params: HashMap<String, ParamValue>,
    ) -> Result<QueryResult> {
        let period = self.period(granularity, year, ordinal)?;
        params.insert("start".to_string(), ParamValue::Date(period.start));
        params.insert("end".to_string(), ParamValue::Date(period.end));
        self.run(name, params).await
    }

    /// Guarded freeform read-only statement.
    pub async fn query(&self, sql: &str) -> Result<QueryResult> {
        self.store.query(sql, self.store.default_max_rows()).await
    }

    /// Resolve a symbolic fiscal period, or report why it cannot be
    /// resolved. The calendar itself degrades to `None`; this boundary is
    /// where the absence becomes an error the caller can act on.
    pub fn period(
        &self,
        granularity: Granularity,
        year: i32,
        ordinal: Option<u32>,
    ) -> Result<FiscalPeriod> {
        self.calendar
            .period_range(granularity, year, ordinal)
            .ok_or_else(|| FyqError::PeriodNotFound(describe_period(granularity, year, ordinal)))
    }

    /// Pair a period with its prior-year equivalent, caveats included.
    pub fn comparison(
        &self,
        granularity: Granularity,
        ordinal: u32,
        year: i32,
    ) -> Result<ComparisonRange> {
        self.calendar
            .comparison_range(granularity, ordinal, year)
            .ok_or_else(|| {
                FyqError::PeriodNotFound(describe_period(granularity, year, Some(ordinal)))
            })
    }

    /// Fiscal context for a date, if it falls inside the loaded calendar.
    pub fn day_context(&self, date: chrono::NaiveDate) -> Option<DayContext> {
        self.calendar.day_context(date)
    }
}

fn describe_period(granularity: Granularity, year: i32, ordinal: Option<u32>) -> String {
    match (granularity, ordinal) {
        (Granularity::Year, _) => format!("FY{year}"),
        (g, Some(o)) => format!("FY{year} {} {o}", g.as_str()),
        (g, None) => format!("FY{year} {} (ordinal required)", g.as_str()),
    }
}
