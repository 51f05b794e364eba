use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One row of the precomputed fiscal calendar: exactly one per calendar date.
///
/// The source table carries ~40 descriptive columns; the engine keeps the
/// subset it resolves against. A fiscal year follows the 5-4-4 retail
/// pattern, beginning the Monday nearest 1 July, with 364 days (52 weeks) or
/// 371 days (53 weeks) in designated long years.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FiscalDay {
    pub date: NaiveDate,
    pub fin_year: i32,
    /// 1..=4
    pub fin_quarter: u32,
    /// 1..=12, fiscal month 1 is July
    pub fin_month: u32,
    /// 1..=53
    pub fin_week: u32,
    pub month_name: String,
    pub day_name: String,
    pub season: String,
    pub trading_day: bool,
}

/// Period granularity accepted by the resolver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    Year,
    Quarter,
    Month,
    Week,
}

impl Granularity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Granularity::Year => "year",
            Granularity::Quarter => "quarter",
            Granularity::Month => "month",
            Granularity::Week => "week",
        }
    }
}

impl std::str::FromStr for Granularity {
    type Err = fyq_common::FyqError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "year" => Ok(Granularity::Year),
            "quarter" => Ok(Granularity::Quarter),
            "month" => Ok(Granularity::Month),
            "week" => Ok(Granularity::Week),
            other => Err(fyq_common::FyqError::InvalidParameter(format!(
                "unsupported granularity: {other} (expected year, quarter, month, or week)"
            ))),
        }
    }
}

/// A resolved fiscal period: inclusive `start`, *exclusive* `end` (last day
/// + 1), so it plugs directly into half-open range queries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FiscalPeriod {
    pub label: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// A current period paired with its prior-year equivalent.
///
/// `prior` is `None` when no prior-year counterpart exists (week 53);
/// `caveats` is populated whenever the two years are not directly
/// comparable. Values stay directionally comparable and are never silently
/// discarded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonRange {
    pub current: FiscalPeriod,
    pub prior: Option<FiscalPeriod>,
    pub caveats: Vec<String>,
}

/// Full period context for a single date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayContext {
    pub date: NaiveDate,
    pub fin_year: i32,
    pub fin_quarter: u32,
    pub fin_month: u32,
    pub fin_week: u32,
    pub month_name: String,
    pub day_name: String,
    pub season: String,
    pub trading_day: bool,
}

impl From<&FiscalDay> for DayContext {
    fn from(d: &FiscalDay) -> Self {
        DayContext {
            date: d.date,
            fin_year: d.fin_year,
            fin_quarter: d.fin_quarter,
            fin_month: d.fin_month,
            fin_week: d.fin_week,
            month_name: d.month_name.clone(),
            day_name: d.day_name.clone(),
            season: d.season.clone(),
            trading_day: d.trading_day,
        }
    }
}
