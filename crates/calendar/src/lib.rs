//! Fiscal calendar resolver.
//!
//! Loads the precomputed calendar table (one row per calendar date, ~11
//! fiscal years) and answers period-boundary and year-over-year comparison
//! questions against the 5-4-4 retail calendar, including 53-week years.
//!
//! Failure semantics: every lookup degrades to an empty/`None` value rather
//! than raising; callers render these results directly.

pub mod model;
pub mod resolver;

pub use model::{ComparisonRange, DayContext, FiscalDay, FiscalPeriod, Granularity};
pub use resolver::{FiscalCalendar, LONG_YEAR_DAYS, SHORT_YEAR_DAYS};
