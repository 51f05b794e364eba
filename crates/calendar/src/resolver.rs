use std::collections::BTreeSet;
use std::path::Path;

use chrono::{Days, NaiveDate};
use tracing::warn;

use crate::model::{ComparisonRange, DayContext, FiscalDay, FiscalPeriod, Granularity};

/// Day count of a regular 52-week fiscal year.
pub const SHORT_YEAR_DAYS: usize = 364;
/// Day count of a long 53-week fiscal year.
pub const LONG_YEAR_DAYS: usize = 371;

/// The immutable fiscal calendar table.
///
/// Constructed once at startup and shared via `Arc`; there is no hidden
/// global cache. An empty calendar means "calendar unavailable", not "zero
/// periods" — every lookup on it degrades to `None`/empty rather than
/// raising, since results feed rendering paths directly.
#[derive(Debug, Clone, Default)]
pub struct FiscalCalendar {
    days: Vec<FiscalDay>,
}

impl FiscalCalendar {
    /// Build a calendar from explicit rows. Rows are sorted by date; the
    /// source is expected to hold exactly one row per date.
    pub fn from_days(mut days: Vec<FiscalDay>) -> Self {
        days.sort_by_key(|d| d.date);
        Self { days }
    }

    /// Load the calendar from a precomputed CSV source.
    ///
    /// A missing or empty source logs a warning and yields an empty
    /// calendar; callers must treat "empty" as "calendar unavailable".
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let mut reader = match csv::Reader::from_path(path) {
            Ok(r) => r,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "fiscal calendar source unavailable");
                return Self::default();
            }
        };

        let mut days = Vec::new();
        for record in reader.deserialize::<FiscalDay>() {
            match record {
                Ok(day) => days.push(day),
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "skipping malformed calendar row");
                }
            }
        }
        if days.is_empty() {
            warn!(path = %path.display(), "fiscal calendar source is empty");
        }
        Self::from_days(days)
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    pub fn len(&self) -> usize {
        self.days.len()
    }

    /// Sorted list of fiscal years present in the calendar.
    pub fn years(&self) -> Vec<i32> {
        self.days
            .iter()
            .map(|d| d.fin_year)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    fn year_day_count(&self, year: i32) -> usize {
        self.days.iter().filter(|d| d.fin_year == year).count()
    }

    /// Whether `year` is a designated 53-week year. Membership is derived
    /// from the loaded table (371-day years), so it never disagrees with the
    /// data.
    pub fn is_long_year(&self, year: i32) -> bool {
        self.year_day_count(year) == LONG_YEAR_DAYS
    }

    /// Resolve a symbolic period to concrete bounds.
    ///
    /// For [`Granularity::Year`] the ordinal is ignored; every other
    /// granularity requires one. Returns `None` when the period does not
    /// exist in the calendar (e.g. week 53 of a 52-week year), never an
    /// error.
    pub fn period_range(
        &self,
        granularity: Granularity,
        year: i32,
        ordinal: Option<u32>,
    ) -> Option<FiscalPeriod> {
        let ordinal = match granularity {
            Granularity::Year => None,
            _ => Some(ordinal?),
        };

        let mut first: Option<NaiveDate> = None;
        let mut last: Option<NaiveDate> = None;
        for day in self.days.iter().filter(|d| d.fin_year == year) {
            let matched = match (granularity, ordinal) {
                (Granularity::Year, _) => true,
                (Granularity::Quarter, Some(o)) => day.fin_quarter == o,
                (Granularity::Month, Some(o)) => day.fin_month == o,
                (Granularity::Week, Some(o)) => day.fin_week == o,
                _ => false,
            };
            if matched {
                first = Some(first.map_or(day.date, |f: NaiveDate| f.min(day.date)));
                last = Some(last.map_or(day.date, |l: NaiveDate| l.max(day.date)));
            }
        }

        let start = first?;
        let end = last?.checked_add_days(Days::new(1))?;
        let label = match (granularity, ordinal) {
            (Granularity::Year, _) => format!("FY{year}"),
            (Granularity::Quarter, Some(o)) => format!("FY{year} Q{o}"),
            (Granularity::Month, Some(o)) => format!("FY{year} M{o:02}"),
            (Granularity::Week, Some(o)) => format!("FY{year} W{o:02}"),
            _ => unreachable!("non-year granularity always carries an ordinal here"),
        };
        Some(FiscalPeriod { label, start, end })
    }

    /// Pair a period with its prior-year equivalent, with explicit caveats.
    ///
    /// Week 53 short-circuits with `prior = None`: a 53-week year has no
    /// analog week in adjacent years. When exactly one of the two years is
    /// long, both periods are still returned with a week-misalignment
    /// caveat — directionally comparable values must not be silently
    /// discarded.
    pub fn comparison_range(
        &self,
        granularity: Granularity,
        ordinal: u32,
        year: i32,
    ) -> Option<ComparisonRange> {
        let ord = match granularity {
            Granularity::Year => None,
            _ => Some(ordinal),
        };
        let current = self.period_range(granularity, year, ord)?;

        let prior_year = year - 1;
        let mut caveats = Vec::new();

        let prior = if granularity == Granularity::Week && ordinal == 53 {
            caveats.push(format!(
                "week 53 of FY{year} has no prior-year equivalent; comparison omitted"
            ));
            None
        } else {
            let prior = self.period_range(granularity, prior_year, ord);
            if prior.is_none() {
                caveats.push(format!(
                    "FY{prior_year} has no matching {} {ordinal} in the loaded calendar",
                    granularity.as_str()
                ));
            }
            prior
        };

        let years = self.years();
        if years.contains(&year) && years.contains(&prior_year) {
            let cur_long = self.is_long_year(year);
            let prior_long = self.is_long_year(prior_year);
            if cur_long != prior_long {
                let (long, short) = if cur_long {
                    (year, prior_year)
                } else {
                    (prior_year, year)
                };
                caveats.push(format!(
                    "FY{long} has 53 weeks while FY{short} has 52; week alignment shifts and totals are not strictly comparable"
                ));
            }
        }

        Some(ComparisonRange {
            current,
            prior,
            caveats,
        })
    }

    /// Full period context for a given date; `None` when the date falls
    /// outside the loaded range.
    pub fn day_context(&self, date: NaiveDate) -> Option<DayContext> {
        self.days
            .binary_search_by_key(&date, |d| d.date)
            .ok()
            .map(|idx| DayContext::from(&self.days[idx]))
    }

    /// Period context for "today" in local time.
    pub fn current_period(&self) -> Option<DayContext> {
        self.day_context(chrono::Local::now().date_naive())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Weekday};

    const MONTH_NAMES: [&str; 12] = [
        "July",
        "August",
        "September",
        "October",
        "November",
        "December",
        "January",
        "February",
        "March",
        "April",
        "May",
        "June",
    ];

    // Southern-hemisphere retail seasons, indexed by fiscal month.
    const SEASONS: [&str; 12] = [
        "Winter", "Winter", "Spring", "Spring", "Spring", "Summer", "Summer", "Summer", "Autumn",
        "Autumn", "Autumn", "Winter",
    ];

    fn month_of_week(week: u32, long: bool) -> u32 {
        let mut weeks_per_month = [5u32, 4, 4, 5, 4, 4, 5, 4, 4, 5, 4, 4];
        if long {
            weeks_per_month[11] += 1;
        }
        let mut upto = 0;
        for (i, w) in weeks_per_month.iter().enumerate() {
            upto += w;
            if week <= upto {
                return i as u32 + 1;
            }
        }
        12
    }

    fn synth_year(start: NaiveDate, year: i32, long: bool) -> Vec<FiscalDay> {
        let total = if long { LONG_YEAR_DAYS } else { SHORT_YEAR_DAYS };
        (0..total)
            .map(|i| {
                let date = start + Days::new(i as u64);
                let week = i as u32 / 7 + 1;
                let month = month_of_week(week, long);
                FiscalDay {
                    date,
                    fin_year: year,
                    fin_quarter: (month - 1) / 3 + 1,
                    fin_month: month,
                    fin_week: week,
                    month_name: MONTH_NAMES[month as usize - 1].to_string(),
                    day_name: date.weekday().to_string(),
                    season: SEASONS[month as usize - 1].to_string(),
                    trading_day: date.weekday() != Weekday::Sun,
                }
            })
            .collect()
    }

    /// FY2014..FY2024, long years {2016, 2022}, first year starting Monday
    /// 2013-07-01.
    fn synth_calendar() -> FiscalCalendar {
        let mut start = NaiveDate::from_ymd_opt(2013, 7, 1).unwrap();
        let mut days = Vec::new();
        for year in 2014..=2024 {
            let long = year == 2016 || year == 2022;
            let rows = synth_year(start, year, long);
            start = rows.last().unwrap().date + Days::new(1);
            days.extend(rows);
        }
        FiscalCalendar::from_days(days)
    }

    #[test]
    fn day_counts_are_364_or_371() {
        let cal = synth_calendar();
        for year in cal.years() {
            let expected = if cal.is_long_year(year) {
                LONG_YEAR_DAYS
            } else {
                SHORT_YEAR_DAYS
            };
            assert_eq!(cal.year_day_count(year), expected, "FY{year}");
        }
    }

    #[test]
    fn designated_long_years() {
        let cal = synth_calendar();
        assert!(cal.is_long_year(2016));
        assert!(cal.is_long_year(2022));
        assert!(!cal.is_long_year(2020));
        assert!(!cal.is_long_year(1999));
    }

    #[test]
    fn quarters_partition_the_year() {
        let cal = synth_calendar();
        for year in cal.years() {
            let whole = cal.period_range(Granularity::Year, year, None).unwrap();
            let mut cursor = whole.start;
            for q in 1..=4 {
                let quarter = cal
                    .period_range(Granularity::Quarter, year, Some(q))
                    .unwrap();
                assert!(quarter.end > quarter.start);
                assert_eq!(quarter.start, cursor, "FY{year} Q{q} gap/overlap");
                cursor = quarter.end;
            }
            assert_eq!(cursor, whole.end, "FY{year} quarters must cover the year");
        }
    }

    #[test]
    fn week_53_exists_only_in_long_years() {
        let cal = synth_calendar();
        assert!(cal
            .period_range(Granularity::Week, 2016, Some(53))
            .is_some());
        assert!(cal
            .period_range(Granularity::Week, 2020, Some(53))
            .is_none());
    }

    #[test]
    fn ordinal_is_required_below_year_granularity() {
        let cal = synth_calendar();
        assert!(cal.period_range(Granularity::Week, 2016, None).is_none());
        assert!(cal.period_range(Granularity::Year, 2016, Some(7)).is_some());
    }

    #[test]
    fn week_periods_are_seven_days() {
        let cal = synth_calendar();
        let week = cal.period_range(Granularity::Week, 2018, Some(9)).unwrap();
        assert_eq!((week.end - week.start).num_days(), 7);
        assert_eq!(week.label, "FY2018 W09");
    }

    #[test]
    fn week_53_comparison_has_no_prior_and_a_caveat() {
        let cal = synth_calendar();
        for year in [2016, 2022] {
            let cmp = cal.comparison_range(Granularity::Week, 53, year).unwrap();
            assert!(cmp.prior.is_none());
            assert!(!cmp.caveats.is_empty());
        }
    }

    #[test]
    fn long_short_mismatch_always_carries_a_caveat() {
        let cal = synth_calendar();
        // 2016 long vs 2015 short, and 2017 short vs 2016 long.
        for (g, o, y) in [
            (Granularity::Week, 1, 2016),
            (Granularity::Quarter, 2, 2017),
            (Granularity::Month, 3, 2022),
            (Granularity::Year, 1, 2023),
        ] {
            let cmp = cal.comparison_range(g, o, y).unwrap();
            assert!(
                cmp.caveats.iter().any(|c| c.contains("53 weeks")),
                "missing mismatch caveat for {g:?} {o} FY{y}"
            );
            assert!(cmp.prior.is_some());
        }
    }

    #[test]
    fn aligned_years_compare_without_caveats() {
        let cal = synth_calendar();
        let cmp = cal.comparison_range(Granularity::Week, 4, 2019).unwrap();
        assert!(cmp.prior.is_some());
        assert!(cmp.caveats.is_empty());
    }

    #[test]
    fn day_context_outside_range_is_none() {
        let cal = synth_calendar();
        assert!(cal
            .day_context(NaiveDate::from_ymd_opt(1990, 1, 1).unwrap())
            .is_none());
        let inside = cal
            .day_context(NaiveDate::from_ymd_opt(2013, 7, 1).unwrap())
            .unwrap();
        assert_eq!(inside.fin_year, 2014);
        assert_eq!(inside.fin_week, 1);
        assert_eq!(inside.month_name, "July");
    }

    #[test]
    fn missing_source_degrades_to_empty() {
        let cal = FiscalCalendar::load("/nonexistent/fiscal_calendar.csv");
        assert!(cal.is_empty());
        assert!(cal.years().is_empty());
        assert!(cal
            .period_range(Granularity::Week, 2020, Some(1))
            .is_none());
        assert!(cal.comparison_range(Granularity::Week, 1, 2020).is_none());
    }

    #[test]
    fn csv_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("calendar.csv");
        let mut writer = csv::Writer::from_path(&path).unwrap();
        for day in synth_year(NaiveDate::from_ymd_opt(2013, 7, 1).unwrap(), 2014, false) {
            writer.serialize(day).unwrap();
        }
        writer.flush().unwrap();

        let cal = FiscalCalendar::load(&path);
        assert_eq!(cal.len(), SHORT_YEAR_DAYS);
        assert_eq!(cal.years(), vec![2014]);
        let q1 = cal.period_range(Granularity::Quarter, 2014, Some(1)).unwrap();
        assert_eq!((q1.end - q1.start).num_days(), 13 * 7);
    }
}
