//! Shared fixture builders: synthetic fiscal calendar CSVs and parquet
//! transaction partitions written into per-test temp directories.

use std::fs::File;
use std::path::Path;
use std::sync::Arc;

use arrow::array::{
    Date32Array, Float64Array, Int32Array, Int64Array, RecordBatch, StringArray,
    TimestampMicrosecondArray,
};
use chrono::{Datelike, Days, NaiveDate, Weekday};
use fyq_calendar::FiscalDay;
use fyq_store::line_item_schema;
use parquet::arrow::ArrowWriter;

pub const MONTH_NAMES: [&str; 12] = [
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

const SEASONS: [&str; 12] = [
    "Winter", "Winter", "Spring", "Spring", "Spring", "Summer", "Summer", "Summer", "Autumn",
    "Autumn", "Autumn", "Winter",
];

fn month_of_week(week: u32) -> u32 {
    let weeks_per_month = [5u32, 4, 4, 5, 4, 4, 5, 4, 4, 5, 4, 4];
    let mut upto = 0;
    for (i, w) in weeks_per_month.iter().enumerate() {
        upto += w;
        if week <= upto {
            return i as u32 + 1;
        }
    }
    12
}

/// 364 days of one regular fiscal year, 5-4-4 pattern, starting on `start`
/// (a Monday).
pub fn fiscal_year_days(start: NaiveDate, year: i32) -> Vec<FiscalDay> {
    (0..364)
        .map(|i| {
            let date = start + Days::new(i as u64);
            let week = i as u32 / 7 + 1;
            let month = month_of_week(week);
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

/// FY2023 starting 2022-07-04 and FY2024 starting 2023-07-03, both 52
/// weeks, written as a calendar CSV.
pub fn write_calendar_csv(path: &Path) {
    let mut writer = csv::Writer::from_path(path).unwrap();
    let fy2023 = fiscal_year_days(NaiveDate::from_ymd_opt(2022, 7, 4).unwrap(), 2023);
    let fy2024 = fiscal_year_days(NaiveDate::from_ymd_opt(2023, 7, 3).unwrap(), 2024);
    for day in fy2023.into_iter().chain(fy2024) {
        writer.serialize(day).unwrap();
    }
    writer.flush().unwrap();
}

/// One transaction line item destined for a parquet partition.
pub struct Tx {
    pub fin_year: i32,
    pub fin_week: i32,
    pub sold_date: NaiveDate,
    pub store_id: &'static str,
    pub store_name: &'static str,
    pub item_id: i64,
    pub item_name: &'static str,
    pub dept_code: &'static str,
    pub category_code: &'static str,
    pub channel: &'static str,
    pub basket_id: String,
    pub customer_id: Option<&'static str>,
    pub quantity: f64,
    pub revenue: f64,
    pub margin: f64,
}

/// Minimal line with sensible defaults; tests override the fields they
/// assert on.
pub fn tx(
    fin_year: i32,
    fin_week: i32,
    sold_date: NaiveDate,
    store_id: &'static str,
    item_id: i64,
    item_name: &'static str,
    revenue: f64,
    basket_id: impl Into<String>,
) -> Tx {
    Tx {
        fin_year,
        fin_week,
        sold_date,
        store_id,
        store_name: "Store",
        item_id,
        item_name,
        dept_code: "GR",
        category_code: "GR-01",
        channel: "instore",
        basket_id: basket_id.into(),
        customer_id: Some("C1"),
        quantity: 1.0,
        revenue,
        margin: revenue * 0.2,
    }
}

fn date32(date: NaiveDate) -> i32 {
    let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).unwrap();
    (date - epoch).num_days() as i32
}

/// Write a parquet partition with the engine's line-item schema.
pub fn write_partition(path: &Path, rows: &[Tx]) {
    let schema = Arc::new(line_item_schema());
    let micros_per_day = 86_400_000_000i64;
    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(Int32Array::from_iter_values(rows.iter().map(|r| r.fin_year))),
            Arc::new(Int32Array::from_iter_values(rows.iter().map(|r| r.fin_week))),
            Arc::new(Date32Array::from_iter_values(
                rows.iter().map(|r| date32(r.sold_date)),
            )),
            Arc::new(TimestampMicrosecondArray::from_iter_values(
                // midday, so truncation tests stay on the same date
                rows.iter()
                    .map(|r| date32(r.sold_date) as i64 * micros_per_day + micros_per_day / 2),
            )),
            Arc::new(StringArray::from_iter_values(
                rows.iter().map(|r| r.store_id),
            )),
            Arc::new(StringArray::from_iter_values(
                rows.iter().map(|r| r.store_name),
            )),
            Arc::new(Int64Array::from_iter_values(rows.iter().map(|r| r.item_id))),
            Arc::new(StringArray::from_iter_values(
                rows.iter().map(|r| r.item_name),
            )),
            Arc::new(StringArray::from_iter_values(
                rows.iter().map(|r| r.dept_code),
            )),
            Arc::new(StringArray::from_iter_values(
                rows.iter().map(|r| r.category_code),
            )),
            Arc::new(StringArray::from_iter_values(
                rows.iter().map(|r| r.channel),
            )),
            Arc::new(StringArray::from_iter_values(
                rows.iter().map(|r| r.basket_id.as_str()),
            )),
            Arc::new(StringArray::from_iter(rows.iter().map(|r| r.customer_id))),
            Arc::new(Float64Array::from_iter_values(
                rows.iter().map(|r| r.quantity),
            )),
            Arc::new(Float64Array::from_iter_values(
                rows.iter().map(|r| r.revenue),
            )),
            Arc::new(Float64Array::from_iter_values(
                rows.iter().map(|r| r.margin),
            )),
        ],
    )
    .unwrap();

    let file = File::create(path).unwrap();
    let mut writer = ArrowWriter::try_new(file, schema, None).unwrap();
    writer.write(&batch).unwrap();
    writer.close().unwrap();
}
