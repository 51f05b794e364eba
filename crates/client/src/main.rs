//! `fyq` — command-line front end for the FYQ analytics engine.
//!
//! Every subcommand prints a JSON document on stdout; diagnostics go to
//! stderr via `tracing` so output stays pipeable.

use std::collections::HashMap;
use std::path::PathBuf;
use std::process::ExitCode;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use fyq_calendar::Granularity;
use fyq_client::Engine;
use fyq_common::{EngineConfig, ParamValue, Result};
use fyq_store::TrendGrain;
use serde_json::json;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "fyq", version, about = "Fiscal-year analytic queries over POS transaction partitions")]
struct Cli {
    /// Local partition root, preferred over the canonical root.
    #[arg(long)]
    local_root: Option<PathBuf>,

    /// Canonical (shared) partition root.
    #[arg(long)]
    canonical_root: Option<PathBuf>,

    /// Precomputed fiscal calendar CSV.
    #[arg(long)]
    calendar: Option<PathBuf>,

    /// Row cap applied to every result.
    #[arg(long)]
    max_rows: Option<usize>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Partition availability and per-year totals.
    Summary,
    /// List the named queries in the catalog.
    List,
    /// Run a named catalog query.
    Run {
        name: String,
        /// Typed parameter, `key=value`. Values parse as date, int, float,
        /// then text.
        #[arg(short, long = "param", value_parser = parse_key_value)]
        params: Vec<(String, ParamValue)>,
        /// Resolve a fiscal period and inject it as start/end, e.g.
        /// `--period week:2024:7` or `--period year:2024`.
        #[arg(long, value_parser = parse_period)]
        period: Option<PeriodRef>,
    },
    /// Execute a freeform read-only SELECT (guarded).
    Query { sql: String },
    /// Resolve a symbolic fiscal period to concrete dates.
    Period {
        granularity: Granularity,
        year: i32,
        ordinal: Option<u32>,
    },
    /// Pair a fiscal period with its prior-year equivalent.
    Compare {
        granularity: Granularity,
        ordinal: u32,
        year: i32,
    },
    /// Fiscal context for a date (defaults to today).
    Context { date: Option<NaiveDate> },
    /// Transaction/revenue time series for one store.
    Trend {
        store_id: String,
        start: NaiveDate,
        end: NaiveDate,
        #[arg(long, default_value = "daily")]
        grain: TrendGrain,
    },
    /// Single-item rollup with per-store breakdown.
    Plu {
        item_id: i64,
        start: NaiveDate,
        end: NaiveDate,
    },
}

#[derive(Clone, Debug)]
struct PeriodRef {
    granularity: Granularity,
    year: i32,
    ordinal: Option<u32>,
}

fn parse_key_value(raw: &str) -> std::result::Result<(String, ParamValue), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got {raw}"))?;
    if key.is_empty() {
        return Err(format!("empty parameter name in {raw}"));
    }
    Ok((key.to_string(), ParamValue::parse_literal(value)))
}

fn parse_period(raw: &str) -> std::result::Result<PeriodRef, String> {
    let mut parts = raw.split(':');
    let granularity: Granularity = parts
        .next()
        .unwrap_or_default()
        .parse()
        .map_err(|e| format!("{e}"))?;
    let year = parts
        .next()
        .ok_or_else(|| format!("missing year in {raw}"))?
        .parse::<i32>()
        .map_err(|e| format!("bad year in {raw}: {e}"))?;
    let ordinal = match parts.next() {
        Some(o) => Some(
            o.parse::<u32>()
                .map_err(|e| format!("bad ordinal in {raw}: {e}"))?,
        ),
        None => None,
    };
    if parts.next().is_some() {
        return Err(format!("too many fields in {raw}"));
    }
    Ok(PeriodRef {
        granularity,
        year,
        ordinal,
    })
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match execute(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn execute(cli: Cli) -> Result<()> {
    let mut config = EngineConfig::default();
    if let Some(root) = cli.local_root {
        config.local_root = root;
    }
    if let Some(root) = cli.canonical_root {
        config.canonical_root = root;
    }
    if let Some(path) = cli.calendar {
        config.calendar_path = path;
    }
    if let Some(n) = cli.max_rows {
        config.max_result_rows = n;
    }

    let engine = Engine::open(&config).await?;

    let output = match cli.command {
        Command::Summary => serde_json::to_value(engine.summary())
            .map_err(fyq_common::FyqError::execution)?,
        Command::List => json!(engine
            .catalog()
            .entries()
            .iter()
            .map(|e| {
                json!({
                    "name": e.name,
                    "domain": e.domain,
                    "description": e.description,
                    "params": e.params.iter().map(|p| json!({
                        "name": p.name,
                        "kind": p.kind.to_string(),
                        "required": p.required,
                    })).collect::<Vec<_>>(),
                })
            })
            .collect::<Vec<_>>()),
        Command::Run {
            name,
            params,
            period,
        } => {
            let params: HashMap<String, ParamValue> = params.into_iter().collect();
            let result = match period {
                Some(p) => {
                    engine
                        .run_in_period(&name, p.granularity, p.year, p.ordinal, params)
                        .await?
                }
                None => engine.run(&name, params).await?,
            };
            serde_json::to_value(result).map_err(fyq_common::FyqError::execution)?
        }
        Command::Query { sql } => {
            serde_json::to_value(engine.query(&sql).await?)
                .map_err(fyq_common::FyqError::execution)?
        }
        Command::Period {
            granularity,
            year,
            ordinal,
        } => serde_json::to_value(engine.period(granularity, year, ordinal)?)
            .map_err(fyq_common::FyqError::execution)?,
        Command::Compare {
            granularity,
            ordinal,
            year,
        } => serde_json::to_value(engine.comparison(granularity, ordinal, year)?)
            .map_err(fyq_common::FyqError::execution)?,
        Command::Context { date } => {
            let context = match date {
                Some(d) => engine.day_context(d),
                None => engine.calendar().current_period(),
            };
            serde_json::to_value(context).map_err(fyq_common::FyqError::execution)?
        }
        Command::Trend {
            store_id,
            start,
            end,
            grain,
        } => serde_json::to_value(engine.store().store_trend(&store_id, start, end, grain).await?)
            .map_err(fyq_common::FyqError::execution)?,
        Command::Plu {
            item_id,
            start,
            end,
        } => serde_json::to_value(engine.store().plu_performance(item_id, start, end).await?)
            .map_err(fyq_common::FyqError::execution)?,
    };

    println!("{}", serde_json::to_string_pretty(&output).map_err(fyq_common::FyqError::execution)?);
    Ok(())
}
