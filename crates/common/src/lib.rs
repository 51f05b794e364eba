//! Shared configuration, error types, and result shapes for FYQ crates.
//!
//! Architecture role:
//! - defines engine configuration passed across layers
//! - provides common [`FyqError`] / [`Result`] contracts
//! - hosts the typed parameter values and row/record result types that make
//!   up the engine's external contract
//!
//! Key modules:
//! - [`config`]
//! - [`error`]
//! - [`params`]
//! - [`rows`]

pub mod config;
pub mod error;
pub mod params;
pub mod rows;

pub use config::EngineConfig;
pub use error::{FyqError, Result};
pub use params::{ParamKind, ParamValue};
pub use rows::{ColumnInfo, QueryResult};
