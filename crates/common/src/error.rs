use thiserror::Error;

/// Canonical FYQ error taxonomy used across crates.
///
/// Classification guidance:
/// - [`FyqError::UnknownQuery`]: catalog miss — the catalog is a closed, enumerable namespace
/// - [`FyqError::InvalidParameter`]: missing required parameter, unknown parameter, or bad enum value
/// - [`FyqError::RejectedSql`]: a freeform statement failed the read-only SQL guard
/// - [`FyqError::PeriodNotFound`]: valid fiscal year but no matching ordinal (e.g. week 53 of a 52-week year)
/// - [`FyqError::InvalidConfig`]: partition-root/config contract violations
/// - [`FyqError::Execution`]: runtime query execution or decode failures
/// - [`FyqError::Io`]: raw filesystem IO failures from std APIs
///
/// Calendar lookups never produce errors: they degrade to empty/`None` values
/// because they feed rendering paths where a crash is worse than a blank result.
/// Partition unavailability is likewise not an error; it narrows the logical
/// relation and is visible through the store summary.
#[derive(Debug, Error)]
pub enum FyqError {
    /// Requested catalog query name does not exist.
    #[error("unknown catalog query: {0}")]
    UnknownQuery(String),

    /// Supplied parameters violate the declared contract.
    ///
    /// Examples:
    /// - missing required parameter
    /// - parameter not declared by the query
    /// - unsupported trend grain
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Freeform statement is not unambiguously a single read-only SELECT.
    #[error("rejected sql: {0}")]
    RejectedSql(String),

    /// A symbolic period could not be resolved against the loaded calendar.
    #[error("period not found: {0}")]
    PeriodNotFound(String),

    /// Invalid or inconsistent configuration state.
    ///
    /// Examples:
    /// - a partition root that exists but is not a directory
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Runtime execution failures after validation succeeded.
    ///
    /// Examples:
    /// - query planning/execution errors from the columnar engine
    /// - result decode failures
    #[error("execution error: {0}")]
    Execution(String),

    /// Transparent std IO failures.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl FyqError {
    /// Wrap an execution-layer error with its display form.
    pub fn execution(e: impl std::fmt::Display) -> Self {
        FyqError::Execution(e.to_string())
    }
}

/// Standard FYQ result alias.
pub type Result<T> = std::result::Result<T, FyqError>;
