use fyq_common::{FyqError, Result};
use sqlparser::ast::{Query, SetExpr, Statement};
use sqlparser::dialect::GenericDialect;
use sqlparser::parser::Parser;

/// Leading clauses that always mark a mutating statement.
const MUTATING_KEYWORDS: [&str; 6] = ["INSERT", "UPDATE", "DELETE", "DROP", "CREATE", "ALTER"];

/// Conservative allow-list validation for the freeform query path.
///
/// Passes only a syntactically single SELECT (or `WITH ... SELECT`)
/// statement with no trailing statement separator and no `SELECT ... INTO`.
/// This is not a full trust boundary: it rejects anything it cannot
/// confidently classify as read-only, because a false rejection costs
/// usability while a false acceptance risks the shared data store.
pub fn validate_freeform_sql(sql: &str) -> Result<()> {
    let trimmed = sql.trim();
    if trimmed.is_empty() {
        return Err(FyqError::RejectedSql("empty statement".to_string()));
    }
    if trimmed.ends_with(';') {
        return Err(FyqError::RejectedSql(
            "trailing statement separator is not allowed".to_string(),
        ));
    }

    let leading = trimmed
        .split_whitespace()
        .next()
        .unwrap_or("")
        .to_ascii_uppercase();
    if MUTATING_KEYWORDS.contains(&leading.as_str()) {
        return Err(FyqError::RejectedSql(format!(
            "{leading} statements are not permitted on the read-only store"
        )));
    }

    let statements = Parser::parse_sql(&GenericDialect {}, trimmed)
        .map_err(|e| FyqError::RejectedSql(format!("statement does not parse: {e}")))?;
    if statements.len() != 1 {
        return Err(FyqError::RejectedSql(format!(
            "expected exactly one statement, found {}",
            statements.len()
        )));
    }

    match &statements[0] {
        Statement::Query(query) => reject_select_into(query),
        other => Err(FyqError::RejectedSql(format!(
            "only SELECT statements are permitted, found: {}",
            statement_kind(other)
        ))),
    }
}

fn reject_select_into(query: &Query) -> Result<()> {
    set_expr_is_read_only(&query.body)
}

fn set_expr_is_read_only(body: &SetExpr) -> Result<()> {
    match body {
        SetExpr::Select(select) => {
            if select.into.is_some() {
                return Err(FyqError::RejectedSql(
                    "SELECT INTO is not permitted".to_string(),
                ));
            }
            Ok(())
        }
        SetExpr::Query(inner) => reject_select_into(inner),
        SetExpr::SetOperation { left, right, .. } => {
            set_expr_is_read_only(left)?;
            set_expr_is_read_only(right)
        }
        SetExpr::Values(_) => Ok(()),
        other => Err(FyqError::RejectedSql(format!(
            "statement shape cannot be classified as read-only: {other}"
        ))),
    }
}

fn statement_kind(stmt: &Statement) -> String {
    stmt.to_string()
        .split_whitespace()
        .next()
        .unwrap_or("unknown")
        .to_ascii_uppercase()
}
