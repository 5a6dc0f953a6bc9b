//! Statement execution.
//!
//! Apply mode runs the whole plan inside one transaction. The first
//! failing statement aborts and rolls everything back, so a partially
//! applied schema is never left behind.

use crate::pg::connection::PgConnection;
use crate::util::{Result, SchemaError};
use sqlx::Executor;

/// Executes the statements in a single transaction, returning how many
/// ran. On error the transaction rolls back and the failing statement is
/// reported with its index.
pub async fn execute_plan(conn: &PgConnection, statements: &[String]) -> Result<usize> {
    if statements.is_empty() {
        return Ok(0);
    }
    let mut transaction = conn
        .pool()
        .begin()
        .await
        .map_err(|e| SchemaError::Connection(format!("cannot begin transaction: {e}")))?;

    for (statement_index, statement) in statements.iter().enumerate() {
        tracing::debug!(statement_index, sql = %statement, "executing");
        (&mut *transaction)
            .execute(statement.as_str())
            .await
            .map_err(|e| SchemaError::Execution {
                statement_index,
                sql: statement.clone(),
                message: e.to_string(),
            })?;
    }

    transaction
        .commit()
        .await
        .map_err(|e| SchemaError::Connection(format!("cannot commit transaction: {e}")))?;
    Ok(statements.len())
}

/// Wraps a plan in BEGIN/COMMIT for `-1` output without execution.
pub fn wrap_transaction(statements: Vec<String>) -> Vec<String> {
    if statements.is_empty() {
        return statements;
    }
    let mut out = Vec::with_capacity(statements.len() + 2);
    out.push("BEGIN;".to_string());
    out.extend(statements);
    out.push("COMMIT;".to_string());
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrap_transaction_brackets_statements() {
        let wrapped = wrap_transaction(vec!["CREATE TABLE t1 (c1 integer);".to_string()]);
        assert_eq!(wrapped.first().map(String::as_str), Some("BEGIN;"));
        assert_eq!(wrapped.last().map(String::as_str), Some("COMMIT;"));
        assert_eq!(wrapped.len(), 3);
    }

    #[test]
    fn wrap_transaction_leaves_empty_plans_alone() {
        assert!(wrap_transaction(Vec::new()).is_empty());
    }
}
