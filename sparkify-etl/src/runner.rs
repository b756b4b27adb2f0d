//! Statement sequence execution
//!
//! Statements run strictly in order on one connection. The first failure
//! halts the sequence; statements after it are never executed.

use sparkify_common::db::Statement;
use sparkify_common::{Error, Result};
use sqlx::AnyConnection;
use sqlx::Connection;
use tracing::{debug, info};

/// Run each statement in its own transaction, committing after every one
///
/// A failure leaves the effects of earlier statements committed.
pub async fn run_statements(conn: &mut AnyConnection, statements: &[Statement]) -> Result<()> {
    for statement in statements {
        let mut tx = conn.begin().await?;
        let rows = execute(&mut tx, statement).await?;
        tx.commit().await?;

        info!("✓ {} {} ({} rows)", statement.kind, statement.table, rows);
    }

    Ok(())
}

/// Run all statements in a single transaction
///
/// Nothing is committed unless every statement succeeds; the transaction
/// rolls back when dropped on the error path.
pub async fn run_in_transaction(conn: &mut AnyConnection, statements: &[Statement]) -> Result<()> {
    let mut tx = conn.begin().await?;

    for statement in statements {
        let rows = execute(&mut tx, statement).await?;
        info!("{} {} ({} rows, pending commit)", statement.kind, statement.table, rows);
    }

    tx.commit().await?;
    info!("✓ Committed {} statements", statements.len());

    Ok(())
}

async fn execute(conn: &mut AnyConnection, statement: &Statement) -> Result<u64> {
    debug!("Executing {} {}:\n{}", statement.kind, statement.table, statement.sql.trim());

    let result = sqlx::raw_sql(&statement.sql)
        .execute(&mut *conn)
        .await
        .map_err(|source| Error::Statement {
            kind: statement.kind,
            table: statement.table,
            source,
        })?;

    Ok(result.rows_affected())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sparkify_common::db::StatementKind;

    async fn memory_connection() -> AnyConnection {
        sqlx::any::install_default_drivers();
        AnyConnection::connect("sqlite::memory:").await.unwrap()
    }

    async fn count(conn: &mut AnyConnection, table: &str) -> i64 {
        sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}", table))
            .fetch_one(&mut *conn)
            .await
            .unwrap()
    }

    fn statement(kind: StatementKind, sql: &str) -> Statement {
        Statement::new(kind, "t", sql)
    }

    #[tokio::test]
    async fn test_statements_run_in_order() {
        let mut conn = memory_connection().await;

        let statements = vec![
            statement(StatementKind::Create, "CREATE TABLE t (id INTEGER)"),
            statement(StatementKind::Insert, "INSERT INTO t VALUES (1)"),
            statement(StatementKind::Insert, "INSERT INTO t SELECT id + 1 FROM t"),
        ];
        run_statements(&mut conn, &statements).await.unwrap();

        let max: i64 = sqlx::query_scalar("SELECT MAX(id) FROM t")
            .fetch_one(&mut conn)
            .await
            .unwrap();
        assert_eq!(max, 2);
        assert_eq!(count(&mut conn, "t").await, 2);
    }

    #[tokio::test]
    async fn test_first_failure_halts_and_keeps_prior_commits() {
        let mut conn = memory_connection().await;

        let statements = vec![
            statement(StatementKind::Create, "CREATE TABLE t (id INTEGER)"),
            statement(StatementKind::Insert, "INSERT INTO t VALUES (1)"),
            statement(StatementKind::Insert, "INSERT INTO missing_table VALUES (2)"),
            statement(StatementKind::Insert, "INSERT INTO t VALUES (3)"),
        ];
        let err = run_statements(&mut conn, &statements).await.unwrap_err();

        assert!(matches!(
            err,
            Error::Statement { kind: StatementKind::Insert, table: "t", .. }
        ));
        // Second statement committed, fourth never ran
        assert_eq!(count(&mut conn, "t").await, 1);
    }

    #[tokio::test]
    async fn test_transaction_rolls_back_on_failure() {
        let mut conn = memory_connection().await;
        run_statements(&mut conn, &[statement(StatementKind::Create, "CREATE TABLE t (id INTEGER)")])
            .await
            .unwrap();

        let statements = vec![
            statement(StatementKind::Insert, "INSERT INTO t VALUES (1)"),
            statement(StatementKind::Insert, "INSERT INTO missing_table VALUES (2)"),
        ];
        let err = run_in_transaction(&mut conn, &statements).await.unwrap_err();

        assert!(matches!(err, Error::Statement { .. }));
        assert_eq!(count(&mut conn, "t").await, 0);
    }
}
