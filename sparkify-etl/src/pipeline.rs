//! The two lifecycle sequences
//!
//! - **Reset**: drop all seven tables, then create them again.
//! - **Load**: copy object storage into staging, then transform staging into
//!   the star schema.
//!
//! Each sequence opens one connection, runs its statements in order and
//! closes the connection.

use crate::report::{self, TableCount};
use crate::runner;
use sparkify_common::db::{self, Dialect, Statement};
use sparkify_common::{Result, WarehouseConfig};
use sqlx::AnyConnection;
use sqlx::Connection;
use tracing::info;

/// Drop-all followed by create-all
pub fn reset_statements(dialect: Dialect) -> Vec<Statement> {
    let mut statements = db::drop_table_statements();
    statements.extend(db::create_table_statements(dialect));
    statements
}

/// Statements of the staging half of a load
///
/// With full refresh on, the staging tables are emptied before copying so
/// every run ingests exactly one snapshot.
pub fn staging_statements(config: &WarehouseConfig) -> Result<Vec<Statement>> {
    let mut statements = Vec::new();
    if config.load.full_refresh {
        statements.extend(db::clear_staging_statements(config.dialect()));
    }
    statements.extend(db::copy_statements(config)?);
    Ok(statements)
}

/// Statements of the transform half of a load
///
/// With full refresh on, the analytical tables are emptied first, which
/// makes re-running the load idempotent.
pub fn transform_statements(config: &WarehouseConfig) -> Vec<Statement> {
    let mut statements = Vec::new();
    if config.load.full_refresh {
        statements.extend(db::clear_analytical_statements());
    }
    statements.extend(db::insert_statements(config.dialect()));
    statements
}

/// Reset the warehouse schema
pub async fn reset_schema(config: &WarehouseConfig) -> Result<()> {
    let mut conn = db::connect(&config.cluster).await?;

    info!("=== Resetting schema ===");
    runner::run_statements(&mut conn, &reset_statements(config.dialect())).await?;

    conn.close().await?;
    info!("=== Schema reset complete ===");
    Ok(())
}

/// Bulk-copy object storage into the staging tables
pub async fn load_staging(conn: &mut AnyConnection, config: &WarehouseConfig) -> Result<()> {
    info!("=== Loading staging tables ===");
    runner::run_statements(conn, &staging_statements(config)?).await
}

/// Populate the star schema from the staging tables
pub async fn transform(conn: &mut AnyConnection, config: &WarehouseConfig) -> Result<()> {
    info!("=== Inserting analytical tables ===");
    let statements = transform_statements(config);

    if config.load.atomic_transform {
        runner::run_in_transaction(conn, &statements).await
    } else {
        runner::run_statements(conn, &statements).await
    }
}

/// Run the full load and report resulting row counts
pub async fn run_load(config: &WarehouseConfig) -> Result<Vec<TableCount>> {
    // Fail on an unsupported dialect before touching the warehouse
    staging_statements(config)?;

    let mut conn = db::connect(&config.cluster).await?;

    load_staging(&mut conn, config).await?;
    transform(&mut conn, config).await?;
    let counts = report::table_counts(&mut conn).await?;

    conn.close().await?;
    info!("=== Load complete ===");
    Ok(counts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sparkify_common::db::{StatementKind, ALL_TABLES};

    fn config(extra: &str) -> WarehouseConfig {
        WarehouseConfig::from_toml_str(&format!(
            r#"
            [cluster]
            host = "dwh.example.com"
            db_name = "dev"
            db_user = "awsuser"

            [iam_role]
            arn = "arn:aws:iam::123456789012:role/dwhRole"

            [s3]
            log_data = "s3://bucket/log_data"
            log_jsonpath = "s3://bucket/log_json_path.json"
            song_data = "s3://bucket/song_data"

            {}
            "#,
            extra
        ))
        .unwrap()
    }

    fn kinds(statements: &[Statement]) -> Vec<StatementKind> {
        statements.iter().map(|s| s.kind).collect()
    }

    #[test]
    fn test_reset_drops_then_creates() {
        let statements = reset_statements(Dialect::Redshift);
        assert_eq!(statements.len(), 14);

        let (drops, creates) = statements.split_at(7);
        assert!(drops.iter().all(|s| s.kind == StatementKind::Drop));
        assert!(creates.iter().all(|s| s.kind == StatementKind::Create));
        assert_eq!(drops.iter().map(|s| s.table).collect::<Vec<_>>(), ALL_TABLES.to_vec());
    }

    #[test]
    fn test_load_sequence_with_full_refresh() {
        let config = config("");

        assert_eq!(
            kinds(&staging_statements(&config).unwrap()),
            vec![StatementKind::Clear, StatementKind::Clear, StatementKind::Copy, StatementKind::Copy]
        );

        let transform = transform_statements(&config);
        assert_eq!(transform.len(), 10);
        assert!(transform[..5].iter().all(|s| s.kind == StatementKind::Clear));
        assert!(transform[5..].iter().all(|s| s.kind == StatementKind::Insert));
    }

    #[test]
    fn test_load_sequence_without_full_refresh() {
        let config = config("[load]\nfull_refresh = false");

        assert_eq!(
            kinds(&staging_statements(&config).unwrap()),
            vec![StatementKind::Copy, StatementKind::Copy]
        );
        assert_eq!(transform_statements(&config).len(), 5);
    }
}
