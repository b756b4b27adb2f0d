//! Warehouse connection

use crate::config::ClusterConfig;
use crate::{Error, Result};
use sqlx::AnyConnection;
use sqlx::Connection;
use tracing::info;

/// Open a single connection to the configured warehouse
///
/// Both PostgreSQL-protocol (Redshift) and SQLite URLs are accepted.
/// Failure here means no statement has been executed.
pub async fn connect(cluster: &ClusterConfig) -> Result<AnyConnection> {
    sqlx::any::install_default_drivers();

    let url = cluster.connection_url();
    info!("Connecting to {}", cluster.redacted_url());

    let conn = AnyConnection::connect(&url)
        .await
        .map_err(|source| Error::Connect {
            url: cluster.redacted_url(),
            source,
        })?;

    info!("✓ Connected ({})", conn.backend_name());
    Ok(conn)
}
