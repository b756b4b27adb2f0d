//! Row counts per warehouse table

use sparkify_common::db::ALL_TABLES;
use sparkify_common::Result;
use sqlx::AnyConnection;
use std::fmt;
use tracing::info;

/// Table name with its row count
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableCount {
    pub name: &'static str,
    pub row_count: i64,
}

impl fmt::Display for TableCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:<16} {:>12}", self.name, self.row_count)
    }
}

/// Count the rows of all seven tables, in catalog order
pub async fn table_counts(conn: &mut AnyConnection) -> Result<Vec<TableCount>> {
    let mut counts = Vec::with_capacity(ALL_TABLES.len());

    for name in ALL_TABLES {
        let row_count: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}", name))
            .fetch_one(&mut *conn)
            .await?;

        info!("{} rows in {}", row_count, name);
        counts.push(TableCount { name, row_count });
    }

    Ok(counts)
}
