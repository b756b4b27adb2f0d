//! Table Schema Definitions
//!
//! Single source of truth for the warehouse tables: two staging tables fed by
//! bulk copy, four replicated dimensions and one distributed fact table.
//! Each struct defines the columns and physical layout of one table, and
//! renders to guarded CREATE / DROP statements for a [`Dialect`].
//!
//! # Usage
//!
//! ```rust,ignore
//! for statement in drop_table_statements(Dialect::Redshift) {
//!     println!("{}", statement);
//! }
//! ```

use crate::db::dialect::Dialect;
use crate::db::statement::{Statement, StatementKind};

pub const STAGING_EVENTS: &str = "staging_events";
pub const STAGING_SONGS: &str = "staging_songs";
pub const DIM_USERS: &str = "dim_users";
pub const DIM_SONGS: &str = "dim_songs";
pub const DIM_ARTISTS: &str = "dim_artists";
pub const DIM_TIME: &str = "dim_time";
pub const FACT_SONGPLAYS: &str = "fact_songplays";

/// Every table, in drop/create order
pub const ALL_TABLES: [&str; 7] = [
    STAGING_EVENTS,
    STAGING_SONGS,
    DIM_USERS,
    DIM_ARTISTS,
    DIM_SONGS,
    DIM_TIME,
    FACT_SONGPLAYS,
];

/// Staging tables, in load order
pub const STAGING_TABLES: [&str; 2] = [STAGING_EVENTS, STAGING_SONGS];

/// Analytical (star schema) tables
pub const ANALYTICAL_TABLES: [&str; 5] = [FACT_SONGPLAYS, DIM_TIME, DIM_USERS, DIM_SONGS, DIM_ARTISTS];

/// Column definition with SQL constraints and layout hints
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDefinition {
    /// Column name
    pub name: &'static str,
    /// SQL type (e.g., "VARCHAR", "INTEGER", "FLOAT", "TIMESTAMP")
    pub sql_type: &'static str,
    /// NOT NULL constraint
    pub not_null: bool,
    /// PRIMARY KEY constraint (informational on Redshift)
    pub primary_key: bool,
    /// Auto-incrementing surrogate key
    pub identity: bool,
    /// Distribution key
    pub dist_key: bool,
    /// Sort key
    pub sort_key: bool,
}

impl ColumnDefinition {
    /// Create new column definition
    pub fn new(name: &'static str, sql_type: &'static str) -> Self {
        Self {
            name,
            sql_type,
            not_null: false,
            primary_key: false,
            identity: false,
            dist_key: false,
            sort_key: false,
        }
    }

    /// Mark column as PRIMARY KEY
    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    /// Mark column as NOT NULL
    pub fn not_null(mut self) -> Self {
        self.not_null = true;
        self
    }

    /// Mark column as an auto-incrementing identity
    pub fn identity(mut self) -> Self {
        self.identity = true;
        self
    }

    /// Mark column as the distribution key
    pub fn dist_key(mut self) -> Self {
        self.dist_key = true;
        self
    }

    /// Mark column as the sort key
    pub fn sort_key(mut self) -> Self {
        self.sort_key = true;
        self
    }

    /// Render the column clause for a CREATE TABLE body
    pub fn render(&self, dialect: Dialect) -> String {
        let mut sql = format!("{} {}", self.name, self.sql_type);

        match dialect {
            Dialect::Redshift => {
                // Attributes precede constraints in Redshift's grammar
                if self.identity {
                    sql.push_str(" IDENTITY(0,1)");
                }
                if self.dist_key {
                    sql.push_str(" DISTKEY");
                }
                if self.sort_key {
                    sql.push_str(" SORTKEY");
                }
                if self.not_null {
                    sql.push_str(" NOT NULL");
                }
                if self.primary_key {
                    sql.push_str(" PRIMARY KEY");
                }
            }
            Dialect::Sqlite => {
                if self.identity {
                    // Only INTEGER PRIMARY KEY columns auto-increment
                    return format!("{} INTEGER PRIMARY KEY AUTOINCREMENT", self.name);
                }
                if self.not_null {
                    sql.push_str(" NOT NULL");
                }
                if self.primary_key {
                    sql.push_str(" PRIMARY KEY");
                }
            }
        }

        sql
    }
}

/// Redshift distribution style
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DistStyle {
    /// Let the store choose
    Auto,
    /// Distributed by the column marked `dist_key`
    Key,
    /// Full copy on every node
    All,
}

/// Defines the expected schema for a warehouse table
pub trait TableSchema {
    /// Table name in database
    fn table_name() -> &'static str;

    /// Column definitions (order matters: bulk copy maps by position)
    fn expected_columns() -> Vec<ColumnDefinition>;

    /// Physical distribution of rows across nodes
    fn dist_style() -> DistStyle {
        DistStyle::Auto
    }
}

/// Render a guarded CREATE TABLE statement for `T`
pub fn create_statement<T: TableSchema>(dialect: Dialect) -> Statement {
    let columns = T::expected_columns()
        .iter()
        .map(|c| format!("    {}", c.render(dialect)))
        .collect::<Vec<_>>()
        .join(",\n");

    let suffix = match (dialect.supports_layout_hints(), T::dist_style()) {
        (true, DistStyle::Key) => " DISTSTYLE KEY",
        (true, DistStyle::All) => " DISTSTYLE ALL",
        _ => "",
    };

    let sql = format!(
        "CREATE TABLE IF NOT EXISTS {} (\n{}\n){}",
        T::table_name(),
        columns,
        suffix
    );

    Statement::new(StatementKind::Create, T::table_name(), sql)
}

/// Render a guarded DROP TABLE statement for `T`
pub fn drop_statement<T: TableSchema>() -> Statement {
    Statement::new(
        StatementKind::Drop,
        T::table_name(),
        format!("DROP TABLE IF EXISTS {}", T::table_name()),
    )
}

/// Raw activity log entries, distributed and sorted by session
pub struct StagingEventsTable;

impl TableSchema for StagingEventsTable {
    fn table_name() -> &'static str {
        STAGING_EVENTS
    }

    fn expected_columns() -> Vec<ColumnDefinition> {
        vec![
            ColumnDefinition::new("artist", "VARCHAR"),
            ColumnDefinition::new("auth", "VARCHAR"),
            ColumnDefinition::new("firstName", "VARCHAR"),
            ColumnDefinition::new("gender", "CHAR(1)"),
            ColumnDefinition::new("itemInSession", "INTEGER"),
            ColumnDefinition::new("lastName", "VARCHAR"),
            ColumnDefinition::new("length", "FLOAT"),
            ColumnDefinition::new("level", "VARCHAR"),
            ColumnDefinition::new("location", "VARCHAR"),
            ColumnDefinition::new("method", "VARCHAR"),
            ColumnDefinition::new("page", "VARCHAR"),
            ColumnDefinition::new("registration", "BIGINT"),
            ColumnDefinition::new("sessionId", "INTEGER")
                .dist_key()
                .sort_key(),
            ColumnDefinition::new("song", "VARCHAR"),
            ColumnDefinition::new("status", "INTEGER"),
            // Epoch milliseconds
            ColumnDefinition::new("ts", "BIGINT"),
            ColumnDefinition::new("userAgent", "VARCHAR"),
            ColumnDefinition::new("userId", "INTEGER"),
        ]
    }

    fn dist_style() -> DistStyle {
        DistStyle::Key
    }
}

/// Raw song metadata, artist attributes denormalized in
pub struct StagingSongsTable;

impl TableSchema for StagingSongsTable {
    fn table_name() -> &'static str {
        STAGING_SONGS
    }

    fn expected_columns() -> Vec<ColumnDefinition> {
        vec![
            ColumnDefinition::new("num_songs", "INTEGER"),
            ColumnDefinition::new("artist_id", "VARCHAR"),
            ColumnDefinition::new("artist_latitude", "FLOAT"),
            ColumnDefinition::new("artist_longitude", "FLOAT"),
            ColumnDefinition::new("artist_location", "VARCHAR"),
            ColumnDefinition::new("artist_name", "VARCHAR"),
            ColumnDefinition::new("song_id", "VARCHAR"),
            ColumnDefinition::new("title", "VARCHAR"),
            ColumnDefinition::new("duration", "FLOAT"),
            ColumnDefinition::new("year", "INTEGER"),
        ]
    }
}

pub struct UsersTable;

impl TableSchema for UsersTable {
    fn table_name() -> &'static str {
        DIM_USERS
    }

    fn expected_columns() -> Vec<ColumnDefinition> {
        vec![
            ColumnDefinition::new("user_id", "INTEGER")
                .sort_key()
                .not_null()
                .primary_key(),
            ColumnDefinition::new("first_name", "VARCHAR"),
            ColumnDefinition::new("last_name", "VARCHAR"),
            ColumnDefinition::new("gender", "CHAR(1)"),
            ColumnDefinition::new("level", "VARCHAR"),
        ]
    }

    fn dist_style() -> DistStyle {
        DistStyle::All
    }
}

pub struct SongsTable;

impl TableSchema for SongsTable {
    fn table_name() -> &'static str {
        DIM_SONGS
    }

    fn expected_columns() -> Vec<ColumnDefinition> {
        vec![
            ColumnDefinition::new("song_id", "VARCHAR")
                .sort_key()
                .not_null()
                .primary_key(),
            ColumnDefinition::new("title", "VARCHAR"),
            // References dim_artists, not enforced
            ColumnDefinition::new("artist_id", "VARCHAR"),
            ColumnDefinition::new("year", "INTEGER"),
            ColumnDefinition::new("duration", "FLOAT"),
        ]
    }

    fn dist_style() -> DistStyle {
        DistStyle::All
    }
}

pub struct ArtistsTable;

impl TableSchema for ArtistsTable {
    fn table_name() -> &'static str {
        DIM_ARTISTS
    }

    fn expected_columns() -> Vec<ColumnDefinition> {
        vec![
            ColumnDefinition::new("artist_id", "VARCHAR")
                .sort_key()
                .not_null()
                .primary_key(),
            ColumnDefinition::new("name", "VARCHAR"),
            ColumnDefinition::new("location", "VARCHAR"),
            ColumnDefinition::new("latitude", "FLOAT"),
            ColumnDefinition::new("longitude", "FLOAT"),
        ]
    }

    fn dist_style() -> DistStyle {
        DistStyle::All
    }
}

/// Calendar breakdown of every songplay start time
pub struct TimeTable;

impl TableSchema for TimeTable {
    fn table_name() -> &'static str {
        DIM_TIME
    }

    fn expected_columns() -> Vec<ColumnDefinition> {
        vec![
            ColumnDefinition::new("start_time", "TIMESTAMP")
                .sort_key()
                .not_null()
                .primary_key(),
            ColumnDefinition::new("hour", "INTEGER"),
            ColumnDefinition::new("day", "INTEGER"),
            ColumnDefinition::new("week", "INTEGER"),
            ColumnDefinition::new("month", "INTEGER"),
            ColumnDefinition::new("year", "INTEGER"),
            // 0 = Sunday
            ColumnDefinition::new("weekday", "INTEGER"),
        ]
    }

    fn dist_style() -> DistStyle {
        DistStyle::All
    }
}

/// One row per playback event, co-located with its user
pub struct SongplaysTable;

impl TableSchema for SongplaysTable {
    fn table_name() -> &'static str {
        FACT_SONGPLAYS
    }

    fn expected_columns() -> Vec<ColumnDefinition> {
        vec![
            ColumnDefinition::new("songplay_id", "INTEGER")
                .identity()
                .primary_key(),
            ColumnDefinition::new("start_time", "TIMESTAMP")
                .sort_key()
                .not_null(),
            ColumnDefinition::new("user_id", "INTEGER")
                .dist_key()
                .not_null(),
            ColumnDefinition::new("level", "VARCHAR"),
            ColumnDefinition::new("song_id", "VARCHAR"),
            ColumnDefinition::new("artist_id", "VARCHAR"),
            ColumnDefinition::new("session_id", "INTEGER"),
            ColumnDefinition::new("location", "VARCHAR"),
            ColumnDefinition::new("user_agent", "VARCHAR"),
        ]
    }

    fn dist_style() -> DistStyle {
        DistStyle::Key
    }
}

/// Guarded CREATE statements for all seven tables
pub fn create_table_statements(dialect: Dialect) -> Vec<Statement> {
    vec![
        create_statement::<StagingEventsTable>(dialect),
        create_statement::<StagingSongsTable>(dialect),
        create_statement::<UsersTable>(dialect),
        create_statement::<ArtistsTable>(dialect),
        create_statement::<SongsTable>(dialect),
        create_statement::<TimeTable>(dialect),
        create_statement::<SongplaysTable>(dialect),
    ]
}

/// Guarded DROP statements for all seven tables
pub fn drop_table_statements() -> Vec<Statement> {
    vec![
        drop_statement::<StagingEventsTable>(),
        drop_statement::<StagingSongsTable>(),
        drop_statement::<UsersTable>(),
        drop_statement::<ArtistsTable>(),
        drop_statement::<SongsTable>(),
        drop_statement::<TimeTable>(),
        drop_statement::<SongplaysTable>(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tables(statements: &[Statement]) -> Vec<&'static str> {
        statements.iter().map(|s| s.table).collect()
    }

    #[test]
    fn test_drop_and_create_cover_all_tables_in_order() {
        let drops = drop_table_statements();
        let creates = create_table_statements(Dialect::Redshift);

        assert_eq!(tables(&drops), ALL_TABLES.to_vec());
        assert_eq!(tables(&creates), ALL_TABLES.to_vec());
        assert!(drops.iter().all(|s| s.kind == StatementKind::Drop));
        assert!(creates.iter().all(|s| s.kind == StatementKind::Create));
    }

    #[test]
    fn test_statements_are_guarded() {
        for statement in drop_table_statements() {
            assert!(statement.sql.starts_with("DROP TABLE IF EXISTS "), "{}", statement.sql);
        }
        for dialect in [Dialect::Redshift, Dialect::Sqlite] {
            for statement in create_table_statements(dialect) {
                assert!(statement.sql.starts_with("CREATE TABLE IF NOT EXISTS "), "{}", statement.sql);
            }
        }
    }

    #[test]
    fn test_dimensions_replicated_on_redshift() {
        let creates = create_table_statements(Dialect::Redshift);
        for statement in &creates {
            let replicated = statement.sql.ends_with("DISTSTYLE ALL");
            let is_dimension = [DIM_USERS, DIM_SONGS, DIM_ARTISTS, DIM_TIME].contains(&statement.table);
            assert_eq!(replicated, is_dimension, "{}", statement.sql);
        }
    }

    #[test]
    fn test_key_distributed_tables_declare_one_dist_key() {
        fn check<T: TableSchema>(expected: &str) {
            let keys: Vec<_> = T::expected_columns()
                .into_iter()
                .filter(|c| c.dist_key)
                .map(|c| c.name)
                .collect();
            assert_eq!(keys, vec![expected], "{}", T::table_name());
            assert_eq!(T::dist_style(), DistStyle::Key);
        }

        check::<StagingEventsTable>("sessionId");
        check::<SongplaysTable>("user_id");
    }

    #[test]
    fn test_songplays_redshift_rendering() {
        let sql = create_statement::<SongplaysTable>(Dialect::Redshift).sql;

        assert!(sql.contains("songplay_id INTEGER IDENTITY(0,1) PRIMARY KEY"));
        assert!(sql.contains("start_time TIMESTAMP SORTKEY NOT NULL"));
        assert!(sql.contains("user_id INTEGER DISTKEY NOT NULL"));
        assert!(sql.ends_with(") DISTSTYLE KEY"));
    }

    #[test]
    fn test_sqlite_rendering_drops_layout_hints() {
        for statement in create_table_statements(Dialect::Sqlite) {
            for hint in ["DISTKEY", "SORTKEY", "DISTSTYLE", "IDENTITY"] {
                assert!(!statement.sql.contains(hint), "{}", statement.sql);
            }
        }

        let sql = create_statement::<SongplaysTable>(Dialect::Sqlite).sql;
        assert!(sql.contains("songplay_id INTEGER PRIMARY KEY AUTOINCREMENT"));
    }

    #[test]
    fn test_staging_events_column_order() {
        let names: Vec<_> = StagingEventsTable::expected_columns()
            .into_iter()
            .map(|c| c.name)
            .collect();

        assert_eq!(names.len(), 18);
        assert_eq!(names.first(), Some(&"artist"));
        assert_eq!(names.last(), Some(&"userId"));
    }
}
