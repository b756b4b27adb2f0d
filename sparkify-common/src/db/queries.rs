//! Load statements: bulk copy into staging, then set-based transforms into
//! the star schema.
//!
//! Transform order is fixed. `dim_time` reads the start times of
//! `fact_songplays`, so it must run after the fact insert.

use crate::config::WarehouseConfig;
use crate::db::dialect::Dialect;
use crate::db::statement::{Statement, StatementKind};
use crate::db::table_schemas::{
    ANALYTICAL_TABLES, DIM_ARTISTS, DIM_SONGS, DIM_TIME, DIM_USERS, FACT_SONGPLAYS, STAGING_EVENTS,
    STAGING_SONGS, STAGING_TABLES,
};
use crate::{Error, Result};

/// Page value of playback events
pub const PLAYBACK_PAGE: &str = "NextSong";

/// Quote a value as a SQL string literal
fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// Bulk-copy statements for both staging tables
///
/// The activity log is mapped through the JSONPaths manifest; song metadata
/// is matched to columns by name. Only Redshift can copy from object storage.
pub fn copy_statements(config: &WarehouseConfig) -> Result<Vec<Statement>> {
    let dialect = config.dialect();
    if dialect != Dialect::Redshift {
        return Err(Error::Unsupported(format!(
            "bulk copy from object storage is not available for {}",
            dialect
        )));
    }

    let role = quote_literal(&config.iam_role.arn);
    let region = quote_literal(&config.s3.region);

    let events = format!(
        "COPY {}\nFROM {}\nIAM_ROLE {}\nREGION {}\nFORMAT AS JSON {}",
        STAGING_EVENTS,
        quote_literal(&config.s3.log_data),
        role,
        region,
        quote_literal(&config.s3.log_jsonpath)
    );

    let songs = format!(
        "COPY {}\nFROM {}\nIAM_ROLE {}\nREGION {}\nFORMAT AS JSON 'auto'",
        STAGING_SONGS,
        quote_literal(&config.s3.song_data),
        role,
        region
    );

    Ok(vec![
        Statement::new(StatementKind::Copy, STAGING_EVENTS, events),
        Statement::new(StatementKind::Copy, STAGING_SONGS, songs),
    ])
}

/// Empty both staging tables before a fresh copy
pub fn clear_staging_statements(dialect: Dialect) -> Vec<Statement> {
    STAGING_TABLES
        .into_iter()
        .map(|table| {
            let sql = match dialect {
                Dialect::Redshift => format!("TRUNCATE {}", table),
                Dialect::Sqlite => format!("DELETE FROM {}", table),
            };
            Statement::new(StatementKind::Clear, table, sql)
        })
        .collect()
}

/// Empty the star schema tables
///
/// `DELETE` rather than `TRUNCATE`: Redshift commits implicitly on
/// `TRUNCATE`, which would break an enclosing transaction.
pub fn clear_analytical_statements() -> Vec<Statement> {
    ANALYTICAL_TABLES
        .into_iter()
        .map(|table| Statement::new(StatementKind::Clear, table, format!("DELETE FROM {}", table)))
        .collect()
}

/// The five transform inserts in mandatory order
pub fn insert_statements(dialect: Dialect) -> Vec<Statement> {
    vec![
        Statement::new(StatementKind::Insert, DIM_USERS, user_table_insert()),
        Statement::new(StatementKind::Insert, DIM_SONGS, song_table_insert()),
        Statement::new(StatementKind::Insert, DIM_ARTISTS, artist_table_insert()),
        Statement::new(StatementKind::Insert, FACT_SONGPLAYS, songplay_table_insert(dialect)),
        Statement::new(StatementKind::Insert, DIM_TIME, time_table_insert(dialect)),
    ]
}

// One row per user: the most recent event decides name and level
fn user_table_insert() -> String {
    format!(
        r#"
INSERT INTO {users} (user_id, first_name, last_name, gender, level)
SELECT latest.user_id, latest.first_name, latest.last_name, latest.gender, latest.level
FROM (
    SELECT
        se.userId       AS user_id,
        se.firstName    AS first_name,
        se.lastName     AS last_name,
        se.gender       AS gender,
        se.level        AS level,
        ROW_NUMBER() OVER (PARTITION BY se.userId ORDER BY se.ts DESC) AS rn
    FROM {events} se
    WHERE se.userId IS NOT NULL
) latest
WHERE latest.rn = 1
  AND NOT EXISTS (SELECT 1 FROM {users} u WHERE u.user_id = latest.user_id)
"#,
        users = DIM_USERS,
        events = STAGING_EVENTS
    )
}

fn song_table_insert() -> String {
    format!(
        r#"
INSERT INTO {songs} (song_id, title, artist_id, year, duration)
SELECT s.song_id, s.title, s.artist_id, s.year, s.duration
FROM (
    SELECT
        ss.song_id      AS song_id,
        ss.title        AS title,
        ss.artist_id    AS artist_id,
        ss.year         AS year,
        ss.duration     AS duration,
        ROW_NUMBER() OVER (PARTITION BY ss.song_id ORDER BY ss.title, ss.artist_id) AS rn
    FROM {staging} ss
    WHERE ss.song_id IS NOT NULL
) s
WHERE s.rn = 1
  AND NOT EXISTS (SELECT 1 FROM {songs} d WHERE d.song_id = s.song_id)
"#,
        songs = DIM_SONGS,
        staging = STAGING_SONGS
    )
}

fn artist_table_insert() -> String {
    format!(
        r#"
INSERT INTO {artists} (artist_id, name, location, latitude, longitude)
SELECT a.artist_id, a.name, a.location, a.latitude, a.longitude
FROM (
    SELECT
        ss.artist_id            AS artist_id,
        ss.artist_name          AS name,
        ss.artist_location      AS location,
        ss.artist_latitude      AS latitude,
        ss.artist_longitude     AS longitude,
        ROW_NUMBER() OVER (PARTITION BY ss.artist_id ORDER BY ss.artist_name, ss.artist_location) AS rn
    FROM {staging} ss
    WHERE ss.artist_id IS NOT NULL
) a
WHERE a.rn = 1
  AND NOT EXISTS (SELECT 1 FROM {artists} d WHERE d.artist_id = a.artist_id)
"#,
        artists = DIM_ARTISTS,
        staging = STAGING_SONGS
    )
}

/// Epoch-millisecond `ts` as an absolute timestamp, milliseconds kept
fn epoch_millis_to_timestamp(dialect: Dialect, column: &str) -> String {
    match dialect {
        Dialect::Redshift => format!("TIMESTAMP 'epoch' + {} / 1000.0 * INTERVAL '1 second'", column),
        Dialect::Sqlite => format!("strftime('%Y-%m-%d %H:%M:%f', {} / 1000.0, 'unixepoch')", column),
    }
}

// Every playback event becomes exactly one fact row. The song lookup keeps
// one candidate per (title, artist_name) so duplicates in the song data
// cannot multiply facts, and a miss leaves song_id/artist_id null.
fn songplay_table_insert(dialect: Dialect) -> String {
    format!(
        r#"
INSERT INTO {songplays} (start_time, user_id, level, song_id, artist_id, session_id, location, user_agent)
SELECT
    {start_time}   AS start_time,
    se.userId       AS user_id,
    se.level        AS level,
    ss.song_id      AS song_id,
    ss.artist_id    AS artist_id,
    se.sessionId    AS session_id,
    se.location     AS location,
    se.userAgent    AS user_agent
FROM {events} se
LEFT JOIN (
    SELECT
        title,
        artist_name,
        song_id,
        artist_id,
        ROW_NUMBER() OVER (PARTITION BY title, artist_name ORDER BY song_id) AS rn
    FROM {songs}
) ss
    ON se.song = ss.title
   AND se.artist = ss.artist_name
   AND ss.rn = 1
WHERE se.page = {page}
"#,
        songplays = FACT_SONGPLAYS,
        start_time = epoch_millis_to_timestamp(dialect, "se.ts"),
        events = STAGING_EVENTS,
        songs = STAGING_SONGS,
        page = quote_literal(PLAYBACK_PAGE)
    )
}

fn time_table_insert(dialect: Dialect) -> String {
    let parts = match dialect {
        Dialect::Redshift => r#"
    EXTRACT(hour FROM sp.start_time)        AS hour,
    EXTRACT(day FROM sp.start_time)         AS day,
    EXTRACT(week FROM sp.start_time)        AS week,
    EXTRACT(month FROM sp.start_time)       AS month,
    EXTRACT(year FROM sp.start_time)        AS year,
    EXTRACT(dow FROM sp.start_time)         AS weekday"#,
        // ISO week: day-of-year of the week's Thursday, counted in sevens
        Dialect::Sqlite => r#"
    CAST(strftime('%H', sp.start_time) AS INTEGER)     AS hour,
    CAST(strftime('%d', sp.start_time) AS INTEGER)     AS day,
    (CAST(strftime('%j', date(sp.start_time, '-3 days', 'weekday 4')) AS INTEGER) - 1) / 7 + 1 AS week,
    CAST(strftime('%m', sp.start_time) AS INTEGER)     AS month,
    CAST(strftime('%Y', sp.start_time) AS INTEGER)     AS year,
    CAST(strftime('%w', sp.start_time) AS INTEGER)     AS weekday"#,
    };

    format!(
        r#"
INSERT INTO {time} (start_time, hour, day, week, month, year, weekday)
SELECT DISTINCT
    sp.start_time                           AS start_time,{parts}
FROM {songplays} sp
WHERE NOT EXISTS (SELECT 1 FROM {time} t WHERE t.start_time = sp.start_time)
"#,
        time = DIM_TIME,
        parts = parts,
        songplays = FACT_SONGPLAYS
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn redshift_config() -> WarehouseConfig {
        WarehouseConfig::from_toml_str(
            r#"
            [cluster]
            host = "dwh.example.com"
            db_name = "dev"
            db_user = "awsuser"
            db_password = "secret"

            [iam_role]
            arn = "arn:aws:iam::123456789012:role/dwhRole"

            [s3]
            log_data = "s3://udacity-dend/log_data"
            log_jsonpath = "s3://udacity-dend/log_json_path.json"
            song_data = "s3://udacity-dend/song_data"
            "#,
        )
        .unwrap()
    }

    #[test]
    fn test_copy_statements_name_source_role_region_format() {
        let statements = copy_statements(&redshift_config()).unwrap();
        assert_eq!(statements.len(), 2);

        let events = &statements[0];
        assert_eq!(events.table, STAGING_EVENTS);
        assert_eq!(events.kind, StatementKind::Copy);
        assert!(events.sql.contains("FROM 's3://udacity-dend/log_data'"));
        assert!(events.sql.contains("IAM_ROLE 'arn:aws:iam::123456789012:role/dwhRole'"));
        assert!(events.sql.contains("REGION 'us-west-2'"));
        assert!(events.sql.contains("FORMAT AS JSON 's3://udacity-dend/log_json_path.json'"));

        let songs = &statements[1];
        assert_eq!(songs.table, STAGING_SONGS);
        assert!(songs.sql.contains("FROM 's3://udacity-dend/song_data'"));
        assert!(songs.sql.contains("FORMAT AS JSON 'auto'"));
    }

    #[test]
    fn test_copy_escapes_quotes() {
        let mut config = redshift_config();
        config.s3.song_data = "s3://bucket/it's".to_string();

        let statements = copy_statements(&config).unwrap();
        assert!(statements[1].sql.contains("FROM 's3://bucket/it''s'"));
    }

    #[test]
    fn test_copy_unsupported_on_sqlite() {
        let config = WarehouseConfig::from_toml_str(
            r#"
            [cluster]
            url = "sqlite::memory:"
            "#,
        )
        .unwrap();

        assert!(matches!(copy_statements(&config), Err(Error::Unsupported(_))));
    }

    #[test]
    fn test_insert_order_time_after_fact() {
        let tables: Vec<_> = insert_statements(Dialect::Redshift)
            .iter()
            .map(|s| s.table)
            .collect();

        assert_eq!(tables, vec![DIM_USERS, DIM_SONGS, DIM_ARTISTS, FACT_SONGPLAYS, DIM_TIME]);
    }

    #[test]
    fn test_songplay_insert_filters_playback_and_left_joins() {
        for dialect in [Dialect::Redshift, Dialect::Sqlite] {
            let sql = songplay_table_insert(dialect);
            assert!(sql.contains("WHERE se.page = 'NextSong'"));
            assert!(sql.contains("LEFT JOIN"));
            assert!(sql.contains("ON se.song = ss.title"));
            assert!(sql.contains("AND se.artist = ss.artist_name"));
            // Facts are never collapsed
            assert!(!sql.contains("DISTINCT"));
        }
    }

    #[test]
    fn test_timestamp_conversion_keeps_milliseconds() {
        assert!(songplay_table_insert(Dialect::Redshift)
            .contains("TIMESTAMP 'epoch' + se.ts / 1000.0 * INTERVAL '1 second'"));
        assert!(songplay_table_insert(Dialect::Sqlite)
            .contains("strftime('%Y-%m-%d %H:%M:%f', se.ts / 1000.0, 'unixepoch')"));
    }

    #[test]
    fn test_clear_statements() {
        let staging = clear_staging_statements(Dialect::Redshift);
        assert_eq!(staging[0].sql, "TRUNCATE staging_events");
        assert_eq!(clear_staging_statements(Dialect::Sqlite)[1].sql, "DELETE FROM staging_songs");

        let analytical = clear_analytical_statements();
        assert_eq!(analytical.len(), 5);
        assert!(analytical.iter().all(|s| s.sql.starts_with("DELETE FROM ")));
    }
}
