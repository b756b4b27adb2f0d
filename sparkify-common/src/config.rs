//! Warehouse configuration loading and config file resolution
//!
//! A single [`WarehouseConfig`] is loaded once at process start and passed
//! explicitly to every component. Nothing re-reads the file afterwards.
//!
//! Config file resolution priority:
//! 1. Command-line argument (highest priority)
//! 2. `SPARKIFY_CONFIG` environment variable
//! 3. `dwh.toml` in the working directory
//! 4. User config directory (`~/.config/sparkify/dwh.toml` on Linux)
//! 5. `/etc/sparkify/dwh.toml` (Unix only)

use crate::db::Dialect;
use crate::{Error, Result};
use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Environment variable naming the config file
pub const CONFIG_ENV_VAR: &str = "SPARKIFY_CONFIG";

/// Config file name searched for in the default locations
pub const CONFIG_FILE_NAME: &str = "dwh.toml";

/// Complete warehouse configuration
#[derive(Debug, Clone, Deserialize)]
pub struct WarehouseConfig {
    /// Database connection parameters
    pub cluster: ClusterConfig,

    /// Role the warehouse assumes to read object storage
    #[serde(default)]
    pub iam_role: IamRoleConfig,

    /// Source locations in object storage
    #[serde(default)]
    pub s3: S3Config,

    /// Load sequence behavior
    #[serde(default)]
    pub load: LoadConfig,

    /// Logging configuration (optional)
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// `[cluster]` section
#[derive(Clone, Deserialize)]
pub struct ClusterConfig {
    #[serde(default)]
    pub host: String,

    #[serde(default)]
    pub db_name: String,

    #[serde(default)]
    pub db_user: String,

    #[serde(default)]
    pub db_password: String,

    /// Default: 5439 (Redshift standard port)
    #[serde(default = "default_db_port")]
    pub db_port: u16,

    /// Full connection URL, overrides the individual parameters when set
    #[serde(default)]
    pub url: Option<String>,
}

/// `[iam_role]` section
#[derive(Debug, Clone, Default, Deserialize)]
pub struct IamRoleConfig {
    #[serde(default)]
    pub arn: String,
}

/// `[s3]` section
#[derive(Debug, Clone, Deserialize)]
pub struct S3Config {
    /// Activity log files
    #[serde(default)]
    pub log_data: String,

    /// JSONPaths manifest describing the activity log field layout
    #[serde(default)]
    pub log_jsonpath: String,

    /// Song metadata files
    #[serde(default)]
    pub song_data: String,

    /// Default: us-west-2
    #[serde(default = "default_region")]
    pub region: String,
}

/// `[load]` section
#[derive(Debug, Clone, Deserialize)]
pub struct LoadConfig {
    /// Clear staging and analytical tables before loading
    #[serde(default = "default_true")]
    pub full_refresh: bool,

    /// Run the transform stage in a single transaction
    #[serde(default)]
    pub atomic_transform: bool,
}

/// `[logging]` section
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_db_port() -> u16 {
    5439
}

fn default_region() -> String {
    "us-west-2".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for S3Config {
    fn default() -> Self {
        Self {
            log_data: String::new(),
            log_jsonpath: String::new(),
            song_data: String::new(),
            region: default_region(),
        }
    }
}

impl Default for LoadConfig {
    fn default() -> Self {
        Self {
            full_refresh: true,
            atomic_transform: false,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

// Manual impl keeps the password out of debug output
impl fmt::Debug for ClusterConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClusterConfig")
            .field("host", &self.host)
            .field("db_name", &self.db_name)
            .field("db_user", &self.db_user)
            .field("db_password", &"***")
            .field("db_port", &self.db_port)
            .field("url", &self.url.as_deref().map(redact_url))
            .finish()
    }
}

impl ClusterConfig {
    /// Connection URL for the warehouse
    ///
    /// Uses `url` verbatim when present, otherwise builds a PostgreSQL wire
    /// protocol URL from the individual parameters.
    pub fn connection_url(&self) -> String {
        if let Some(url) = &self.url {
            return url.clone();
        }

        format!(
            "postgres://{}:{}@{}:{}/{}",
            urlencoding::encode(&self.db_user),
            urlencoding::encode(&self.db_password),
            self.host,
            self.db_port,
            self.db_name
        )
    }

    /// Connection URL safe for logs
    pub fn redacted_url(&self) -> String {
        redact_url(&self.connection_url())
    }
}

impl WarehouseConfig {
    /// Parse and validate configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let mut config: WarehouseConfig = toml::from_str(content)?;
        config.normalize();
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Cannot read config file {}: {}", path.display(), e))
        })?;

        let config = Self::from_toml_str(&content)?;
        debug!("Configuration from {}: {:?}", path.display(), config);

        Ok(config)
    }

    /// SQL dialect spoken by the configured warehouse
    pub fn dialect(&self) -> Dialect {
        Dialect::from_url(&self.cluster.connection_url())
    }

    /// Check required values
    ///
    /// Connection parameters are required unless a URL override is given.
    /// Object storage settings are only required for Redshift, the only
    /// dialect with a bulk-copy path.
    pub fn validate(&self) -> Result<()> {
        if self.cluster.url.is_none() {
            require("cluster.host", &self.cluster.host)?;
            require("cluster.db_name", &self.cluster.db_name)?;
            require("cluster.db_user", &self.cluster.db_user)?;
        }

        if self.dialect() == Dialect::Redshift {
            require("iam_role.arn", &self.iam_role.arn)?;
            require("s3.log_data", &self.s3.log_data)?;
            require("s3.log_jsonpath", &self.s3.log_jsonpath)?;
            require("s3.song_data", &self.s3.song_data)?;
            require("s3.region", &self.s3.region)?;
        }

        Ok(())
    }

    // Values copied from INI-style configs often carry their own quotes
    fn normalize(&mut self) {
        for value in [
            &mut self.iam_role.arn,
            &mut self.s3.log_data,
            &mut self.s3.log_jsonpath,
            &mut self.s3.song_data,
            &mut self.s3.region,
        ] {
            *value = strip_quotes(value.trim()).to_string();
        }
    }
}

fn require(key: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::Config(format!("Missing required setting '{}'", key)));
    }
    Ok(())
}

fn strip_quotes(value: &str) -> &str {
    value
        .strip_prefix('\'')
        .and_then(|v| v.strip_suffix('\''))
        .unwrap_or(value)
}

/// Replace the password component of a URL with `***`
pub fn redact_url(url: &str) -> String {
    let Some(scheme_end) = url.find("://") else {
        return url.to_string();
    };
    let authority_start = scheme_end + 3;
    let rest = &url[authority_start..];
    let authority_len = rest.find('/').unwrap_or(rest.len());
    let authority = &rest[..authority_len];

    let Some(at) = authority.rfind('@') else {
        return url.to_string();
    };
    let Some(colon) = authority[..at].find(':') else {
        return url.to_string();
    };

    format!(
        "{}{}***{}",
        &url[..authority_start],
        &authority[..=colon],
        &url[authority_start + at..]
    )
}

/// Locate the config file following the documented priority order
pub fn resolve_config_path(cli_arg: Option<&Path>) -> Result<PathBuf> {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return Ok(path.to_path_buf());
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        if !path.is_empty() {
            return Ok(PathBuf::from(path));
        }
    }

    // Priority 3-5: Default locations
    let candidates = default_config_locations();
    for candidate in &candidates {
        if candidate.exists() {
            return Ok(candidate.clone());
        }
    }

    Err(Error::Config(format!(
        "No config file found (searched: {})",
        candidates
            .iter()
            .map(|p| p.display().to_string())
            .collect::<Vec<_>>()
            .join(", ")
    )))
}

fn default_config_locations() -> Vec<PathBuf> {
    let mut locations = vec![PathBuf::from(CONFIG_FILE_NAME)];

    if let Some(dir) = dirs::config_dir() {
        locations.push(dir.join("sparkify").join(CONFIG_FILE_NAME));
    }

    if cfg!(unix) {
        locations.push(PathBuf::from("/etc/sparkify").join(CONFIG_FILE_NAME));
    }

    locations
}
