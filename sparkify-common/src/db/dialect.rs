//! SQL dialect selection
//!
//! The warehouse itself is Redshift. SQLite runs the same catalog and
//! transform statements locally, minus the physical layout hints and the
//! bulk-copy path.

use std::fmt;

/// Dialect the statements are rendered for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    Redshift,
    Sqlite,
}

impl Dialect {
    /// Infer the dialect from a connection URL scheme
    pub fn from_url(url: &str) -> Self {
        if url.starts_with("sqlite:") {
            Dialect::Sqlite
        } else {
            Dialect::Redshift
        }
    }

    /// Whether distribution/sort key hints are part of the DDL
    pub fn supports_layout_hints(self) -> bool {
        matches!(self, Dialect::Redshift)
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dialect::Redshift => write!(f, "redshift"),
            Dialect::Sqlite => write!(f, "sqlite"),
        }
    }
}
