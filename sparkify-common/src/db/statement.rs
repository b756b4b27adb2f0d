//! Executable statement descriptors

use std::fmt;

/// What a statement does to its table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    Drop,
    Create,
    /// Remove all rows, keep the table
    Clear,
    /// Bulk copy from object storage
    Copy,
    Insert,
}

impl fmt::Display for StatementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            StatementKind::Drop => "DROP",
            StatementKind::Create => "CREATE",
            StatementKind::Clear => "CLEAR",
            StatementKind::Copy => "COPY",
            StatementKind::Insert => "INSERT",
        };
        f.write_str(label)
    }
}

/// One SQL statement in a lifecycle sequence
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    pub kind: StatementKind,
    /// Table the statement targets
    pub table: &'static str,
    pub sql: String,
}

impl Statement {
    pub fn new(kind: StatementKind, table: &'static str, sql: impl Into<String>) -> Self {
        Self {
            kind,
            table,
            sql: sql.into(),
        }
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "-- {} {}\n{};", self.kind, self.table, self.sql.trim())
    }
}
