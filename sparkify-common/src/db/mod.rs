//! Warehouse schema catalog, load statements and connection handling

pub mod connect;
pub mod dialect;
pub mod queries;
pub mod statement;
pub mod table_schemas;

pub use connect::connect;
pub use dialect::Dialect;
pub use queries::*;
pub use statement::{Statement, StatementKind};
pub use table_schemas::*;
