//! sparkify-etl library - warehouse lifecycle runner
//!
//! Two entry sequences share this library:
//! - `create-tables`: drop and recreate every warehouse table
//! - `etl`: bulk-copy staging data, then transform it into the star schema

pub mod logging;
pub mod pipeline;
pub mod report;
pub mod runner;

pub use pipeline::{reset_schema, run_load};
