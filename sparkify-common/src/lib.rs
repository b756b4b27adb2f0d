//! # Sparkify Common Library
//!
//! Shared code for the Sparkify warehouse tools:
//! - Warehouse configuration loading
//! - Schema catalog (staging, dimension and fact tables)
//! - Bulk copy and transform statements
//! - Calendar derivation for the time dimension

pub mod config;
pub mod db;
pub mod error;
pub mod time;

pub use config::WarehouseConfig;
pub use error::{Error, Result};
