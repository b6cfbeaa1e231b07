//! Core types shared by the database handle and the open helper
//!
//! This module provides the error type, values, the result cursor, connection
//! configuration and the SQL statement builders.

pub mod config;
pub mod cursor;
pub mod error;
pub mod query_builder;
pub mod value;

// Re-export commonly used types
pub use config::{ConnectionConfig, OpenHelperConfig, OpenMode, IN_MEMORY};
pub use cursor::{ColumnIndex, Cursor};
pub use error::{DatabaseError, Result};
pub use query_builder::{DeleteBuilder, InsertBuilder, OrderDirection, SelectBuilder, UpdateBuilder};
pub use value::Value;
