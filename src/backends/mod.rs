//! SQLite handle implementation
//!
//! This module contains the connection handle and its RAII transaction guard.

pub mod sqlite;
pub mod transaction;

pub use sqlite::SqliteDatabase;
pub use transaction::TransactionGuard;
