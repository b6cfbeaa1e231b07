//! # Rust SQLite Helper
//!
//! A thin, synchronous convenience layer over SQLite. SQLite does all of the
//! storage work; this crate builds SQL text, binds values, copies result rows
//! into an in-memory [`Cursor`], and manages schema versions.
//!
//! ## Features
//!
//! - **Database handle**: [`SqliteDatabase`] opens one resource in read-only,
//!   read-write or read-write-create mode, runs raw SQL and structured
//!   SELECT/INSERT/UPDATE/DELETE builders, and controls transactions
//! - **Parameter binding**: structural SQL is concatenated, data values are
//!   always bound through the engine
//! - **Cursor**: a materialized, forward-only view over result rows with
//!   typed accessors
//! - **Open helper**: [`SqliteOpenHelper`] creates, upgrades or downgrades a
//!   schema based on the version stored in the database header
//! - **Thread safety**: the handle serializes access to its connection with
//!   `parking_lot`
//!
//! ## Quick Start
//!
//! ```rust
//! use rust_sqlite_helper::prelude::*;
//!
//! fn main() -> Result<()> {
//!     let db = SqliteDatabase::new();
//!     db.open(":memory:", OpenMode::ReadWriteCreate)?;
//!
//!     db.exec_query("CREATE TABLE cars (mpg TEXT, weight TEXT)")?;
//!     db.insert("cars", &["mpg", "weight"], &["34".into(), "2000".into()])?;
//!
//!     let mut cursor = db.query(&SelectBuilder::new("cars").columns(&["mpg", "weight"]))?;
//!     while cursor.advance() {
//!         println!("{} mpg, {} lbs", cursor.get_string("mpg")?, cursor.get_int("weight")?);
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Project Structure
//!
//! ```text
//! rust_sqlite_helper/
//! ├── src/
//! │   ├── core/              # Shared types
//! │   │   ├── config.rs      # Open modes and connection settings
//! │   │   ├── cursor.rs      # Result cursor
//! │   │   ├── error.rs       # Error types
//! │   │   ├── query_builder.rs  # Statement builders
//! │   │   ├── value.rs       # Value types
//! │   │   └── mod.rs
//! │   ├── backends/          # SQLite handle
//! │   │   ├── sqlite.rs      # Database handle
//! │   │   ├── transaction.rs # RAII transaction guard
//! │   │   └── mod.rs
//! │   ├── open_helper.rs     # Schema-versioned open helper
//! │   └── lib.rs
//! ├── demos/                 # Example programs
//! ├── tests/                 # Integration tests
//! └── Cargo.toml
//! ```

/// Core types: values, cursor, errors, configuration and builders
pub mod core;

/// SQLite handle implementation
pub mod backends;

/// Schema-versioned open helper
pub mod open_helper;

/// Prelude for convenient imports
///
/// ```rust
/// use rust_sqlite_helper::prelude::*;
///
/// fn main() -> Result<()> {
///     let db = SqliteDatabase::new();
///     db.open(":memory:", OpenMode::ReadWriteCreate)?;
///     Ok(())
/// }
/// ```
pub mod prelude {
    pub use crate::backends::{SqliteDatabase, TransactionGuard};
    pub use crate::core::{
        ColumnIndex, ConnectionConfig, Cursor, DatabaseError, DeleteBuilder, InsertBuilder,
        OpenHelperConfig, OpenMode, OrderDirection, Result, SelectBuilder, UpdateBuilder, Value,
        IN_MEMORY,
    };
    pub use crate::open_helper::{SchemaLifecycle, SqliteOpenHelper};
}

// Re-export at root level for convenience
pub use crate::backends::{SqliteDatabase, TransactionGuard};
pub use crate::core::{
    ConnectionConfig, Cursor, DatabaseError, OpenHelperConfig, OpenMode, Result, SelectBuilder,
    Value,
};
pub use crate::open_helper::{SchemaLifecycle, SqliteOpenHelper};
