//! Error types for the database system
//!
//! This module defines all error types that can occur while opening, querying
//! or closing a database, and while reading values out of a cursor.

/// Result type alias for database operations
pub type Result<T> = std::result::Result<T, DatabaseError>;

/// Error types for database operations
#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    /// Opening the database failed
    #[error("Failed to open database {path}: {message}")]
    Open { path: String, message: String },

    /// Closing the database failed
    #[error("Failed to close database: {0}")]
    Close(String),

    /// Statement preparation, execution or stepping failed
    #[error("Query execution error: {0}")]
    Query(String),

    /// Malformed builder input
    #[error("Invalid argument: {0}")]
    Argument(String),

    /// Column index outside the result set
    #[error("Column index {index} out of range for {count} columns")]
    Index { index: usize, count: usize },

    /// Cursor read before the first row or after the last
    #[error("Cursor is not positioned on a row")]
    NoCurrentRow,

    /// Column name not present in the result set
    #[error("Unknown column: {0}")]
    UnknownColumn(String),

    /// Cell value could not be read as the requested type
    #[error("Cannot convert {value:?} to {target}")]
    Conversion { value: String, target: &'static str },

    /// Schema transition the owner did not provide
    #[error("Not implemented: {0}")]
    NotImplemented(String),
}

impl DatabaseError {
    /// Create an open error for the given path
    pub fn open(path: impl Into<String>, message: impl Into<String>) -> Self {
        DatabaseError::Open {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a close error
    pub fn close<S: Into<String>>(msg: S) -> Self {
        DatabaseError::Close(msg.into())
    }

    /// Create a new query error
    pub fn query<S: Into<String>>(msg: S) -> Self {
        DatabaseError::Query(msg.into())
    }

    /// Error returned by every operation attempted on a closed handle
    pub fn not_open() -> Self {
        DatabaseError::Query("database is not open".to_string())
    }

    /// Create a new argument error
    pub fn argument<S: Into<String>>(msg: S) -> Self {
        DatabaseError::Argument(msg.into())
    }

    /// Create a column index error
    pub fn index(index: usize, count: usize) -> Self {
        DatabaseError::Index { index, count }
    }

    /// Create an unknown column error
    pub fn unknown_column<S: Into<String>>(name: S) -> Self {
        DatabaseError::UnknownColumn(name.into())
    }

    /// Create a conversion error
    pub fn conversion(value: impl Into<String>, target: &'static str) -> Self {
        DatabaseError::Conversion {
            value: value.into(),
            target,
        }
    }

    /// Create a not implemented error
    pub fn not_implemented<S: Into<String>>(msg: S) -> Self {
        DatabaseError::NotImplemented(msg.into())
    }

    /// Wrap an engine failure, keeping the engine's diagnostic text
    pub(crate) fn from_engine(err: rusqlite::Error) -> Self {
        DatabaseError::Query(engine_message(&err))
    }
}

/// Extract the diagnostic text SQLite attached to an error.
pub(crate) fn engine_message(err: &rusqlite::Error) -> String {
    match err {
        rusqlite::Error::SqliteFailure(_, Some(message)) => message.clone(),
        other => other.to_string(),
    }
}
