//! Connection configuration
//!
//! Open modes and per-connection settings applied every time a handle opens.

use rusqlite::OpenFlags;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Reserved path for a private in-memory database
pub const IN_MEMORY: &str = ":memory:";

/// How a database resource is opened
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OpenMode {
    /// Reads only; writes fail with a query error
    ReadOnly,
    /// Reads and writes an existing resource
    ReadWrite,
    /// Reads and writes, creating the resource if missing
    ReadWriteCreate,
}

impl OpenMode {
    pub(crate) fn flags(self) -> OpenFlags {
        let base = OpenFlags::SQLITE_OPEN_URI | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        match self {
            OpenMode::ReadOnly => base | OpenFlags::SQLITE_OPEN_READ_ONLY,
            OpenMode::ReadWrite => base | OpenFlags::SQLITE_OPEN_READ_WRITE,
            OpenMode::ReadWriteCreate => {
                base | OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_CREATE
            }
        }
    }

    /// Check if this mode forbids writes
    pub fn is_read_only(self) -> bool {
        matches!(self, OpenMode::ReadOnly)
    }
}

/// Settings applied to every connection right after it opens
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionConfig {
    /// How long the engine retries when another connection holds a lock
    pub busy_timeout: Duration,
    /// Enforce foreign key constraints
    pub foreign_keys: bool,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            busy_timeout: Duration::from_secs(5),
            foreign_keys: true,
        }
    }
}

impl ConnectionConfig {
    /// Create a configuration with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the busy timeout
    pub fn with_busy_timeout(mut self, timeout: Duration) -> Self {
        self.busy_timeout = timeout;
        self
    }

    /// Enable or disable foreign key enforcement
    pub fn with_foreign_keys(mut self, enabled: bool) -> Self {
        self.foreign_keys = enabled;
        self
    }
}

/// Settings for [`crate::SqliteOpenHelper`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OpenHelperConfig {
    /// Directory the database file lives in
    pub directory: PathBuf,
    /// File extension appended to the database name
    pub extension: String,
    /// Settings for the owned connection
    pub connection: ConnectionConfig,
}

impl Default for OpenHelperConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("."),
            extension: "db".to_string(),
            connection: ConnectionConfig::default(),
        }
    }
}

impl OpenHelperConfig {
    /// Create a configuration with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the directory database files are created in
    pub fn with_directory(mut self, directory: impl Into<PathBuf>) -> Self {
        self.directory = directory.into();
        self
    }

    /// Set the file extension
    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }

    /// Set the connection settings
    pub fn with_connection(mut self, connection: ConnectionConfig) -> Self {
        self.connection = connection;
        self
    }

    /// Resolve the path for a named database
    pub fn path_for(&self, name: &str) -> PathBuf {
        if name == IN_MEMORY {
            return PathBuf::from(IN_MEMORY);
        }
        if self.extension.is_empty() {
            self.directory.join(name)
        } else {
            self.directory.join(format!("{}.{}", name, self.extension))
        }
    }
}
