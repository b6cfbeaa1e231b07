//! SQLite database handle
//!
//! [`SqliteDatabase`] owns at most one connection to a SQLite resource. All
//! calls are synchronous. The connection sits behind a mutex, so a handle can
//! be shared across threads; each call holds the lock for one engine
//! operation. Grouping several calls atomically still needs a transaction,
//! and the caller must keep other threads off the handle while one is open.

use crate::core::{
    config::{ConnectionConfig, OpenMode, IN_MEMORY},
    cursor::Cursor,
    error::{engine_message, DatabaseError, Result},
    query_builder::{DeleteBuilder, InsertBuilder, SelectBuilder, UpdateBuilder},
    value::Value,
};
use log::{debug, warn};
use parking_lot::Mutex;
use rusqlite::{params_from_iter, Connection};
use std::path::{Path, PathBuf};

struct OpenConnection {
    conn: Connection,
    path: PathBuf,
    mode: OpenMode,
}

/// Handle to one SQLite resource
pub struct SqliteDatabase {
    state: Mutex<Option<OpenConnection>>,
    config: ConnectionConfig,
}

impl SqliteDatabase {
    /// Largest schema version the database header can hold
    pub const MAX_VERSION: u32 = i32::MAX as u32;

    /// Create an unopened handle with default connection settings
    pub fn new() -> Self {
        Self::with_config(ConnectionConfig::default())
    }

    /// Create an unopened handle with the given connection settings
    pub fn with_config(config: ConnectionConfig) -> Self {
        Self {
            state: Mutex::new(None),
            config,
        }
    }

    /// Connection settings applied on open
    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    /// Open the resource at `path`
    ///
    /// A read-only open of a file that does not exist yet first creates an
    /// empty database, then reopens it read-only, so the call succeeds with
    /// a version 0 resource instead of failing.
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseError::Open`] if the handle is already open or the
    /// engine refuses the path.
    pub fn open(&self, path: impl AsRef<Path>, mode: OpenMode) -> Result<()> {
        let path = path.as_ref();
        let mut state = self.state.lock();
        if state.is_some() {
            return Err(DatabaseError::open(
                path.display().to_string(),
                "database is already open",
            ));
        }

        if mode.is_read_only() && !is_in_memory(path) && !path.exists() {
            debug!(
                "event=db_materialize path={} reason=read_only_open_of_missing_file",
                path.display()
            );
            let conn = self.connect(path, OpenMode::ReadWriteCreate)?;
            conn.close()
                .map_err(|(_, e)| DatabaseError::open(path.display().to_string(), engine_message(&e)))?;
        }

        let conn = self.connect(path, mode)?;
        debug!("event=db_open path={} mode={:?} status=ok", path.display(), mode);
        *state = Some(OpenConnection {
            conn,
            path: path.to_path_buf(),
            mode,
        });
        Ok(())
    }

    fn connect(&self, path: &Path, mode: OpenMode) -> Result<Connection> {
        let open_error = |e: rusqlite::Error| {
            DatabaseError::open(path.display().to_string(), engine_message(&e))
        };

        let conn = Connection::open_with_flags(path, mode.flags()).map_err(open_error)?;
        // On failure `conn` is dropped here, releasing the half-configured connection.
        conn.busy_timeout(self.config.busy_timeout)
            .map_err(open_error)?;
        conn.pragma_update(None, "foreign_keys", self.config.foreign_keys)
            .map_err(open_error)?;
        Ok(conn)
    }

    /// Close the connection. Closing an unopened handle is a no-op.
    ///
    /// The handle is unopened afterwards even if the engine reports an error.
    pub fn close(&self) -> Result<()> {
        let Some(open) = self.state.lock().take() else {
            return Ok(());
        };
        debug!("event=db_close path={}", open.path.display());
        open.conn
            .close()
            .map_err(|(_, e)| DatabaseError::close(engine_message(&e)))
    }

    /// Check if the handle holds an open connection
    pub fn is_open(&self) -> bool {
        self.state.lock().is_some()
    }

    /// Mode of the current connection
    pub fn mode(&self) -> Option<OpenMode> {
        self.state.lock().as_ref().map(|open| open.mode)
    }

    /// Path of the current connection
    pub fn path(&self) -> Option<PathBuf> {
        self.state.lock().as_ref().map(|open| open.path.clone())
    }

    fn with_connection<T>(&self, f: impl FnOnce(&Connection) -> rusqlite::Result<T>) -> Result<T> {
        let state = self.state.lock();
        let open = state.as_ref().ok_or_else(DatabaseError::not_open)?;
        f(&open.conn).map_err(DatabaseError::from_engine)
    }

    /// Execute SQL that produces no rows (DDL, DML without projection)
    ///
    /// # Security Warning
    ///
    /// The text is executed as-is. Pass data through
    /// [`exec_query_with_args`](Self::exec_query_with_args) instead of
    /// formatting it into the SQL.
    pub fn exec_query(&self, sql: &str) -> Result<()> {
        debug!("event=exec sql={}", sql);
        self.with_connection(|conn| conn.execute_batch(sql))
    }

    /// Execute one statement with bound arguments, returning rows affected
    pub fn exec_query_with_args(&self, sql: &str, args: &[Value]) -> Result<usize> {
        debug!("event=exec sql={} args={}", sql, args.len());
        self.with_connection(|conn| conn.execute(sql, params_from_iter(args.iter())))
    }

    /// Run a statement that produces rows and materialize every row
    pub fn raw_query(&self, sql: &str, args: &[Value]) -> Result<Cursor> {
        debug!("event=query sql={} args={}", sql, args.len());
        self.with_connection(|conn| collect_rows(conn, sql, args))
    }

    /// Run a structured SELECT
    pub fn query(&self, select: &SelectBuilder) -> Result<Cursor> {
        let sql = select.build()?;
        self.raw_query(&sql, select.params())
    }

    /// Insert one row and return its row id
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseError::Argument`] if `columns` is empty or its
    /// length differs from `values`.
    pub fn insert(&self, table: &str, columns: &[&str], values: &[Value]) -> Result<i64> {
        let builder = InsertBuilder::from_columns(table, columns, values)?;
        let sql = builder.build()?;
        debug!("event=insert sql={}", sql);
        self.with_connection(|conn| {
            conn.execute(&sql, params_from_iter(builder.params().iter()))?;
            Ok(conn.last_insert_rowid())
        })
    }

    /// Update matching rows and return how many changed
    ///
    /// A `None` or blank selection updates every row.
    pub fn update(
        &self,
        table: &str,
        columns: &[&str],
        values: &[Value],
        selection: Option<&str>,
        selection_args: &[Value],
    ) -> Result<usize> {
        let mut builder = UpdateBuilder::from_columns(table, columns, values)?;
        if let Some(selection) = selection {
            builder = builder.selection(selection, selection_args.to_vec());
        }
        let sql = builder.build()?;
        self.exec_query_with_args(&sql, &builder.params())
    }

    /// Delete matching rows and return how many were removed
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseError::Argument`] for an empty selection.
    pub fn remove(&self, table: &str, selection: &str, selection_args: &[Value]) -> Result<usize> {
        let builder = DeleteBuilder::new(table).selection(selection, selection_args.to_vec());
        let sql = builder.build()?;
        self.exec_query_with_args(&sql, builder.params())
    }

    /// Begin a transaction
    ///
    /// Nesting is not tracked; a second begin fails the way SQLite does.
    pub fn begin_transaction(&self) -> Result<()> {
        self.exec_query("BEGIN TRANSACTION")
    }

    /// Commit the current transaction
    pub fn end_transaction(&self) -> Result<()> {
        self.exec_query("COMMIT")
    }

    /// Roll back the current transaction
    pub fn rollback(&self) -> Result<()> {
        self.exec_query("ROLLBACK")
    }

    /// Check if a transaction is open on this connection
    pub fn in_transaction(&self) -> bool {
        self.state
            .lock()
            .as_ref()
            .map(|open| !open.conn.is_autocommit())
            .unwrap_or(false)
    }

    /// Run `f` inside a transaction, committing on success and rolling back on error
    pub fn transaction<T>(&self, f: impl FnOnce(&Self) -> Result<T>) -> Result<T> {
        self.begin_transaction()?;

        match f(self) {
            Ok(result) => {
                self.end_transaction()?;
                Ok(result)
            }
            Err(e) => {
                if let Err(rollback_err) = self.rollback() {
                    warn!("event=rollback status=error error={}", rollback_err);
                }
                Err(e)
            }
        }
    }

    /// Read the schema version from the database header (0 when never set)
    pub fn version(&self) -> Result<u32> {
        let raw =
            self.with_connection(|conn| conn.query_row("PRAGMA user_version", [], |row| row.get::<_, i64>(0)))?;
        u32::try_from(raw).map_err(|_| DatabaseError::conversion(raw.to_string(), "u32"))
    }

    /// Write the schema version into the database header
    ///
    /// Fails with a query error on a read-only connection.
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseError::Argument`] if `version` exceeds
    /// [`MAX_VERSION`](Self::MAX_VERSION).
    pub fn set_version(&self, version: u32) -> Result<()> {
        // The header slot is a signed 32-bit integer; larger values are stored as 0.
        if version > Self::MAX_VERSION {
            return Err(DatabaseError::argument(format!(
                "database version {} exceeds {}",
                version,
                Self::MAX_VERSION
            )));
        }
        // PRAGMA arguments cannot be bound; a u32 renders as plain digits.
        self.exec_query(&format!("PRAGMA user_version = {}", version))
    }

    /// Row id of the most recent successful insert on this connection
    pub fn last_insert_rowid(&self) -> Result<i64> {
        self.with_connection(|conn| Ok(conn.last_insert_rowid()))
    }

    /// Rows changed by the most recent write statement
    pub fn changes(&self) -> Result<u64> {
        self.with_connection(|conn| Ok(conn.changes()))
    }
}

fn is_in_memory(path: &Path) -> bool {
    path.as_os_str() == IN_MEMORY || path.to_string_lossy().starts_with("file::memory:")
}

fn collect_rows(conn: &Connection, sql: &str, args: &[Value]) -> rusqlite::Result<Cursor> {
    let mut stmt = conn.prepare(sql)?;
    let names: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
    let column_count = names.len();

    let mut cursor = Cursor::new();
    cursor.set_column_names(names);

    let mut rows = stmt.query(params_from_iter(args.iter()))?;
    while let Some(row) = rows.next()? {
        let mut values = Vec::with_capacity(column_count);
        for i in 0..column_count {
            values.push(Value::from(row.get_ref(i)?));
        }
        cursor.add_row(values);
    }

    Ok(cursor)
}

impl Default for SqliteDatabase {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for SqliteDatabase {
    fn drop(&mut self) {
        // The engine rolls back any open transaction when the connection closes.
        if let Some(open) = self.state.get_mut().take() {
            if let Err((_, e)) = open.conn.close() {
                warn!(
                    "event=db_close path={} status=error error={}",
                    open.path.display(),
                    e
                );
            }
        }
    }
}
