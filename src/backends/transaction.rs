//! Transaction guard for automatic rollback on drop
//!
//! This module provides RAII-style transaction management on top of
//! [`SqliteDatabase`]'s begin/end/rollback statements.

use super::sqlite::SqliteDatabase;
use crate::core::error::Result;
use log::warn;
use std::ops::Deref;

/// Transaction guard that rolls back on drop unless committed
///
/// The guard dereferences to the database, so every handle operation runs
/// inside the transaction.
///
/// # Example
///
/// ```
/// use rust_sqlite_helper::prelude::*;
///
/// # fn main() -> Result<()> {
/// let db = SqliteDatabase::new();
/// db.open(":memory:", OpenMode::ReadWriteCreate)?;
/// db.exec_query("CREATE TABLE accounts (id INTEGER PRIMARY KEY, balance REAL)")?;
///
/// let tx = TransactionGuard::begin(&db)?;
/// tx.insert("accounts", &["balance"], &[100.0.into()])?;
/// tx.commit()?;
/// # Ok(())
/// # }
/// ```
pub struct TransactionGuard<'a> {
    db: &'a SqliteDatabase,
    finished: bool,
}

impl<'a> TransactionGuard<'a> {
    /// Begin a new transaction
    ///
    /// # Errors
    ///
    /// Returns an error if the database is not open or a transaction is
    /// already active.
    pub fn begin(db: &'a SqliteDatabase) -> Result<Self> {
        db.begin_transaction()?;
        Ok(Self {
            db,
            finished: false,
        })
    }

    /// Commit the transaction
    ///
    /// If the commit fails the guard still rolls back when it drops.
    pub fn commit(mut self) -> Result<()> {
        self.db.end_transaction()?;
        self.finished = true;
        Ok(())
    }

    /// Explicitly roll back the transaction
    pub fn rollback(mut self) -> Result<()> {
        self.finished = true;
        self.db.rollback()
    }
}

impl Deref for TransactionGuard<'_> {
    type Target = SqliteDatabase;

    fn deref(&self) -> &SqliteDatabase {
        self.db
    }
}

impl Drop for TransactionGuard<'_> {
    fn drop(&mut self) {
        if self.finished || !self.db.in_transaction() {
            return;
        }
        if let Err(e) = self.db.rollback() {
            warn!("event=tx_auto_rollback status=error error={}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::{OpenMode, IN_MEMORY};

    fn create_test_db() -> SqliteDatabase {
        let db = SqliteDatabase::new();
        db.open(IN_MEMORY, OpenMode::ReadWriteCreate).unwrap();
        db.exec_query("CREATE TABLE test (id INTEGER PRIMARY KEY, value TEXT)")
            .unwrap();
        db
    }

    fn row_count(db: &SqliteDatabase) -> usize {
        db.raw_query("SELECT * FROM test", &[]).unwrap().count()
    }

    #[test]
    fn test_transaction_guard_commit() {
        let db = create_test_db();

        {
            let tx = TransactionGuard::begin(&db).unwrap();
            tx.insert("test", &["value"], &["test1".into()]).unwrap();
            tx.commit().unwrap();
        }

        assert_eq!(row_count(&db), 1);
        assert!(!db.in_transaction());
    }

    #[test]
    fn test_transaction_guard_rollback_on_drop() {
        let db = create_test_db();

        {
            let tx = TransactionGuard::begin(&db).unwrap();
            tx.insert("test", &["value"], &["test1".into()]).unwrap();
            // Drop without commit
        }

        assert_eq!(row_count(&db), 0);
        assert!(!db.in_transaction());
    }

    #[test]
    fn test_transaction_guard_explicit_rollback() {
        let db = create_test_db();

        {
            let tx = TransactionGuard::begin(&db).unwrap();
            tx.insert("test", &["value"], &["test1".into()]).unwrap();
            tx.rollback().unwrap();
        }

        assert_eq!(row_count(&db), 0);
    }

    #[test]
    fn test_transaction_guard_requires_open_database() {
        let db = SqliteDatabase::new();
        assert!(TransactionGuard::begin(&db).is_err());
    }
}
