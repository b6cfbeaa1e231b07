//! Schema-versioned open helper
//!
//! [`SqliteOpenHelper`] owns one [`SqliteDatabase`] and, the first time it is
//! asked for a connection, reconciles the version stored in the database
//! header with the version the application expects:
//!
//! | stored version | action |
//! |---|---|
//! | `0` | [`SchemaLifecycle::on_create`] |
//! | `< target` | [`SchemaLifecycle::on_upgrade`] |
//! | `> target` | [`SchemaLifecycle::on_downgrade`] |
//! | `== target` | nothing |
//!
//! The callback and the version write commit in one transaction, and the
//! whole open sequence runs under a mutex so concurrent callers cannot both
//! initialize the same resource.
//!
//! # Example
//!
//! ```
//! use rust_sqlite_helper::prelude::*;
//!
//! struct Cars;
//!
//! impl SchemaLifecycle for Cars {
//!     fn on_create(&self, db: &SqliteDatabase) -> Result<()> {
//!         db.exec_query("CREATE TABLE cars (mpg TEXT, weight TEXT)")
//!     }
//!
//!     fn on_upgrade(&self, _db: &SqliteDatabase, _old: u32, _new: u32) -> Result<()> {
//!         Ok(())
//!     }
//! }
//!
//! # fn main() -> Result<()> {
//! let helper = SqliteOpenHelper::new(":memory:", 1, Cars)?;
//! let db = helper.writable_database()?;
//! assert_eq!(db.version()?, 1);
//! # Ok(())
//! # }
//! ```

use crate::backends::sqlite::SqliteDatabase;
use crate::core::config::{OpenHelperConfig, OpenMode, IN_MEMORY};
use crate::core::error::{DatabaseError, Result};
use log::{debug, info, warn};
use parking_lot::Mutex;
use std::cmp::Ordering;
use std::path::{Path, PathBuf};

/// Schema callbacks supplied by the owner of a database
///
/// Every callback runs with the helper's open lock held and, for the three
/// transition callbacks, inside a transaction. Callbacks must not begin
/// their own transactions.
pub trait SchemaLifecycle {
    /// Called right after a connection opens, before the version check
    fn on_configure(&self, _db: &SqliteDatabase) -> Result<()> {
        Ok(())
    }

    /// Called when the database has never been initialized (version 0)
    fn on_create(&self, db: &SqliteDatabase) -> Result<()>;

    /// Called when the stored version is older than the target
    fn on_upgrade(&self, db: &SqliteDatabase, old_version: u32, new_version: u32) -> Result<()>;

    /// Called when the stored version is newer than the target
    ///
    /// The default refuses with [`DatabaseError::NotImplemented`].
    fn on_downgrade(&self, _db: &SqliteDatabase, old_version: u32, new_version: u32) -> Result<()> {
        Err(DatabaseError::not_implemented(format!(
            "cannot downgrade database from version {} to {}",
            old_version, new_version
        )))
    }

    /// Called after the version check, once the database is ready
    fn on_open(&self, _db: &SqliteDatabase) -> Result<()> {
        Ok(())
    }
}

/// Opens a named database and keeps its schema at a target version
pub struct SqliteOpenHelper<S: SchemaLifecycle> {
    name: String,
    path: PathBuf,
    version: u32,
    schema: S,
    db: SqliteDatabase,
    open_lock: Mutex<()>,
}

impl<S: SchemaLifecycle> SqliteOpenHelper<S> {
    /// Create a helper for `name` at schema `version` with default settings
    ///
    /// The database file is `./<name>.db`, or a private in-memory database
    /// when `name` is `":memory:"`.
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseError::Argument`] if `version` is 0 or exceeds
    /// [`SqliteDatabase::MAX_VERSION`].
    pub fn new(name: impl Into<String>, version: u32, schema: S) -> Result<Self> {
        Self::with_config(name, version, schema, OpenHelperConfig::default())
    }

    /// Create a helper with explicit settings
    pub fn with_config(
        name: impl Into<String>,
        version: u32,
        schema: S,
        config: OpenHelperConfig,
    ) -> Result<Self> {
        if version == 0 {
            return Err(DatabaseError::argument(
                "database version must be an integer greater than 0",
            ));
        }
        if version > SqliteDatabase::MAX_VERSION {
            return Err(DatabaseError::argument(format!(
                "database version {} exceeds {}",
                version,
                SqliteDatabase::MAX_VERSION
            )));
        }
        let name = name.into();
        let path = config.path_for(&name);

        Ok(Self {
            name,
            path,
            version,
            schema,
            db: SqliteDatabase::with_config(config.connection),
            open_lock: Mutex::new(()),
        })
    }

    /// Name the helper was created with
    pub fn database_name(&self) -> &str {
        &self.name
    }

    /// Path of the database resource
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Target schema version
    pub fn version(&self) -> u32 {
        self.version
    }

    /// Schema callbacks
    pub fn schema(&self) -> &S {
        &self.schema
    }

    /// Whether the owned handle is currently open read-only
    pub fn is_read_only(&self) -> bool {
        self.db.mode().is_some_and(|mode| mode.is_read_only())
    }

    /// Open for reading, or return the already open handle
    pub fn readable_database(&self) -> Result<&SqliteDatabase> {
        self.get_database(OpenMode::ReadOnly)
    }

    /// Open for reading and writing, or return the already open handle
    pub fn writable_database(&self) -> Result<&SqliteDatabase> {
        self.get_database(OpenMode::ReadWriteCreate)
    }

    /// Close the owned handle. Safe to call when already closed.
    pub fn close(&self) -> Result<()> {
        let _guard = self.open_lock.lock();
        self.db.close()
    }

    fn get_database(&self, requested: OpenMode) -> Result<&SqliteDatabase> {
        let _guard = self.open_lock.lock();

        if self.db.is_open() {
            return Ok(&self.db);
        }

        // A read-only in-memory database would be empty forever.
        let mode = if self.path.as_os_str() == IN_MEMORY {
            OpenMode::ReadWriteCreate
        } else {
            requested
        };

        if let Err(e) = self.open_and_reconcile(mode) {
            if let Err(close_err) = self.db.close() {
                warn!(
                    "event=helper_open name={} status=close_failed error={}",
                    self.name, close_err
                );
            }
            return Err(e);
        }

        Ok(&self.db)
    }

    fn open_configured(&self, mode: OpenMode) -> Result<()> {
        self.db.open(&self.path, mode)?;
        self.schema.on_configure(&self.db)
    }

    fn open_and_reconcile(&self, mode: OpenMode) -> Result<()> {
        self.open_configured(mode)?;

        if self.db.version()? != self.version {
            if mode.is_read_only() {
                // Migrations need a writable connection; reopen read-only afterwards.
                debug!(
                    "event=helper_open name={} reconcile_mode=read_write",
                    self.name
                );
                self.db.close()?;
                self.open_configured(OpenMode::ReadWriteCreate)?;
                self.reconcile()?;
                self.db.close()?;
                self.open_configured(OpenMode::ReadOnly)?;
            } else {
                self.reconcile()?;
            }
        }

        self.schema.on_open(&self.db)
    }

    fn reconcile(&self) -> Result<()> {
        let target = self.version;
        self.db.transaction(|db| {
            let stored = db.version()?;
            match stored.cmp(&target) {
                Ordering::Equal => return Ok(()),
                _ if stored == 0 => {
                    info!("event=schema_create name={} version={}", self.name, target);
                    self.schema.on_create(db)?;
                }
                Ordering::Less => {
                    info!(
                        "event=schema_upgrade name={} from={} to={}",
                        self.name, stored, target
                    );
                    self.schema.on_upgrade(db, stored, target)?;
                }
                Ordering::Greater => {
                    info!(
                        "event=schema_downgrade name={} from={} to={}",
                        self.name, stored, target
                    );
                    self.schema.on_downgrade(db, stored, target)?;
                }
            }
            db.set_version(target)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};

    #[derive(Default)]
    struct Recording {
        created: AtomicUsize,
        upgraded: Mutex<Vec<(u32, u32)>>,
        allow_downgrade: bool,
        fail_create: bool,
    }

    impl SchemaLifecycle for Recording {
        fn on_create(&self, db: &SqliteDatabase) -> Result<()> {
            self.created.fetch_add(1, AtomicOrdering::SeqCst);
            db.exec_query("CREATE TABLE cars (mpg TEXT, weight TEXT)")?;
            if self.fail_create {
                return Err(DatabaseError::query("create failed"));
            }
            Ok(())
        }

        fn on_upgrade(&self, _db: &SqliteDatabase, old: u32, new: u32) -> Result<()> {
            self.upgraded.lock().push((old, new));
            Ok(())
        }

        fn on_downgrade(&self, _db: &SqliteDatabase, old: u32, new: u32) -> Result<()> {
            if self.allow_downgrade {
                Ok(())
            } else {
                Err(DatabaseError::not_implemented(format!("{} -> {}", old, new)))
            }
        }
    }

    fn config(dir: &tempfile::TempDir) -> OpenHelperConfig {
        OpenHelperConfig::new().with_directory(dir.path())
    }

    #[test]
    fn test_zero_version_rejected() {
        let result = SqliteOpenHelper::new("cars", 0, Recording::default());
        assert!(matches!(result, Err(DatabaseError::Argument(_))));
    }

    #[test]
    fn test_version_beyond_header_range_rejected() {
        for version in [SqliteDatabase::MAX_VERSION + 1, u32::MAX] {
            let result = SqliteOpenHelper::new(IN_MEMORY, version, Recording::default());
            assert!(matches!(result, Err(DatabaseError::Argument(_))));
        }

        let helper =
            SqliteOpenHelper::new(IN_MEMORY, SqliteDatabase::MAX_VERSION, Recording::default())
                .unwrap();
        let db = helper.writable_database().unwrap();
        assert_eq!(db.version().unwrap(), SqliteDatabase::MAX_VERSION);
    }

    #[test]
    fn test_path_derived_from_name() {
        let dir = tempfile::tempdir().unwrap();
        let helper =
            SqliteOpenHelper::with_config("cars", 1, Recording::default(), config(&dir)).unwrap();
        assert_eq!(helper.path(), dir.path().join("cars.db"));
        assert_eq!(helper.database_name(), "cars");
        assert_eq!(helper.version(), 1);
    }

    #[test]
    fn test_first_open_creates_once() {
        let dir = tempfile::tempdir().unwrap();
        let helper =
            SqliteOpenHelper::with_config("cars", 3, Recording::default(), config(&dir)).unwrap();

        let db = helper.writable_database().unwrap();
        assert_eq!(db.version().unwrap(), 3);
        assert_eq!(helper.schema().created.load(AtomicOrdering::SeqCst), 1);

        helper.writable_database().unwrap();
        helper.readable_database().unwrap();
        assert_eq!(helper.schema().created.load(AtomicOrdering::SeqCst), 1);
        assert!(helper.schema().upgraded.lock().is_empty());
        assert!(!helper.is_read_only());
    }

    #[test]
    fn test_upgrade_receives_versions() {
        let dir = tempfile::tempdir().unwrap();
        {
            let helper =
                SqliteOpenHelper::with_config("cars", 1, Recording::default(), config(&dir))
                    .unwrap();
            helper.writable_database().unwrap();
        }

        let helper =
            SqliteOpenHelper::with_config("cars", 2, Recording::default(), config(&dir)).unwrap();
        let db = helper.writable_database().unwrap();
        assert_eq!(db.version().unwrap(), 2);
        assert_eq!(helper.schema().created.load(AtomicOrdering::SeqCst), 0);
        assert_eq!(*helper.schema().upgraded.lock(), vec![(1, 2)]);
    }

    #[test]
    fn test_default_downgrade_is_not_implemented() {
        struct NoDowngrade;
        impl SchemaLifecycle for NoDowngrade {
            fn on_create(&self, _db: &SqliteDatabase) -> Result<()> {
                Ok(())
            }
            fn on_upgrade(&self, _db: &SqliteDatabase, _old: u32, _new: u32) -> Result<()> {
                Ok(())
            }
        }

        let dir = tempfile::tempdir().unwrap();
        {
            let helper = SqliteOpenHelper::with_config("cars", 5, NoDowngrade, config(&dir)).unwrap();
            helper.writable_database().unwrap();
        }

        let helper = SqliteOpenHelper::with_config("cars", 4, NoDowngrade, config(&dir)).unwrap();
        assert!(matches!(
            helper.writable_database(),
            Err(DatabaseError::NotImplemented(_))
        ));

        // Failed opens leave the handle closed
        helper.close().unwrap();
        let db = SqliteDatabase::new();
        db.open(helper.path(), OpenMode::ReadOnly).unwrap();
        assert_eq!(db.version().unwrap(), 5);
    }

    #[test]
    fn test_overridden_downgrade_persists_target() {
        let dir = tempfile::tempdir().unwrap();
        {
            let helper =
                SqliteOpenHelper::with_config("cars", 5, Recording::default(), config(&dir))
                    .unwrap();
            helper.writable_database().unwrap();
        }

        let schema = Recording {
            allow_downgrade: true,
            ..Default::default()
        };
        let helper = SqliteOpenHelper::with_config("cars", 2, schema, config(&dir)).unwrap();
        assert_eq!(helper.writable_database().unwrap().version().unwrap(), 2);
    }

    #[test]
    fn test_failed_create_rolls_back() {
        let dir = tempfile::tempdir().unwrap();
        let schema = Recording {
            fail_create: true,
            ..Default::default()
        };
        let helper = SqliteOpenHelper::with_config("cars", 1, schema, config(&dir)).unwrap();
        assert!(helper.writable_database().is_err());

        let db = SqliteDatabase::new();
        db.open(helper.path(), OpenMode::ReadOnly).unwrap();
        assert_eq!(db.version().unwrap(), 0);
        let tables = db
            .raw_query("SELECT name FROM sqlite_master WHERE type='table' AND name='cars'", &[])
            .unwrap();
        assert_eq!(tables.count(), 0);
    }

    #[test]
    fn test_readable_database_on_new_resource() {
        let dir = tempfile::tempdir().unwrap();
        let helper =
            SqliteOpenHelper::with_config("cars", 1, Recording::default(), config(&dir)).unwrap();

        let db = helper.readable_database().unwrap();
        assert!(helper.is_read_only());
        assert_eq!(db.mode(), Some(OpenMode::ReadOnly));
        assert_eq!(db.version().unwrap(), 1);
        assert_eq!(helper.schema().created.load(AtomicOrdering::SeqCst), 1);
        assert!(matches!(db.set_version(2), Err(DatabaseError::Query(_))));

        // Closing the returned handle directly clears the read-only state too
        db.close().unwrap();
        assert!(!helper.is_read_only());

        helper.readable_database().unwrap();
        assert!(helper.is_read_only());
        helper.close().unwrap();
        assert!(!helper.is_read_only());
    }

    #[test]
    fn test_callback_order() {
        #[derive(Default)]
        struct Ordered(Mutex<Vec<&'static str>>);

        impl SchemaLifecycle for Ordered {
            fn on_configure(&self, db: &SqliteDatabase) -> Result<()> {
                assert!(!db.in_transaction());
                self.0.lock().push("configure");
                Ok(())
            }
            fn on_create(&self, db: &SqliteDatabase) -> Result<()> {
                assert!(db.in_transaction());
                self.0.lock().push("create");
                Ok(())
            }
            fn on_upgrade(&self, _db: &SqliteDatabase, _old: u32, _new: u32) -> Result<()> {
                self.0.lock().push("upgrade");
                Ok(())
            }
            fn on_open(&self, db: &SqliteDatabase) -> Result<()> {
                assert!(!db.in_transaction());
                self.0.lock().push("open");
                Ok(())
            }
        }

        let helper = SqliteOpenHelper::new(IN_MEMORY, 1, Ordered::default()).unwrap();
        helper.writable_database().unwrap();
        helper.writable_database().unwrap();
        assert_eq!(*helper.schema().0.lock(), vec!["configure", "create", "open"]);
    }

    #[test]
    fn test_reopen_after_close() {
        let helper = SqliteOpenHelper::new(IN_MEMORY, 1, Recording::default()).unwrap();

        let db = helper.writable_database().unwrap();
        assert!(db.is_open());
        db.close().unwrap();
        assert!(!db.is_open());
        assert!(matches!(
            db.exec_query("SELECT * FROM cars"),
            Err(DatabaseError::Query(_))
        ));

        // In-memory resources come back empty and are created again
        let db = helper.readable_database().unwrap();
        assert!(db.is_open());
        assert_eq!(db.mode(), Some(OpenMode::ReadWriteCreate));
        assert_eq!(helper.schema().created.load(AtomicOrdering::SeqCst), 2);
        helper.close().unwrap();
        helper.close().unwrap();
    }
}
