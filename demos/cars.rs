//! Schema open helper example
//!
//! This example demonstrates the versioned open helper:
//! - Creating a database on first open
//! - Upgrading it when the schema version increases
//! - Querying rows back through a cursor
//!
//! Run with: cargo run --example cars

use rust_sqlite_helper::prelude::*;

struct CarsV1;

impl SchemaLifecycle for CarsV1 {
    fn on_create(&self, db: &SqliteDatabase) -> Result<()> {
        db.exec_query("CREATE TABLE IF NOT EXISTS cars (mpg TEXT, weight TEXT)")?;
        for (mpg, weight) in [("34", "2000"), ("27", "25000"), ("16", "5000")] {
            db.insert("cars", &["mpg", "weight"], &[mpg.into(), weight.into()])?;
        }
        Ok(())
    }

    fn on_upgrade(&self, _db: &SqliteDatabase, _old: u32, _new: u32) -> Result<()> {
        Ok(())
    }
}

struct CarsV2;

impl SchemaLifecycle for CarsV2 {
    fn on_create(&self, db: &SqliteDatabase) -> Result<()> {
        CarsV1.on_create(db)?;
        self.on_upgrade(db, 1, 2)
    }

    fn on_upgrade(&self, db: &SqliteDatabase, old: u32, _new: u32) -> Result<()> {
        if old < 2 {
            db.exec_query("ALTER TABLE cars ADD COLUMN make TEXT")?;
            db.update("cars", &["make"], &["unknown".into()], None, &[])?;
        }
        Ok(())
    }
}

fn main() -> Result<()> {
    println!("=== Rust SQLite Helper - Open Helper Example ===\n");

    let dir = std::env::temp_dir().join("rust_sqlite_helper_demo");
    std::fs::create_dir_all(&dir).map_err(|e| DatabaseError::open(dir.display().to_string(), e.to_string()))?;
    let config = OpenHelperConfig::new().with_directory(&dir);
    // Start from a fresh file so the demo always walks create -> upgrade.
    let _ = std::fs::remove_file(config.path_for("cars"));

    println!("1. Opening version 1...");
    {
        let helper = SqliteOpenHelper::with_config("cars", 1, CarsV1, config.clone())?;
        let db = helper.writable_database()?;
        println!("   ✓ {} at version {}", helper.path().display(), db.version()?);
        print_cars(db)?;
    }

    println!("\n2. Opening version 2...");
    let helper = SqliteOpenHelper::with_config("cars", 2, CarsV2, config)?;
    let db = helper.readable_database()?;
    println!("   ✓ Upgraded to version {}", db.version()?);

    let mut cursor = db.query(
        &SelectBuilder::new("cars")
            .columns(&["make", "mpg"])
            .selection("CAST(mpg AS INTEGER) > ?", vec![20.into()])
            .order_by_desc("mpg"),
    )?;
    println!("   Cars above 20 mpg:");
    while cursor.advance() {
        println!("     {} ({} mpg)", cursor.get_string("make")?, cursor.get_int("mpg")?);
    }

    helper.close()?;
    std::fs::remove_file(helper.path())
        .map_err(|e| DatabaseError::close(e.to_string()))?;

    println!("\n=== Example completed successfully ===");
    Ok(())
}

fn print_cars(db: &SqliteDatabase) -> Result<()> {
    let mut cursor = db.query(&SelectBuilder::new("cars").columns(&["mpg", "weight"]))?;
    println!("   {} cars:", cursor.count());
    while cursor.advance() {
        println!(
            "     {} mpg, {} lbs",
            cursor.get_string("mpg")?,
            cursor.get_long("weight")?
        );
    }
    Ok(())
}
