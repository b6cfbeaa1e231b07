//! Transaction example
//!
//! This example demonstrates transaction management including:
//! - Beginning and committing transactions
//! - Rolling back when a statement fails
//! - The closure-based `transaction` helper
//! - The RAII `TransactionGuard`
//!
//! Run with: cargo run --example transactions

use rust_sqlite_helper::prelude::*;

fn main() -> Result<()> {
    println!("=== Rust SQLite Helper - Transaction Example ===\n");

    let db = SqliteDatabase::new();
    db.open(IN_MEMORY, OpenMode::ReadWriteCreate)?;

    println!("1. Setting up accounts table...");
    db.exec_query(
        "CREATE TABLE accounts (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            balance REAL NOT NULL CHECK(balance >= 0)
        )",
    )?;

    for (id, name, balance) in [(1, "Alice", 1000.0), (2, "Bob", 500.0), (3, "Charlie", 750.0)] {
        db.insert(
            "accounts",
            &["id", "name", "balance"],
            &[id.into(), name.into(), balance.into()],
        )?;
    }
    println!("   ✓ Accounts created\n");
    print_balances(&db)?;

    println!("\n2. Manual transaction (Alice -> Bob: $100)");
    db.begin_transaction()?;
    match transfer(&db, 1, 2, 100.0) {
        Ok(()) => {
            db.end_transaction()?;
            println!("   ✓ Transaction committed");
        }
        Err(e) => {
            db.rollback()?;
            println!("   ✗ Transaction rolled back: {}", e);
        }
    }
    print_balances(&db)?;

    println!("\n3. Closure transaction (Bob -> Alice: $1000, insufficient funds)");
    match db.transaction(|db| transfer(db, 2, 1, 1000.0)) {
        Ok(()) => println!("   ✓ Transaction committed"),
        Err(e) => println!("   ✗ Transaction rolled back: {}", e),
    }
    print_balances(&db)?;

    println!("\n4. Guarded transaction dropped without commit (Charlie -> Alice: $50)");
    {
        let tx = TransactionGuard::begin(&db)?;
        transfer(&tx, 3, 1, 50.0)?;
        println!("   ✓ Transfer applied inside the guard, dropping it now");
    }
    print_balances(&db)?;

    println!("\n=== Example completed successfully ===");
    Ok(())
}

fn transfer(db: &SqliteDatabase, from: i64, to: i64, amount: f64) -> Result<()> {
    db.exec_query_with_args(
        "UPDATE accounts SET balance = balance - ? WHERE id = ?",
        &[amount.into(), from.into()],
    )?;
    db.exec_query_with_args(
        "UPDATE accounts SET balance = balance + ? WHERE id = ?",
        &[amount.into(), to.into()],
    )?;
    Ok(())
}

fn print_balances(db: &SqliteDatabase) -> Result<()> {
    let mut cursor = db.query(
        &SelectBuilder::new("accounts")
            .columns(&["name", "balance"])
            .order_by_asc("id"),
    )?;
    println!("   Current balances:");
    while cursor.advance() {
        println!(
            "     {}: ${:.2}",
            cursor.get_string("name")?,
            cursor.get_double("balance")?
        );
    }
    Ok(())
}
