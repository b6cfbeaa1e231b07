//! Property-based tests for the database handle using proptest

use proptest::prelude::*;
use rust_sqlite_helper::prelude::*;

fn open_cars() -> SqliteDatabase {
    let db = SqliteDatabase::new();
    db.open(IN_MEMORY, OpenMode::ReadWriteCreate).unwrap();
    db.exec_query("CREATE TABLE cars (mpg TEXT, weight TEXT)").unwrap();
    db
}

/// Printable strings biased toward characters that break naive SQL quoting
fn hostile_text() -> impl Strategy<Value = String> {
    prop_oneof![
        "[ -~]{0,40}",
        "[' %_;\"\\\\\t-]{0,12}",
        Just("'); DROP TABLE cars; --".to_string()),
        Just("100% 'quoted'  and  spaced ".to_string()),
    ]
}

// ============================================================================
// Version Roundtrip Tests
// ============================================================================

proptest! {
    /// set_version followed by version returns the value written
    #[test]
    fn test_version_roundtrip(version in 0..=SqliteDatabase::MAX_VERSION) {
        let db = SqliteDatabase::new();
        db.open(IN_MEMORY, OpenMode::ReadWriteCreate).unwrap();
        db.set_version(version).unwrap();
        prop_assert_eq!(db.version().unwrap(), version);
    }

    /// Versions the header cannot hold are refused, never truncated
    #[test]
    fn test_oversized_version_rejected(version in (SqliteDatabase::MAX_VERSION + 1)..=u32::MAX) {
        let db = SqliteDatabase::new();
        db.open(IN_MEMORY, OpenMode::ReadWriteCreate).unwrap();
        db.set_version(1).unwrap();
        let rejected = matches!(db.set_version(version), Err(DatabaseError::Argument(_)));
        prop_assert!(rejected);
        prop_assert_eq!(db.version().unwrap(), 1);
    }
}

// ============================================================================
// Parameter Binding Tests
// ============================================================================

proptest! {
    /// Values inserted through the builder come back unchanged when selected
    /// with a bound selection, whatever quotes or wildcards they contain
    #[test]
    fn test_insert_query_roundtrip(mpg in hostile_text(), weight in hostile_text()) {
        let db = open_cars();
        db.insert("cars", &["mpg", "weight"], &[mpg.clone().into(), weight.clone().into()]).unwrap();

        let mut cursor = db
            .query(
                &SelectBuilder::new("cars")
                    .columns(&["mpg", "weight"])
                    .selection("mpg = ? AND weight = ?", vec![mpg.clone().into(), weight.clone().into()]),
            )
            .unwrap();

        prop_assert_eq!(cursor.count(), 1);
        prop_assert!(cursor.advance());
        prop_assert_eq!(cursor.get_string("mpg").unwrap(), mpg);
        prop_assert_eq!(cursor.get_string("weight").unwrap(), weight);
        prop_assert!(!cursor.advance());

        // The table survived whatever the strings contained
        prop_assert_eq!(db.query(&SelectBuilder::new("cars")).unwrap().count(), 1);
    }

    /// update reports exactly the rows matched by the selection
    #[test]
    fn test_update_count_matches_selection(
        rows in prop::collection::vec(0u8..4, 0..20),
        target in 0u8..5,
    ) {
        let db = open_cars();
        for mpg in &rows {
            db.insert("cars", &["mpg", "weight"], &[mpg.to_string().into(), "0".into()]).unwrap();
        }

        let expected = rows.iter().filter(|mpg| **mpg == target).count();
        let updated = db
            .update("cars", &["weight"], &["1".into()], Some("mpg = ?"), &[target.to_string().into()])
            .unwrap();
        prop_assert_eq!(updated, expected);

        let removed = db.remove("cars", "weight = ?", &["1".into()]).unwrap();
        prop_assert_eq!(removed, expected);
        prop_assert_eq!(db.query(&SelectBuilder::new("cars")).unwrap().count(), rows.len() - expected);
    }
}

// ============================================================================
// Cursor Conversion Tests
// ============================================================================

proptest! {
    /// Integers stored as text read back through every numeric accessor
    #[test]
    fn test_numeric_text_conversions(value in any::<i32>()) {
        let db = open_cars();
        db.insert("cars", &["mpg"], &[value.to_string().into()]).unwrap();

        let mut cursor = db.raw_query("SELECT mpg FROM cars", &[]).unwrap();
        prop_assert!(cursor.advance());
        prop_assert_eq!(cursor.get_int(0).unwrap(), value);
        prop_assert_eq!(cursor.get_long(0).unwrap(), value as i64);
        prop_assert_eq!(cursor.get_double(0).unwrap(), value as f64);
    }

    /// Non-numeric text never converts silently
    #[test]
    fn test_non_numeric_text_fails_conversion(text in "[a-zA-Z' %]{1,16}") {
        let db = open_cars();
        db.insert("cars", &["mpg"], &[text.into()]).unwrap();

        let mut cursor = db.raw_query("SELECT mpg FROM cars", &[]).unwrap();
        prop_assert!(cursor.advance());
        let is_conversion_error = matches!(cursor.get_long("mpg"), Err(DatabaseError::Conversion { .. }));
        prop_assert!(is_conversion_error);
    }
}
