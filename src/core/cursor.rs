//! Materialized result cursor
//!
//! A [`Cursor`] holds every row a query produced, in engine order, and walks
//! them forward one at a time. Positions and column indices are 0-based.
//! Before the first [`Cursor::advance`] the cursor sits before the first row
//! and no cell can be read.

use super::error::{DatabaseError, Result};
use super::value::Value;
use std::collections::HashMap;

/// Anything that can address a column of a [`Cursor`]: a 0-based index or a name.
pub trait ColumnIndex {
    /// Resolve to a 0-based column index within `cursor`
    fn resolve(&self, cursor: &Cursor) -> Result<usize>;
}

impl ColumnIndex for usize {
    fn resolve(&self, cursor: &Cursor) -> Result<usize> {
        if *self < cursor.column_count() {
            Ok(*self)
        } else {
            Err(DatabaseError::index(*self, cursor.column_count()))
        }
    }
}

impl ColumnIndex for &str {
    fn resolve(&self, cursor: &Cursor) -> Result<usize> {
        cursor.column_index(self)
    }
}

impl ColumnIndex for &String {
    fn resolve(&self, cursor: &Cursor) -> Result<usize> {
        cursor.column_index(self)
    }
}

/// Forward-only view over a fully materialized result set
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Cursor {
    column_names: Vec<String>,
    column_map: HashMap<String, usize>,
    rows: Vec<Vec<Value>>,
    position: Option<usize>,
}

impl Cursor {
    /// Create an empty cursor
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn set_column_names(&mut self, names: Vec<String>) {
        self.column_map.clear();
        for (i, name) in names.iter().enumerate() {
            // First occurrence wins when a projection repeats a name.
            self.column_map.entry(name.clone()).or_insert(i);
        }
        self.column_names = names;
    }

    pub(crate) fn add_row(&mut self, row: Vec<Value>) {
        debug_assert_eq!(row.len(), self.column_names.len());
        self.rows.push(row);
    }

    /// Move to the next row. Returns `false` once every row has been visited.
    pub fn advance(&mut self) -> bool {
        let next = self.position.map_or(0, |p| p.saturating_add(1));
        if next < self.rows.len() {
            self.position = Some(next);
            true
        } else {
            self.position = Some(self.rows.len());
            false
        }
    }

    /// Rewind to the first row. Returns `false` if the cursor is empty.
    pub fn move_to_first(&mut self) -> bool {
        if self.rows.is_empty() {
            self.position = None;
            false
        } else {
            self.position = Some(0);
            true
        }
    }

    /// Current row position, `None` before the first advance
    pub fn position(&self) -> Option<usize> {
        self.position.filter(|p| *p < self.rows.len())
    }

    /// Total number of rows
    pub fn count(&self) -> usize {
        self.rows.len()
    }

    /// Check if the result set has no rows
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Column names in engine order
    pub fn column_names(&self) -> &[String] {
        &self.column_names
    }

    /// Number of columns
    pub fn column_count(&self) -> usize {
        self.column_names.len()
    }

    /// 0-based index of the named column
    pub fn column_index(&self, name: &str) -> Result<usize> {
        self.column_map
            .get(name)
            .copied()
            .ok_or_else(|| DatabaseError::unknown_column(name))
    }

    /// Clear rows, column metadata and position
    pub fn reset(&mut self) {
        self.column_names.clear();
        self.column_map.clear();
        self.rows.clear();
        self.position = None;
    }

    fn cell<C: ColumnIndex>(&self, column: C) -> Result<&Value> {
        let index = column.resolve(self)?;
        let row = self
            .position()
            .and_then(|p| self.rows.get(p))
            .ok_or(DatabaseError::NoCurrentRow)?;
        Ok(&row[index])
    }

    /// Raw value of a cell in the current row
    pub fn get_value<C: ColumnIndex>(&self, column: C) -> Result<&Value> {
        self.cell(column)
    }

    /// Check whether a cell in the current row is NULL
    pub fn is_null<C: ColumnIndex>(&self, column: C) -> Result<bool> {
        Ok(self.cell(column)?.is_null())
    }

    /// Read a cell as text
    pub fn get_string<C: ColumnIndex>(&self, column: C) -> Result<String> {
        self.cell(column)?
            .to_text()
            .ok_or_else(|| DatabaseError::conversion("NULL", "string"))
    }

    /// Read a cell as a 32-bit integer
    pub fn get_int<C: ColumnIndex>(&self, column: C) -> Result<i32> {
        self.parse(column, "i32")
    }

    /// Read a cell as a 64-bit integer
    pub fn get_long<C: ColumnIndex>(&self, column: C) -> Result<i64> {
        self.parse(column, "i64")
    }

    /// Read a cell as a double
    pub fn get_double<C: ColumnIndex>(&self, column: C) -> Result<f64> {
        self.parse(column, "f64")
    }

    /// Read a cell as raw bytes
    pub fn get_blob<C: ColumnIndex>(&self, column: C) -> Result<Vec<u8>> {
        let value = self.cell(column)?;
        match value.as_bytes() {
            Some(bytes) => Ok(bytes.to_vec()),
            None => value
                .to_text()
                .map(String::into_bytes)
                .ok_or_else(|| DatabaseError::conversion("NULL", "blob")),
        }
    }

    fn parse<C, T>(&self, column: C, target: &'static str) -> Result<T>
    where
        C: ColumnIndex,
        T: std::str::FromStr,
    {
        let text = self
            .cell(column)?
            .to_text()
            .ok_or_else(|| DatabaseError::conversion("NULL", target))?;
        text.parse::<T>()
            .map_err(|_| DatabaseError::conversion(text, target))
    }
}
