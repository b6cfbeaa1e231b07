//! SQL statement builders
//!
//! Structural fragments (table and column names, selections, clause bodies)
//! are concatenated as trusted text. Every data value travels separately in
//! `params()` and is bound to a `?` placeholder by the engine, never spliced
//! into the SQL string.

use super::error::{DatabaseError, Result};
use super::value::Value;

/// ORDER BY direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderDirection {
    /// Ascending order
    Asc,
    /// Descending order
    Desc,
}

impl OrderDirection {
    fn as_sql(&self) -> &'static str {
        match self {
            OrderDirection::Asc => "ASC",
            OrderDirection::Desc => "DESC",
        }
    }
}

fn require_table(table: &str) -> Result<()> {
    if table.trim().is_empty() {
        return Err(DatabaseError::argument("table name must not be empty"));
    }
    Ok(())
}

fn require_columns(columns: &[String], values: usize) -> Result<()> {
    if columns.is_empty() {
        return Err(DatabaseError::argument("column list must not be empty"));
    }
    if columns.len() != values {
        return Err(DatabaseError::argument(format!(
            "{} columns but {} values",
            columns.len(),
            values
        )));
    }
    Ok(())
}

fn non_blank(fragment: Option<&str>) -> Option<&str> {
    fragment.filter(|s| !s.trim().is_empty())
}

/// SELECT query builder
#[derive(Debug, Clone)]
pub struct SelectBuilder {
    table: String,
    columns: Vec<String>,
    distinct: bool,
    selection: Option<String>,
    selection_args: Vec<Value>,
    group_by: Option<String>,
    having: Option<String>,
    order_by: Vec<String>,
    limit: Option<usize>,
    offset: Option<usize>,
}

impl SelectBuilder {
    /// Create a new SELECT query builder over all columns of `table`
    ///
    /// # Example
    ///
    /// ```
    /// use rust_sqlite_helper::core::query_builder::SelectBuilder;
    ///
    /// let query = SelectBuilder::new("cars")
    ///     .columns(&["mpg", "weight"])
    ///     .selection("mpg > ?", vec!["20".into()])
    ///     .build()
    ///     .unwrap();
    /// assert_eq!(query, "SELECT mpg, weight FROM cars WHERE mpg > ?");
    /// ```
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            columns: Vec::new(),
            distinct: false,
            selection: None,
            selection_args: Vec::new(),
            group_by: None,
            having: None,
            order_by: Vec::new(),
            limit: None,
            offset: None,
        }
    }

    /// Select specific columns
    #[must_use]
    pub fn columns(mut self, columns: &[&str]) -> Self {
        self.columns = columns.iter().map(|s| s.to_string()).collect();
        self
    }

    /// Select all columns (*)
    #[must_use]
    pub fn all_columns(mut self) -> Self {
        self.columns.clear();
        self
    }

    /// Emit `SELECT DISTINCT`
    #[must_use]
    pub fn distinct(mut self, distinct: bool) -> Self {
        self.distinct = distinct;
        self
    }

    /// Set the WHERE fragment and the values bound to its `?` placeholders
    #[must_use]
    pub fn selection(mut self, selection: &str, args: Vec<Value>) -> Self {
        self.selection = Some(selection.to_string());
        self.selection_args = args;
        self
    }

    /// Set the GROUP BY fragment
    #[must_use]
    pub fn group_by(mut self, group_by: &str) -> Self {
        self.group_by = Some(group_by.to_string());
        self
    }

    /// Set the HAVING fragment (requires GROUP BY)
    #[must_use]
    pub fn having(mut self, having: &str) -> Self {
        self.having = Some(having.to_string());
        self
    }

    /// Add an ORDER BY term
    #[must_use]
    pub fn order_by(mut self, column: &str, direction: OrderDirection) -> Self {
        self.order_by
            .push(format!("{} {}", column, direction.as_sql()));
        self
    }

    /// Add ORDER BY ASC
    #[must_use]
    pub fn order_by_asc(self, column: &str) -> Self {
        self.order_by(column, OrderDirection::Asc)
    }

    /// Add ORDER BY DESC
    #[must_use]
    pub fn order_by_desc(self, column: &str) -> Self {
        self.order_by(column, OrderDirection::Desc)
    }

    /// Add a raw ORDER BY fragment, e.g. `"weight DESC, mpg"`
    #[must_use]
    pub fn order_by_clause(mut self, clause: &str) -> Self {
        self.order_by.push(clause.to_string());
        self
    }

    /// Add LIMIT clause
    #[must_use]
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Add OFFSET clause (requires LIMIT)
    #[must_use]
    pub fn offset(mut self, offset: usize) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Build the SQL query string
    pub fn build(&self) -> Result<String> {
        require_table(&self.table)?;

        let group_by = non_blank(self.group_by.as_deref());
        let having = non_blank(self.having.as_deref());
        if having.is_some() && group_by.is_none() {
            return Err(DatabaseError::argument(
                "HAVING clauses are only permitted when using a GROUP BY clause",
            ));
        }
        if self.offset.is_some() && self.limit.is_none() {
            return Err(DatabaseError::argument("OFFSET requires a LIMIT"));
        }

        let mut sql = String::from("SELECT ");
        if self.distinct {
            sql.push_str("DISTINCT ");
        }
        if self.columns.is_empty() {
            sql.push('*');
        } else {
            sql.push_str(&self.columns.join(", "));
        }
        sql.push_str(" FROM ");
        sql.push_str(&self.table);

        if let Some(selection) = non_blank(self.selection.as_deref()) {
            sql.push_str(&format!(" WHERE {}", selection));
        }
        if let Some(group_by) = group_by {
            sql.push_str(&format!(" GROUP BY {}", group_by));
        }
        if let Some(having) = having {
            sql.push_str(&format!(" HAVING {}", having));
        }
        if !self.order_by.is_empty() {
            sql.push_str(&format!(" ORDER BY {}", self.order_by.join(", ")));
        }
        if let Some(limit) = self.limit {
            sql.push_str(&format!(" LIMIT {}", limit));
        }
        if let Some(offset) = self.offset {
            sql.push_str(&format!(" OFFSET {}", offset));
        }

        Ok(sql)
    }

    /// Get the parameter values for the selection placeholders
    pub fn params(&self) -> &[Value] {
        &self.selection_args
    }
}

/// INSERT query builder
#[derive(Debug, Clone)]
pub struct InsertBuilder {
    table: String,
    columns: Vec<String>,
    values: Vec<Value>,
}

impl InsertBuilder {
    /// Create a new INSERT query builder
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            columns: Vec::new(),
            values: Vec::new(),
        }
    }

    /// Create a builder from parallel column and value lists
    pub fn from_columns(
        table: impl Into<String>,
        columns: &[&str],
        values: &[Value],
    ) -> Result<Self> {
        let builder = Self {
            table: table.into(),
            columns: columns.iter().map(|s| s.to_string()).collect(),
            values: values.to_vec(),
        };
        require_columns(&builder.columns, builder.values.len())?;
        Ok(builder)
    }

    /// Add a column-value pair
    #[must_use]
    pub fn value(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.columns.push(column.to_string());
        self.values.push(value.into());
        self
    }

    /// Build the SQL query string
    pub fn build(&self) -> Result<String> {
        require_table(&self.table)?;
        require_columns(&self.columns, self.values.len())?;

        let placeholders: Vec<&str> = vec!["?"; self.values.len()];
        Ok(format!(
            "INSERT INTO {} ({}) VALUES ({})",
            self.table,
            self.columns.join(", "),
            placeholders.join(", ")
        ))
    }

    /// Get the parameter values
    pub fn params(&self) -> &[Value] {
        &self.values
    }
}

/// UPDATE query builder
#[derive(Debug, Clone)]
pub struct UpdateBuilder {
    table: String,
    set_columns: Vec<String>,
    set_values: Vec<Value>,
    selection: Option<String>,
    selection_args: Vec<Value>,
}

impl UpdateBuilder {
    /// Create a new UPDATE query builder
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            set_columns: Vec::new(),
            set_values: Vec::new(),
            selection: None,
            selection_args: Vec::new(),
        }
    }

    /// Create a builder from parallel column and value lists
    pub fn from_columns(
        table: impl Into<String>,
        columns: &[&str],
        values: &[Value],
    ) -> Result<Self> {
        let builder = Self {
            set_columns: columns.iter().map(|s| s.to_string()).collect(),
            set_values: values.to_vec(),
            ..Self::new(table)
        };
        require_columns(&builder.set_columns, builder.set_values.len())?;
        Ok(builder)
    }

    /// Set a column value
    #[must_use]
    pub fn set(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.set_columns.push(column.to_string());
        self.set_values.push(value.into());
        self
    }

    /// Set the WHERE fragment and the values bound to its `?` placeholders
    #[must_use]
    pub fn selection(mut self, selection: &str, args: Vec<Value>) -> Self {
        self.selection = Some(selection.to_string());
        self.selection_args = args;
        self
    }

    /// Build the SQL query string
    pub fn build(&self) -> Result<String> {
        require_table(&self.table)?;
        require_columns(&self.set_columns, self.set_values.len())?;

        let set_clauses: Vec<String> = self
            .set_columns
            .iter()
            .map(|col| format!("{} = ?", col))
            .collect();

        let mut sql = format!("UPDATE {} SET {}", self.table, set_clauses.join(", "));
        if let Some(selection) = non_blank(self.selection.as_deref()) {
            sql.push_str(&format!(" WHERE {}", selection));
        }

        Ok(sql)
    }

    /// Get the parameter values (SET values followed by selection values)
    pub fn params(&self) -> Vec<Value> {
        let mut params = self.set_values.clone();
        params.extend(self.selection_args.iter().cloned());
        params
    }
}

/// DELETE query builder
///
/// A selection is mandatory: table-wide deletes must go through raw SQL.
#[derive(Debug, Clone)]
pub struct DeleteBuilder {
    table: String,
    selection: Option<String>,
    selection_args: Vec<Value>,
}

impl DeleteBuilder {
    /// Create a new DELETE query builder
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            selection: None,
            selection_args: Vec::new(),
        }
    }

    /// Set the WHERE fragment and the values bound to its `?` placeholders
    #[must_use]
    pub fn selection(mut self, selection: &str, args: Vec<Value>) -> Self {
        self.selection = Some(selection.to_string());
        self.selection_args = args;
        self
    }

    /// Build the SQL query string
    pub fn build(&self) -> Result<String> {
        require_table(&self.table)?;
        let selection = non_blank(self.selection.as_deref()).ok_or_else(|| {
            DatabaseError::argument("delete requires a non-empty selection")
        })?;
        Ok(format!("DELETE FROM {} WHERE {}", self.table, selection))
    }

    /// Get the parameter values
    pub fn params(&self) -> &[Value] {
        &self.selection_args
    }
}
