use std::fmt::Display;
use thiserror::Error;

/// Errors raised while assembling a table from rows.
#[derive(Error, Debug)]
pub enum ValueError {
    #[error("Row {row} has {actual} values but the table has {expected} columns")]
    RaggedRow { row: usize, expected: usize, actual: usize },

    #[error("Column '{0}' appears more than once")]
    DuplicateColumn(String),
}

/// A single scalar cell value with an explicit null sentinel.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl Value {
    /// Returns true for `Null` and for floating point NaN.
    pub fn is_null(&self) -> bool {
        match self {
            Value::Null => true,
            Value::Float(value) => value.is_nan(),
            _ => false,
        }
    }

    /// Returns the identity used when comparing primary key values.
    /// Integral floats collapse onto integers so `1` and `1.0` match.
    pub fn key(&self) -> Key {
        match self {
            _ if self.is_null() => Key::Null,
            Value::Bool(value) => Key::Bool(*value),
            Value::Int(value) => Key::Int(*value),
            Value::Float(value) if value.fract() == 0.0 && value.abs() < i64::MAX as f64 => {
                Key::Int(*value as i64)
            }
            Value::Float(value) => Key::Float(value.to_bits()),
            Value::Str(value) => Key::Str(value.to_owned()),
            Value::Null => Key::Null,
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Bool(value) => write!(f, "{value}"),
            Value::Int(value) => write!(f, "{value}"),
            Value::Float(value) if value.is_nan() => Ok(()),
            // Debug keeps the shortest text that parses back to the same float ("1.0", "1e20").
            Value::Float(value) => write!(f, "{value:?}"),
            Value::Str(value) => f.write_str(value),
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Str(value.to_owned())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Str(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

/// Hashable identity of a primary key value.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Key {
    Null,
    Bool(bool),
    Int(i64),
    Float(u64),
    Str(String),
}

/// An in-memory table: ordered column names and row-major values.
///
/// Every row holds exactly one value per column.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Table {
    /// Column names in display order
    columns: Vec<String>,
    /// Row-major cell values
    rows: Vec<Vec<Value>>,
    /// Label written above the row index column
    pub index_name: Option<String>,
}

impl Table {
    /// Creates a table with the given columns and no rows.
    pub fn new<S: Into<String>>(columns: impl IntoIterator<Item = S>) -> Result<Self, ValueError> {
        let mut table = Table::default();
        for column in columns {
            let column = column.into();
            if table.columns.contains(&column) {
                return Err(ValueError::DuplicateColumn(column));
            }
            table.columns.push(column);
        }
        Ok(table)
    }

    /// Creates a table from columns and rows, rejecting rows of the wrong width.
    pub fn from_rows<S: Into<String>>(
        columns: impl IntoIterator<Item = S>,
        rows: Vec<Vec<Value>>,
    ) -> Result<Self, ValueError> {
        let mut table = Table::new(columns)?;
        for row in rows {
            table.push_row(row)?;
        }
        Ok(table)
    }

    /// Assembles a table from parts already known to be rectangular.
    pub(crate) fn from_parts(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        debug_assert!(rows.iter().all(|row| row.len() == columns.len()));
        Table {
            columns,
            rows,
            index_name: None,
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Returns true if the table has neither rows nor columns.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty() && self.columns.is_empty()
    }

    /// Returns the position of a column by name.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|column| column == name)
    }

    /// Returns the value at (row, column name), if both exist.
    pub fn get(&self, row: usize, column: &str) -> Option<&Value> {
        let col = self.column_index(column)?;
        self.rows.get(row).map(|values| &values[col])
    }

    /// Iterates over all values of one column.
    pub fn column(&self, name: &str) -> Option<impl Iterator<Item = &Value> + '_> {
        let col = self.column_index(name)?;
        Some(self.rows.iter().map(move |row| &row[col]))
    }

    /// Appends a row; its width must match the column count.
    pub fn push_row(&mut self, row: Vec<Value>) -> Result<(), ValueError> {
        if row.len() != self.columns.len() {
            Err(ValueError::RaggedRow {
                row: self.rows.len(),
                expected: self.columns.len(),
                actual: row.len(),
            })?;
        }
        self.rows.push(row);
        Ok(())
    }

    /// Returns a copy of one row laid out for another column order.
    /// Columns this table lacks come back as null.
    pub(crate) fn row_as(&self, row: usize, columns: &[String]) -> Vec<Value> {
        columns
            .iter()
            .map(|name| {
                self.column_index(name)
                    .map(|col| self.rows[row][col].to_owned())
                    .unwrap_or_default()
            })
            .collect()
    }

    /// Keeps only rows satisfying the predicate.
    pub(crate) fn retain_rows<F>(self, mut keep: F) -> Self
    where
        F: FnMut(&[Value]) -> bool,
    {
        Table {
            rows: self.rows.into_iter().filter(|row| keep(row)).collect(),
            ..self
        }
    }

    /// Returns a table with the given column layout, taking values by name.
    pub(crate) fn select(&self, columns: &[String]) -> Self {
        Table {
            columns: columns.to_vec(),
            rows: (0..self.rows.len()).map(|row| self.row_as(row, columns)).collect(),
            index_name: self.index_name.to_owned(),
        }
    }
}
