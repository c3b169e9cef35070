//! Table types.

use serde::{Deserialize, Serialize};

/// A table as an ordered list of rows of string cells.
///
/// A table always has at least one row. Rows may have different lengths;
/// no schema is imposed and the first row is not treated as a header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Vec<String>>", into = "Vec<Vec<String>>")]
pub struct Table {
    rows: Vec<Vec<String>>,
}

impl Table {
    /// Build a table, or `None` when `rows` is empty.
    pub fn from_rows(rows: Vec<Vec<String>>) -> Option<Self> {
        if rows.is_empty() {
            None
        } else {
            Some(Self { rows })
        }
    }

    /// All rows.
    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    /// Number of rows (always at least one).
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Width of the widest row.
    pub fn column_count(&self) -> usize {
        self.rows.iter().map(Vec::len).max().unwrap_or(0)
    }

    /// Whether rows differ in length.
    pub fn is_ragged(&self) -> bool {
        let first = self.rows[0].len();
        self.rows.iter().any(|r| r.len() != first)
    }

    /// Get a cell, tolerating ragged rows.
    pub fn cell(&self, row: usize, col: usize) -> Option<&str> {
        self.rows.get(row)?.get(col).map(String::as_str)
    }

    /// Render rows as lines of cells joined by `separator`.
    pub fn to_delimited(&self, separator: &str) -> String {
        self.rows
            .iter()
            .map(|row| row.join(separator))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl TryFrom<Vec<Vec<String>>> for Table {
    type Error = String;

    fn try_from(rows: Vec<Vec<String>>) -> Result<Self, Self::Error> {
        Self::from_rows(rows).ok_or_else(|| "a table must contain at least one row".to_string())
    }
}

impl From<Table> for Vec<Vec<String>> {
    fn from(table: Table) -> Self {
        table.rows
    }
}
