//! In-memory representation of a delimited text file.

use std::fmt;

/// A single data row, cells aligned to [`Table::columns`].
pub type Row = Vec<String>;

/// Ordered header plus ordered rows.
///
/// Every row has exactly as many cells as there are columns; [`Table::new`]
/// refuses anything else, so a `Table` is rectangular once it exists.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Row>,
}

/// A row whose width does not match the header.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RaggedRow {
    /// 0-based index of the offending data row.
    pub row: usize,
    pub expected: usize,
    pub found: usize,
}

impl fmt::Display for RaggedRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "row {} has {} cells, header has {}",
            self.row + 1,
            self.found,
            self.expected
        )
    }
}

impl std::error::Error for RaggedRow {}

impl Table {
    /// Build a table, checking that every row matches the header width.
    ///
    /// # Errors
    /// Returns [`RaggedRow`] for the first row whose length differs.
    pub fn new(columns: Vec<String>, rows: Vec<Row>) -> Result<Self, RaggedRow> {
        let expected = columns.len();
        if let Some((row, r)) = rows.iter().enumerate().find(|(_, r)| r.len() != expected) {
            return Err(RaggedRow { row, expected, found: r.len() });
        }
        Ok(Self { columns, rows })
    }

    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    #[must_use]
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Number of data rows (header excluded).
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
