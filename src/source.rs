//! The backing table a [`FilterView`](crate::view::FilterView) filters.
//!
//! A source is read through [`TableSource`] and reports each mutation as a
//! [`SourceEvent`], which the caller forwards to the view. Row ranges are
//! inclusive. For [`SourceEvent::RowsDeleted`] they name the rows as they were
//! numbered before the deletion; for every other event, as numbered after.

use std::borrow::Cow;

use crate::error::{FilterError, Result};

/// Read access to tabular cell text.
pub trait TableSource {
    fn row_count(&self) -> usize;

    fn column_count(&self) -> usize;

    /// Text of a cell, or `None` for a cell with no value.
    fn value_at(&self, row: usize, column: usize) -> Option<Cow<'_, str>>;
}

/// A change notification from the backing table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceEvent {
    /// Columns were added, removed or reordered.
    StructureChanged,
    /// Any or all data may have changed, including the row count.
    FullReload,
    /// Cells in every column of the rows changed.
    RowsUpdated { first: usize, last: usize },
    /// Cells in one column of the rows changed.
    CellsUpdated {
        first: usize,
        last: usize,
        column: usize,
    },
    RowsDeleted { first: usize, last: usize },
    RowsInserted { first: usize, last: usize },
}

/// An in-memory table of strings. Each mutation returns the event to forward.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryTable {
    columns: usize,
    rows: Vec<Vec<String>>,
}

impl MemoryTable {
    pub fn new(columns: usize) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Build a table from rows; short rows are padded with empty cells.
    pub fn from_rows<R, S>(rows: R) -> Self
    where
        R: IntoIterator,
        R::Item: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let rows: Vec<Vec<String>> = rows
            .into_iter()
            .map(|r| r.into_iter().map(Into::into).collect())
            .collect();
        let columns = rows.iter().map(Vec::len).max().unwrap_or(0);
        let mut table = Self { columns, rows };
        table.pad_rows();
        table
    }

    /// A single-column table.
    pub fn single_column<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::from_rows(values.into_iter().map(|v| [v]))
    }

    pub fn get(&self, row: usize, column: usize) -> Option<&str> {
        self.rows.get(row)?.get(column).map(String::as_str)
    }

    pub fn set_value(&mut self, row: usize, column: usize, value: impl Into<String>) -> Result<SourceEvent> {
        self.check_cell(row, column)?;
        self.rows[row][column] = value.into();
        Ok(SourceEvent::CellsUpdated {
            first: row,
            last: row,
            column,
        })
    }

    /// Replace every cell of one row.
    pub fn set_row<S: Into<String>>(&mut self, row: usize, values: impl IntoIterator<Item = S>) -> Result<SourceEvent> {
        if row >= self.rows.len() {
            return Err(FilterError::row_out_of_bounds(row, self.rows.len()));
        }
        let mut values: Vec<String> = values.into_iter().map(Into::into).collect();
        values.resize(self.columns, String::new());
        self.rows[row] = values;
        Ok(SourceEvent::RowsUpdated {
            first: row,
            last: row,
        })
    }

    /// Insert rows before `at`. Returns `None` if `rows` is empty.
    pub fn insert_rows<R, S>(&mut self, at: usize, rows: R) -> Result<Option<SourceEvent>>
    where
        R: IntoIterator,
        R::Item: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if at > self.rows.len() {
            return Err(FilterError::row_out_of_bounds(at, self.rows.len()));
        }
        let columns = self.columns;
        let new_rows: Vec<Vec<String>> = rows
            .into_iter()
            .map(|r| {
                let mut cells: Vec<String> = r.into_iter().map(Into::into).collect();
                cells.resize(columns, String::new());
                cells
            })
            .collect();
        if new_rows.is_empty() {
            return Ok(None);
        }
        let count = new_rows.len();
        self.rows.splice(at..at, new_rows);
        Ok(Some(SourceEvent::RowsInserted {
            first: at,
            last: at + count - 1,
        }))
    }

    pub fn remove_rows(&mut self, first: usize, last: usize) -> Result<SourceEvent> {
        FilterError::check_range(first, last, self.rows.len())?;
        self.rows.drain(first..=last);
        Ok(SourceEvent::RowsDeleted { first, last })
    }

    /// Replace the entire contents, keeping the column count.
    pub fn reload<R, S>(&mut self, rows: R) -> SourceEvent
    where
        R: IntoIterator,
        R::Item: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.rows = rows
            .into_iter()
            .map(|r| r.into_iter().map(Into::into).collect())
            .collect();
        self.pad_rows();
        SourceEvent::FullReload
    }

    /// Append a column filled with `fill`.
    pub fn push_column(&mut self, fill: impl Into<String>) -> SourceEvent {
        let fill = fill.into();
        self.columns += 1;
        for row in &mut self.rows {
            row.push(fill.clone());
        }
        SourceEvent::StructureChanged
    }

    fn pad_rows(&mut self) {
        let columns = self.columns;
        for row in &mut self.rows {
            row.resize(columns, String::new());
        }
    }

    fn check_cell(&self, row: usize, column: usize) -> Result<()> {
        if row >= self.rows.len() {
            return Err(FilterError::row_out_of_bounds(row, self.rows.len()));
        }
        if column >= self.columns {
            return Err(FilterError::column_out_of_bounds(column, self.columns));
        }
        Ok(())
    }
}

impl TableSource for MemoryTable {
    fn row_count(&self) -> usize {
        self.rows.len()
    }

    fn column_count(&self) -> usize {
        self.columns
    }

    fn value_at(&self, row: usize, column: usize) -> Option<Cow<'_, str>> {
        self.get(row, column)
            .filter(|s| !s.is_empty())
            .map(Cow::Borrowed)
    }
}
