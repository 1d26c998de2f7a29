//! Error handling for rowsift.
//!
//! Absent keys, values and prefixes are ordinary outcomes and never surface
//! here. Everything in [`FilterError`] is an argument the caller should not
//! have passed; operations reject such input before touching any state.

use thiserror::Error;

/// Main error type for index and view operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FilterError {
    /// A key passed to `add`/`remove` was empty.
    #[error("key must not be empty")]
    EmptyKey,

    /// A key did not end with the terminator character.
    #[error("key {key:?} does not end with the terminator")]
    MissingTerminator {
        /// The offending key
        key: String,
    },

    /// The terminator appeared somewhere other than the final position.
    #[error("key {key:?} contains the terminator at char offset {position}")]
    TerminatorInKey {
        /// The offending key
        key: String,
        /// Char offset of the stray terminator
        position: usize,
    },

    /// A row index outside the current table.
    #[error("row {row} out of bounds for {rows} rows")]
    RowOutOfBounds {
        /// The invalid row
        row: usize,
        /// Number of rows available
        rows: usize,
    },

    /// A column index outside the current table.
    #[error("column {column} out of bounds for {columns} columns")]
    ColumnOutOfBounds {
        /// The invalid column
        column: usize,
        /// Number of columns available
        columns: usize,
    },

    /// An inclusive row range with `first > last`.
    #[error("invalid row range {first}..={last}")]
    InvalidRange {
        /// First row of the range
        first: usize,
        /// Last row of the range
        last: usize,
    },

    /// A row insertion or deletion that disagrees with the source's row count.
    #[error("source has {actual} rows, expected {expected} after the change")]
    RowCountMismatch {
        /// Row count implied by the event
        expected: usize,
        /// Row count reported by the source
        actual: usize,
    },

    /// The table has more rows than a visibility bitmap can address.
    #[error("table with {rows} rows exceeds the addressable row limit")]
    TooManyRows {
        /// Row count reported by the source
        rows: usize,
    },
}

impl FilterError {
    /// Create a missing terminator error
    pub fn missing_terminator<S: Into<String>>(key: S) -> Self {
        Self::MissingTerminator { key: key.into() }
    }

    /// Create a stray terminator error
    pub fn terminator_in_key<S: Into<String>>(key: S, position: usize) -> Self {
        Self::TerminatorInKey {
            key: key.into(),
            position,
        }
    }

    /// Create a row out of bounds error
    pub fn row_out_of_bounds(row: usize, rows: usize) -> Self {
        Self::RowOutOfBounds { row, rows }
    }

    /// Create a column out of bounds error
    pub fn column_out_of_bounds(column: usize, columns: usize) -> Self {
        Self::ColumnOutOfBounds { column, columns }
    }

    /// Check an inclusive row range against a row count.
    pub fn check_range(first: usize, last: usize, rows: usize) -> Result<()> {
        if first > last {
            return Err(Self::InvalidRange { first, last });
        }
        if last >= rows {
            return Err(Self::row_out_of_bounds(last, rows));
        }
        Ok(())
    }

    /// Check the source's row count against the one an event implies.
    pub fn check_row_count(expected: usize, actual: usize) -> Result<()> {
        if expected != actual {
            return Err(Self::RowCountMismatch { expected, actual });
        }
        Ok(())
    }
}

/// Result type alias for rowsift operations
pub type Result<T, E = FilterError> = std::result::Result<T, E>;
