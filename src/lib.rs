//! # rowsift
//!
//! Substring filtering for live tables.
//!
//! Every suffix of every cell goes into a compressed trie ([`radix`]), so a
//! prefix query against the trie finds a search term anywhere inside a cell.
//! A [`FilterView`] keeps the set of backing rows that contain the current
//! term and, after each change to the backing table, reports the smallest
//! set of [`ViewEvent`]s that carries an observer from the old view to the
//! new one.
//!
//! ## Example
//!
//! ```rust
//! use rowsift::{FilterView, MemoryTable, ViewEvent};
//!
//! let mut table = MemoryTable::single_column(["apple", "banana", "grape"]);
//! let mut view = FilterView::new(&table).unwrap();
//! view.set_search_term("an").unwrap();
//! assert_eq!(view.visible_rows(), &[1]);
//!
//! let event = table.set_value(2, 0, "mango").unwrap();
//! let changes = view.handle(&table, event).unwrap();
//! assert_eq!(changes.as_slice(), &[ViewEvent::RowsInserted { first: 1, last: 1 }]);
//! ```
//!
//! The view is single-threaded: every operation runs to completion on the
//! calling thread and callers serialize access.

#![forbid(unsafe_code)]

pub mod config;
pub mod error;
pub mod indexer;
pub mod radix;
pub mod source;
pub mod view;

pub use config::{IndexConfig, ViewConfig};
pub use error::{FilterError, Result};
pub use indexer::{CellIndexer, MatchMap, SuffixIndexer};
pub use radix::{Collector, RadixTree, TERMINATOR};
pub use source::{MemoryTable, SourceEvent, TableSource};
pub use view::{ColumnScope, FilterView, ViewChanges, ViewEvent, ViewNotifier};
