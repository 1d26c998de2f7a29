//! The filtered view: which backing rows pass the current search term, in
//! what order, and what changed after each mutation.
//!
//! [`FilterView`] keeps a bitmap of passing backing rows and the ascending
//! row map derived from it. Every public mutation returns the
//! [`ViewChanges`] an observer needs to move from the previous view to the
//! new one; applying them in order to a copy of the old row map yields the
//! new row map.
//!
//! ```rust
//! use rowsift::source::MemoryTable;
//! use rowsift::view::{FilterView, ViewEvent};
//!
//! let table = MemoryTable::single_column(["apple", "banana", "grape"]);
//! let mut view = FilterView::new(&table).unwrap();
//!
//! view.set_search_term("an").unwrap();
//! assert_eq!(view.visible_rows(), &[1]);
//!
//! let changes = view.clear_search().unwrap();
//! assert_eq!(changes.as_slice(), &[ViewEvent::Reset]);
//! assert_eq!(view.row_count(), 3);
//! ```

pub mod diff;

#[cfg(test)]
mod proptests;

use std::borrow::Cow;
use std::collections::BTreeSet;
use std::mem;
use std::rc::Rc;

use roaring::RoaringBitmap;
use smallvec::{smallvec, SmallVec};

use crate::config::ViewConfig;
use crate::error::{FilterError, Result};
use crate::indexer::{CellIndexer, MatchMap, SuffixIndexer};
use crate::source::{SourceEvent, TableSource};

/// Columns covered by a [`ViewEvent::CellsUpdated`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnScope {
    All,
    Column(usize),
}

/// A change notification for observers of the view. Row ranges are
/// inclusive view positions; a deletion names positions as they were before
/// it, every other event as they are after it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViewEvent {
    /// Anything may have changed.
    Reset,
    RowsInserted { first: usize, last: usize },
    RowsDeleted { first: usize, last: usize },
    CellsUpdated {
        first: usize,
        last: usize,
        column: ColumnScope,
    },
}

/// Events from one operation, in the order they must be applied.
pub type ViewChanges = SmallVec<[ViewEvent; 3]>;

/// Receiver for view events, e.g. a binding to a grid widget.
pub trait ViewNotifier {
    fn notify(&mut self, event: ViewEvent);
}

impl ViewNotifier for Vec<ViewEvent> {
    fn notify(&mut self, event: ViewEvent) {
        self.push(event);
    }
}

/// Adapts a closure into a [`ViewNotifier`].
pub struct FnNotifier<F>(pub F);

impl<F: FnMut(ViewEvent)> ViewNotifier for FnNotifier<F> {
    fn notify(&mut self, event: ViewEvent) {
        (self.0)(event)
    }
}

/// Live filtered view over a [`TableSource`].
///
/// The view does not own the source. The caller forwards each
/// [`SourceEvent`] to [`handle`](Self::handle) after mutating the source,
/// passing the source so changed cells can be re-indexed.
pub struct FilterView<I = SuffixIndexer> {
    indexer: I,
    config: ViewConfig,
    term: Option<String>,
    matches: Option<Rc<MatchMap>>,
    visible: RoaringBitmap,
    row_map: Vec<usize>,
    /// Row count of the source as of the last event.
    rows: usize,
}

impl FilterView<SuffixIndexer> {
    /// A view over `source` with the default configuration, no search term
    /// and every row visible.
    pub fn new<S: TableSource>(source: &S) -> Result<Self> {
        Self::with_config(source, ViewConfig::default())
    }

    pub fn with_config<S: TableSource>(source: &S, config: ViewConfig) -> Result<Self> {
        let indexer = SuffixIndexer::new(config.index.clone());
        Self::with_indexer(source, indexer, config)
    }

    /// Rebuild the index with a new base depth. `None` indexes whole
    /// suffixes. Visibility is unaffected.
    pub fn build_index_to_depth(&mut self, depth: Option<usize>) -> Result<()> {
        self.config.index.base_depth = depth;
        self.indexer.set_base_depth(depth)
    }
}

impl<I: CellIndexer> FilterView<I> {
    /// A view using `indexer`, which is first brought in step with `source`.
    pub fn with_indexer<S: TableSource>(source: &S, mut indexer: I, config: ViewConfig) -> Result<Self> {
        let rows = source.row_count();
        check_row_domain(rows)?;
        indexer.on_full_reload(source)?;
        let mut view = Self {
            indexer,
            config,
            term: None,
            matches: None,
            visible: RoaringBitmap::new(),
            row_map: Vec::new(),
            rows,
        };
        view.recompute()?;
        Ok(view)
    }

    pub fn config(&self) -> &ViewConfig {
        &self.config
    }

    pub fn indexer(&self) -> &I {
        &self.indexer
    }

    pub fn search_term(&self) -> Option<&str> {
        self.term.as_deref()
    }

    /// Number of visible rows.
    pub fn row_count(&self) -> usize {
        self.row_map.len()
    }

    /// Backing row of each visible position, ascending.
    pub fn visible_rows(&self) -> &[usize] {
        &self.row_map
    }

    /// Filter on `term`. An empty term clears the search.
    pub fn set_search_term(&mut self, term: &str) -> Result<ViewChanges> {
        if term.is_empty() {
            return self.clear_search();
        }
        self.term = Some(term.to_owned());
        self.reset()
    }

    /// Remove the search term; every row becomes visible.
    pub fn clear_search(&mut self) -> Result<ViewChanges> {
        self.term = None;
        self.reset()
    }

    /// Bring the view up to date with a change already applied to `source`.
    pub fn handle<S: TableSource>(&mut self, source: &S, event: SourceEvent) -> Result<ViewChanges> {
        match event {
            SourceEvent::StructureChanged => {
                check_row_domain(source.row_count())?;
                self.indexer.on_structure_changed(source)?;
                self.rows = source.row_count();
                self.reset()
            }
            SourceEvent::FullReload => {
                check_row_domain(source.row_count())?;
                self.indexer.on_full_reload(source)?;
                self.rows = source.row_count();
                self.reset()
            }
            SourceEvent::RowsUpdated { first, last } => {
                FilterError::check_range(first, last, self.rows)?;
                let columns = self.check_columns(source)?;
                for row in first..=last {
                    for column in 0..columns {
                        self.indexer.on_cell_changed(source, row, column)?;
                    }
                }
                self.update(first, last, ColumnScope::All)
            }
            SourceEvent::CellsUpdated { first, last, column } => {
                FilterError::check_range(first, last, self.rows)?;
                let columns = self.check_columns(source)?;
                if column >= columns {
                    return Err(FilterError::column_out_of_bounds(column, columns));
                }
                for row in first..=last {
                    self.indexer.on_cell_changed(source, row, column)?;
                }
                self.update(first, last, ColumnScope::Column(column))
            }
            SourceEvent::RowsDeleted { first, last } => {
                FilterError::check_range(first, last, self.rows)?;
                FilterError::check_row_count(self.rows - (last - first + 1), source.row_count())?;
                self.indexer.on_rows_removed(first, last)?;
                self.rows -= last - first + 1;
                let old_visible = mem::take(&mut self.visible);
                let old_row_map = mem::take(&mut self.row_map);
                self.recompute()?;

                let removed = diff::visible_in_range(&old_visible, first, last);
                if removed == 0 {
                    return Ok(ViewChanges::new());
                }
                let start = diff::position_of(&old_row_map, first);
                Ok(smallvec![ViewEvent::RowsDeleted {
                    first: start,
                    last: start + removed - 1,
                }])
            }
            SourceEvent::RowsInserted { first, last } => {
                if first > last {
                    return Err(FilterError::InvalidRange { first, last });
                }
                if first > self.rows {
                    return Err(FilterError::row_out_of_bounds(first, self.rows));
                }
                if last >= source.row_count() {
                    return Err(FilterError::row_out_of_bounds(last, source.row_count()));
                }
                FilterError::check_row_count(self.rows + (last - first + 1), source.row_count())?;
                check_row_domain(source.row_count())?;
                self.indexer.on_rows_inserted(source, first, last)?;
                self.rows += last - first + 1;
                let old_row_map = mem::take(&mut self.row_map);
                self.recompute()?;

                let added = diff::visible_in_range(&self.visible, first, last);
                if added == 0 {
                    return Ok(ViewChanges::new());
                }
                let start = diff::position_of(&old_row_map, first);
                Ok(smallvec![ViewEvent::RowsInserted {
                    first: start,
                    last: start + added - 1,
                }])
            }
        }
    }

    /// [`handle`](Self::handle), delivering the resulting events to `notifier`.
    pub fn handle_and_notify<S, N>(&mut self, source: &S, event: SourceEvent, notifier: &mut N) -> Result<()>
    where
        S: TableSource,
        N: ViewNotifier + ?Sized,
    {
        for change in self.handle(source, event)? {
            notifier.notify(change);
        }
        Ok(())
    }

    /// Switch to a different backing table.
    pub fn replace_source<S: TableSource>(&mut self, source: &S) -> Result<ViewChanges> {
        check_row_domain(source.row_count())?;
        self.indexer.on_structure_changed(source)?;
        self.rows = source.row_count();
        self.reset()
    }

    /// Release index depth acquired by long search terms.
    pub fn trim_index_to_base_depth(&mut self) -> Result<()> {
        self.indexer.trim_to_base_depth()
    }

    /// Backing row shown at view position `position`.
    pub fn row_in_backing_model(&self, position: usize) -> Result<usize> {
        self.row_map
            .get(position)
            .copied()
            .ok_or_else(|| FilterError::row_out_of_bounds(position, self.row_map.len()))
    }

    /// Columns of the row at `position` that contain the search term, or
    /// `None` when no search is active.
    pub fn matching_columns(&self, position: usize) -> Result<Option<&BTreeSet<usize>>> {
        let row = self.row_in_backing_model(position)?;
        Ok(self.matches.as_deref().and_then(|m| m.get(&row)))
    }

    /// True iff the cell at view position `position` contains the search term.
    pub fn is_cell_matching(&self, position: usize, column: usize) -> Result<bool> {
        Ok(self
            .matching_columns(position)?
            .is_some_and(|columns| columns.contains(&column)))
    }

    /// Cell text at a view position, read from `source`.
    pub fn value_at<'s, S: TableSource>(
        &self,
        source: &'s S,
        position: usize,
        column: usize,
    ) -> Result<Option<Cow<'s, str>>> {
        let row = self.row_in_backing_model(position)?;
        if column >= source.column_count() {
            return Err(FilterError::column_out_of_bounds(column, source.column_count()));
        }
        Ok(source.value_at(row, column))
    }

    /// Cell updates need the source and the index to agree on the columns.
    fn check_columns<S: TableSource>(&self, source: &S) -> Result<usize> {
        let indexed = self.indexer.column_count();
        let columns = source.column_count();
        if columns != indexed {
            let common = columns.min(indexed);
            return Err(FilterError::column_out_of_bounds(common, common));
        }
        Ok(columns)
    }

    fn reset(&mut self) -> Result<ViewChanges> {
        self.recompute()?;
        log::debug!(
            "view reset: {} of {} rows visible for {:?}",
            self.row_map.len(),
            self.rows,
            self.term
        );
        Ok(smallvec![ViewEvent::Reset])
    }

    /// Rebuild visibility from scratch for the current term and row count.
    fn recompute(&mut self) -> Result<()> {
        let rows = check_row_domain(self.rows)?;
        match &self.term {
            None => {
                self.matches = None;
                let mut visible = RoaringBitmap::new();
                visible.insert_range(0..rows);
                self.visible = visible;
            }
            Some(term) => {
                let matches = self.indexer.matches_for_term(term)?;
                self.apply(matches, rows);
            }
        }
        self.rebuild_row_map();
        Ok(())
    }

    fn apply(&mut self, matches: Rc<MatchMap>, rows: u32) {
        self.visible = matches
            .keys()
            .filter_map(|&row| u32::try_from(row).ok())
            .filter(|&row| row < rows)
            .collect();
        self.matches = Some(matches);
    }

    fn rebuild_row_map(&mut self) {
        self.row_map = self.visible.iter().map(|row| row as usize).collect();
        debug_assert_eq!(self.row_map.len() as u64, self.visible.len());
    }

    /// Content of backing rows `first..=last` changed; row count did not.
    fn update(&mut self, first: usize, last: usize, column: ColumnScope) -> Result<ViewChanges> {
        let Some(term) = self.term.as_deref() else {
            return Ok(diff::events_for_update(
                &self.visible,
                &self.visible,
                &self.row_map,
                first,
                last,
                column,
            ));
        };

        let matches = self.indexer.matches_for_term(term)?;
        if self.matches.as_ref().is_some_and(|prev| Rc::ptr_eq(prev, &matches)) {
            log::trace!("rows {first}..={last}: match set unchanged");
            if !self.config.forward_content_updates {
                return Ok(ViewChanges::new());
            }
            return Ok(diff::events_for_update(
                &self.visible,
                &self.visible,
                &self.row_map,
                first,
                last,
                column,
            ));
        }

        let rows = check_row_domain(self.rows)?;
        let old_visible = mem::take(&mut self.visible);
        let old_row_map = mem::take(&mut self.row_map);
        self.apply(matches, rows);
        self.rebuild_row_map();
        let events = diff::events_for_update(&old_visible, &self.visible, &old_row_map, first, last, column);
        log::trace!("rows {first}..={last}: {events:?}");
        Ok(events)
    }
}

/// Row indexes must fit the bitmap's `u32` domain.
fn check_row_domain(rows: usize) -> Result<u32> {
    u32::try_from(rows).map_err(|_| FilterError::TooManyRows { rows })
}
