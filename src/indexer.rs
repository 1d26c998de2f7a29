//! Cell indexing: which substrings of which cells go into the trie.
//!
//! [`CellIndexer`] is the boundary the view engine consumes. Its one query,
//! [`matches_for_term`](CellIndexer::matches_for_term), must hand back the
//! *same* `Rc` when the outcome for a term has not changed since the last
//! call, so the view can skip an update with a pointer comparison.
//!
//! [`SuffixIndexer`] is the stock implementation: every suffix of every cell,
//! truncated to the current depth, is added to a [`RadixTree`] under a stable
//! row handle so inserting or deleting rows never rewrites the trie values of
//! unaffected rows.

use std::collections::{BTreeMap, BTreeSet};
use std::rc::Rc;

use ahash::AHashMap;

use crate::config::IndexConfig;
use crate::error::{FilterError, Result};
use crate::radix::{RadixTree, TERMINATOR};
use crate::source::TableSource;

/// Backing row index to the columns whose cell contains the term.
pub type MatchMap = BTreeMap<usize, BTreeSet<usize>>;

/// Keeps a substring index in step with a [`TableSource`] and answers term
/// queries against it.
///
/// The view calls the `on_*` hooks for each source notification before it
/// queries again; row arguments follow [`SourceEvent`](crate::source::SourceEvent)
/// numbering.
pub trait CellIndexer {
    /// Rows containing `term` in at least one cell, with the matching columns.
    ///
    /// Returns an `Rc` pointer-equal to the previous result when the previous
    /// call used the same term and the outcome is unchanged.
    fn matches_for_term(&mut self, term: &str) -> Result<Rc<MatchMap>>;

    /// Columns the index currently covers.
    fn column_count(&self) -> usize;

    fn on_structure_changed(&mut self, source: &dyn TableSource) -> Result<()>;

    fn on_full_reload(&mut self, source: &dyn TableSource) -> Result<()>;

    fn on_cell_changed(&mut self, source: &dyn TableSource, row: usize, column: usize) -> Result<()>;

    /// Rows `first..=last` (pre-deletion numbering) are gone from the source.
    fn on_rows_removed(&mut self, first: usize, last: usize) -> Result<()>;

    /// Rows `first..=last` are new in the source.
    fn on_rows_inserted(&mut self, source: &dyn TableSource, first: usize, last: usize) -> Result<()>;

    /// Drop any index depth acquired on demand beyond the configured base.
    fn trim_to_base_depth(&mut self) -> Result<()>;
}

/// Stable handle for a row, independent of its current position.
type RowId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
struct CellId {
    row: RowId,
    column: usize,
}

/// Normalized text of an indexed cell and the depth its suffixes are cut to.
struct IndexedCell {
    text: String,
    depth: Option<usize>,
}

/// True iff suffixes cut to `depth` are long enough to answer a term of
/// `len` characters.
fn covers(depth: Option<usize>, len: usize) -> bool {
    depth.map_or(true, |d| d >= len)
}

/// Suffix-trie [`CellIndexer`] with depth-limited, on-demand indexing.
///
/// Every cell starts at the base depth. A term longer than that deepens only
/// the cells containing the term's base-depth prefix.
pub struct SuffixIndexer {
    config: IndexConfig,
    /// Deepest depth any cell was taken to since the last trim or rebuild.
    depth: Option<usize>,
    tree: RadixTree<CellId>,
    /// Position -> row handle.
    rows: Vec<RowId>,
    /// Row handle -> position.
    positions: AHashMap<RowId, usize>,
    cells: AHashMap<CellId, IndexedCell>,
    columns: usize,
    next_row: RowId,
    last: Option<(String, Rc<MatchMap>)>,
}

impl SuffixIndexer {
    pub fn new(config: IndexConfig) -> Self {
        let depth = config.base_depth;
        Self {
            config,
            depth,
            tree: RadixTree::new(),
            rows: Vec::new(),
            positions: AHashMap::new(),
            cells: AHashMap::new(),
            columns: 0,
            next_row: 0,
            last: None,
        }
    }

    /// A new indexer with every cell of `source` indexed.
    pub fn with_source(config: IndexConfig, source: &dyn TableSource) -> Result<Self> {
        let mut indexer = Self::new(config);
        indexer.rebuild(source)?;
        Ok(indexer)
    }

    pub fn config(&self) -> &IndexConfig {
        &self.config
    }

    /// Deepest depth currently indexed, `None` for whole suffixes.
    pub fn depth(&self) -> Option<usize> {
        self.depth
    }

    /// Distinct truncated suffixes currently in the trie.
    pub fn key_count(&self) -> usize {
        self.tree.len()
    }

    pub fn node_count(&self) -> usize {
        self.tree.node_count()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Change the base depth and re-index every cell to it.
    pub fn set_base_depth(&mut self, base_depth: Option<usize>) -> Result<()> {
        self.config.base_depth = base_depth;
        self.reindex_to(base_depth)
    }

    /// Discard the index and rebuild it from every cell of `source`.
    pub fn rebuild(&mut self, source: &dyn TableSource) -> Result<()> {
        self.tree.clear();
        self.rows.clear();
        self.positions.clear();
        self.cells.clear();
        self.depth = self.config.base_depth;
        self.columns = source.column_count();

        let rows = source.row_count();
        self.rows.reserve(rows);
        for row in 0..rows {
            let id = self.allocate_row();
            self.rows.push(id);
            self.positions.insert(id, row);
            self.index_row(source, row, id)?;
        }
        log::debug!(
            "indexed {} rows x {} columns, {} keys at depth {:?}",
            rows,
            self.columns,
            self.tree.len(),
            self.depth
        );
        Ok(())
    }

    fn allocate_row(&mut self) -> RowId {
        let id = self.next_row;
        self.next_row += 1;
        id
    }

    fn normalize(&self, text: &str) -> String {
        let text: String = text.chars().filter(|&c| c != TERMINATOR).collect();
        if self.config.case_sensitive {
            text
        } else {
            text.to_lowercase()
        }
    }

    fn index_row(&mut self, source: &dyn TableSource, row: usize, id: RowId) -> Result<()> {
        for column in 0..self.columns {
            if let Some(text) = source.value_at(row, column) {
                self.index_cell(CellId { row: id, column }, &text)?;
            }
        }
        Ok(())
    }

    fn index_cell(&mut self, cell: CellId, text: &str) -> Result<()> {
        let text = self.normalize(text);
        if text.is_empty() {
            return Ok(());
        }
        let depth = self.config.base_depth;
        for key in suffix_keys(&text, depth) {
            self.tree.add(&key, cell)?;
        }
        self.cells.insert(cell, IndexedCell { text, depth });
        Ok(())
    }

    fn unindex_cell(&mut self, cell: CellId) -> Result<()> {
        if let Some(indexed) = self.cells.remove(&cell) {
            for key in suffix_keys(&indexed.text, indexed.depth) {
                self.tree.remove(&key, &cell)?;
            }
        }
        Ok(())
    }

    /// Swap the keys of `cell` for suffixes cut to `depth`.
    fn reindex_cell(&mut self, cell: CellId, depth: Option<usize>) -> Result<()> {
        let Some(indexed) = self.cells.get_mut(&cell) else {
            return Ok(());
        };
        for key in suffix_keys(&indexed.text, indexed.depth) {
            self.tree.remove(&key, &cell)?;
        }
        for key in suffix_keys(&indexed.text, depth) {
            self.tree.add(&key, cell)?;
        }
        indexed.depth = depth;
        Ok(())
    }

    /// Bring every cell to `depth`.
    fn reindex_to(&mut self, depth: Option<usize>) -> Result<()> {
        let stale: Vec<CellId> = self
            .cells
            .iter()
            .filter(|(_, indexed)| indexed.depth != depth)
            .map(|(cell, _)| *cell)
            .collect();
        if !stale.is_empty() {
            log::debug!("re-indexing {} of {} cells to depth {:?}", stale.len(), self.cells.len(), depth);
        }
        for cell in stale {
            self.reindex_cell(cell, depth)?;
        }
        self.depth = depth;
        Ok(())
    }

    /// Deepen the cells that may contain `term` so a query for it is exact.
    ///
    /// Candidates are the cells holding the term's base-depth prefix; with a
    /// base depth of zero the trie is empty and every cell is a candidate.
    fn deepen_for(&mut self, term: &str, len: usize) -> Result<()> {
        let Some(base) = self.config.base_depth else {
            return Ok(());
        };
        if len <= base {
            return Ok(());
        }
        let candidates: Vec<CellId> = if base == 0 {
            self.cells.keys().copied().collect()
        } else {
            let prefix: String = term.chars().take(base).collect();
            let mut found: BTreeSet<CellId> = BTreeSet::new();
            self.tree.get(&prefix, &mut found);
            found.into_iter().collect()
        };

        let mut deepened = 0usize;
        for cell in candidates {
            if self.cells.get(&cell).is_some_and(|c| !covers(c.depth, len)) {
                self.reindex_cell(cell, Some(len))?;
                deepened += 1;
            }
        }
        if deepened > 0 {
            log::debug!("deepened {} of {} cells to depth {}", deepened, self.cells.len(), len);
            if !covers(self.depth, len) {
                self.depth = Some(len);
            }
        }
        Ok(())
    }

    /// Re-point `positions` at every row from `from` onwards.
    fn renumber_from(&mut self, from: usize) {
        for (pos, id) in self.rows.iter().enumerate().skip(from) {
            self.positions.insert(*id, pos);
        }
    }

    fn check_row(&self, row: usize) -> Result<()> {
        if row >= self.rows.len() {
            return Err(FilterError::row_out_of_bounds(row, self.rows.len()));
        }
        Ok(())
    }
}

impl CellIndexer for SuffixIndexer {
    fn matches_for_term(&mut self, term: &str) -> Result<Rc<MatchMap>> {
        let term = self.normalize(term);
        let term_len = term.chars().count();
        self.deepen_for(&term, term_len)?;

        let mut cells: BTreeSet<CellId> = BTreeSet::new();
        self.tree.get(&term, &mut cells);

        let mut matches = MatchMap::new();
        for cell in cells {
            if let Some(&row) = self.positions.get(&cell.row) {
                matches.entry(row).or_default().insert(cell.column);
            }
        }

        if let Some((last_term, last)) = &self.last {
            if *last_term == term && **last == matches {
                return Ok(Rc::clone(last));
            }
        }
        let matches = Rc::new(matches);
        self.last = Some((term, Rc::clone(&matches)));
        Ok(matches)
    }

    fn column_count(&self) -> usize {
        self.columns
    }

    fn on_structure_changed(&mut self, source: &dyn TableSource) -> Result<()> {
        self.rebuild(source)
    }

    fn on_full_reload(&mut self, source: &dyn TableSource) -> Result<()> {
        self.rebuild(source)
    }

    fn on_cell_changed(&mut self, source: &dyn TableSource, row: usize, column: usize) -> Result<()> {
        self.check_row(row)?;
        if column >= self.columns {
            return Err(FilterError::column_out_of_bounds(column, self.columns));
        }
        let cell = CellId {
            row: self.rows[row],
            column,
        };
        self.unindex_cell(cell)?;
        if let Some(text) = source.value_at(row, column) {
            self.index_cell(cell, &text)?;
        }
        Ok(())
    }

    fn on_rows_removed(&mut self, first: usize, last: usize) -> Result<()> {
        FilterError::check_range(first, last, self.rows.len())?;
        let removed: Vec<RowId> = self.rows.drain(first..=last).collect();
        for id in removed {
            self.positions.remove(&id);
            for column in 0..self.columns {
                self.unindex_cell(CellId { row: id, column })?;
            }
        }
        self.renumber_from(first);
        Ok(())
    }

    fn on_rows_inserted(&mut self, source: &dyn TableSource, first: usize, last: usize) -> Result<()> {
        if first > last {
            return Err(FilterError::InvalidRange { first, last });
        }
        if first > self.rows.len() {
            return Err(FilterError::row_out_of_bounds(first, self.rows.len()));
        }
        if last >= source.row_count() {
            return Err(FilterError::row_out_of_bounds(last, source.row_count()));
        }
        let ids: Vec<RowId> = (first..=last).map(|_| self.allocate_row()).collect();
        self.rows.splice(first..first, ids.iter().copied());
        self.renumber_from(first);
        for (row, id) in (first..=last).zip(ids) {
            self.index_row(source, row, id)?;
        }
        Ok(())
    }

    fn trim_to_base_depth(&mut self) -> Result<()> {
        self.reindex_to(self.config.base_depth)
    }
}

/// Every suffix of `text`, truncated to `depth` characters and terminated.
fn suffix_keys(text: &str, depth: Option<usize>) -> impl Iterator<Item = String> + '_ {
    let limit = depth.unwrap_or(usize::MAX);
    text.char_indices()
        .map(move |(start, _)| {
            let mut key: String = text[start..].chars().take(limit).collect();
            key.push(TERMINATOR);
            key
        })
        .filter(|key| key.chars().count() > 1)
}
