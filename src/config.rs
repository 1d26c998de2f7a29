//! Configuration for the cell indexer and the filtered view.

/// Configuration for [`SuffixIndexer`](crate::indexer::SuffixIndexer).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexConfig {
    /// Match case exactly. When `false`, cell text and search terms are both
    /// lower-cased before indexing and lookup.
    pub case_sensitive: bool,
    /// Maximum suffix length indexed up front; `None` indexes whole suffixes.
    ///
    /// A shallow depth keeps the trie small. Searching for a longer term
    /// deepens the index to the term's length until
    /// [`trim_to_base_depth`](crate::indexer::CellIndexer::trim_to_base_depth)
    /// is called.
    pub base_depth: Option<usize>,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            case_sensitive: false,
            base_depth: Some(3),
        }
    }
}

impl IndexConfig {
    pub fn case_sensitive(mut self, case_sensitive: bool) -> Self {
        self.case_sensitive = case_sensitive;
        self
    }

    pub fn base_depth(mut self, base_depth: Option<usize>) -> Self {
        self.base_depth = base_depth;
        self
    }
}

/// Configuration for [`FilterView`](crate::view::FilterView).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewConfig {
    pub index: IndexConfig,
    /// Report `CellsUpdated` for visible rows even when an update left the
    /// filter outcome unchanged. Off by default: such an update is skipped
    /// without emitting anything.
    pub forward_content_updates: bool,
}
