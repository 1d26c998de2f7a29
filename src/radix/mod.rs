//! Compressed trie mapping terminated character keys to sets of values.
//!
//! Keys are strings ending in [`TERMINATOR`]. Because the terminator never
//! appears inside user data, no key can be a strict prefix of another, and a
//! terminal node is always reached by a complete key. Inserting every suffix
//! of a string turns this into a suffix trie: a prefix query then matches
//! text anywhere inside the original string.
//!
//! ```rust
//! use std::collections::BTreeSet;
//!
//! use rowsift::radix::{RadixTree, TERMINATOR};
//!
//! let mut tree: RadixTree<&str> = RadixTree::new();
//! tree.add(&format!("cat{TERMINATOR}"), "A").unwrap();
//! tree.add(&format!("car{TERMINATOR}"), "B").unwrap();
//! tree.add(&format!("at{TERMINATOR}"), "A").unwrap();
//!
//! let mut found = BTreeSet::new();
//! assert_eq!(tree.get_bounded("", &mut found, 2), 2);
//! assert_eq!(found, BTreeSet::from(["A", "B"]));
//! ```

pub mod node;
pub mod values;
pub mod visitor;

use std::collections::{BTreeSet, HashSet};
use std::hash::{BuildHasher, Hash};

use smallvec::SmallVec;

use crate::error::{FilterError, Result};

pub use node::Node;
pub use values::{
    DefaultSupplier, FnSupplier, HashValues, ListValues, SetValues, ValueContainer, ValueSupplier,
};
pub use visitor::{KeyCollector, NodeCounter, NodeVisitor, TreeDumper};

use node::common_prefix_len;

/// Reserved character that ends every key. A Unicode noncharacter, so it
/// sorts after all other characters of the Basic Multilingual Plane and
/// does not occur in interchanged text.
pub const TERMINATOR: char = '\u{FFFF}';

/// Keys of ordinary length are decoded onto the stack.
type KeyChars = SmallVec<[char; 32]>;

// =============================================================================
// Result collection
// =============================================================================

/// Destination for query results.
///
/// `offer` returns whether the value was actually added; only added values
/// count towards the `max_items` bound of [`RadixTree::get_bounded`]. Set
/// collectors therefore bound the number of distinct values.
pub trait Collector<V> {
    fn offer(&mut self, value: &V) -> bool;
}

/// Multiset collector: a value stored under several keys is pushed, and
/// counted against `max_items`, once per key.
impl<V: Clone> Collector<V> for Vec<V> {
    fn offer(&mut self, value: &V) -> bool {
        self.push(value.clone());
        true
    }
}

impl<V: Clone + Ord> Collector<V> for BTreeSet<V> {
    fn offer(&mut self, value: &V) -> bool {
        self.insert(value.clone())
    }
}

impl<V: Clone + Hash + Eq, H: BuildHasher> Collector<V> for HashSet<V, H> {
    fn offer(&mut self, value: &V) -> bool {
        self.insert(value.clone())
    }
}

// =============================================================================
// RadixTree
// =============================================================================

/// A radix tree from terminated keys to value containers.
///
/// Features:
/// - Edge splitting on insert, immediate pruning and re-merging on remove
/// - Character-ascending, depth-first result order
/// - Pluggable per-node value storage via [`ValueSupplier`]
/// - Visitor traversal for inspection (key listing, counting, dumping)
pub struct RadixTree<V, S = DefaultSupplier<SetValues<V>>>
where
    S: ValueSupplier<V>,
{
    root: Node<S::Container>,
    supplier: S,
    /// Number of keys with at least one value.
    keys: usize,
}

impl<V: Ord> RadixTree<V> {
    /// An empty tree with ordered deduplicating value sets.
    pub fn new() -> Self {
        Self::with_supplier(DefaultSupplier::new())
    }
}

impl<V: Ord> Default for RadixTree<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V, S> RadixTree<V, S>
where
    S: ValueSupplier<V>,
{
    pub fn with_supplier(supplier: S) -> Self {
        let root = Node::root(supplier.supply());
        Self {
            root,
            supplier,
            keys: 0,
        }
    }

    /// Number of distinct keys currently holding values.
    #[inline]
    pub fn len(&self) -> usize {
        self.keys
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.keys == 0
    }

    pub fn root(&self) -> &Node<S::Container> {
        &self.root
    }

    pub fn clear(&mut self) {
        self.root = Node::root(self.supplier.supply());
        self.keys = 0;
    }

    /// Add `value` under `key`, creating or splitting edges as needed.
    ///
    /// Returns `true` if the value container changed. Fails on an empty key
    /// or one not ending in [`TERMINATOR`]; the tree is untouched in that case.
    pub fn add(&mut self, key: &str, value: V) -> Result<bool> {
        let key = parse_key(key)?;
        let (added, new_key) = insert(&mut self.root, &key, value, &self.supplier);
        if new_key {
            self.keys += 1;
        }
        Ok(added)
    }

    /// Remove one occurrence of `value` from `key`.
    ///
    /// Absent keys and values are a no-op returning `Ok(false)`. A node
    /// left without values is pruned immediately and its parent re-merged
    /// with a remaining single child.
    pub fn remove(&mut self, key: &str, value: &V) -> Result<bool> {
        let key = parse_key(key)?;
        let (removed, key_gone) = remove(&mut self.root, &key, value);
        if key_gone {
            self.keys -= 1;
        }
        Ok(removed)
    }

    /// True iff `value` is stored under the exact `key`.
    pub fn contains(&self, key: &str, value: &V) -> bool {
        let key: KeyChars = key.chars().collect();
        match find_node(&self.root, &key) {
            Some((node, 0)) => node.values().contains(value),
            _ => false,
        }
    }

    /// Collect every value in the subtree reached by `query`.
    ///
    /// Returns the number of values the collector accepted.
    pub fn get<Col>(&self, query: &str, collector: &mut Col) -> usize
    where
        Col: Collector<V> + ?Sized,
    {
        self.get_bounded(query, collector, usize::MAX)
    }

    /// Like [`get`](Self::get), stopping once `max_items` values have been
    /// accepted by the collector.
    ///
    /// Matching consumes `query` character by character through compressed
    /// edges; a query ending partway along an edge selects that edge's node.
    /// A query that leaves the tree yields nothing.
    pub fn get_bounded<Col>(&self, query: &str, collector: &mut Col, max_items: usize) -> usize
    where
        Col: Collector<V> + ?Sized,
    {
        if max_items == 0 {
            return 0;
        }
        let query: KeyChars = query.chars().collect();
        let Some((start, _)) = find_node(&self.root, &query) else {
            return 0;
        };

        let mut added = 0usize;
        let mut stack: Vec<&Node<S::Container>> = vec![start];
        while let Some(node) = stack.pop() {
            for value in node.values().iter() {
                if collector.offer(value) {
                    added += 1;
                    if added == max_items {
                        return added;
                    }
                }
            }
            stack.extend(node.children().iter().rev());
        }
        added
    }

    /// Traverse the whole tree from the root.
    pub fn accept<Vis>(&self, visitor: &mut Vis)
    where
        Vis: NodeVisitor<S::Container> + ?Sized,
    {
        self.root.accept(visitor);
    }

    /// Every key, terminator stripped, in traversal order.
    pub fn keys(&self) -> Vec<String> {
        let mut v = KeyCollector::new();
        self.accept(&mut v);
        v.into_keys()
    }

    /// Number of nodes below the root.
    pub fn node_count(&self) -> usize {
        let mut v = NodeCounter::new();
        self.accept(&mut v);
        v.count() - 1
    }

    /// Check the structural invariants, returning a description of each
    /// violation found. An empty list means the tree is well formed.
    pub fn verify_integrity(&self) -> Vec<String> {
        let mut issues = Vec::new();
        for child in self.root.children() {
            verify_node::<V, _>(child, &mut issues, String::new());
        }
        let mut prev: Option<char> = None;
        for child in self.root.children() {
            if let (Some(p), Some(&c)) = (prev, child.label().first()) {
                if p >= c {
                    issues.push(format!("root children out of order at {c:?}"));
                }
            }
            prev = child.label().first().copied();
        }
        let mut live = 0usize;
        count_live::<V, _>(&self.root, &mut live);
        if live != self.keys {
            issues.push(format!("key count {} but {live} live nodes", self.keys));
        }
        issues
    }
}

fn parse_key(key: &str) -> Result<KeyChars> {
    let chars: KeyChars = key.chars().collect();
    let Some((&last, body)) = chars.split_last() else {
        return Err(FilterError::EmptyKey);
    };
    if last != TERMINATOR {
        return Err(FilterError::missing_terminator(key));
    }
    if let Some(position) = body.iter().position(|&c| c == TERMINATOR) {
        return Err(FilterError::terminator_in_key(key, position));
    }
    Ok(chars)
}

/// Walk `key` from `node`. Returns the node whose edge the walk ended on and
/// how many of that edge's characters were left unconsumed.
fn find_node<'a, C>(node: &'a Node<C>, key: &[char]) -> Option<(&'a Node<C>, usize)> {
    let mut node = node;
    let mut rest = key;
    while !rest.is_empty() {
        let idx = node.child_index(rest[0]).ok()?;
        let child = &node.children()[idx];
        let common = common_prefix_len(child.label(), rest);
        if common == rest.len() {
            return Some((child, child.label_len() - common));
        }
        if common < child.label_len() {
            return None;
        }
        node = child;
        rest = &rest[common..];
    }
    Some((node, 0))
}

/// Returns (value container changed, key went from empty to live).
fn insert<V, S>(node: &mut Node<S::Container>, rest: &[char], value: V, supplier: &S) -> (bool, bool)
where
    S: ValueSupplier<V>,
{
    let pos = match node.child_index(rest[0]) {
        Ok(idx) => idx,
        Err(pos) => {
            let mut values = supplier.supply();
            values.insert(value);
            node.insert_child(pos, Node::new(rest, true, values));
            return (true, true);
        }
    };

    let child = node.child_mut(pos);
    let common = common_prefix_len(child.label(), rest);
    if common < child.label_len() {
        child.split_at(common, supplier.supply());
    }
    if common == rest.len() {
        let was_empty = child.values().is_empty();
        let added = child.values_mut().insert(value);
        child.set_terminal(true);
        return (added, was_empty && added);
    }
    insert(child, &rest[common..], value, supplier)
}

/// Returns (value removed, key went from live to empty).
fn remove<V, C>(node: &mut Node<C>, rest: &[char], value: &V) -> (bool, bool)
where
    C: ValueContainer<V>,
{
    let Ok(idx) = node.child_index(rest[0]) else {
        return (false, false);
    };
    let child = node.child_mut(idx);
    if !rest.starts_with(child.label()) {
        return (false, false);
    }

    let len = child.label_len();
    let outcome = if len == rest.len() {
        let removed = child.values_mut().remove(value);
        (removed, removed && child.values().is_empty())
    } else {
        remove(child, &rest[len..], value)
    };
    if outcome.0 {
        node.prune_child::<V>(idx);
    }
    outcome
}

fn verify_node<V, C>(node: &Node<C>, issues: &mut Vec<String>, mut path: String)
where
    C: ValueContainer<V>,
{
    path.extend(node.label());
    if node.label().is_empty() {
        issues.push(format!("empty label below {path:?}"));
    }
    if let Some(pos) = node.label().iter().position(|&c| c == TERMINATOR) {
        if pos + 1 != node.label_len() || !node.is_terminal() {
            issues.push(format!("terminator inside edge at {path:?}"));
        }
    }
    let empty = node.values().is_empty();
    match node.children().len() {
        0 if empty => issues.push(format!("dangling empty leaf at {path:?}")),
        1 if empty && !node.is_terminal() => {
            issues.push(format!("uncompressed single-child chain at {path:?}"))
        }
        _ => {}
    }
    if node.is_terminal() && empty {
        issues.push(format!("terminal node without values at {path:?}"));
    }
    for pair in node.children().windows(2) {
        if pair[0].label()[0] >= pair[1].label()[0] {
            issues.push(format!("children out of order below {path:?}"));
        }
    }
    for child in node.children() {
        verify_node::<V, C>(child, issues, path.clone());
    }
}

fn count_live<V, C>(node: &Node<C>, live: &mut usize)
where
    C: ValueContainer<V>,
{
    if !node.values().is_empty() {
        *live += 1;
    }
    for child in node.children() {
        count_live::<V, C>(child, live);
    }
}

impl<V, S> std::fmt::Debug for RadixTree<V, S>
where
    V: std::fmt::Debug,
    S: ValueSupplier<V>,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut dumper: TreeDumper<String, V> = TreeDumper::new(String::new());
        self.accept(&mut dumper);
        f.write_str(&dumper.finish()?)
    }
}


#[cfg(test)]
mod proptests;
