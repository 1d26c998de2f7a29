//! Radix tree nodes.
//!
//! A node is one compressed edge: its label may cover several characters of
//! what would be a single-child chain in an uncompressed trie. Children are
//! owned directly and kept sorted by the first character of their label, so
//! every traversal is character-ascending.

use std::mem;

use smallvec::SmallVec;

use super::values::ValueContainer;
use super::visitor::NodeVisitor;
use super::TERMINATOR;

/// Inline capacity for edge labels. Suffixes of short cell text rarely
/// exceed this once the shared prefix has been split off.
pub(crate) type Label = SmallVec<[char; 8]>;

/// A single node in a [`RadixTree`](super::RadixTree).
#[derive(Clone)]
pub struct Node<C> {
    label: Label,
    children: Vec<Node<C>>,
    terminal: bool,
    values: C,
}

impl<C> Node<C> {
    pub(crate) fn root(values: C) -> Self {
        Self {
            label: Label::new(),
            children: Vec::new(),
            terminal: false,
            values,
        }
    }

    pub(crate) fn new(label: &[char], terminal: bool, values: C) -> Self {
        Self {
            label: Label::from_slice(label),
            children: Vec::new(),
            terminal,
            values,
        }
    }

    /// Characters on the edge leading into this node. Empty for the root.
    #[inline]
    pub fn label(&self) -> &[char] {
        &self.label
    }

    #[inline]
    pub fn label_len(&self) -> usize {
        self.label.len()
    }

    /// The label as a string, with the terminator left in place.
    pub fn label_string(&self) -> String {
        self.label.iter().collect()
    }

    /// True iff a complete inserted key ends at this node.
    #[inline]
    pub fn is_terminal(&self) -> bool {
        self.terminal
    }

    /// True iff the label ends with [`TERMINATOR`].
    #[inline]
    pub fn ends_with_terminator(&self) -> bool {
        self.label.last() == Some(&TERMINATOR)
    }

    #[inline]
    pub fn values(&self) -> &C {
        &self.values
    }

    #[inline]
    pub fn children(&self) -> &[Node<C>] {
        &self.children
    }

    /// Pre-order/post-order traversal of this node and its subtree.
    ///
    /// `visit` is called on entry; returning `false` skips this node's
    /// children but not its siblings. `visit_complete` is always called on
    /// the way back out, whether or not the children were visited.
    pub fn accept<Vis>(&self, visitor: &mut Vis)
    where
        Vis: NodeVisitor<C> + ?Sized,
    {
        if visitor.visit(self) {
            for child in &self.children {
                child.accept(visitor);
            }
        }
        visitor.visit_complete(self);
    }

    /// Binary search the children by leading character.
    #[inline]
    pub(crate) fn child_index(&self, first: char) -> Result<usize, usize> {
        self.children
            .binary_search_by(|child| child.label[0].cmp(&first))
    }

    #[inline]
    pub(crate) fn child_mut(&mut self, idx: usize) -> &mut Node<C> {
        &mut self.children[idx]
    }

    #[inline]
    pub(crate) fn insert_child(&mut self, pos: usize, child: Node<C>) {
        debug_assert!(!child.label.is_empty());
        self.children.insert(pos, child);
    }

    #[inline]
    pub(crate) fn values_mut(&mut self) -> &mut C {
        &mut self.values
    }

    #[inline]
    pub(crate) fn set_terminal(&mut self, terminal: bool) {
        self.terminal = terminal;
    }

    /// Split this edge after `at` characters.
    ///
    /// This node keeps the first `at` characters and becomes a non-terminal
    /// branch holding `values` (normally an empty container). Everything it
    /// held before moves into a single child labelled with the remainder.
    pub(crate) fn split_at(&mut self, at: usize, values: C) {
        debug_assert!(at > 0 && at < self.label.len());
        let tail = Node {
            label: Label::from_slice(&self.label[at..]),
            children: mem::take(&mut self.children),
            terminal: mem::replace(&mut self.terminal, false),
            values: mem::replace(&mut self.values, values),
        };
        self.label.truncate(at);
        self.children.push(tail);
    }

    /// Absorb the only child into this node, concatenating the labels.
    fn merge_single_child(&mut self) {
        debug_assert_eq!(self.children.len(), 1);
        if let Some(child) = self.children.pop() {
            self.label.extend_from_slice(&child.label);
            self.children = child.children;
            self.terminal = child.terminal;
            self.values = child.values;
        }
    }
}

impl<C> Node<C> {
    /// Restore the compression invariant for child `idx` after a value was
    /// removed somewhere in its subtree.
    ///
    /// An emptied node stops being terminal. With no children it is detached;
    /// with exactly one child it is merged with that child.
    pub(crate) fn prune_child<V>(&mut self, idx: usize)
    where
        C: ValueContainer<V>,
    {
        let child = &mut self.children[idx];
        if !child.values.is_empty() {
            return;
        }
        child.terminal = false;
        match child.children.len() {
            0 => {
                self.children.remove(idx);
            }
            1 => {
                child.merge_single_child();
                debug_assert!(
                    child.terminal || !child.values.is_empty() || child.children.len() != 1,
                    "merged node still heads a single-child chain"
                );
            }
            _ => {}
        }
    }
}

/// Length of the shared prefix of two char slices.
#[inline]
pub(crate) fn common_prefix_len(a: &[char], b: &[char]) -> usize {
    a.iter().zip(b).take_while(|(x, y)| x == y).count()
}
