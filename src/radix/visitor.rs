//! Traversal callbacks over a radix tree.
//!
//! Visitors never see full keys; a visitor that needs them pushes label
//! characters on [`visit`](NodeVisitor::visit) and pops exactly as many on
//! [`visit_complete`](NodeVisitor::visit_complete), as [`KeyCollector`] does.

use std::fmt;
use std::marker::PhantomData;

use super::node::Node;
use super::values::ValueContainer;
use super::TERMINATOR;

/// Callbacks invoked by [`Node::accept`].
pub trait NodeVisitor<C> {
    /// Called on entering `node`. Return `false` to skip its children.
    fn visit(&mut self, node: &Node<C>) -> bool;

    /// Called when leaving `node`, after its children (if visited).
    fn visit_complete(&mut self, _node: &Node<C>) {}
}

/// Characters a key-building visitor keeps for `node`: the label, minus the
/// terminator when the node completes a key.
#[inline]
fn kept_label_len<C>(node: &Node<C>) -> usize {
    if node.is_terminal() && node.ends_with_terminator() {
        node.label_len() - 1
    } else {
        node.label_len()
    }
}

/// Collects every complete key in traversal order, terminator stripped.
#[derive(Debug, Default)]
pub struct KeyCollector {
    path: String,
    keys: Vec<String>,
}

impl KeyCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    pub fn into_keys(self) -> Vec<String> {
        self.keys
    }
}

impl<C> NodeVisitor<C> for KeyCollector {
    fn visit(&mut self, node: &Node<C>) -> bool {
        self.path.extend(&node.label()[..kept_label_len(node)]);
        if node.is_terminal() {
            self.keys.push(self.path.clone());
        }
        true
    }

    fn visit_complete(&mut self, node: &Node<C>) {
        for _ in 0..kept_label_len(node) {
            self.path.pop();
        }
    }
}

/// Counts visited nodes, root included.
#[derive(Debug, Default, Clone, Copy)]
pub struct NodeCounter {
    count: usize,
}

impl NodeCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self) -> usize {
        self.count
    }
}

impl<C> NodeVisitor<C> for NodeCounter {
    fn visit(&mut self, _node: &Node<C>) -> bool {
        self.count += 1;
        true
    }
}

/// Writes an indented outline of the tree, one node per line.
///
/// ```text
/// (root)
///   "ca"
///     "p$" [C]
///     "r$" [B]
/// ```
///
/// The terminator is rendered as `$`. The first write error stops output and
/// is reported by [`finish`](TreeDumper::finish).
pub struct TreeDumper<W, V> {
    out: W,
    depth: usize,
    error: Option<fmt::Error>,
    _marker: PhantomData<fn(&V)>,
}

impl<W: fmt::Write, V: fmt::Debug> TreeDumper<W, V> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            depth: 0,
            error: None,
            _marker: PhantomData,
        }
    }

    pub fn finish(self) -> Result<W, fmt::Error> {
        match self.error {
            Some(e) => Err(e),
            None => Ok(self.out),
        }
    }

    fn write_node<C: ValueContainer<V>>(&mut self, node: &Node<C>) -> fmt::Result {
        write!(self.out, "{:width$}", "", width = self.depth * 2)?;
        if self.depth == 0 && node.label().is_empty() {
            self.out.write_str("(root)")?;
        } else {
            let label: String = node
                .label()
                .iter()
                .map(|&c| if c == TERMINATOR { '$' } else { c })
                .collect();
            write!(self.out, "{label:?}")?;
        }
        if !node.values().is_empty() {
            self.out.write_str(" [")?;
            for (i, v) in node.values().iter().enumerate() {
                if i > 0 {
                    self.out.write_str(", ")?;
                }
                write!(self.out, "{v:?}")?;
            }
            self.out.write_str("]")?;
        }
        self.out.write_char('\n')
    }
}

impl<W, V, C> NodeVisitor<C> for TreeDumper<W, V>
where
    W: fmt::Write,
    V: fmt::Debug,
    C: ValueContainer<V>,
{
    fn visit(&mut self, node: &Node<C>) -> bool {
        if self.error.is_some() {
            return false;
        }
        if let Err(e) = self.write_node(node) {
            self.error = Some(e);
            return false;
        }
        self.depth += 1;
        true
    }

    fn visit_complete(&mut self, _node: &Node<C>) {
        self.depth = self.depth.saturating_sub(1);
    }
}
