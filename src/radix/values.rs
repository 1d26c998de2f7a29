//! Per-node value storage.
//!
//! Every trie node owns one container produced by the tree's
//! [`ValueSupplier`]. Swapping the supplier changes how values accumulate
//! under a key without touching the tree itself:
//!
//! - [`SetValues`]: ordered, deduplicating (the default)
//! - [`HashValues`]: hash-based, deduplicating, no order within a node
//! - [`ListValues`]: insertion-ordered multiset, duplicates are counted

use std::collections::BTreeSet;
use std::hash::Hash;
use std::marker::PhantomData;

use ahash::AHashSet;

/// Storage for the values attached to a single trie node.
pub trait ValueContainer<V> {
    /// Add a value. Returns `false` if a deduplicating container already held it.
    fn insert(&mut self, value: V) -> bool;

    /// Remove one occurrence of a value. Returns `false` if it was absent.
    fn remove(&mut self, value: &V) -> bool;

    /// Number of stored values (occurrences, for multisets).
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn contains(&self, value: &V) -> bool;

    fn iter<'a>(&'a self) -> impl Iterator<Item = &'a V> + 'a
    where
        V: 'a;
}

/// Factory for per-node containers, supplied to the tree at construction.
pub trait ValueSupplier<V> {
    type Container: ValueContainer<V>;

    fn supply(&self) -> Self::Container;
}

/// Supplies `C::default()` for every node.
pub struct DefaultSupplier<C>(PhantomData<fn() -> C>);

impl<C> DefaultSupplier<C> {
    pub fn new() -> Self {
        Self(PhantomData)
    }
}

impl<C> Default for DefaultSupplier<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> Clone for DefaultSupplier<C> {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl<V, C> ValueSupplier<V> for DefaultSupplier<C>
where
    C: ValueContainer<V> + Default,
{
    type Container = C;

    fn supply(&self) -> C {
        C::default()
    }
}

/// Supplies containers from a closure, for containers that need runtime
/// parameters (pre-sized lists and the like).
#[derive(Clone)]
pub struct FnSupplier<F>(pub F);

impl<V, C, F> ValueSupplier<V> for FnSupplier<F>
where
    F: Fn() -> C,
    C: ValueContainer<V>,
{
    type Container = C;

    fn supply(&self) -> C {
        (self.0)()
    }
}

/// Ordered deduplicating set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetValues<V>(BTreeSet<V>);

impl<V> Default for SetValues<V> {
    fn default() -> Self {
        Self(BTreeSet::new())
    }
}

impl<V: Ord> ValueContainer<V> for SetValues<V> {
    fn insert(&mut self, value: V) -> bool {
        self.0.insert(value)
    }

    fn remove(&mut self, value: &V) -> bool {
        self.0.remove(value)
    }

    fn len(&self) -> usize {
        self.0.len()
    }

    fn contains(&self, value: &V) -> bool {
        self.0.contains(value)
    }

    fn iter<'a>(&'a self) -> impl Iterator<Item = &'a V> + 'a
    where
        V: 'a,
    {
        self.0.iter()
    }
}

/// Hash-based deduplicating set. Iteration order within a node is unspecified.
#[derive(Debug, Clone)]
pub struct HashValues<V>(AHashSet<V>);

impl<V> Default for HashValues<V> {
    fn default() -> Self {
        Self(AHashSet::new())
    }
}

impl<V: Hash + Eq> ValueContainer<V> for HashValues<V> {
    fn insert(&mut self, value: V) -> bool {
        self.0.insert(value)
    }

    fn remove(&mut self, value: &V) -> bool {
        self.0.remove(value)
    }

    fn len(&self) -> usize {
        self.0.len()
    }

    fn contains(&self, value: &V) -> bool {
        self.0.contains(value)
    }

    fn iter<'a>(&'a self) -> impl Iterator<Item = &'a V> + 'a
    where
        V: 'a,
    {
        self.0.iter()
    }
}

/// Insertion-ordered multiset. Adding a value twice stores it twice, and it
/// takes two removals to drop it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListValues<V>(Vec<V>);

impl<V> ListValues<V> {
    pub fn with_capacity(capacity: usize) -> Self {
        Self(Vec::with_capacity(capacity))
    }
}

impl<V> Default for ListValues<V> {
    fn default() -> Self {
        Self(Vec::new())
    }
}

impl<V: PartialEq> ValueContainer<V> for ListValues<V> {
    fn insert(&mut self, value: V) -> bool {
        self.0.push(value);
        true
    }

    fn remove(&mut self, value: &V) -> bool {
        match self.0.iter().position(|v| v == value) {
            Some(idx) => {
                self.0.remove(idx);
                true
            }
            None => false,
        }
    }

    fn len(&self) -> usize {
        self.0.len()
    }

    fn contains(&self, value: &V) -> bool {
        self.0.contains(value)
    }

    fn iter<'a>(&'a self) -> impl Iterator<Item = &'a V> + 'a
    where
        V: 'a,
    {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_dedups() {
        let mut s: SetValues<u32> = SetValues::default();
        assert!(s.insert(2));
        assert!(s.insert(1));
        assert!(!s.insert(2));
        assert_eq!(s.len(), 2);
        assert_eq!(s.iter().copied().collect::<Vec<_>>(), vec![1, 2]);
        assert!(s.remove(&2));
        assert!(!s.remove(&2));
        assert_eq!(s.len(), 1);
    }

    #[test]
    fn test_hash_dedups() {
        let mut s: HashValues<&str> = HashValues::default();
        assert!(s.insert("a"));
        assert!(!s.insert("a"));
        assert!(s.contains(&"a"));
        assert!(s.remove(&"a"));
        assert!(s.is_empty());
    }

    #[test]
    fn test_list_counts_multiplicity() {
        let mut l: ListValues<char> = ListValues::with_capacity(4);
        l.insert('x');
        l.insert('y');
        l.insert('x');
        assert_eq!(l.len(), 3);
        assert!(l.remove(&'x'));
        assert!(l.contains(&'x'));
        assert_eq!(l.iter().copied().collect::<Vec<_>>(), vec!['y', 'x']);
        assert!(l.remove(&'x'));
        assert!(!l.contains(&'x'));
    }

    #[test]
    fn test_fn_supplier() {
        let supplier = FnSupplier(|| ListValues::<u8>::with_capacity(2));
        let mut c = ValueSupplier::<u8>::supply(&supplier);
        c.insert(1);
        assert_eq!(c.len(), 1);
    }
}
