//! Insertion-ordered set used for requirement lists and reverse edges.

use std::hash::Hash;

use indexmap::IndexSet;
use rustc_hash::FxBuildHasher;
use serde::{Deserialize, Serialize};

/// An ordered collection without duplicates.
///
/// Exposes only the set operations the graph and the packer need. Iteration
/// order is insertion order and removals keep the relative order of the
/// remaining items.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
#[serde(bound(
    serialize = "T: Serialize + Hash + Eq",
    deserialize = "T: Deserialize<'de> + Hash + Eq"
))]
pub struct OrderedSet<T: Hash + Eq> {
    items: IndexSet<T, FxBuildHasher>,
}

impl<T: Hash + Eq> Default for OrderedSet<T> {
    fn default() -> Self {
        Self {
            items: IndexSet::default(),
        }
    }
}

impl<T: Hash + Eq> PartialEq for OrderedSet<T> {
    /// Two sets are equal when they hold the same items in the same order.
    fn eq(&self, other: &Self) -> bool {
        self.items.len() == other.items.len() && self.items.iter().eq(other.items.iter())
    }
}

impl<T: Hash + Eq> Eq for OrderedSet<T> {}

impl<T: Hash + Eq> OrderedSet<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `item` unless it is already present. Returns `true` if it was added.
    pub fn insert(&mut self, item: T) -> bool {
        self.items.insert(item)
    }

    /// Remove `item` if present. Returns `true` if it was removed.
    pub fn remove(&mut self, item: &T) -> bool {
        self.items.shift_remove(item)
    }

    /// Replace `old` with `new` in place.
    ///
    /// If `new` is already present, `old` is simply removed. Returns `false`
    /// when `old` was not in the set.
    pub fn replace(&mut self, old: &T, new: T) -> bool {
        let Some(index) = self.items.get_index_of(old) else {
            return false;
        };
        self.items.shift_remove_index(index);
        if !self.items.contains(&new) {
            self.items.shift_insert(index, new);
        }
        true
    }

    pub fn contains(&self, item: &T) -> bool {
        self.items.contains(item)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &T> + ExactSizeIterator {
        self.items.iter()
    }

    pub fn first(&self) -> Option<&T> {
        self.items.first()
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        self.items.get_index(index)
    }

    /// `true` if every item of `self` is also in `other`.
    pub fn is_subset(&self, other: &Self) -> bool {
        self.items.iter().all(|item| other.contains(item))
    }
}

impl<T: Hash + Eq + Clone> OrderedSet<T> {
    /// Items of `self` that are not in `other`, in `self`'s order.
    pub fn difference(&self, other: &Self) -> Self {
        self.items
            .iter()
            .filter(|item| !other.contains(item))
            .cloned()
            .collect()
    }

    /// Items present in both sets, in `self`'s order.
    pub fn intersection(&self, other: &Self) -> Self {
        self.items
            .iter()
            .filter(|item| other.contains(item))
            .cloned()
            .collect()
    }

    pub fn to_vec(&self) -> Vec<T> {
        self.items.iter().cloned().collect()
    }
}

impl<T: Hash + Eq> FromIterator<T> for OrderedSet<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self {
            items: iter.into_iter().collect(),
        }
    }
}

impl<T: Hash + Eq> Extend<T> for OrderedSet<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        self.items.extend(iter);
    }
}

impl<T: Hash + Eq> IntoIterator for OrderedSet<T> {
    type Item = T;
    type IntoIter = indexmap::set::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a, T: Hash + Eq> IntoIterator for &'a OrderedSet<T> {
    type Item = &'a T;
    type IntoIter = indexmap::set::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
