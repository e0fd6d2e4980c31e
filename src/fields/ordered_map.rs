//! Insertion-ordered map with positional insertion.
//!
//! [`OrderedMap`] keeps its entries in a doubly-linked list stored in an owned
//! arena (`Vec` of nodes) with a `HashMap` from key to slot. Lookups, inserts,
//! removals and every positional operation (`insert_after`, `move_before`,
//! `move_to_end`, ...) are O(1).
//!
//! The merge of base-template fields relies on these positional operations to
//! splice a base's fields into a child's mapping at a precise position without
//! disturbing the relative order of anything else.
//!
//! ```rust
//! use templar_cli::fields::OrderedMap;
//!
//! let mut map = OrderedMap::new();
//! map.insert("a".to_string(), 1);
//! map.insert("c".to_string(), 3);
//! map.insert_after("b".to_string(), 2, "a")?;
//!
//! let keys: Vec<&str> = map.keys().map(String::as_str).collect();
//! assert_eq!(keys, ["a", "b", "c"]);
//! # Ok::<(), templar_cli::core::TemplarError>(())
//! ```

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::borrow::Borrow;
use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::marker::PhantomData;

use crate::core::TemplarError;

#[derive(Clone)]
struct Node<K, V> {
    key: K,
    value: V,
    prev: Option<usize>,
    next: Option<usize>,
}

/// Map preserving insertion order, with O(1) positional insert and move.
///
/// Equality is order-sensitive: two maps with the same entries in a different
/// order are not equal.
#[derive(Clone)]
pub struct OrderedMap<K, V> {
    nodes: Vec<Node<K, V>>,
    index: HashMap<K, usize>,
    head: Option<usize>,
    tail: Option<usize>,
}

impl<K, V> OrderedMap<K, V> {
    /// Number of entries.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the map has no entries.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Iterate entries in order.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            map: self,
            cursor: self.head,
            remaining: self.nodes.len(),
        }
    }

    /// Iterate keys in order.
    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.iter().map(|(k, _)| k)
    }

    /// Iterate values in order.
    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.iter().map(|(_, v)| v)
    }

    /// First key in iteration order.
    ///
    /// # Errors
    ///
    /// [`TemplarError::EmptyMapping`] if the map is empty.
    pub fn first(&self) -> Result<&K, TemplarError> {
        self.head.map(|i| &self.nodes[i].key).ok_or(TemplarError::EmptyMapping)
    }

    /// Last key in iteration order.
    ///
    /// # Errors
    ///
    /// [`TemplarError::EmptyMapping`] if the map is empty.
    pub fn last(&self) -> Result<&K, TemplarError> {
        self.tail.map(|i| &self.nodes[i].key).ok_or(TemplarError::EmptyMapping)
    }

    fn unlink(&mut self, idx: usize) {
        let (prev, next) = (self.nodes[idx].prev, self.nodes[idx].next);
        match prev {
            Some(p) => self.nodes[p].next = next,
            None => self.head = next,
        }
        match next {
            Some(n) => self.nodes[n].prev = prev,
            None => self.tail = prev,
        }
        self.nodes[idx].prev = None;
        self.nodes[idx].next = None;
    }

    fn link_after(&mut self, idx: usize, anchor: usize) {
        let next = self.nodes[anchor].next;
        self.nodes[idx].prev = Some(anchor);
        self.nodes[idx].next = next;
        self.nodes[anchor].next = Some(idx);
        match next {
            Some(n) => self.nodes[n].prev = Some(idx),
            None => self.tail = Some(idx),
        }
    }

    fn link_before(&mut self, idx: usize, anchor: usize) {
        let prev = self.nodes[anchor].prev;
        self.nodes[idx].next = Some(anchor);
        self.nodes[idx].prev = prev;
        self.nodes[anchor].prev = Some(idx);
        match prev {
            Some(p) => self.nodes[p].next = Some(idx),
            None => self.head = Some(idx),
        }
    }

    fn link_back(&mut self, idx: usize) {
        self.nodes[idx].prev = self.tail;
        self.nodes[idx].next = None;
        match self.tail {
            Some(t) => self.nodes[t].next = Some(idx),
            None => self.head = Some(idx),
        }
        self.tail = Some(idx);
    }
}

impl<K: Eq + Hash + Clone, V> OrderedMap<K, V> {
    /// Create an empty map.
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            index: HashMap::new(),
            head: None,
            tail: None,
        }
    }

    /// Whether `key` is present.
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.index.contains_key(key)
    }

    /// Value stored under `key`.
    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.index.get(key).map(|&i| &self.nodes[i].value)
    }

    /// Mutable value stored under `key`.
    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        match self.index.get(key) {
            Some(&i) => Some(&mut self.nodes[i].value),
            None => None,
        }
    }

    /// Append `key` at the end, or replace its value in place if already present.
    ///
    /// Returns the previous value when the key existed.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        if let Some(&idx) = self.index.get(&key) {
            return Some(std::mem::replace(&mut self.nodes[idx].value, value));
        }
        let idx = self.push_node(key, value);
        self.link_back(idx);
        None
    }

    /// Insert `key` immediately after `anchor`.
    ///
    /// An existing `key` gets the new value and is moved after `anchor`.
    ///
    /// # Errors
    ///
    /// [`TemplarError::KeyNotFound`] if `anchor` is absent; the map is unchanged.
    pub fn insert_after<Q>(&mut self, key: K, value: V, anchor: &Q) -> Result<Option<V>, TemplarError>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + fmt::Display + ?Sized,
    {
        let anchor_idx = self.position(anchor)?;
        Ok(self.place(key, value, anchor_idx, Side::After))
    }

    /// Insert `key` immediately before `anchor`.
    ///
    /// An existing `key` gets the new value and is moved before `anchor`.
    ///
    /// # Errors
    ///
    /// [`TemplarError::KeyNotFound`] if `anchor` is absent; the map is unchanged.
    pub fn insert_before<Q>(
        &mut self,
        key: K,
        value: V,
        anchor: &Q,
    ) -> Result<Option<V>, TemplarError>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + fmt::Display + ?Sized,
    {
        let anchor_idx = self.position(anchor)?;
        Ok(self.place(key, value, anchor_idx, Side::Before))
    }

    /// Move an existing `key` immediately after `anchor`.
    ///
    /// # Errors
    ///
    /// [`TemplarError::KeyNotFound`] if either key is absent.
    pub fn move_after<Q>(&mut self, key: &Q, anchor: &Q) -> Result<(), TemplarError>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + fmt::Display + ?Sized,
    {
        let idx = self.position(key)?;
        let anchor_idx = self.position(anchor)?;
        if idx != anchor_idx {
            self.unlink(idx);
            self.link_after(idx, anchor_idx);
        }
        Ok(())
    }

    /// Move an existing `key` immediately before `anchor`.
    ///
    /// # Errors
    ///
    /// [`TemplarError::KeyNotFound`] if either key is absent.
    pub fn move_before<Q>(&mut self, key: &Q, anchor: &Q) -> Result<(), TemplarError>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + fmt::Display + ?Sized,
    {
        let idx = self.position(key)?;
        let anchor_idx = self.position(anchor)?;
        if idx != anchor_idx {
            self.unlink(idx);
            self.link_before(idx, anchor_idx);
        }
        Ok(())
    }

    /// Move an existing `key` to the end.
    ///
    /// # Errors
    ///
    /// [`TemplarError::KeyNotFound`] if `key` is absent.
    pub fn move_to_end<Q>(&mut self, key: &Q) -> Result<(), TemplarError>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + fmt::Display + ?Sized,
    {
        let idx = self.position(key)?;
        if self.tail != Some(idx) {
            self.unlink(idx);
            self.link_back(idx);
        }
        Ok(())
    }

    /// Remove `key`, returning its value. Order of the other entries is kept.
    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let idx = self.index.remove(key)?;
        self.unlink(idx);

        let last = self.nodes.len() - 1;
        let node = self.nodes.swap_remove(idx);
        if idx != last {
            // the node previously stored at `last` now lives at `idx`
            let (prev, next) = (self.nodes[idx].prev, self.nodes[idx].next);
            match prev {
                Some(p) => self.nodes[p].next = Some(idx),
                None => self.head = Some(idx),
            }
            match next {
                Some(n) => self.nodes[n].prev = Some(idx),
                None => self.tail = Some(idx),
            }
            if let Some(slot) = self.index.get_mut::<K>(&self.nodes[idx].key) {
                *slot = idx;
            }
        }
        Some(node.value)
    }

    fn position<Q>(&self, key: &Q) -> Result<usize, TemplarError>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + fmt::Display + ?Sized,
    {
        self.index.get(key).copied().ok_or_else(|| TemplarError::KeyNotFound {
            key: key.to_string(),
        })
    }

    fn push_node(&mut self, key: K, value: V) -> usize {
        let idx = self.nodes.len();
        self.nodes.push(Node {
            key: key.clone(),
            value,
            prev: None,
            next: None,
        });
        self.index.insert(key, idx);
        idx
    }

    fn place(&mut self, key: K, value: V, anchor_idx: usize, side: Side) -> Option<V> {
        let (idx, previous) = match self.index.get(&key) {
            Some(&idx) => {
                let old = std::mem::replace(&mut self.nodes[idx].value, value);
                if idx == anchor_idx {
                    return Some(old);
                }
                self.unlink(idx);
                (idx, Some(old))
            }
            None => (self.push_node(key, value), None),
        };
        match side {
            Side::After => self.link_after(idx, anchor_idx),
            Side::Before => self.link_before(idx, anchor_idx),
        }
        previous
    }
}

#[derive(Clone, Copy)]
enum Side {
    After,
    Before,
}

impl<K: Eq + Hash + Clone, V> Default for OrderedMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for OrderedMap<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K: PartialEq, V: PartialEq> PartialEq for OrderedMap<K, V> {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().zip(other.iter()).all(|(a, b)| a == b)
    }
}

impl<K: Eq, V: Eq> Eq for OrderedMap<K, V> {}

/// Borrowing iterator over an [`OrderedMap`] in order.
pub struct Iter<'a, K, V> {
    map: &'a OrderedMap<K, V>,
    cursor: Option<usize>,
    remaining: usize,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let idx = self.cursor?;
        let node = &self.map.nodes[idx];
        self.cursor = node.next;
        self.remaining -= 1;
        Some((&node.key, &node.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}

impl<'a, K, V> IntoIterator for &'a OrderedMap<K, V> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<K, V> IntoIterator for OrderedMap<K, V> {
    type Item = (K, V);
    type IntoIter = std::vec::IntoIter<(K, V)>;

    fn into_iter(self) -> Self::IntoIter {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut cursor = self.head;
        while let Some(idx) = cursor {
            order.push(idx);
            cursor = self.nodes[idx].next;
        }
        let mut slots: Vec<Option<Node<K, V>>> = self.nodes.into_iter().map(Some).collect();
        order
            .into_iter()
            .filter_map(|idx| slots[idx].take())
            .map(|node| (node.key, node.value))
            .collect::<Vec<_>>()
            .into_iter()
    }
}

impl<K: Eq + Hash + Clone, V> FromIterator<(K, V)> for OrderedMap<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        map.extend(iter);
        map
    }
}

impl<K: Eq + Hash + Clone, V> Extend<(K, V)> for OrderedMap<K, V> {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (k, v) in iter {
            self.insert(k, v);
        }
    }
}

impl<K: Serialize, V: Serialize> Serialize for OrderedMap<K, V> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (k, v) in self {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

struct OrderedMapVisitor<K, V>(PhantomData<fn() -> OrderedMap<K, V>>);

impl<'de, K, V> Visitor<'de> for OrderedMapVisitor<K, V>
where
    K: Deserialize<'de> + Eq + Hash + Clone,
    V: Deserialize<'de>,
{
    type Value = OrderedMap<K, V>;

    fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("a map")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut map = OrderedMap::new();
        while let Some((key, value)) = access.next_entry()? {
            map.insert(key, value);
        }
        Ok(map)
    }
}

impl<'de, K, V> Deserialize<'de> for OrderedMap<K, V>
where
    K: Deserialize<'de> + Eq + Hash + Clone,
    V: Deserialize<'de>,
{
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(OrderedMapVisitor(PhantomData))
    }
}
