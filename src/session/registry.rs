//! Keyed, session-scoped instance cache.

use anyhow::Result;
use std::collections::HashMap;
use std::hash::Hash;

/// Values created on first use and shared for the rest of the session.
///
/// One instance per key: `get_or_create` only runs its factory when the key is
/// not registered yet. Dropping the registry drops every instance, so nothing
/// leaks from one session into the next.
#[derive(Debug, Clone)]
pub struct Registry<K, V> {
    entries: HashMap<K, V>,
}

impl<K: Eq + Hash, V> Registry<K, V> {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    pub fn get(&self, key: &K) -> Option<&V> {
        self.entries.get(key)
    }

    /// Instance for `key`, created by `create` if missing.
    pub fn get_or_create<F>(&mut self, key: K, create: F) -> &mut V
    where
        F: FnOnce() -> V,
    {
        self.entries.entry(key).or_insert_with(create)
    }

    /// Fallible [`get_or_create`](Self::get_or_create). Nothing is registered
    /// when `create` fails.
    pub fn get_or_try_create<F>(&mut self, key: K, create: F) -> Result<&mut V>
    where
        F: FnOnce() -> Result<V>,
    {
        use std::collections::hash_map::Entry;
        match self.entries.entry(key) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => Ok(entry.insert(create()?)),
        }
    }
}

impl<K: Eq + Hash, V> Default for Registry<K, V> {
    fn default() -> Self {
        Self::new()
    }
}
