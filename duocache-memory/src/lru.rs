// Copyright 2025 duocache Project Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::hash::Hash;

use duocache_common::strict_assert_eq;
use hashbrown::{Equivalent, HashMap};

use crate::slab::{SlabLinkedList, Token};

/// Bounded key-value map with strict least-recently-used eviction.
///
/// Both [`Lru::get`] and [`Lru::put`] count as an access. The list is ordered from the least recently used entry
/// (front) to the most recently used entry (back). The indexer maps a key to the slab token of its node.
#[derive(Debug)]
pub struct Lru<K, V> {
    indexer: HashMap<K, Token>,
    list: SlabLinkedList<(K, V)>,
    capacity: usize,
}

impl<K, V> Lru<K, V>
where
    K: Hash + Eq + Clone,
{
    /// Create an LRU holding at most `capacity` entries.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "capacity must be greater than zero");
        Self {
            indexer: HashMap::with_capacity(capacity),
            list: SlabLinkedList::with_capacity(capacity),
            capacity,
        }
    }

    /// Get the value and mark the entry as most recently used.
    ///
    /// A miss does not modify the LRU.
    pub fn get<Q>(&mut self, key: &Q) -> Option<&V>
    where
        Q: Hash + Equivalent<K> + ?Sized,
    {
        let token = *self.indexer.get(key)?;
        self.list.move_to_back(token);
        self.list.get(token).map(|(_, v)| v)
    }

    /// Get the value without touching the recency order.
    pub fn peek<Q>(&self, key: &Q) -> Option<&V>
    where
        Q: Hash + Equivalent<K> + ?Sized,
    {
        let token = *self.indexer.get(key)?;
        self.list.get(token).map(|(_, v)| v)
    }

    /// Insert or replace the value and mark the entry as most recently used.
    ///
    /// Returns the evicted least recently used entry if the insertion made the LRU exceed its capacity. Replacing an
    /// existing key never evicts.
    pub fn put(&mut self, key: K, value: V) -> Option<(K, V)> {
        if let Some(&token) = self.indexer.get(&key) {
            if let Some((_, v)) = self.list.get_mut(token) {
                *v = value;
            }
            self.list.move_to_back(token);
            return None;
        }

        let token = self.list.push_back((key.clone(), value));
        self.indexer.insert(key, token);

        let evicted = if self.list.len() > self.capacity { self.evict() } else { None };

        strict_assert_eq!(self.indexer.len(), self.list.len());
        evicted
    }

    /// Remove the entry.
    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        Q: Hash + Equivalent<K> + ?Sized,
    {
        let token = self.indexer.remove(key)?;
        self.list.remove(token).map(|(_, v)| v)
    }

    /// Check if the key exists, without touching the recency order.
    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        Q: Hash + Equivalent<K> + ?Sized,
    {
        self.indexer.contains_key(key)
    }

    /// Count of entries.
    pub fn len(&self) -> usize {
        self.list.len()
    }

    /// Check if the LRU is empty.
    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    /// Max count of entries.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Remove all entries.
    pub fn clear(&mut self) {
        self.indexer.clear();
        self.list.clear();
    }

    /// Iterate from the least recently used entry to the most recently used entry.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        self.list.iter().map(|(k, v)| (k, v))
    }

    fn evict(&mut self) -> Option<(K, V)> {
        let (key, value) = self.list.pop_front()?;
        self.indexer.remove(&key);
        Some((key, value))
    }
}
