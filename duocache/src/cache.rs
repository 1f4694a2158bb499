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

use std::{
    fmt::Debug,
    panic::{catch_unwind, AssertUnwindSafe},
    path::PathBuf,
    sync::Arc,
};

use duocache_common::{
    code::StorageValue,
    error::{Error, ErrorKind, Result},
    stripe::LockStripes,
};
use duocache_memory::Lru;
use duocache_storage::DiskStore;
use parking_lot::{Mutex, RwLock};

use crate::{
    loader::Loader,
    stats::{Statistics, Stats},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Source {
    Memory,
    Disk,
}

/// The tiers, guarded together by the structural lock.
///
/// Lookups hold the read lock. The inner mutex only covers the recency update of a memory hit. Inserts, promotions
/// and clears hold the write lock.
struct Tiers<V> {
    memory: Mutex<Lru<String, V>>,
    storage: Option<DiskStore>,
}

struct Inner<V, L> {
    name: String,
    capacity: usize,
    tiers: RwLock<Tiers<V>>,
    stripes: LockStripes,
    loader: L,
    statistics: Statistics,
}

/// A bounded in-memory LRU backed by an optional on-disk tier, filled on demand by a [`Loader`].
///
/// `DuoCache` is cheap to clone, all clones share the same tiers.
///
/// For a single key, the loader never runs concurrently with itself: misses take the key's stripe lock before
/// revalidating and loading. Misses of keys on different stripes load in parallel.
///
/// Stripe locks are reentrant, so a loader may call [`DuoCache::get`] for other keys. Loaders that depend on each
/// other in a cycle across threads still deadlock, and a loader must not get its own key.
pub struct DuoCache<V, L> {
    inner: Arc<Inner<V, L>>,
}

impl<V, L> Debug for DuoCache<V, L> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DuoCache")
            .field("name", &self.inner.name)
            .field("capacity", &self.inner.capacity)
            .field("stripes", &self.inner.stripes.len())
            .finish()
    }
}

impl<V, L> Clone for DuoCache<V, L> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<V, L> DuoCache<V, L>
where
    V: StorageValue,
    L: Loader<V>,
{
    pub(crate) fn new(
        name: String,
        capacity: usize,
        stripes: usize,
        storage: Option<DiskStore>,
        loader: L,
    ) -> Self {
        let tiers = Tiers {
            memory: Mutex::new(Lru::new(capacity)),
            storage,
        };
        Self {
            inner: Arc::new(Inner {
                name,
                capacity,
                tiers: RwLock::new(tiers),
                stripes: LockStripes::new(stripes),
                loader,
                statistics: Statistics::default(),
            }),
        }
    }

    /// Get the value of the key, loading it on a miss or if the cached value is no longer valid.
    ///
    /// A value served from the disk tier is promoted into the memory tier.
    #[cfg_attr(feature = "tracing", fastrace::trace(name = "duocache::get"))]
    pub fn get(&self, key: &str) -> Result<V> {
        check_key(key)?;

        if let Some((value, source)) = self.lookup(key) {
            if self.is_valid(&value) {
                if source == Source::Disk {
                    self.promote(key, &value);
                }
                return Ok(value);
            }
        }

        self.load_guarded(key)
    }

    /// Get the value of the key if either tier holds one. Never loads.
    ///
    /// The value is returned as is, without checking its validity. A disk hit is not promoted.
    #[cfg_attr(feature = "tracing", fastrace::trace(name = "duocache::get_only"))]
    pub fn get_only(&self, key: &str) -> Result<Option<V>> {
        check_key(key)?;
        Ok(self.lookup(key).map(|(value, _)| value))
    }

    /// Revalidate the key under its stripe lock and load it if it is still missing or invalid.
    ///
    /// This is the miss path of [`DuoCache::get`], without the preceding unguarded lookup.
    #[cfg_attr(feature = "tracing", fastrace::trace(name = "duocache::fetch"))]
    pub fn fetch(&self, key: &str) -> Result<V> {
        check_key(key)?;
        self.load_guarded(key)
    }

    /// Write the value into both tiers without calling the loader.
    ///
    /// The write does not take the key's stripe lock, so it may race with a concurrent load of the same key. The last
    /// writer wins.
    ///
    /// If the disk write fails the error is returned, but the memory tier keeps the new value.
    #[cfg_attr(feature = "tracing", fastrace::trace(name = "duocache::put_only"))]
    pub fn put_only(&self, key: &str, value: V) -> Result<()> {
        check_key(key)?;
        self.write(key, &value)
    }

    /// Remove all entries from the memory tier. The disk tier is left intact, its entries are promoted again on
    /// access.
    pub fn clear(&self) {
        let mut tiers = self.inner.tiers.write();
        tiers.memory.get_mut().clear();
        tracing::debug!(name = %self.inner.name, "[duocache]: memory tier cleared");
    }

    /// Snapshot of the counters.
    pub fn stats(&self) -> Stats {
        self.inner.statistics.snapshot(&self.inner.name, self.len(), self.inner.capacity)
    }

    /// Path of the file that holds, or would hold, the key on disk. `None` without the disk tier.
    pub fn storage_path(&self, key: &str) -> Result<Option<PathBuf>> {
        check_key(key)?;
        let tiers = self.inner.tiers.read();
        Ok(tiers.storage.as_ref().map(|storage| storage.path(key)))
    }

    /// Check if the disk tier is enabled.
    pub fn is_disk_persistent(&self) -> bool {
        self.inner.tiers.read().storage.is_some()
    }

    /// Name of the cache.
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Max entry count of the memory tier.
    pub fn capacity(&self) -> usize {
        self.inner.capacity
    }

    /// Entry count of the memory tier.
    pub fn len(&self) -> usize {
        self.inner.tiers.read().memory.lock().len()
    }

    /// Check if the memory tier is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Look up memory first, then disk. Records a hit or a miss.
    fn lookup(&self, key: &str) -> Option<(V, Source)> {
        let tiers = self.inner.tiers.read();

        if let Some(value) = tiers.memory.lock().get(key).cloned() {
            self.inner.statistics.hit_memory();
            tracing::trace!(name = %self.inner.name, key, "[duocache]: memory hit");
            return Some((value, Source::Memory));
        }

        if let Some(value) = tiers.storage.as_ref().and_then(|storage| storage.deserialize::<V>(key)) {
            self.inner.statistics.hit_disk();
            tracing::trace!(name = %self.inner.name, key, "[duocache]: disk hit");
            return Some((value, Source::Disk));
        }

        self.inner.statistics.miss();
        tracing::trace!(name = %self.inner.name, key, "[duocache]: miss");
        None
    }

    /// Look up again without touching the counters, used under the stripe lock.
    fn relookup(&self, key: &str) -> Option<(V, Source)> {
        let tiers = self.inner.tiers.read();
        if let Some(value) = tiers.memory.lock().get(key).cloned() {
            return Some((value, Source::Memory));
        }
        tiers
            .storage
            .as_ref()
            .and_then(|storage| storage.deserialize::<V>(key))
            .map(|value| (value, Source::Disk))
    }

    fn load_guarded(&self, key: &str) -> Result<V> {
        let _guard = self.inner.stripes.lock_for(key).lock();

        // Another thread holding the stripe may have loaded the key already.
        if let Some((value, source)) = self.relookup(key) {
            if self.is_valid(&value) {
                if source == Source::Disk {
                    self.promote(key, &value);
                }
                return Ok(value);
            }
        }

        self.inner.statistics.load();
        tracing::debug!(name = %self.inner.name, key, "[duocache]: load");

        let value = match self.inner.loader.load(key) {
            Ok(Some(value)) => value,
            Ok(None) => {
                return Err(Error::new(ErrorKind::Value, "loader returned no value").with_context("key", key));
            }
            Err(e) => {
                return Err(Error::new(ErrorKind::Load, "loader failed")
                    .with_context("key", key)
                    .with_source(e));
            }
        };

        self.write(key, &value)?;
        Ok(value)
    }

    /// Insert into memory, then serialize to disk, both under the write lock.
    fn write(&self, key: &str, value: &V) -> Result<()> {
        let mut tiers = self.inner.tiers.write();
        if tiers.memory.get_mut().put(key.to_string(), value.clone()).is_some() {
            self.inner.statistics.evict();
        }
        if let Some(storage) = tiers.storage.as_ref() {
            storage.serialize(key, value)?;
        }
        Ok(())
    }

    /// Copy a disk hit into memory, without writing it back to disk.
    ///
    /// A value written to memory since the lookup is newer and is kept.
    fn promote(&self, key: &str, value: &V) {
        let mut tiers = self.inner.tiers.write();
        let memory = tiers.memory.get_mut();
        if memory.contains(key) {
            return;
        }
        if memory.put(key.to_string(), value.clone()).is_some() {
            self.inner.statistics.evict();
        }
        tracing::debug!(name = %self.inner.name, key, "[duocache]: promote disk hit to memory");
    }

    /// A panicking predicate counts as invalid.
    fn is_valid(&self, value: &V) -> bool {
        match catch_unwind(AssertUnwindSafe(|| self.inner.loader.is_valid(value))) {
            Ok(valid) => valid,
            Err(_) => {
                tracing::warn!(name = %self.inner.name, "[duocache]: validity predicate panicked, treat value as invalid");
                false
            }
        }
    }
}

fn check_key(key: &str) -> Result<()> {
    if key.trim().is_empty() {
        return Err(Error::blank_key(key));
    }
    Ok(())
}
