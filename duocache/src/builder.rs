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

use std::path::Path;

use duocache_common::{code::StorageValue, error::Result};
use duocache_storage::{DiskStore, DiskStoreConfig};

use crate::{cache::DuoCache, config::CacheConfig, loader::Loader};

/// Builder of a [`DuoCache`].
///
/// ```rust
/// # use duocache::prelude::*;
/// let dir = tempfile::tempdir().unwrap();
/// let cache = DuoCacheBuilder::new(1024)
///     .with_name("users")
///     .with_disk_persistence(dir.path())
///     .build(FnLoader::new(|key: &str| Ok(Some(key.to_uppercase()))))
///     .unwrap();
/// assert_eq!(cache.get("alice").unwrap(), "ALICE");
/// ```
#[derive(Debug, Clone)]
pub struct DuoCacheBuilder {
    config: CacheConfig,
}

impl DuoCacheBuilder {
    /// Create a builder for a cache holding at most `capacity` entries in memory, without the disk tier.
    pub fn new(capacity: usize) -> Self {
        Self {
            config: CacheConfig {
                capacity,
                ..Default::default()
            },
        }
    }

    /// Set the name of the cache. It labels stats and logs.
    ///
    /// Default: `duocache`.
    pub fn with_name(mut self, name: &str) -> Self {
        self.config.name = name.to_string();
        self
    }

    /// Set the count of per-key lock stripes. Keys on the same stripe serialize their loads.
    ///
    /// Default: `100`.
    pub fn with_lock_stripes(mut self, stripes: usize) -> Self {
        self.config.stripes = stripes;
        self
    }

    /// Enable the disk tier under the given directory.
    pub fn with_disk_persistence(mut self, dir: impl AsRef<Path>) -> Self {
        self.config.persist = true;
        self.config.data_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    /// Set the count of shard directories of the disk tier.
    ///
    /// Default: `1000`.
    pub fn with_shards(mut self, shards: usize) -> Self {
        self.config.shards = shards;
        self
    }

    /// Call `fsync` after each disk write.
    ///
    /// Default: `false`.
    pub fn with_flush(mut self, flush: bool) -> Self {
        self.config.flush = flush;
        self
    }

    /// Replace the whole config.
    pub fn with_config(mut self, config: CacheConfig) -> Self {
        self.config = config;
        self
    }

    /// Validate the config, prepare the disk tier if enabled, and build the cache.
    pub fn build<V, L>(self, loader: L) -> Result<DuoCache<V, L>>
    where
        V: StorageValue,
        L: Loader<V>,
    {
        let CacheConfig {
            name,
            capacity,
            persist,
            data_dir,
            shards,
            stripes,
            flush,
        } = self.config.validate()?;

        let storage = match data_dir {
            Some(dir) => Some(DiskStore::open(DiskStoreConfig { dir, shards, flush })?),
            None => None,
        };

        tracing::info!(
            name = %name,
            capacity,
            persist,
            dir = ?storage.as_ref().map(|storage| storage.dir()),
            stripes,
            "[duocache]: open"
        );

        Ok(DuoCache::new(name, capacity, stripes, storage, loader))
    }
}
