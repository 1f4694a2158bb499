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
    fs::{create_dir, create_dir_all, remove_file, File},
    io::Write,
    path::{Path, PathBuf},
};

use duocache_common::{
    code::Code,
    error::{Error, ErrorKind, Result},
    hasher::KeyHasher,
};

use crate::serde::{EntryDeserializer, EntrySerializer};

/// Config for the [`DiskStore`].
#[derive(Debug, Clone)]
pub struct DiskStoreConfig {
    /// Root of the shard directories.
    pub dir: PathBuf,
    /// Count of shard directories.
    pub shards: usize,
    /// Call `fsync` after each write.
    pub flush: bool,
}

impl DiskStoreConfig {
    /// Default count of shard directories.
    pub const DEFAULT_SHARDS: usize = 1000;

    /// Config with the default shard count and without `fsync`.
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().into(),
            shards: Self::DEFAULT_SHARDS,
            flush: false,
        }
    }
}

/// Sharded on-disk store with one file per key.
///
/// Layout: `<dir>/<shard>/<hash>`, where `hash` is the 16-digit hex stable hash of the key and `shard` is
/// `hash % shards`. The entry records the full key, so two keys with the same hash never read each other's value.
///
/// The store does not lock. Callers must not serialize and deserialize the same key concurrently.
#[derive(Debug)]
pub struct DiskStore {
    dir: PathBuf,
    shards: usize,
    flush: bool,
}

impl DiskStore {
    /// Open the store and create all shard directories.
    ///
    /// A shard path occupied by a regular file is replaced with a directory.
    pub fn open(config: DiskStoreConfig) -> Result<Self> {
        let DiskStoreConfig { dir, shards, flush } = config;

        if shards == 0 {
            return Err(Error::config("shards must be greater than zero"));
        }
        if dir.exists() && !dir.is_dir() {
            return Err(Error::config("data dir is a file, should be a directory").with_context("dir", dir.display()));
        }

        let usable = |e: std::io::Error, path: &Path| {
            Error::config("data dir is not usable")
                .with_context("path", path.display())
                .with_source(e)
        };

        create_dir_all(&dir).map_err(|e| usable(e, &dir))?;

        for shard in 0..shards {
            let path = dir.join(shard.to_string());
            if path.is_dir() {
                continue;
            }
            if path.exists() {
                tracing::warn!(path = %path.display(), "[disk store]: replace non-directory shard path");
                remove_file(&path).map_err(|e| usable(e, &path))?;
            }
            create_dir(&path).map_err(|e| usable(e, &path))?;
        }

        tracing::debug!(dir = %dir.display(), shards, "[disk store]: opened");

        Ok(Self { dir, shards, flush })
    }

    /// Root of the shard directories.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Count of shard directories.
    pub fn shards(&self) -> usize {
        self.shards
    }

    /// Path of the file holding the key.
    pub fn path(&self, key: &str) -> PathBuf {
        let hash = KeyHasher::hash(key);
        let shard = hash % self.shards as u64;
        self.dir.join(shard.to_string()).join(format!("{hash:016x}"))
    }

    /// Write the entry, overwriting any previous content of its file.
    ///
    /// The overwrite is not atomic. A crash in the middle leaves a corrupt file, which [`DiskStore::deserialize`]
    /// removes on the next read.
    pub fn serialize<V>(&self, key: &str, value: &V) -> Result<()>
    where
        V: Code,
    {
        let path = self.path(key);
        self.write(key, value, &path).map_err(|e| {
            Error::new(ErrorKind::Serialization, "serialize entry failed")
                .with_context("key", key)
                .with_context("path", path.display())
                .with_source(e)
        })
    }

    fn write<V>(&self, key: &str, value: &V, path: &Path) -> Result<()>
    where
        V: Code,
    {
        let mut buf = vec![];
        EntrySerializer::serialize(key, value, &mut buf)?;

        let mut file = File::create(path)?;
        file.write_all(&buf)?;
        if self.flush {
            file.sync_data()?;
        }
        Ok(())
    }

    /// Read the value of the key.
    ///
    /// Returns `None` if the key has no file. If the file cannot be read or decoded, it is removed and `None` is
    /// returned. Failures here are never surfaced.
    pub fn deserialize<V>(&self, key: &str) -> Option<V>
    where
        V: Code,
    {
        let path = self.path(key);

        let buf = match std::fs::read(&path) {
            Ok(buf) => buf,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                self.heal(&path, e.into());
                return None;
            }
        };

        match EntryDeserializer::deserialize(key, &buf) {
            Ok(Some(value)) => Some(value),
            Ok(None) => {
                tracing::debug!(key, path = %path.display(), "[disk store]: entry belongs to another key");
                None
            }
            Err(e) => {
                self.heal(&path, e);
                None
            }
        }
    }

    fn heal(&self, path: &Path, e: Error) {
        tracing::warn!(path = %path.display(), error = %e, "[disk store]: remove unreadable entry");
        if let Err(e) = remove_file(path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!(path = %path.display(), error = %e, "[disk store]: remove unreadable entry failed");
            }
        }
    }
}
