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

use std::path::{Path, PathBuf};

use duocache_common::error::{Error, Result};

/// Construction parameters of a [`crate::DuoCache`].
///
/// Usually filled through [`crate::DuoCacheBuilder`]. With the `serde` feature the config can be read from a file,
/// missing fields take their default values.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct CacheConfig {
    /// Non-blank name, used to label stats and logs.
    pub name: String,
    /// Max entry count of the memory tier. Must be at least 1.
    pub capacity: usize,
    /// Enable the disk tier.
    pub persist: bool,
    /// Root of the disk tier. Required if `persist` is set.
    pub data_dir: Option<PathBuf>,
    /// Count of shard directories under `data_dir`.
    pub shards: usize,
    /// Count of per-key lock stripes.
    pub stripes: usize,
    /// Call `fsync` after each disk write.
    pub flush: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            name: Self::DEFAULT_NAME.to_string(),
            capacity: Self::DEFAULT_CAPACITY,
            persist: false,
            data_dir: None,
            shards: Self::DEFAULT_SHARDS,
            stripes: Self::DEFAULT_STRIPES,
            flush: false,
        }
    }
}

impl CacheConfig {
    /// Default cache name.
    pub const DEFAULT_NAME: &'static str = "duocache";
    /// Default memory tier capacity.
    pub const DEFAULT_CAPACITY: usize = 1024;
    /// Default count of shard directories.
    pub const DEFAULT_SHARDS: usize = duocache_storage::DiskStoreConfig::DEFAULT_SHARDS;
    /// Default count of lock stripes.
    pub const DEFAULT_STRIPES: usize = 100;

    /// Validate the config and normalize the data directory.
    ///
    /// The data directory is dropped when persistence is disabled.
    pub fn validate(mut self) -> Result<Self> {
        if self.name.trim().is_empty() {
            return Err(Error::config("cache name must not be blank").with_context("name", format!("{:?}", self.name)));
        }
        if self.capacity == 0 {
            return Err(Error::config("capacity must be at least 1").with_context("capacity", self.capacity));
        }
        if self.stripes == 0 {
            return Err(Error::config("lock stripes must be at least 1"));
        }
        if self.shards == 0 {
            return Err(Error::config("shards must be at least 1"));
        }

        if !self.persist {
            self.data_dir = None;
            return Ok(self);
        }

        let dir = self
            .data_dir
            .as_deref()
            .and_then(normalize_dir)
            .ok_or_else(|| Error::config("disk persistence requires a data directory"))?;
        self.data_dir = Some(dir);

        Ok(self)
    }
}

/// Trim surrounding whitespace and trailing `/`. Returns `None` for a blank path.
fn normalize_dir(dir: &Path) -> Option<PathBuf> {
    let Some(s) = dir.to_str() else {
        return Some(dir.to_path_buf());
    };
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    match s.trim_end_matches('/') {
        "" => Some(PathBuf::from("/")),
        s => Some(PathBuf::from(s)),
    }
}

#[cfg(test)]
mod tests {
    use duocache_common::error::ErrorKind;

    use super::*;

    fn config() -> CacheConfig {
        CacheConfig {
            name: "test".to_string(),
            capacity: 16,
            ..Default::default()
        }
    }

    #[test]
    fn test_validate() {
        assert_eq!(config().validate().unwrap(), config());

        for invalid in [
            CacheConfig { name: "  ".to_string(), ..config() },
            CacheConfig { capacity: 0, ..config() },
            CacheConfig { stripes: 0, ..config() },
            CacheConfig { shards: 0, ..config() },
            CacheConfig { persist: true, ..config() },
            CacheConfig { persist: true, data_dir: Some(" ".into()), ..config() },
        ] {
            let e = invalid.clone().validate().unwrap_err();
            assert_eq!(e.kind(), ErrorKind::Config, "{invalid:?}");
        }
    }

    #[test]
    fn test_normalize_dir() {
        let validated = CacheConfig {
            persist: true,
            data_dir: Some(" /tmp/duocache// ".into()),
            ..config()
        }
        .validate()
        .unwrap();
        assert_eq!(validated.data_dir, Some(PathBuf::from("/tmp/duocache")));

        assert_eq!(normalize_dir(Path::new("/")), Some(PathBuf::from("/")));
        assert_eq!(normalize_dir(Path::new("data")), Some(PathBuf::from("data")));
        assert_eq!(normalize_dir(Path::new("")), None);

        // The directory is ignored without persistence.
        let validated = CacheConfig {
            data_dir: Some("/tmp/duocache".into()),
            ..config()
        }
        .validate()
        .unwrap();
        assert_eq!(validated.data_dir, None);
    }
}
