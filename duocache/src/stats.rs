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

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters of a [`crate::DuoCache`], updated lock-free by every operation.
#[derive(Debug, Default)]
pub(crate) struct Statistics {
    pub hits_memory: AtomicU64,
    pub hits_disk: AtomicU64,
    pub misses: AtomicU64,
    pub loads: AtomicU64,
    pub evictions: AtomicU64,
}

impl Statistics {
    pub fn hit_memory(&self) {
        self.hits_memory.fetch_add(1, Ordering::Relaxed);
    }

    pub fn hit_disk(&self) {
        self.hits_disk.fetch_add(1, Ordering::Relaxed);
    }

    pub fn miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn load(&self) {
        self.loads.fetch_add(1, Ordering::Relaxed);
    }

    pub fn evict(&self) {
        self.evictions.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self, name: &str, size: usize, max_size: usize) -> Stats {
        let hits_memory = self.hits_memory.load(Ordering::Relaxed);
        let hits_disk = self.hits_disk.load(Ordering::Relaxed);
        Stats {
            name: name.to_string(),
            hits: hits_memory + hits_disk,
            misses: self.misses.load(Ordering::Relaxed),
            hits_memory,
            hits_disk,
            loads: self.loads.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            size,
            max_size,
        }
    }
}

/// Point-in-time view of the counters of a [`crate::DuoCache`].
///
/// A lookup is a hit when it finds a value in either tier, regardless of the value's validity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stats {
    /// Name of the cache.
    pub name: String,
    /// Lookups that found a value. Always `hits_memory + hits_disk`.
    pub hits: u64,
    /// Lookups that found nothing in both tiers.
    pub misses: u64,
    /// Hits served by the memory tier.
    pub hits_memory: u64,
    /// Hits served by the disk tier.
    pub hits_disk: u64,
    /// Loader invocations.
    pub loads: u64,
    /// Entries evicted from the memory tier.
    pub evictions: u64,
    /// Entries currently held by the memory tier.
    pub size: usize,
    /// Capacity of the memory tier.
    pub max_size: usize,
}

impl Stats {
    /// `hits / (hits + misses)`, or `0.0` before the first hit.
    pub fn hit_ratio(&self) -> f64 {
        if self.hits == 0 {
            return 0.0;
        }
        self.hits as f64 / (self.hits + self.misses) as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hit_ratio() {
        let statistics = Statistics::default();
        let stats = statistics.snapshot("test", 0, 10);
        assert_eq!(stats.hit_ratio(), 0.0);

        // Misses alone never produce a ratio other than zero.
        statistics.miss();
        statistics.miss();
        assert_eq!(statistics.snapshot("test", 0, 10).hit_ratio(), 0.0);

        statistics.hit_memory();
        statistics.hit_disk();
        let stats = statistics.snapshot("test", 2, 10);
        assert_eq!(stats.hits, 2);
        assert_eq!(stats.hits_memory + stats.hits_disk, stats.hits);
        assert_eq!(stats.hit_ratio(), 0.5);
        assert_eq!(stats.size, 2);
        assert_eq!(stats.max_size, 10);
        assert_eq!(stats.name, "test");
    }
}
