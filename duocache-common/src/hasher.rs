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

use twox_hash::XxHash64;

/// Stable key hasher.
///
/// The hash of a key must not change across processes, because it selects the shard directory and the file name of
/// persisted entries. `std`'s `RandomState` is seeded per process and cannot be used here.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeyHasher;

impl KeyHasher {
    const SEED: u64 = 0;

    /// Hash the key bytes.
    pub fn hash(key: &str) -> u64 {
        XxHash64::oneshot(Self::SEED, key.as_bytes())
    }

    /// Map the key into `0..buckets`.
    ///
    /// # Panics
    ///
    /// Panics if `buckets` is zero.
    pub fn bucket(key: &str, buckets: usize) -> usize {
        assert!(buckets > 0, "buckets must be greater than zero");
        (Self::hash(key) % buckets as u64) as usize
    }
}
