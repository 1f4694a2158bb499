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

use parking_lot::ReentrantMutex;

use crate::hasher::KeyHasher;

/// A fixed pool of reentrant locks selected by key hash.
///
/// Used to serialize per-key critical sections without a lock object per key. Distinct keys may share a stripe.
///
/// A thread holding a stripe can lock it again. A critical section may therefore enter another one for a key on the
/// same stripe without blocking on itself.
///
/// The pool size is fixed for the lifetime of the pool. A key always maps to the same lock.
#[derive(Debug)]
pub struct LockStripes {
    locks: Box<[ReentrantMutex<()>]>,
}

impl LockStripes {
    /// Create a pool with `stripes` locks.
    ///
    /// # Panics
    ///
    /// Panics if `stripes` is zero.
    pub fn new(stripes: usize) -> Self {
        assert!(stripes > 0, "stripes must be greater than zero");
        let locks = (0..stripes).map(|_| ReentrantMutex::new(())).collect();
        Self { locks }
    }

    /// Index of the stripe the key maps to.
    pub fn index(&self, key: &str) -> usize {
        KeyHasher::bucket(key, self.locks.len())
    }

    /// The lock guarding the key.
    pub fn lock_for(&self, key: &str) -> &ReentrantMutex<()> {
        &self.locks[self.index(key)]
    }

    /// Count of stripes.
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    /// Always `false`, a pool holds at least one stripe.
    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}
