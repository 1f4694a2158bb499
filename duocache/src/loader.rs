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

use std::fmt::Debug;

/// Capability that produces and validates the values of a [`crate::DuoCache`].
///
/// The cache calls [`Loader::load`] on a miss, at most once at a time per key. [`Loader::is_valid`] is checked on
/// every lookup. A value that fails it is treated as a miss and reloaded.
pub trait Loader<V>: Send + Sync + 'static {
    /// Produce the value of the key.
    ///
    /// Returning `Ok(None)` is a bug in the loader and fails the lookup with a value error.
    ///
    /// The loader may read other keys of the same cache through [`crate::DuoCache::get`].
    fn load(&self, key: &str) -> anyhow::Result<Option<V>>;

    /// Check if a cached value can still be served.
    ///
    /// A panic here is caught by the cache and treated as `false`.
    fn is_valid(&self, value: &V) -> bool {
        let _ = value;
        true
    }
}

/// [`Loader`] built from closures.
///
/// ```rust
/// # use duocache::prelude::*;
/// let loader = FnLoader::new(|key: &str| Ok(Some(key.len())))
///     .with_validity(|len: &usize| *len > 0);
/// assert_eq!(loader.load("abc").unwrap(), Some(3));
/// assert!(!loader.is_valid(&0));
/// ```
pub struct FnLoader<V> {
    load: Box<dyn Fn(&str) -> anyhow::Result<Option<V>> + Send + Sync + 'static>,
    validity: Box<dyn Fn(&V) -> bool + Send + Sync + 'static>,
}

impl<V> Debug for FnLoader<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnLoader").finish_non_exhaustive()
    }
}

impl<V> FnLoader<V> {
    /// Create a loader that treats every value as valid.
    pub fn new<F>(load: F) -> Self
    where
        F: Fn(&str) -> anyhow::Result<Option<V>> + Send + Sync + 'static,
    {
        Self {
            load: Box::new(load),
            validity: Box::new(|_| true),
        }
    }

    /// Set the validity predicate.
    pub fn with_validity<F>(mut self, validity: F) -> Self
    where
        F: Fn(&V) -> bool + Send + Sync + 'static,
    {
        self.validity = Box::new(validity);
        self
    }
}

impl<V> Loader<V> for FnLoader<V>
where
    V: 'static,
{
    fn load(&self, key: &str) -> anyhow::Result<Option<V>> {
        (self.load)(key)
    }

    fn is_valid(&self, value: &V) -> bool {
        (self.validity)(value)
    }
}
