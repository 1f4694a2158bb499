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

//! duocache: a bounded in-memory LRU cache backed by an optional on-disk tier.
//!
//! Values are produced on demand by a caller-supplied [`Loader`]. Concurrent misses of the same key call the loader
//! once. Values found only on disk are promoted into memory on access, and unreadable disk entries are removed and
//! treated as misses.
//!
//! ```rust
//! use duocache::prelude::*;
//!
//! let cache = DuoCacheBuilder::new(100)
//!     .with_name("squares")
//!     .build(FnLoader::new(|key: &str| Ok(Some(key.parse::<u64>()? * 2))))
//!     .unwrap();
//!
//! assert_eq!(cache.get("21").unwrap(), 42);
//! assert_eq!(cache.stats().misses, 1);
//! ```

mod builder;
mod cache;
mod config;
mod entry;
mod loader;
mod stats;

/// Re-exports of the commonly used types.
pub mod prelude;

pub use builder::DuoCacheBuilder;
pub use cache::DuoCache;
pub use config::CacheConfig;
pub use duocache_common::{
    code::{Code, StorageValue},
    error::{Error, ErrorKind, Result},
};
pub use entry::Stamped;
pub use loader::{FnLoader, Loader};
pub use stats::Stats;
