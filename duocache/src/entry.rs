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

use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// A value with the wall-clock time it was created at.
///
/// The cache has no expiry of its own. Wrap values in [`Stamped`] and check [`Stamped::is_older_than`] in
/// [`crate::Loader::is_valid`] to get freshness-based reloads.
///
/// ```rust
/// # use std::time::Duration;
/// # use duocache::prelude::*;
/// let loader = FnLoader::new(|key: &str| Ok(Some(Stamped::new(key.to_string()))))
///     .with_validity(|v: &Stamped<String>| !v.is_older_than(Duration::from_secs(60)));
/// # let _ = loader;
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Stamped<T> {
    value: T,
    /// Milliseconds since the Unix epoch.
    created_at: u64,
}

impl<T> Stamped<T> {
    /// Stamp the value with the current time.
    pub fn new(value: T) -> Self {
        Self::with_timestamp(value, now_millis())
    }

    /// Stamp the value with a given time in milliseconds since the Unix epoch.
    pub fn with_timestamp(value: T, created_at: u64) -> Self {
        Self { value, created_at }
    }

    /// The wrapped value.
    pub fn value(&self) -> &T {
        &self.value
    }

    /// Unwrap the value.
    pub fn into_value(self) -> T {
        self.value
    }

    /// Creation time in milliseconds since the Unix epoch.
    pub fn created_at(&self) -> u64 {
        self.created_at
    }

    /// Time elapsed since creation. Zero if the clock went backwards.
    pub fn age(&self) -> Duration {
        Duration::from_millis(now_millis().saturating_sub(self.created_at))
    }

    /// Check if the value is strictly older than `max_age`.
    pub fn is_older_than(&self, max_age: Duration) -> bool {
        self.age() > max_age
    }
}

#[cfg(not(feature = "serde"))]
impl<T> duocache_common::code::Code for Stamped<T>
where
    T: duocache_common::code::Code,
{
    fn encode(&self, writer: &mut impl std::io::Write) -> duocache_common::error::Result<()> {
        writer.write_all(&self.created_at.to_le_bytes())?;
        self.value.encode(writer)
    }

    fn decode(reader: &mut impl std::io::Read) -> duocache_common::error::Result<Self>
    where
        Self: Sized,
    {
        let mut buf = [0u8; 8];
        reader.read_exact(&mut buf)?;
        let created_at = u64::from_le_bytes(buf);
        let value = T::decode(reader)?;
        Ok(Self { value, created_at })
    }

    fn estimated_size(&self) -> usize {
        8 + self.value.estimated_size()
    }
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}
