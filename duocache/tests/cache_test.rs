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

//! Behavior of duocache across both tiers.

use std::{
    fs::{self, OpenOptions},
    path::Path,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
};

use duocache::prelude::*;
use itertools::Itertools;

/// Loader that returns `v-<key>` and counts its calls.
fn counting() -> (FnLoader<String>, Arc<AtomicUsize>) {
    let loads = Arc::new(AtomicUsize::new(0));
    let counter = loads.clone();
    let loader = FnLoader::new(move |key: &str| {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(Some(format!("v-{key}")))
    });
    (loader, loads)
}

fn open(dir: &Path, capacity: usize) -> (DuoCache<String, FnLoader<String>>, Arc<AtomicUsize>) {
    let (loader, loads) = counting();
    let cache = DuoCacheBuilder::new(capacity)
        .with_name("test")
        .with_shards(16)
        .with_disk_persistence(dir)
        .build(loader)
        .unwrap();
    (cache, loads)
}

#[test_log::test]
fn test_capacity_and_lru_order() {
    let (loader, loads) = counting();
    let cache = DuoCacheBuilder::new(3).build(loader).unwrap();

    for key in ["a", "b", "c"] {
        cache.put_only(key, key.to_string()).unwrap();
    }
    // Touch `a`, so `b` is the least recently used.
    assert_eq!(cache.get("a").unwrap(), "a");

    cache.put_only("d", "d".to_string()).unwrap();
    assert_eq!(cache.len(), 3);
    assert_eq!(cache.get_only("b").unwrap(), None);
    for key in ["a", "c", "d"] {
        assert_eq!(cache.get_only(key).unwrap().as_deref(), Some(key));
    }
    assert_eq!(loads.load(Ordering::SeqCst), 0);

    // Loads count as accesses too.
    for i in 0..100 {
        cache.get(&format!("k{i}")).unwrap();
        assert!(cache.len() <= 3);
    }
    let stats = cache.stats();
    assert_eq!(stats.size, 3);
    assert_eq!(stats.max_size, 3);
    assert_eq!(stats.evictions, 101);
}

#[test]
fn test_read_your_write() {
    let dir = tempfile::tempdir().unwrap();
    let (cache, loads) = open(dir.path(), 8);

    cache.put_only("k", "written".to_string()).unwrap();
    assert_eq!(cache.get("k").unwrap(), "written");

    cache.put_only("k", "rewritten".to_string()).unwrap();
    assert_eq!(cache.get("k").unwrap(), "rewritten");
    assert_eq!(cache.len(), 1);

    assert_eq!(loads.load(Ordering::SeqCst), 0);
}

#[test_log::test]
fn test_disk_round_trip_and_promotion() {
    let dir = tempfile::tempdir().unwrap();
    let (cache, loads) = open(dir.path(), 4);

    cache.put_only("k", "persisted".to_string()).unwrap();
    for i in 0..4 {
        cache.put_only(&format!("other-{i}"), "x".to_string()).unwrap();
    }
    assert_eq!(cache.len(), 4);

    let before = cache.stats();
    assert_eq!(cache.get("k").unwrap(), "persisted");
    let after = cache.stats();
    assert_eq!(after.hits_disk, before.hits_disk + 1);
    assert_eq!(after.hits_memory, before.hits_memory);

    assert_eq!(cache.get("k").unwrap(), "persisted");
    let promoted = cache.stats();
    assert_eq!(promoted.hits_memory, after.hits_memory + 1);
    assert_eq!(promoted.hits_disk, after.hits_disk);

    assert_eq!(loads.load(Ordering::SeqCst), 0);
}

#[test]
fn test_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    {
        let (cache, _) = open(dir.path(), 4);
        cache.get("k").unwrap();
        cache.put_only("p", "put".to_string()).unwrap();
    }

    let (cache, loads) = open(dir.path(), 4);
    assert_eq!(cache.get("k").unwrap(), "v-k");
    assert_eq!(cache.get("p").unwrap(), "put");
    assert_eq!(loads.load(Ordering::SeqCst), 0);
    assert_eq!(cache.stats().hits_disk, 2);
}

#[test_log::test]
fn test_self_healing() {
    let dir = tempfile::tempdir().unwrap();
    {
        let (cache, _) = open(dir.path(), 4);
        cache.put_only("k", "stale value".to_string()).unwrap();
    }

    let (cache, loads) = open(dir.path(), 4);
    let path = cache.storage_path("k").unwrap().unwrap();
    let len = fs::metadata(&path).unwrap().len();
    OpenOptions::new().write(true).open(&path).unwrap().set_len(len / 2).unwrap();

    // `get_only` removes the corrupt file and reports a miss.
    assert_eq!(cache.get_only("k").unwrap(), None);
    assert!(!path.exists());

    // Corrupt it again, `get` loads as on a clean miss and persists the fresh value.
    fs::write(&path, b"\x00\x01garbage").unwrap();
    assert_eq!(cache.get("k").unwrap(), "v-k");
    assert_eq!(loads.load(Ordering::SeqCst), 1);

    let (cache, loads) = open(dir.path(), 4);
    assert_eq!(cache.get("k").unwrap(), "v-k");
    assert_eq!(loads.load(Ordering::SeqCst), 0);
}

#[test]
fn test_stats() {
    let (loader, _) = counting();
    let cache = DuoCacheBuilder::new(16).with_name("stats").build(loader).unwrap();

    let stats = cache.stats();
    assert_eq!(stats.name, "stats");
    assert_eq!(stats.hit_ratio(), 0.0);

    // 3 misses, then 6 hits.
    for key in ["a", "b", "c"] {
        cache.get(key).unwrap();
    }
    assert_eq!(cache.stats().hit_ratio(), 0.0);
    for key in ["a", "b", "c", "a", "b", "c"] {
        cache.get(key).unwrap();
    }

    let stats = cache.stats();
    assert_eq!(stats.misses, 3);
    assert_eq!(stats.hits, 6);
    assert_eq!(stats.hits_memory + stats.hits_disk, stats.hits);
    assert_eq!(stats.loads, 3);
    assert_eq!(stats.size, 3);
    assert!((stats.hit_ratio() - 6.0 / 9.0).abs() < f64::EPSILON);

    // `get_only` lookups are counted as well.
    assert_eq!(cache.get_only("missing").unwrap(), None);
    assert_eq!(cache.stats().misses, 4);
}

#[test]
fn test_clear_keeps_disk() {
    let dir = tempfile::tempdir().unwrap();
    let (cache, loads) = open(dir.path(), 8);

    let keys = (0..5).map(|i| format!("key-{i}")).collect_vec();
    for key in &keys {
        cache.get(key).unwrap();
    }
    assert_eq!(cache.len(), 5);

    cache.clear();
    assert!(cache.is_empty());

    for key in &keys {
        assert_eq!(cache.get(key).unwrap(), format!("v-{key}"));
    }
    assert_eq!(loads.load(Ordering::SeqCst), 5);
    assert_eq!(cache.stats().hits_disk, 5);
    assert_eq!(cache.len(), 5);
}

#[test]
fn test_memory_only_clear_loses_values() {
    let (loader, loads) = counting();
    let cache = DuoCacheBuilder::new(8).build(loader).unwrap();

    cache.get("k").unwrap();
    cache.clear();
    cache.get("k").unwrap();
    assert_eq!(loads.load(Ordering::SeqCst), 2);
}

#[test]
fn test_input_validation() {
    let (loader, _) = counting();
    let cache = DuoCacheBuilder::new(1).build(loader).unwrap();
    assert_eq!(cache.get("   ").unwrap_err().kind(), ErrorKind::Key);
    assert_eq!(cache.put_only("", "v".to_string()).unwrap_err().kind(), ErrorKind::Key);

    let kind = |builder: DuoCacheBuilder| builder.build(counting().0).unwrap_err().kind();
    assert_eq!(kind(DuoCacheBuilder::new(0)), ErrorKind::Config);
    assert_eq!(kind(DuoCacheBuilder::new(1).with_name("")), ErrorKind::Config);
    assert_eq!(kind(DuoCacheBuilder::new(1).with_disk_persistence("  ")), ErrorKind::Config);
    assert_eq!(
        kind(DuoCacheBuilder::new(1).with_config(CacheConfig {
            persist: true,
            data_dir: None,
            ..Default::default()
        })),
        ErrorKind::Config
    );
}

#[test]
fn test_serialization_error_keeps_memory() {
    let dir = tempfile::tempdir().unwrap();
    let (cache, _) = open(dir.path(), 8);

    let path = cache.storage_path("k").unwrap().unwrap();
    let shard = path.parent().unwrap();
    fs::remove_dir_all(shard).unwrap();
    fs::write(shard, b"").unwrap();

    let e = cache.put_only("k", "v".to_string()).unwrap_err();
    assert_eq!(e.kind(), ErrorKind::Serialization);
    assert_eq!(cache.get_only("k").unwrap().as_deref(), Some("v"));
}

#[test]
fn test_load_serialization_error_keeps_memory() {
    let dir = tempfile::tempdir().unwrap();
    let (cache, loads) = open(dir.path(), 8);

    let path = cache.storage_path("k").unwrap().unwrap();
    let shard = path.parent().unwrap();
    fs::remove_dir_all(shard).unwrap();
    fs::write(shard, b"").unwrap();

    let e = cache.get("k").unwrap_err();
    assert_eq!(e.kind(), ErrorKind::Serialization);
    assert_eq!(loads.load(Ordering::SeqCst), 1);

    // The loaded value stays in memory and is served without another load.
    assert_eq!(cache.get_only("k").unwrap().as_deref(), Some("v-k"));
    assert_eq!(cache.get("k").unwrap(), "v-k");
    assert_eq!(loads.load(Ordering::SeqCst), 1);
    assert_eq!(cache.stats().loads, 1);
}

#[test_log::test]
fn test_validity_panic_is_invalid() {
    let loads = Arc::new(AtomicUsize::new(0));
    let counter = loads.clone();
    let loader = FnLoader::new(move |_: &str| Ok(Some(counter.fetch_add(1, Ordering::SeqCst) as u64)))
        .with_validity(|v: &u64| {
            if *v == 0 {
                panic!("validity predicate bug");
            }
            true
        });
    let cache = DuoCacheBuilder::new(4).build(loader).unwrap();

    assert_eq!(cache.get("k").unwrap(), 0);
    // The cached `0` makes the predicate panic, so it is reloaded.
    assert_eq!(cache.get("k").unwrap(), 1);
    assert_eq!(cache.get("k").unwrap(), 1);
    assert_eq!(loads.load(Ordering::SeqCst), 2);

    // The cache is still consistent.
    cache.put_only("other", 7).unwrap();
    assert_eq!(cache.len(), 2);
}

#[test]
fn test_stamped_freshness() {
    use std::time::Duration;

    let loader = FnLoader::new(|key: &str| Ok(Some(Stamped::with_timestamp(key.to_string(), 0))))
        .with_validity(|v: &Stamped<String>| !v.is_older_than(Duration::from_secs(60)));
    let cache = DuoCacheBuilder::new(4).build(loader).unwrap();

    cache.put_only("fresh", Stamped::new("fresh".to_string())).unwrap();
    assert_eq!(cache.get("fresh").unwrap().value(), "fresh");
    assert_eq!(cache.stats().loads, 0);

    // Values stamped at the epoch are always stale and reloaded on every get.
    cache.get("old").unwrap();
    cache.get("old").unwrap();
    assert_eq!(cache.stats().loads, 2);
}
