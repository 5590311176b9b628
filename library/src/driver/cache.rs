// III-IV
// Copyright 2023 Julio Merino
//
// Licensed under the Apache License, Version 2.0 (the "License"); you may not
// use this file except in compliance with the License.  You may obtain a copy
// of the License at:
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS, WITHOUT
// WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.  See the
// License for the specific language governing permissions and limitations
// under the License.

//! In-memory read-through cache for a single entity type.
//!
//! The cache holds two kinds of entries: the full collection of entities, and individual entities
//! keyed by their identifier.  Any write to the entity type invalidates both.
//!
//! Lookups that miss hand out the generation the cache was in at the time.  Readers then load the
//! data from the database and store it back with that generation, and the cache drops the value
//! if an invalidation happened in between.  This keeps a read that raced with a write from
//! resurrecting data that the write already replaced.

use futures::lock::Mutex;
use log::warn;
use lru_time_cache::LruCache;
use std::time::Duration;

/// Opaque marker of the state of the cache at the time of a lookup.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Generation(u64);

/// Result of a cache lookup.
#[derive(Debug, PartialEq)]
pub(crate) enum Cached<V> {
    /// The value was present in the cache.
    Hit(V),

    /// The value was not present.  Storing a value later on requires the given generation.
    Miss(Generation),
}

/// Mutable state of the cache, protected by the mutex in `EntityCache`.
struct Inner<K, V> {
    /// Entry for the full collection of entities.  The key is meaningless.
    all: LruCache<(), Vec<V>>,

    /// Entries for individual entities.
    by_id: LruCache<K, V>,

    /// Counter bumped on every invalidation.
    generation: u64,
}

/// Read-through cache of entities of type `V` keyed by identifiers of type `K`.
pub(crate) struct EntityCache<K, V> {
    /// How long entries stay valid after insertion.
    ttl: Duration,

    /// Maximum number of individual entities to keep.
    capacity: usize,

    /// Cache contents.
    inner: Mutex<Inner<K, V>>,
}

impl<K, V> EntityCache<K, V>
where
    K: Clone + Ord,
    V: Clone,
{
    /// Creates a new empty cache whose entries expire after `ttl` and that holds at most
    /// `capacity` individual entities.
    pub(crate) fn new(ttl: Duration, capacity: usize) -> Self {
        let inner = Inner {
            all: LruCache::with_expiry_duration_and_capacity(ttl, 1),
            by_id: LruCache::with_expiry_duration_and_capacity(ttl, capacity),
            generation: 0,
        };
        Self { ttl, capacity, inner: Mutex::new(inner) }
    }

    /// Looks up the full collection of entities.
    pub(crate) async fn get_all(&self) -> Cached<Vec<V>> {
        let mut inner = self.inner.lock().await;
        let generation = Generation(inner.generation);
        match inner.all.get(&()) {
            Some(values) => Cached::Hit(values.clone()),
            None => Cached::Miss(generation),
        }
    }

    /// Stores the full collection of entities `values` loaded under `generation`.
    pub(crate) async fn put_all(&self, generation: Generation, values: Vec<V>) {
        let mut inner = self.inner.lock().await;
        if generation.0 != inner.generation {
            warn!("Not caching collection loaded during a concurrent write");
            return;
        }
        inner.all.insert((), values);
    }

    /// Looks up the entity identified by `key`.
    pub(crate) async fn get(&self, key: &K) -> Cached<V> {
        let mut inner = self.inner.lock().await;
        let generation = Generation(inner.generation);
        match inner.by_id.get(key) {
            Some(value) => Cached::Hit(value.clone()),
            None => Cached::Miss(generation),
        }
    }

    /// Stores the entity `value` identified by `key` loaded under `generation`.
    pub(crate) async fn put(&self, generation: Generation, key: K, value: V) {
        let mut inner = self.inner.lock().await;
        if generation.0 != inner.generation {
            warn!("Not caching entity loaded during a concurrent write");
            return;
        }
        inner.by_id.insert(key, value);
    }

    /// Drops all cached entries.
    pub(crate) async fn invalidate(&self) {
        let mut inner = self.inner.lock().await;
        inner.all = LruCache::with_expiry_duration_and_capacity(self.ttl, 1);
        inner.by_id = LruCache::with_expiry_duration_and_capacity(self.ttl, self.capacity);
        inner.generation += 1;
    }
}
