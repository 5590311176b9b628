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

//! Business logic for the library record keeper.

use crate::driver::cache::EntityCache;
use crate::model::{Book, BookId, Patron, PatronId};
use iii_iv_core::clocks::Clock;
use iii_iv_core::db::Db;
use iii_iv_core::driver::DriverResult;
use iii_iv_core::env::get_optional_var;
use log::{error, info};
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

mod books;
mod borrowing;
mod cache;
mod patrons;
#[cfg(test)]
pub(crate) mod testutils;

/// Default amount of time to keep cached entities in memory.
const DEFAULT_CACHE_TTL_SECONDS: u64 = 60 * 60;

/// Default number of individual entities of each type to keep cached in memory.
const DEFAULT_CACHE_CAPACITY: usize = 1024;

/// Configuration options for the driver.
#[derive(Clone, Debug)]
#[cfg_attr(test, derive(PartialEq))]
pub struct DriverOptions {
    /// The amount of time to keep cached entities in memory.
    pub cache_ttl: Duration,

    /// The number of individual entities of each type to keep cached in memory.
    pub cache_capacity: usize,
}

impl Default for DriverOptions {
    fn default() -> Self {
        Self {
            cache_ttl: Duration::from_secs(DEFAULT_CACHE_TTL_SECONDS),
            cache_capacity: DEFAULT_CACHE_CAPACITY,
        }
    }
}

impl DriverOptions {
    /// Creates a new set of options from environment variables whose name is prefixed with the
    /// given `prefix`.
    pub fn from_env(prefix: &str) -> Result<Self, String> {
        Ok(Self {
            cache_ttl: get_optional_var::<Duration>(prefix, "CACHE_TTL")?
                .unwrap_or_else(|| Duration::from_secs(DEFAULT_CACHE_TTL_SECONDS)),
            cache_capacity: get_optional_var::<usize>(prefix, "CACHE_CAPACITY")?
                .unwrap_or(DEFAULT_CACHE_CAPACITY),
        })
    }
}

/// Business logic.
///
/// The public operations exposed by the driver are all "one shot": they start and commit a
/// transaction, so it's incorrect for the caller to use two separate calls.  For this reason,
/// these operations consume the driver in an attempt to minimize the possibility of executing
/// two operations.
#[derive(Clone)]
pub struct Driver {
    /// The database that the driver uses for persistence.
    db: Arc<dyn Db + Send + Sync>,

    /// Clock instance to obtain the current date for borrowing records.
    clock: Arc<dyn Clock + Send + Sync>,

    /// Cache of books.
    books_cache: Arc<EntityCache<BookId, Book>>,

    /// Cache of patrons.
    patrons_cache: Arc<EntityCache<PatronId, Patron>>,
}

impl Driver {
    /// Creates a new driver backed by the given injected components.
    pub fn new(
        db: Arc<dyn Db + Send + Sync>,
        clock: Arc<dyn Clock + Send + Sync>,
        opts: DriverOptions,
    ) -> Self {
        let books_cache = Arc::from(EntityCache::new(opts.cache_ttl, opts.cache_capacity));
        let patrons_cache = Arc::from(EntityCache::new(opts.cache_ttl, opts.cache_capacity));
        Self { db, clock, books_cache, patrons_cache }
    }
}

/// Runs the operation `f` named `name` and logs its arguments `args`, its result and how long
/// it took.
async fn timed<T, F>(name: &str, args: String, f: F) -> DriverResult<T>
where
    T: fmt::Debug,
    F: Future<Output = DriverResult<T>>,
{
    info!("{}({}) started", name, args);
    let start = Instant::now();
    let result = f.await;
    let elapsed_ms = start.elapsed().as_millis();
    match &result {
        Ok(value) => info!("{}({}) returned {:?} in {}ms", name, args, value, elapsed_ms),
        Err(e) => error!("{}({}) failed in {}ms: {}", name, args, elapsed_ms, e),
    }
    result
}
