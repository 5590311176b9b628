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

//! Test utilities for the business logic.

use crate::db;
use crate::driver::{Driver, DriverOptions};
use crate::model::{Book, BookDetails, Patron, PatronDetails};
use iii_iv_core::clocks::testutils::{SettableClock, utc_datetime};
use iii_iv_core::db::sqlite::{self, testutils::TempDbFile};
use iii_iv_core::db::{Db, Executor};
use std::sync::Arc;

/// State of a running test.
pub(crate) struct TestContext {
    /// The database backing the driver.
    db: Arc<dyn Db + Send + Sync>,

    /// The clock used by the driver.
    clock: Arc<SettableClock>,

    /// The driver under test.
    driver: Driver,
}

impl TestContext {
    /// Initializes a driver with an in-memory database and a clock pinned at a known instant.
    pub(crate) async fn setup() -> Self {
        Self::setup_with_opts(DriverOptions::default()).await
    }

    /// Same as `setup` but allows customizing the driver options.
    pub(crate) async fn setup_with_opts(opts: DriverOptions) -> Self {
        Self::setup_with_db(Arc::new(sqlite::testutils::setup().await), opts).await
    }

    /// Same as `setup` but stores the database in `file` and accesses it through multiple
    /// connections, so that operations can truly run concurrently.
    pub(crate) async fn setup_on_file(file: &TempDbFile) -> Self {
        let db = sqlite::testutils::setup_file(file).await;
        Self::setup_with_db(Arc::new(db), DriverOptions::default()).await
    }

    /// Initializes the schema in `db` and builds a driver on top of it.
    async fn setup_with_db(db: Arc<dyn Db + Send + Sync>, opts: DriverOptions) -> Self {
        db::init_schema(&mut db.ex().await.unwrap()).await.unwrap();
        let clock = Arc::from(SettableClock::new(utc_datetime(2024, 3, 5, 10, 30, 0)));
        let driver = Driver::new(db.clone(), clock.clone(), opts);
        Self { db, clock, driver }
    }

    /// Gets a copy of the driver.
    pub(crate) fn driver(&self) -> Driver {
        self.driver.clone()
    }

    /// Gets the clock used by the driver.
    pub(crate) fn clock(&self) -> &SettableClock {
        &self.clock
    }

    /// Closes the database connection.
    pub(crate) async fn close(self) {
        self.db.close().await;
    }

    /// Gets a direct executor against the database, bypassing the driver and its caches.
    pub(crate) async fn ex(&self) -> Executor {
        self.db.ex().await.unwrap()
    }

    /// Syntactic sugar to create a book behind the driver's back.
    pub(crate) async fn create_book(&self, title: &str) -> Book {
        let details = BookDetails::new(title, "Some author", 1990, "978-0").unwrap();
        db::create_book(&mut self.ex().await, details).await.unwrap()
    }

    /// Syntactic sugar to create a patron behind the driver's back.
    pub(crate) async fn create_patron(&self, name: &str) -> Patron {
        let details = PatronDetails::new(name, format!("{}@example.com", name)).unwrap();
        db::create_patron(&mut self.ex().await, details).await.unwrap()
    }
}
