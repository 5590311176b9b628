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

//! Test utilities for the REST API.

use crate::db;
use crate::driver::testutils::TestContext as DriverTestContext;
use crate::model::{AdminCredentials, Book, BookId, BorrowingRecord, Patron, PatronId};
use crate::rest::app;
use axum::Router;
use axum::http::Method;
use iii_iv_core::db::DbError;
use iii_iv_core::rest::testutils::OneShotBuilder;
use std::fmt;
use time::Date;

/// Username of the administrator account in tests.
pub(crate) const ADMIN_USERNAME: &str = "librarian";

/// Password of the administrator account in tests.
pub(crate) const ADMIN_PASSWORD: &str = "open sesame";

/// Lowest cost accepted by bcrypt, to keep tests fast.
const TEST_BCRYPT_COST: u32 = 4;

/// State of a running test.
pub(crate) struct TestContext {
    /// Access to the backing database and clock.
    inner: DriverTestContext,

    /// The router under test.
    app: Router,
}

impl TestContext {
    /// Sets up the app with an in-memory database and a fixed clock.
    pub(crate) async fn setup() -> Self {
        let inner = DriverTestContext::setup().await;
        let admin = AdminCredentials::new(ADMIN_USERNAME, ADMIN_PASSWORD, TEST_BCRYPT_COST).unwrap();
        let app = app(inner.driver(), admin);
        Self { inner, app }
    }

    /// Gets a clone of the app router.
    pub(crate) fn app(&self) -> Router {
        self.app.clone()
    }

    /// Consumes the context and transforms it into the app router.
    pub(crate) fn into_app(self) -> Router {
        self.app
    }

    /// Starts a request against `route` that carries the administrator's credentials.
    pub(crate) fn request<U: AsRef<str>>(&self, route: (Method, U)) -> OneShotBuilder {
        OneShotBuilder::new(self.app(), route).with_basic_auth(ADMIN_USERNAME, ADMIN_PASSWORD)
    }

    /// Creates a book by directly modifying the backing database.
    pub(crate) async fn create_book(&self, title: &str) -> Book {
        self.inner.create_book(title).await
    }

    /// Creates a patron by directly modifying the backing database.
    pub(crate) async fn create_patron(&self, name: &str) -> Patron {
        self.inner.create_patron(name).await
    }

    /// Opens a loan by directly modifying the backing database.
    pub(crate) async fn create_record(
        &self,
        book_id: BookId,
        patron_id: PatronId,
        borrow_date: Date,
    ) -> BorrowingRecord {
        db::create_record(&mut self.inner.ex().await, book_id, patron_id, borrow_date)
            .await
            .unwrap()
    }

    /// Fetches a book by directly querying the backing database.
    pub(crate) async fn get_book(&self, id: BookId) -> Option<Book> {
        some_or_none(db::get_book(&mut self.inner.ex().await, id).await)
    }

    /// Fetches a patron by directly querying the backing database.
    pub(crate) async fn get_patron(&self, id: PatronId) -> Option<Patron> {
        some_or_none(db::get_patron(&mut self.inner.ex().await, id).await)
    }

    /// Fetches all borrowing records by directly querying the backing database.
    pub(crate) async fn get_records(&self) -> Vec<BorrowingRecord> {
        db::get_records(&mut self.inner.ex().await).await.unwrap()
    }
}

/// Converts a lookup result into an optional value, panicking on unexpected errors.
fn some_or_none<T: fmt::Debug>(result: Result<T, DbError>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(DbError::NotFound) => None,
        Err(e) => panic!("{:?}", e),
    }
}
