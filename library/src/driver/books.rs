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

//! Extends the driver with the catalog operations.

use crate::db;
use crate::driver::cache::Cached;
use crate::driver::{Driver, timed};
use crate::model::{Book, BookDetails, BookId};
use iii_iv_core::db::{DbError, DbResult, Executor};
use iii_iv_core::driver::{DriverError, DriverResult};

/// Converts the result of a database operation on the book `id` into a driver result, giving
/// a meaningful message to missing books.
pub(super) fn or_book_not_found<T>(result: DbResult<T>, id: BookId) -> DriverResult<T> {
    match result {
        Err(DbError::NotFound) => Err(DriverError::NotFound(format!("Book not found with id {}", id))),
        result => Ok(result?),
    }
}

/// Loads the book `id` from the database.
pub(super) async fn lookup_book(ex: &mut Executor, id: BookId) -> DriverResult<Book> {
    or_book_not_found(db::get_book(ex, id).await, id)
}

impl Driver {
    /// Gets all books in the catalog.
    pub(crate) async fn get_books(self) -> DriverResult<Vec<Book>> {
        let generation = match self.books_cache.get_all().await {
            Cached::Hit(books) => return Ok(books),
            Cached::Miss(generation) => generation,
        };

        let books = db::get_books(&mut self.db.ex().await?).await?;
        self.books_cache.put_all(generation, books.clone()).await;
        Ok(books)
    }

    /// Gets the book identified by `id`.
    pub(crate) async fn get_book(self, id: BookId) -> DriverResult<Book> {
        let generation = match self.books_cache.get(&id).await {
            Cached::Hit(book) => return Ok(book),
            Cached::Miss(generation) => generation,
        };

        let book = lookup_book(&mut self.db.ex().await?, id).await?;
        self.books_cache.put(generation, id, book.clone()).await;
        Ok(book)
    }

    /// Adds a new book to the catalog.
    pub(crate) async fn create_book(self, details: BookDetails) -> DriverResult<Book> {
        timed("create_book", format!("{:?}", details), async move {
            let mut tx = self.db.begin().await?;
            let book = db::create_book(tx.ex(), details).await?;
            tx.commit().await?;

            self.books_cache.invalidate().await;
            Ok(book)
        })
        .await
    }

    /// Replaces all details of the book identified by `id`.
    pub(crate) async fn update_book(self, id: BookId, details: BookDetails) -> DriverResult<Book> {
        timed("update_book", format!("id={}, {:?}", id, details), async move {
            let mut tx = self.db.begin().await?;
            let book = or_book_not_found(db::update_book(tx.ex(), id, details).await, id)?;
            tx.commit().await?;

            self.books_cache.invalidate().await;
            Ok(book)
        })
        .await
    }

    /// Removes the book identified by `id` from the catalog.
    ///
    /// Books that appear in any borrowing record cannot be deleted.
    pub(crate) async fn delete_book(self, id: BookId) -> DriverResult<()> {
        let mut tx = self.db.begin().await?;
        lookup_book(tx.ex(), id).await?;
        let records = db::count_records_for_book(tx.ex(), id).await?;
        if records > 0 {
            return Err(DriverError::Conflict(format!(
                "Book {} cannot be deleted because it has {} borrowing records",
                id, records
            )));
        }
        or_book_not_found(db::delete_book(tx.ex(), id).await, id)?;
        tx.commit().await?;

        self.books_cache.invalidate().await;
        Ok(())
    }
}
