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

//! Extends the driver with the lending operations.

use crate::db;
use crate::driver::books::lookup_book;
use crate::driver::patrons::lookup_patron;
use crate::driver::{Driver, timed};
use crate::model::{BookId, BorrowingRecord, PatronId};
use iii_iv_core::driver::{DriverError, DriverResult};

impl Driver {
    /// Lends the book `book_id` to the patron `patron_id` starting today.
    pub(crate) async fn borrow(
        self,
        book_id: BookId,
        patron_id: PatronId,
    ) -> DriverResult<BorrowingRecord> {
        let args = format!("book_id={}, patron_id={}", book_id, patron_id);
        timed("borrow", args, async move {
            let mut tx = self.db.begin().await?;

            lookup_book(tx.ex(), book_id).await?;
            lookup_patron(tx.ex(), patron_id).await?;

            let open = db::get_open_records(tx.ex(), book_id, patron_id).await?;
            if !open.is_empty() {
                return Err(DriverError::AlreadyExists(format!(
                    "Book {} is already borrowed by patron {}",
                    book_id, patron_id
                )));
            }

            let record =
                db::create_record(tx.ex(), book_id, patron_id, self.clock.today()).await?;
            tx.commit().await?;
            Ok(record)
        })
        .await
    }

    /// Marks the book `book_id` lent to the patron `patron_id` as returned today.
    pub(crate) async fn return_book(
        self,
        book_id: BookId,
        patron_id: PatronId,
    ) -> DriverResult<BorrowingRecord> {
        let args = format!("book_id={}, patron_id={}", book_id, patron_id);
        timed("return_book", args, async move {
            let mut tx = self.db.begin().await?;

            let mut open = db::get_open_records(tx.ex(), book_id, patron_id).await?;
            if open.len() > 1 {
                return Err(DriverError::BackendError(format!(
                    "Found {} open borrowing records for book id {} and patron id {}",
                    open.len(),
                    book_id,
                    patron_id
                )));
            }
            let record = match open.pop() {
                Some(record) => record,
                None => {
                    return Err(DriverError::NotFound(format!(
                        "Borrowing record not found for book id {} and patron id {}",
                        book_id, patron_id
                    )));
                }
            };

            let today = self.clock.today();
            let record = record.close(today)?;
            let record = db::close_record(tx.ex(), *record.id(), today).await?;
            tx.commit().await?;
            Ok(record)
        })
        .await
    }

    /// Gets all borrowing records, open or closed.
    pub(crate) async fn get_records(self) -> DriverResult<Vec<BorrowingRecord>> {
        Ok(db::get_records(&mut self.db.ex().await?).await?)
    }

    /// Gets all borrowing records of the patron `patron_id`.
    pub(crate) async fn get_patron_records(
        self,
        patron_id: PatronId,
    ) -> DriverResult<Vec<BorrowingRecord>> {
        let mut tx = self.db.begin().await?;
        lookup_patron(tx.ex(), patron_id).await?;
        let records = db::get_records_by_patron(tx.ex(), patron_id).await?;
        tx.commit().await?;
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::testutils::*;
    use iii_iv_core::clocks::testutils::utc_datetime;
    use iii_iv_core::db::sqlite::testutils::TempDbFile;
    use std::time::Duration;
    use time::macros::date;

    #[tokio::test]
    async fn test_borrow_ok() {
        let context = TestContext::setup().await;
        let book = context.create_book("Dune").await;
        let patron = context.create_patron("jane").await;

        let record = context.driver().borrow(*book.id(), *patron.id()).await.unwrap();
        assert_eq!(book.id(), record.book_id());
        assert_eq!(patron.id(), record.patron_id());
        assert_eq!(date!(2024 - 03 - 05), *record.borrow_date());
        assert!(record.is_open());

        assert_eq!(vec![record], context.driver().get_records().await.unwrap());
    }

    #[tokio::test]
    async fn test_borrow_book_not_found() {
        let context = TestContext::setup().await;
        let patron = context.create_patron("jane").await;

        assert_eq!(
            DriverError::NotFound("Book not found with id 5".to_owned()),
            context.driver().borrow(BookId::new(5), *patron.id()).await.unwrap_err()
        );
        assert!(context.driver().get_records().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_borrow_patron_not_found() {
        let context = TestContext::setup().await;
        let book = context.create_book("Dune").await;

        assert_eq!(
            DriverError::NotFound("Patron not found with id 8".to_owned()),
            context.driver().borrow(*book.id(), PatronId::new(8)).await.unwrap_err()
        );
        assert!(context.driver().get_records().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_borrow_twice_conflicts_until_returned() {
        let context = TestContext::setup().await;
        let book = context.create_book("Dune").await;
        let patron = context.create_patron("jane").await;

        let first = context.driver().borrow(*book.id(), *patron.id()).await.unwrap();
        match context.driver().borrow(*book.id(), *patron.id()).await {
            Err(DriverError::AlreadyExists(e)) => assert!(e.contains("already borrowed")),
            e => panic!("{:?}", e),
        }
        assert_eq!(vec![first.clone()], context.driver().get_records().await.unwrap());

        let returned = context.driver().return_book(*book.id(), *patron.id()).await.unwrap();
        let second = context.driver().borrow(*book.id(), *patron.id()).await.unwrap();
        assert_ne!(first.id(), second.id());
        assert_eq!(vec![returned, second], context.driver().get_records().await.unwrap());
    }

    #[tokio::test]
    async fn test_same_book_different_patrons() {
        let context = TestContext::setup().await;
        let book = context.create_book("Dune").await;
        let jane = context.create_patron("jane").await;
        let john = context.create_patron("john").await;

        context.driver().borrow(*book.id(), *jane.id()).await.unwrap();
        context.driver().borrow(*book.id(), *john.id()).await.unwrap();
        assert_eq!(2, context.driver().get_records().await.unwrap().len());
    }

    #[tokio::test]
    async fn test_return_ok() {
        let context = TestContext::setup().await;
        let book = context.create_book("Dune").await;
        let patron = context.create_patron("jane").await;

        let borrowed = context.driver().borrow(*book.id(), *patron.id()).await.unwrap();

        context.clock().advance(Duration::from_secs(14 * 24 * 60 * 60));
        let returned = context.driver().return_book(*book.id(), *patron.id()).await.unwrap();
        assert_eq!(borrowed.id(), returned.id());
        assert_eq!(borrowed.borrow_date(), returned.borrow_date());
        assert_eq!(Some(date!(2024 - 03 - 19)), *returned.return_date());

        assert_eq!(vec![returned], context.driver().get_records().await.unwrap());
    }

    #[tokio::test]
    async fn test_return_without_open_record() {
        let context = TestContext::setup().await;
        let book = context.create_book("Dune").await;
        let patron = context.create_patron("jane").await;

        let exp_err = DriverError::NotFound(format!(
            "Borrowing record not found for book id {} and patron id {}",
            book.id(),
            patron.id()
        ));
        assert_eq!(
            exp_err,
            context.driver().return_book(*book.id(), *patron.id()).await.unwrap_err()
        );

        context.driver().borrow(*book.id(), *patron.id()).await.unwrap();
        context.driver().return_book(*book.id(), *patron.id()).await.unwrap();
        assert_eq!(
            exp_err,
            context.driver().return_book(*book.id(), *patron.id()).await.unwrap_err()
        );
    }

    #[tokio::test]
    async fn test_return_same_day() {
        let context = TestContext::setup().await;
        let book = context.create_book("Dune").await;
        let patron = context.create_patron("jane").await;

        context.clock().set(utc_datetime(2024, 6, 1, 23, 59, 59));
        context.driver().borrow(*book.id(), *patron.id()).await.unwrap();
        let returned = context.driver().return_book(*book.id(), *patron.id()).await.unwrap();
        assert_eq!(date!(2024 - 06 - 01), *returned.borrow_date());
        assert_eq!(Some(date!(2024 - 06 - 01)), *returned.return_date());
    }

    #[tokio::test]
    async fn test_get_patron_records() {
        let context = TestContext::setup().await;
        let book1 = context.create_book("Dune").await;
        let book2 = context.create_book("Emma").await;
        let jane = context.create_patron("jane").await;
        let john = context.create_patron("john").await;

        let r1 = context.driver().borrow(*book1.id(), *jane.id()).await.unwrap();
        context.driver().borrow(*book1.id(), *john.id()).await.unwrap();
        let r3 = context.driver().borrow(*book2.id(), *jane.id()).await.unwrap();
        let r1 = context.driver().return_book(*r1.book_id(), *r1.patron_id()).await.unwrap();

        assert_eq!(vec![r1, r3], context.driver().get_patron_records(*jane.id()).await.unwrap());
    }

    #[tokio::test]
    async fn test_get_patron_records_not_found() {
        let context = TestContext::setup().await;

        assert_eq!(
            DriverError::NotFound("Patron not found with id 4".to_owned()),
            context.driver().get_patron_records(PatronId::new(4)).await.unwrap_err()
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_borrow_concurrently_independent_pairs() {
        let file = TempDbFile::new("borrow_independent");
        let context = TestContext::setup_on_file(&file).await;
        let patron = context.create_patron("jane").await;
        let mut books = vec![];
        for i in 0..8 {
            books.push(context.create_book(&format!("Volume {}", i)).await);
        }

        let mut handles = vec![];
        for book in &books {
            let driver = context.driver();
            let (book_id, patron_id) = (*book.id(), *patron.id());
            handles.push(tokio::spawn(async move { driver.borrow(book_id, patron_id).await }));
        }
        for handle in handles {
            assert!(handle.await.unwrap().unwrap().is_open());
        }

        let records = context.driver().get_patron_records(*patron.id()).await.unwrap();
        assert_eq!(8, records.len());
        context.close().await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_borrow_concurrently_same_pair() {
        let file = TempDbFile::new("borrow_same_pair");
        let context = TestContext::setup_on_file(&file).await;
        let book = context.create_book("Dune").await;
        let patron = context.create_patron("jane").await;

        let mut handles = vec![];
        for _ in 0..8 {
            let driver = context.driver();
            let (book_id, patron_id) = (*book.id(), *patron.id());
            handles.push(tokio::spawn(async move { driver.borrow(book_id, patron_id).await }));
        }
        let mut borrowed = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => borrowed += 1,
                Err(DriverError::AlreadyExists(message)) => {
                    assert!(message.contains("is already borrowed"))
                }
                Err(e) => panic!("Unexpected error: {:?}", e),
            }
        }
        assert_eq!(1, borrowed);

        assert_eq!(1, context.driver().get_records().await.unwrap().len());
        context.close().await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_return_concurrently_same_pair() {
        let file = TempDbFile::new("return_same_pair");
        let context = TestContext::setup_on_file(&file).await;
        let book = context.create_book("Dune").await;
        let patron = context.create_patron("jane").await;
        context.driver().borrow(*book.id(), *patron.id()).await.unwrap();

        let mut handles = vec![];
        for _ in 0..4 {
            let driver = context.driver();
            let (book_id, patron_id) = (*book.id(), *patron.id());
            handles.push(tokio::spawn(async move { driver.return_book(book_id, patron_id).await }));
        }
        let mut returned = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => returned += 1,
                Err(DriverError::NotFound(_)) => (),
                Err(e) => panic!("Unexpected error: {:?}", e),
            }
        }
        assert_eq!(1, returned);
        context.close().await;
    }
}
