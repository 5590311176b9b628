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

//! Database abstraction to manipulate books, patrons and borrowing records.

use crate::model::{
    Book, BookDetails, BookId, BorrowingRecord, Patron, PatronDetails, PatronId, RecordId,
};
#[cfg(feature = "postgres")]
use iii_iv_core::db::postgres;
#[cfg(any(feature = "sqlite", test))]
use iii_iv_core::db::sqlite;
use iii_iv_core::db::{DbError, DbResult, Executor};
use sqlx::Row;
#[cfg(feature = "postgres")]
use sqlx::postgres::PgRow;
#[cfg(any(feature = "sqlite", test))]
use sqlx::sqlite::SqliteRow;
use time::Date;

#[cfg(test)]
mod tests;

/// Initializes the database schema.
pub async fn init_schema(ex: &mut Executor) -> DbResult<()> {
    match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => postgres::run_schema(ex, include_str!("postgres.sql")).await,

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => sqlite::run_schema(ex, include_str!("sqlite.sql")).await,

        #[allow(unused)]
        _ => unreachable!(),
    }
}

#[cfg(feature = "postgres")]
impl TryFrom<PgRow> for Book {
    type Error = DbError;

    fn try_from(row: PgRow) -> DbResult<Self> {
        let id: i64 = row.try_get("id").map_err(postgres::map_sqlx_error)?;
        let title: String = row.try_get("title").map_err(postgres::map_sqlx_error)?;
        let author: String = row.try_get("author").map_err(postgres::map_sqlx_error)?;
        let publication_year: i32 =
            row.try_get("publication_year").map_err(postgres::map_sqlx_error)?;
        let isbn: String = row.try_get("isbn").map_err(postgres::map_sqlx_error)?;

        let details = BookDetails::new(title, author, publication_year, isbn)?;
        Ok(Book::new(BookId::new(id), details))
    }
}

#[cfg(any(feature = "sqlite", test))]
impl TryFrom<SqliteRow> for Book {
    type Error = DbError;

    fn try_from(row: SqliteRow) -> DbResult<Self> {
        let id: i64 = row.try_get("id").map_err(sqlite::map_sqlx_error)?;
        let title: String = row.try_get("title").map_err(sqlite::map_sqlx_error)?;
        let author: String = row.try_get("author").map_err(sqlite::map_sqlx_error)?;
        let publication_year: i32 =
            row.try_get("publication_year").map_err(sqlite::map_sqlx_error)?;
        let isbn: String = row.try_get("isbn").map_err(sqlite::map_sqlx_error)?;

        let details = BookDetails::new(title, author, publication_year, isbn)?;
        Ok(Book::new(BookId::new(id), details))
    }
}

#[cfg(feature = "postgres")]
impl TryFrom<PgRow> for Patron {
    type Error = DbError;

    fn try_from(row: PgRow) -> DbResult<Self> {
        let id: i64 = row.try_get("id").map_err(postgres::map_sqlx_error)?;
        let name: String = row.try_get("name").map_err(postgres::map_sqlx_error)?;
        let contact_information: String =
            row.try_get("contact_information").map_err(postgres::map_sqlx_error)?;

        let details = PatronDetails::new(name, contact_information)?;
        Ok(Patron::new(PatronId::new(id), details))
    }
}

#[cfg(any(feature = "sqlite", test))]
impl TryFrom<SqliteRow> for Patron {
    type Error = DbError;

    fn try_from(row: SqliteRow) -> DbResult<Self> {
        let id: i64 = row.try_get("id").map_err(sqlite::map_sqlx_error)?;
        let name: String = row.try_get("name").map_err(sqlite::map_sqlx_error)?;
        let contact_information: String =
            row.try_get("contact_information").map_err(sqlite::map_sqlx_error)?;

        let details = PatronDetails::new(name, contact_information)?;
        Ok(Patron::new(PatronId::new(id), details))
    }
}

#[cfg(feature = "postgres")]
impl TryFrom<PgRow> for BorrowingRecord {
    type Error = DbError;

    fn try_from(row: PgRow) -> DbResult<Self> {
        let id: i64 = row.try_get("id").map_err(postgres::map_sqlx_error)?;
        let book_id: i64 = row.try_get("book_id").map_err(postgres::map_sqlx_error)?;
        let patron_id: i64 = row.try_get("patron_id").map_err(postgres::map_sqlx_error)?;
        let borrow_date: Date = row.try_get("borrow_date").map_err(postgres::map_sqlx_error)?;
        let return_date: Option<Date> =
            row.try_get("return_date").map_err(postgres::map_sqlx_error)?;

        Ok(BorrowingRecord::new(
            RecordId::new(id),
            BookId::new(book_id),
            PatronId::new(patron_id),
            borrow_date,
            return_date,
        )?)
    }
}

#[cfg(any(feature = "sqlite", test))]
impl TryFrom<SqliteRow> for BorrowingRecord {
    type Error = DbError;

    fn try_from(row: SqliteRow) -> DbResult<Self> {
        let id: i64 = row.try_get("id").map_err(sqlite::map_sqlx_error)?;
        let book_id: i64 = row.try_get("book_id").map_err(sqlite::map_sqlx_error)?;
        let patron_id: i64 = row.try_get("patron_id").map_err(sqlite::map_sqlx_error)?;
        let borrow_date: Date = row.try_get("borrow_date").map_err(sqlite::map_sqlx_error)?;
        let return_date: Option<Date> =
            row.try_get("return_date").map_err(sqlite::map_sqlx_error)?;

        Ok(BorrowingRecord::new(
            RecordId::new(id),
            BookId::new(book_id),
            PatronId::new(patron_id),
            borrow_date,
            return_date,
        )?)
    }
}

/// Converts a row count returned by the database into an unsigned quantity.
fn count_to_u64(count: i64) -> DbResult<u64> {
    u64::try_from(count)
        .map_err(|e| DbError::DataIntegrityError(format!("Invalid row count {}: {}", count, e)))
}

/// Fails with `NotFound` if a write that targeted a single row did not touch any.
fn ensure_one_row(rows_affected: u64) -> DbResult<()> {
    match rows_affected {
        0 => Err(DbError::NotFound),
        1 => Ok(()),
        n => Err(DbError::BackendError(format!("Write affected {} rows instead of 1", n))),
    }
}

/// Adds a new book with the given `details` to the catalog and returns it with its assigned
/// identifier.
pub(crate) async fn create_book(ex: &mut Executor, details: BookDetails) -> DbResult<Book> {
    let id: i64 = match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            let query_str = "
                INSERT INTO books (title, author, publication_year, isbn)
                VALUES ($1, $2, $3, $4)
                RETURNING id";
            let row = sqlx::query(query_str)
                .bind(details.title().as_str())
                .bind(details.author().as_str())
                .bind(*details.publication_year())
                .bind(details.isbn().as_str())
                .fetch_one(ex.conn())
                .await
                .map_err(postgres::map_sqlx_error)?;
            row.try_get("id").map_err(postgres::map_sqlx_error)?
        }

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => {
            let query_str = "
                INSERT INTO books (title, author, publication_year, isbn)
                VALUES (?, ?, ?, ?)
                RETURNING id";
            let row = sqlx::query(query_str)
                .bind(details.title().as_str())
                .bind(details.author().as_str())
                .bind(*details.publication_year())
                .bind(details.isbn().as_str())
                .fetch_one(ex.conn())
                .await
                .map_err(sqlite::map_sqlx_error)?;
            row.try_get("id").map_err(sqlite::map_sqlx_error)?
        }

        #[allow(unused)]
        _ => unreachable!(),
    };

    Ok(Book::new(BookId::new(id), details))
}

/// Gets the book identified by `id`.
pub(crate) async fn get_book(ex: &mut Executor, id: BookId) -> DbResult<Book> {
    match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            let query_str = "SELECT * FROM books WHERE id = $1";
            let row = sqlx::query(query_str)
                .bind(id.as_i64())
                .fetch_one(ex.conn())
                .await
                .map_err(postgres::map_sqlx_error)?;
            Book::try_from(row)
        }

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => {
            let query_str = "SELECT * FROM books WHERE id = ?";
            let row = sqlx::query(query_str)
                .bind(id.as_i64())
                .fetch_one(ex.conn())
                .await
                .map_err(sqlite::map_sqlx_error)?;
            Book::try_from(row)
        }

        #[allow(unused)]
        _ => unreachable!(),
    }
}

/// Gets all books in the catalog ordered by their identifier.
pub(crate) async fn get_books(ex: &mut Executor) -> DbResult<Vec<Book>> {
    let query_str = "SELECT * FROM books ORDER BY id";
    match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            let rows = sqlx::query(query_str)
                .fetch_all(ex.conn())
                .await
                .map_err(postgres::map_sqlx_error)?;
            rows.into_iter().map(Book::try_from).collect()
        }

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => {
            let rows =
                sqlx::query(query_str).fetch_all(ex.conn()).await.map_err(sqlite::map_sqlx_error)?;
            rows.into_iter().map(Book::try_from).collect()
        }

        #[allow(unused)]
        _ => unreachable!(),
    }
}

/// Overwrites all mutable properties of the book identified by `id` with `details`.
pub(crate) async fn update_book(
    ex: &mut Executor,
    id: BookId,
    details: BookDetails,
) -> DbResult<Book> {
    let rows_affected = match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            let query_str = "
                UPDATE books SET title = $1, author = $2, publication_year = $3, isbn = $4
                WHERE id = $5";
            let done = sqlx::query(query_str)
                .bind(details.title().as_str())
                .bind(details.author().as_str())
                .bind(*details.publication_year())
                .bind(details.isbn().as_str())
                .bind(id.as_i64())
                .execute(ex.conn())
                .await
                .map_err(postgres::map_sqlx_error)?;
            done.rows_affected()
        }

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => {
            let query_str = "
                UPDATE books SET title = ?, author = ?, publication_year = ?, isbn = ?
                WHERE id = ?";
            let done = sqlx::query(query_str)
                .bind(details.title().as_str())
                .bind(details.author().as_str())
                .bind(*details.publication_year())
                .bind(details.isbn().as_str())
                .bind(id.as_i64())
                .execute(ex.conn())
                .await
                .map_err(sqlite::map_sqlx_error)?;
            done.rows_affected()
        }

        #[allow(unused)]
        _ => unreachable!(),
    };

    ensure_one_row(rows_affected)?;
    Ok(Book::new(id, details))
}

/// Deletes the book identified by `id`.
pub(crate) async fn delete_book(ex: &mut Executor, id: BookId) -> DbResult<()> {
    let rows_affected = match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            let query_str = "DELETE FROM books WHERE id = $1";
            let done = sqlx::query(query_str)
                .bind(id.as_i64())
                .execute(ex.conn())
                .await
                .map_err(postgres::map_sqlx_error)?;
            done.rows_affected()
        }

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => {
            let query_str = "DELETE FROM books WHERE id = ?";
            let done = sqlx::query(query_str)
                .bind(id.as_i64())
                .execute(ex.conn())
                .await
                .map_err(sqlite::map_sqlx_error)?;
            done.rows_affected()
        }

        #[allow(unused)]
        _ => unreachable!(),
    };

    ensure_one_row(rows_affected)
}

/// Registers a new patron with the given `details` and returns it with its assigned identifier.
pub(crate) async fn create_patron(ex: &mut Executor, details: PatronDetails) -> DbResult<Patron> {
    let id: i64 = match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            let query_str =
                "INSERT INTO patrons (name, contact_information) VALUES ($1, $2) RETURNING id";
            let row = sqlx::query(query_str)
                .bind(details.name().as_str())
                .bind(details.contact_information().as_str())
                .fetch_one(ex.conn())
                .await
                .map_err(postgres::map_sqlx_error)?;
            row.try_get("id").map_err(postgres::map_sqlx_error)?
        }

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => {
            let query_str =
                "INSERT INTO patrons (name, contact_information) VALUES (?, ?) RETURNING id";
            let row = sqlx::query(query_str)
                .bind(details.name().as_str())
                .bind(details.contact_information().as_str())
                .fetch_one(ex.conn())
                .await
                .map_err(sqlite::map_sqlx_error)?;
            row.try_get("id").map_err(sqlite::map_sqlx_error)?
        }

        #[allow(unused)]
        _ => unreachable!(),
    };

    Ok(Patron::new(PatronId::new(id), details))
}

/// Gets the patron identified by `id`.
pub(crate) async fn get_patron(ex: &mut Executor, id: PatronId) -> DbResult<Patron> {
    match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            let query_str = "SELECT * FROM patrons WHERE id = $1";
            let row = sqlx::query(query_str)
                .bind(id.as_i64())
                .fetch_one(ex.conn())
                .await
                .map_err(postgres::map_sqlx_error)?;
            Patron::try_from(row)
        }

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => {
            let query_str = "SELECT * FROM patrons WHERE id = ?";
            let row = sqlx::query(query_str)
                .bind(id.as_i64())
                .fetch_one(ex.conn())
                .await
                .map_err(sqlite::map_sqlx_error)?;
            Patron::try_from(row)
        }

        #[allow(unused)]
        _ => unreachable!(),
    }
}

/// Gets all patrons ordered by their identifier.
pub(crate) async fn get_patrons(ex: &mut Executor) -> DbResult<Vec<Patron>> {
    let query_str = "SELECT * FROM patrons ORDER BY id";
    match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            let rows = sqlx::query(query_str)
                .fetch_all(ex.conn())
                .await
                .map_err(postgres::map_sqlx_error)?;
            rows.into_iter().map(Patron::try_from).collect()
        }

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => {
            let rows =
                sqlx::query(query_str).fetch_all(ex.conn()).await.map_err(sqlite::map_sqlx_error)?;
            rows.into_iter().map(Patron::try_from).collect()
        }

        #[allow(unused)]
        _ => unreachable!(),
    }
}

/// Overwrites all mutable properties of the patron identified by `id` with `details`.
pub(crate) async fn update_patron(
    ex: &mut Executor,
    id: PatronId,
    details: PatronDetails,
) -> DbResult<Patron> {
    let rows_affected = match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            let query_str = "UPDATE patrons SET name = $1, contact_information = $2 WHERE id = $3";
            let done = sqlx::query(query_str)
                .bind(details.name().as_str())
                .bind(details.contact_information().as_str())
                .bind(id.as_i64())
                .execute(ex.conn())
                .await
                .map_err(postgres::map_sqlx_error)?;
            done.rows_affected()
        }

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => {
            let query_str = "UPDATE patrons SET name = ?, contact_information = ? WHERE id = ?";
            let done = sqlx::query(query_str)
                .bind(details.name().as_str())
                .bind(details.contact_information().as_str())
                .bind(id.as_i64())
                .execute(ex.conn())
                .await
                .map_err(sqlite::map_sqlx_error)?;
            done.rows_affected()
        }

        #[allow(unused)]
        _ => unreachable!(),
    };

    ensure_one_row(rows_affected)?;
    Ok(Patron::new(id, details))
}

/// Deletes the patron identified by `id`.
pub(crate) async fn delete_patron(ex: &mut Executor, id: PatronId) -> DbResult<()> {
    let rows_affected = match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            let query_str = "DELETE FROM patrons WHERE id = $1";
            let done = sqlx::query(query_str)
                .bind(id.as_i64())
                .execute(ex.conn())
                .await
                .map_err(postgres::map_sqlx_error)?;
            done.rows_affected()
        }

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => {
            let query_str = "DELETE FROM patrons WHERE id = ?";
            let done = sqlx::query(query_str)
                .bind(id.as_i64())
                .execute(ex.conn())
                .await
                .map_err(sqlite::map_sqlx_error)?;
            done.rows_affected()
        }

        #[allow(unused)]
        _ => unreachable!(),
    };

    ensure_one_row(rows_affected)
}

/// Opens a new borrowing record for `book_id` and `patron_id` starting on `borrow_date`.
///
/// Fails with `AlreadyExists` if the pair already has an open record and with `NotFound` if
/// either the book or the patron do not exist.
pub(crate) async fn create_record(
    ex: &mut Executor,
    book_id: BookId,
    patron_id: PatronId,
    borrow_date: Date,
) -> DbResult<BorrowingRecord> {
    let id: i64 = match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            let query_str = "
                INSERT INTO borrowing_records (book_id, patron_id, borrow_date)
                VALUES ($1, $2, $3)
                RETURNING id";
            let row = sqlx::query(query_str)
                .bind(book_id.as_i64())
                .bind(patron_id.as_i64())
                .bind(borrow_date)
                .fetch_one(ex.conn())
                .await
                .map_err(postgres::map_sqlx_error)?;
            row.try_get("id").map_err(postgres::map_sqlx_error)?
        }

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => {
            let query_str = "
                INSERT INTO borrowing_records (book_id, patron_id, borrow_date)
                VALUES (?, ?, ?)
                RETURNING id";
            let row = sqlx::query(query_str)
                .bind(book_id.as_i64())
                .bind(patron_id.as_i64())
                .bind(borrow_date)
                .fetch_one(ex.conn())
                .await
                .map_err(sqlite::map_sqlx_error)?;
            row.try_get("id").map_err(sqlite::map_sqlx_error)?
        }

        #[allow(unused)]
        _ => unreachable!(),
    };

    Ok(BorrowingRecord::new(RecordId::new(id), book_id, patron_id, borrow_date, None)?)
}

/// Gets all borrowing records ordered by their identifier.
pub(crate) async fn get_records(ex: &mut Executor) -> DbResult<Vec<BorrowingRecord>> {
    let query_str = "SELECT * FROM borrowing_records ORDER BY id";
    match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            let rows = sqlx::query(query_str)
                .fetch_all(ex.conn())
                .await
                .map_err(postgres::map_sqlx_error)?;
            rows.into_iter().map(BorrowingRecord::try_from).collect()
        }

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => {
            let rows =
                sqlx::query(query_str).fetch_all(ex.conn()).await.map_err(sqlite::map_sqlx_error)?;
            rows.into_iter().map(BorrowingRecord::try_from).collect()
        }

        #[allow(unused)]
        _ => unreachable!(),
    }
}

/// Gets all borrowing records of `patron_id`, open or closed, ordered by their identifier.
pub(crate) async fn get_records_by_patron(
    ex: &mut Executor,
    patron_id: PatronId,
) -> DbResult<Vec<BorrowingRecord>> {
    match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            let query_str = "SELECT * FROM borrowing_records WHERE patron_id = $1 ORDER BY id";
            let rows = sqlx::query(query_str)
                .bind(patron_id.as_i64())
                .fetch_all(ex.conn())
                .await
                .map_err(postgres::map_sqlx_error)?;
            rows.into_iter().map(BorrowingRecord::try_from).collect()
        }

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => {
            let query_str = "SELECT * FROM borrowing_records WHERE patron_id = ? ORDER BY id";
            let rows = sqlx::query(query_str)
                .bind(patron_id.as_i64())
                .fetch_all(ex.conn())
                .await
                .map_err(sqlite::map_sqlx_error)?;
            rows.into_iter().map(BorrowingRecord::try_from).collect()
        }

        #[allow(unused)]
        _ => unreachable!(),
    }
}

/// Gets the open borrowing records for the `book_id` and `patron_id` pair.
///
/// The schema guarantees that there is at most one, but this returns all matches so that the
/// caller can detect inconsistent data.
pub(crate) async fn get_open_records(
    ex: &mut Executor,
    book_id: BookId,
    patron_id: PatronId,
) -> DbResult<Vec<BorrowingRecord>> {
    match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            let query_str = "
                SELECT * FROM borrowing_records
                WHERE book_id = $1 AND patron_id = $2 AND return_date IS NULL
                ORDER BY id";
            let rows = sqlx::query(query_str)
                .bind(book_id.as_i64())
                .bind(patron_id.as_i64())
                .fetch_all(ex.conn())
                .await
                .map_err(postgres::map_sqlx_error)?;
            rows.into_iter().map(BorrowingRecord::try_from).collect()
        }

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => {
            let query_str = "
                SELECT * FROM borrowing_records
                WHERE book_id = ? AND patron_id = ? AND return_date IS NULL
                ORDER BY id";
            let rows = sqlx::query(query_str)
                .bind(book_id.as_i64())
                .bind(patron_id.as_i64())
                .fetch_all(ex.conn())
                .await
                .map_err(sqlite::map_sqlx_error)?;
            rows.into_iter().map(BorrowingRecord::try_from).collect()
        }

        #[allow(unused)]
        _ => unreachable!(),
    }
}

/// Sets the return date of the open record `id` to `return_date`.
///
/// Fails with `NotFound` if the record does not exist or if it is already closed.
pub(crate) async fn close_record(
    ex: &mut Executor,
    id: RecordId,
    return_date: Date,
) -> DbResult<BorrowingRecord> {
    match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            let query_str = "
                UPDATE borrowing_records SET return_date = $1
                WHERE id = $2 AND return_date IS NULL
                RETURNING *";
            let row = sqlx::query(query_str)
                .bind(return_date)
                .bind(id.as_i64())
                .fetch_optional(ex.conn())
                .await
                .map_err(postgres::map_sqlx_error)?;
            match row {
                Some(row) => BorrowingRecord::try_from(row),
                None => Err(DbError::NotFound),
            }
        }

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => {
            let query_str = "
                UPDATE borrowing_records SET return_date = ?
                WHERE id = ? AND return_date IS NULL
                RETURNING *";
            let row = sqlx::query(query_str)
                .bind(return_date)
                .bind(id.as_i64())
                .fetch_optional(ex.conn())
                .await
                .map_err(sqlite::map_sqlx_error)?;
            match row {
                Some(row) => BorrowingRecord::try_from(row),
                None => Err(DbError::NotFound),
            }
        }

        #[allow(unused)]
        _ => unreachable!(),
    }
}

/// Counts the borrowing records, open or closed, that reference `book_id`.
pub(crate) async fn count_records_for_book(ex: &mut Executor, book_id: BookId) -> DbResult<u64> {
    let count: i64 = match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            let query_str = "SELECT COUNT(*) AS count FROM borrowing_records WHERE book_id = $1";
            let row = sqlx::query(query_str)
                .bind(book_id.as_i64())
                .fetch_one(ex.conn())
                .await
                .map_err(postgres::map_sqlx_error)?;
            row.try_get("count").map_err(postgres::map_sqlx_error)?
        }

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => {
            let query_str = "SELECT COUNT(*) AS count FROM borrowing_records WHERE book_id = ?";
            let row = sqlx::query(query_str)
                .bind(book_id.as_i64())
                .fetch_one(ex.conn())
                .await
                .map_err(sqlite::map_sqlx_error)?;
            row.try_get("count").map_err(sqlite::map_sqlx_error)?
        }

        #[allow(unused)]
        _ => unreachable!(),
    };

    count_to_u64(count)
}

/// Counts the borrowing records, open or closed, that reference `patron_id`.
pub(crate) async fn count_records_for_patron(
    ex: &mut Executor,
    patron_id: PatronId,
) -> DbResult<u64> {
    let count: i64 = match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            let query_str = "SELECT COUNT(*) AS count FROM borrowing_records WHERE patron_id = $1";
            let row = sqlx::query(query_str)
                .bind(patron_id.as_i64())
                .fetch_one(ex.conn())
                .await
                .map_err(postgres::map_sqlx_error)?;
            row.try_get("count").map_err(postgres::map_sqlx_error)?
        }

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => {
            let query_str = "SELECT COUNT(*) AS count FROM borrowing_records WHERE patron_id = ?";
            let row = sqlx::query(query_str)
                .bind(patron_id.as_i64())
                .fetch_one(ex.conn())
                .await
                .map_err(sqlite::map_sqlx_error)?;
            row.try_get("count").map_err(sqlite::map_sqlx_error)?
        }

        #[allow(unused)]
        _ => unreachable!(),
    };

    count_to_u64(count)
}
