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

//! Common tests for any database implementation.

use super::*;
use iii_iv_core::db::Db;
use std::sync::Arc;
use time::macros::date;

/// Runs a raw `query` on `ex`.  The `query` must be valid for all database implementations.
async fn exec(ex: &mut Executor, query: &str) {
    match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            sqlx::query(query).execute(ex.conn()).await.unwrap();
        }

        Executor::Sqlite(ex) => {
            sqlx::query(query).execute(ex.conn()).await.unwrap();
        }
    }
}

/// Syntactic sugar to create a book given only its title.
async fn create_simple_book(ex: &mut Executor, title: &str) -> Book {
    create_book(ex, BookDetails::new(title, "Some author", 2000, "978-0").unwrap()).await.unwrap()
}

/// Syntactic sugar to create a patron given only its name.
async fn create_simple_patron(ex: &mut Executor, name: &str) -> Patron {
    create_patron(ex, PatronDetails::new(name, "someone@example.com").unwrap()).await.unwrap()
}

pub(super) async fn test_books_crud(db: Arc<dyn Db + Send + Sync>) {
    let mut ex = db.ex().await.unwrap();

    assert!(get_books(&mut ex).await.unwrap().is_empty());

    let dune = create_book(&mut ex, BookDetails::new("Dune", "Herbert", 1965, "978-1").unwrap())
        .await
        .unwrap();
    let emma = create_book(&mut ex, BookDetails::new("Emma", "Austen", 1815, "978-2").unwrap())
        .await
        .unwrap();
    assert_ne!(dune.id(), emma.id());
    assert_eq!("Dune", dune.title());
    assert_eq!(1815, *emma.publication_year());

    assert_eq!(dune, get_book(&mut ex, *dune.id()).await.unwrap());
    assert_eq!(vec![dune.clone(), emma.clone()], get_books(&mut ex).await.unwrap());

    let dune2 = update_book(
        &mut ex,
        *dune.id(),
        BookDetails::new("Dune Messiah", "Herbert", 1969, "978-3").unwrap(),
    )
    .await
    .unwrap();
    assert_eq!(dune.id(), dune2.id());
    assert_eq!(dune2, get_book(&mut ex, *dune.id()).await.unwrap());
    assert_eq!(emma, get_book(&mut ex, *emma.id()).await.unwrap());

    delete_book(&mut ex, *dune.id()).await.unwrap();
    assert_eq!(DbError::NotFound, get_book(&mut ex, *dune.id()).await.unwrap_err());
    assert_eq!(vec![emma], get_books(&mut ex).await.unwrap());
}

pub(super) async fn test_books_not_found(db: Arc<dyn Db + Send + Sync>) {
    let mut ex = db.ex().await.unwrap();
    let id = BookId::new(12345);

    assert_eq!(DbError::NotFound, get_book(&mut ex, id).await.unwrap_err());
    assert_eq!(
        DbError::NotFound,
        update_book(&mut ex, id, BookDetails::new("a", "b", 1, "c").unwrap()).await.unwrap_err()
    );
    assert_eq!(DbError::NotFound, delete_book(&mut ex, id).await.unwrap_err());
}

pub(super) async fn test_book_corrupted_row(db: Arc<dyn Db + Send + Sync>) {
    let mut ex = db.ex().await.unwrap();
    exec(
        &mut ex,
        "INSERT INTO books (title, author, publication_year, isbn) VALUES (' ', 'a', 1, 'b')",
    )
    .await;

    match get_books(&mut ex).await {
        Err(DbError::DataIntegrityError(e)) => assert!(e.contains("title must not be blank")),
        e => panic!("{:?}", e),
    }
}

pub(super) async fn test_books_abort_creation(db: Arc<dyn Db + Send + Sync>) {
    {
        let mut tx = db.begin().await.unwrap();
        create_simple_book(tx.ex(), "Lost").await;
    }

    let mut ex = db.ex().await.unwrap();
    assert!(get_books(&mut ex).await.unwrap().is_empty());
}

pub(super) async fn test_patrons_crud(db: Arc<dyn Db + Send + Sync>) {
    let mut ex = db.ex().await.unwrap();

    let jane = create_patron(&mut ex, PatronDetails::new("Jane", "jane@example.com").unwrap())
        .await
        .unwrap();
    let john = create_simple_patron(&mut ex, "John").await;
    assert_eq!(vec![jane.clone(), john.clone()], get_patrons(&mut ex).await.unwrap());

    let jane2 =
        update_patron(&mut ex, *jane.id(), PatronDetails::new("Jane Doe", "555-1234").unwrap())
            .await
            .unwrap();
    assert_eq!("555-1234", jane2.contact_information());
    assert_eq!(jane2, get_patron(&mut ex, *jane.id()).await.unwrap());

    delete_patron(&mut ex, *john.id()).await.unwrap();
    assert_eq!(DbError::NotFound, get_patron(&mut ex, *john.id()).await.unwrap_err());
    assert_eq!(DbError::NotFound, delete_patron(&mut ex, *john.id()).await.unwrap_err());
    assert_eq!(
        DbError::NotFound,
        update_patron(&mut ex, *john.id(), PatronDetails::new("a", "b").unwrap())
            .await
            .unwrap_err()
    );
    assert_eq!(vec![jane2], get_patrons(&mut ex).await.unwrap());
}

pub(super) async fn test_records_lifecycle(db: Arc<dyn Db + Send + Sync>) {
    let mut ex = db.ex().await.unwrap();
    let book = create_simple_book(&mut ex, "Dune").await;
    let patron = create_simple_patron(&mut ex, "Jane").await;

    let record = create_record(&mut ex, *book.id(), *patron.id(), date!(2024 - 03 - 05))
        .await
        .unwrap();
    assert!(record.is_open());
    assert_eq!(
        vec![record.clone()],
        get_open_records(&mut ex, *book.id(), *patron.id()).await.unwrap()
    );

    assert_eq!(
        DbError::AlreadyExists,
        create_record(&mut ex, *book.id(), *patron.id(), date!(2024 - 03 - 06)).await.unwrap_err()
    );

    let closed = close_record(&mut ex, *record.id(), date!(2024 - 03 - 19)).await.unwrap();
    assert_eq!(Some(date!(2024 - 03 - 19)), *closed.return_date());
    assert_eq!(date!(2024 - 03 - 05), *closed.borrow_date());
    assert!(get_open_records(&mut ex, *book.id(), *patron.id()).await.unwrap().is_empty());
    assert_eq!(
        DbError::NotFound,
        close_record(&mut ex, *record.id(), date!(2024 - 03 - 20)).await.unwrap_err()
    );

    let again = create_record(&mut ex, *book.id(), *patron.id(), date!(2024 - 04 - 01))
        .await
        .unwrap();
    assert_eq!(vec![closed.clone(), again.clone()], get_records(&mut ex).await.unwrap());
    assert_eq!(
        vec![closed, again],
        get_records_by_patron(&mut ex, *patron.id()).await.unwrap()
    );
    assert_eq!(2, count_records_for_book(&mut ex, *book.id()).await.unwrap());
    assert_eq!(2, count_records_for_patron(&mut ex, *patron.id()).await.unwrap());
}

pub(super) async fn test_records_per_patron(db: Arc<dyn Db + Send + Sync>) {
    let mut ex = db.ex().await.unwrap();
    let book1 = create_simple_book(&mut ex, "Dune").await;
    let book2 = create_simple_book(&mut ex, "Emma").await;
    let jane = create_simple_patron(&mut ex, "Jane").await;
    let john = create_simple_patron(&mut ex, "John").await;

    let r1 = create_record(&mut ex, *book1.id(), *jane.id(), date!(2024 - 01 - 01)).await.unwrap();
    let r2 = create_record(&mut ex, *book1.id(), *john.id(), date!(2024 - 01 - 02)).await.unwrap();
    let r3 = create_record(&mut ex, *book2.id(), *jane.id(), date!(2024 - 01 - 03)).await.unwrap();

    assert_eq!(vec![r1, r3], get_records_by_patron(&mut ex, *jane.id()).await.unwrap());
    assert_eq!(vec![r2], get_records_by_patron(&mut ex, *john.id()).await.unwrap());
    assert!(get_records_by_patron(&mut ex, PatronId::new(999)).await.unwrap().is_empty());
    assert_eq!(2, count_records_for_book(&mut ex, *book1.id()).await.unwrap());
    assert_eq!(1, count_records_for_book(&mut ex, *book2.id()).await.unwrap());
    assert_eq!(0, count_records_for_book(&mut ex, BookId::new(999)).await.unwrap());
}

pub(super) async fn test_records_missing_references(db: Arc<dyn Db + Send + Sync>) {
    let mut ex = db.ex().await.unwrap();
    let book = create_simple_book(&mut ex, "Dune").await;
    let patron = create_simple_patron(&mut ex, "Jane").await;

    assert_eq!(
        DbError::NotFound,
        create_record(&mut ex, BookId::new(999), *patron.id(), date!(2024 - 01 - 01))
            .await
            .unwrap_err()
    );
    assert_eq!(
        DbError::NotFound,
        create_record(&mut ex, *book.id(), PatronId::new(999), date!(2024 - 01 - 01))
            .await
            .unwrap_err()
    );
    assert!(get_records(&mut ex).await.unwrap().is_empty());
}

pub(super) async fn test_referenced_entities_cannot_be_deleted(db: Arc<dyn Db + Send + Sync>) {
    let mut ex = db.ex().await.unwrap();
    let book = create_simple_book(&mut ex, "Dune").await;
    let patron = create_simple_patron(&mut ex, "Jane").await;
    create_record(&mut ex, *book.id(), *patron.id(), date!(2024 - 01 - 01)).await.unwrap();

    assert!(delete_book(&mut ex, *book.id()).await.is_err());
    assert!(delete_patron(&mut ex, *patron.id()).await.is_err());
    assert_eq!(book, get_book(&mut ex, *book.id()).await.unwrap());
    assert_eq!(patron, get_patron(&mut ex, *patron.id()).await.unwrap());
}

macro_rules! generate_db_tests [
    ( $setup:expr $(, #[$extra:meta] )? ) => {
        iii_iv_core::db::testutils::generate_tests!(
            $(#[$extra],)?
            $setup,
            $crate::db::tests,
            test_books_crud,
            test_books_not_found,
            test_book_corrupted_row,
            test_books_abort_creation,
            test_patrons_crud,
            test_records_lifecycle,
            test_records_per_patron,
            test_records_missing_references,
            test_referenced_entities_cannot_be_deleted
        );
    }
];

/// Opens a database and initializes it with the schema of this crate.
async fn setup_with_schema<D>(db: D) -> Arc<dyn Db + Send + Sync>
where
    D: Db + Send + Sync + 'static,
{
    let db: Arc<dyn Db + Send + Sync> = Arc::from(db);
    init_schema(&mut db.ex().await.unwrap()).await.unwrap();
    db
}

#[cfg(feature = "postgres")]
mod postgres {
    use super::*;

    generate_db_tests!(
        setup_with_schema(iii_iv_core::db::postgres::testutils::setup().await).await,
        #[ignore = "Requires environment configuration and is expensive"]
    );
}

mod sqlite {
    use super::*;

    generate_db_tests!(setup_with_schema(iii_iv_core::db::sqlite::testutils::setup().await).await);
}
