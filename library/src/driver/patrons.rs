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

//! Extends the driver with the patron management operations.

use crate::db;
use crate::driver::cache::Cached;
use crate::driver::{Driver, timed};
use crate::model::{Patron, PatronDetails, PatronId};
use iii_iv_core::db::{DbError, DbResult, Executor};
use iii_iv_core::driver::{DriverError, DriverResult};

/// Converts the result of a database operation on the patron `id` into a driver result.
pub(super) fn or_patron_not_found<T>(result: DbResult<T>, id: PatronId) -> DriverResult<T> {
    match result {
        Err(DbError::NotFound) => {
            Err(DriverError::NotFound(format!("Patron not found with id {}", id)))
        }
        result => Ok(result?),
    }
}

/// Loads the patron `id` from the database.
pub(super) async fn lookup_patron(ex: &mut Executor, id: PatronId) -> DriverResult<Patron> {
    or_patron_not_found(db::get_patron(ex, id).await, id)
}

impl Driver {
    /// Gets all registered patrons.
    pub(crate) async fn get_patrons(self) -> DriverResult<Vec<Patron>> {
        let generation = match self.patrons_cache.get_all().await {
            Cached::Hit(patrons) => return Ok(patrons),
            Cached::Miss(generation) => generation,
        };

        let patrons = db::get_patrons(&mut self.db.ex().await?).await?;
        self.patrons_cache.put_all(generation, patrons.clone()).await;
        Ok(patrons)
    }

    /// Gets the patron identified by `id`.
    pub(crate) async fn get_patron(self, id: PatronId) -> DriverResult<Patron> {
        let generation = match self.patrons_cache.get(&id).await {
            Cached::Hit(patron) => return Ok(patron),
            Cached::Miss(generation) => generation,
        };

        let patron = lookup_patron(&mut self.db.ex().await?, id).await?;
        self.patrons_cache.put(generation, id, patron.clone()).await;
        Ok(patron)
    }

    /// Registers a new patron.
    pub(crate) async fn create_patron(self, details: PatronDetails) -> DriverResult<Patron> {
        timed("create_patron", format!("{:?}", details), async move {
            let mut tx = self.db.begin().await?;
            let patron = db::create_patron(tx.ex(), details).await?;
            tx.commit().await?;

            self.patrons_cache.invalidate().await;
            Ok(patron)
        })
        .await
    }

    /// Replaces all details of the patron identified by `id`.
    pub(crate) async fn update_patron(
        self,
        id: PatronId,
        details: PatronDetails,
    ) -> DriverResult<Patron> {
        timed("update_patron", format!("id={}, {:?}", id, details), async move {
            let mut tx = self.db.begin().await?;
            let patron = or_patron_not_found(db::update_patron(tx.ex(), id, details).await, id)?;
            tx.commit().await?;

            self.patrons_cache.invalidate().await;
            Ok(patron)
        })
        .await
    }

    /// Unregisters the patron identified by `id`.
    ///
    /// Patrons that appear in any borrowing record cannot be deleted.
    pub(crate) async fn delete_patron(self, id: PatronId) -> DriverResult<()> {
        let mut tx = self.db.begin().await?;
        lookup_patron(tx.ex(), id).await?;
        let records = db::count_records_for_patron(tx.ex(), id).await?;
        if records > 0 {
            return Err(DriverError::Conflict(format!(
                "Patron {} cannot be deleted because it has {} borrowing records",
                id, records
            )));
        }
        or_patron_not_found(db::delete_patron(tx.ex(), id).await, id)?;
        tx.commit().await?;

        self.patrons_cache.invalidate().await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::testutils::*;
    use time::macros::date;

    #[tokio::test]
    async fn test_create_and_get() {
        let context = TestContext::setup().await;

        let details = PatronDetails::new("Jane Doe", "jane@example.com").unwrap();
        let patron = context.driver().create_patron(details).await.unwrap();
        assert_eq!("jane@example.com", patron.contact_information());
        assert_eq!(patron, context.driver().get_patron(*patron.id()).await.unwrap());
        assert_eq!(vec![patron], context.driver().get_patrons().await.unwrap());
    }

    #[tokio::test]
    async fn test_get_patron_not_found() {
        let context = TestContext::setup().await;

        assert_eq!(
            DriverError::NotFound("Patron not found with id 3".to_owned()),
            context.driver().get_patron(PatronId::new(3)).await.unwrap_err()
        );
    }

    #[tokio::test]
    async fn test_writes_invalidate_cache() {
        let context = TestContext::setup().await;

        let jane = context.create_patron("jane").await;
        assert_eq!(vec![jane.clone()], context.driver().get_patrons().await.unwrap());

        let john = context.create_patron("john").await;
        assert_eq!(vec![jane.clone()], context.driver().get_patrons().await.unwrap());

        let details = PatronDetails::new("Jane Roe", "555-0100").unwrap();
        let jane2 = context.driver().update_patron(*jane.id(), details).await.unwrap();
        assert_eq!(vec![jane2.clone(), john.clone()], context.driver().get_patrons().await.unwrap());
        assert_eq!(jane2, context.driver().get_patron(*jane.id()).await.unwrap());

        context.driver().delete_patron(*john.id()).await.unwrap();
        assert_eq!(vec![jane2], context.driver().get_patrons().await.unwrap());
        context.driver().get_patron(*john.id()).await.unwrap_err();
    }

    #[tokio::test]
    async fn test_update_not_found() {
        let context = TestContext::setup().await;

        let details = PatronDetails::new("Nobody", "none").unwrap();
        assert_eq!(
            DriverError::NotFound("Patron not found with id 9".to_owned()),
            context.driver().update_patron(PatronId::new(9), details).await.unwrap_err()
        );
    }

    #[tokio::test]
    async fn test_delete_referenced_patron_conflicts() {
        let context = TestContext::setup().await;

        let book = context.create_book("Dune").await;
        let patron = context.create_patron("jane").await;
        db::create_record(&mut context.ex().await, *book.id(), *patron.id(), date!(2024 - 01 - 01))
            .await
            .unwrap();

        match context.driver().delete_patron(*patron.id()).await {
            Err(DriverError::Conflict(e)) => assert!(e.contains("borrowing records")),
            e => panic!("{:?}", e),
        }
        assert_eq!(patron, context.driver().get_patron(*patron.id()).await.unwrap());
    }
}
