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

//! API to list the borrowing history of a patron.

use crate::driver::Driver;
use crate::model::{BorrowingRecord, PatronId};
use axum::Json;
use axum::extract::{Path, State};
use iii_iv_core::rest::{EmptyBody, RestError};

/// API handler.
pub(crate) async fn handler(
    State(driver): State<Driver>,
    Path(id): Path<PatronId>,
    _: EmptyBody,
) -> Result<Json<Vec<BorrowingRecord>>, RestError> {
    Ok(Json(driver.get_patron_records(id).await?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rest::testutils::*;
    use axum::http;
    use iii_iv_core::test_payload_must_be_empty;
    use time::macros::date;

    fn route(id: PatronId) -> (http::Method, String) {
        (http::Method::GET, format!("/api/patrons/{}/records", id))
    }

    #[tokio::test]
    async fn test_ok() {
        let context = TestContext::setup().await;

        let book1 = context.create_book("Dune").await;
        let book2 = context.create_book("Emma").await;
        let jane = context.create_patron("jane").await;
        let john = context.create_patron("john").await;
        let r1 = context.create_record(*book1.id(), *jane.id(), date!(2024 - 01 - 10)).await;
        context.create_record(*book1.id(), *john.id(), date!(2024 - 01 - 11)).await;
        let r3 = context.create_record(*book2.id(), *jane.id(), date!(2024 - 01 - 12)).await;

        let response = context
            .request(route(*jane.id()))
            .send_empty()
            .await
            .expect_json::<Vec<BorrowingRecord>>()
            .await;
        assert_eq!(vec![r1, r3], response);
    }

    #[tokio::test]
    async fn test_no_records() {
        let context = TestContext::setup().await;

        let patron = context.create_patron("new").await;

        let response = context
            .request(route(*patron.id()))
            .send_empty()
            .await
            .expect_json::<Vec<BorrowingRecord>>()
            .await;
        assert!(response.is_empty());
    }

    #[tokio::test]
    async fn test_patron_not_found() {
        let context = TestContext::setup().await;

        context
            .request(route(PatronId::new(6)))
            .send_empty()
            .await
            .expect_status(http::StatusCode::NOT_FOUND)
            .expect_error("Patron not found with id 6")
            .await;
    }

    test_payload_must_be_empty!(
        TestContext::setup().await.into_app(),
        route(PatronId::new(1)),
        ADMIN_USERNAME,
        ADMIN_PASSWORD
    );
}
