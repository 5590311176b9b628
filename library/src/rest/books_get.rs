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

//! API to list all books in the catalog.

use crate::driver::Driver;
use crate::model::Book;
use axum::Json;
use axum::extract::State;
use iii_iv_core::rest::{EmptyBody, RestError};

/// API handler.
pub(crate) async fn handler(
    State(driver): State<Driver>,
    _: EmptyBody,
) -> Result<Json<Vec<Book>>, RestError> {
    let books = driver.get_books().await?;
    Ok(Json(books))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rest::testutils::*;
    use axum::http;
    use iii_iv_core::test_payload_must_be_empty;

    fn route() -> (http::Method, String) {
        (http::Method::GET, "/api/books".to_owned())
    }

    #[tokio::test]
    async fn test_empty() {
        let context = TestContext::setup().await;

        let response = context.request(route()).send_empty().await.expect_json::<Vec<Book>>().await;
        assert!(response.is_empty());
    }

    #[tokio::test]
    async fn test_some() {
        let context = TestContext::setup().await;

        let book1 = context.create_book("First").await;
        let book2 = context.create_book("Second").await;

        let response = context.request(route()).send_empty().await.expect_json::<Vec<Book>>().await;
        assert_eq!(vec![book1, book2], response);
    }

    test_payload_must_be_empty!(
        TestContext::setup().await.into_app(),
        route(),
        ADMIN_USERNAME,
        ADMIN_PASSWORD
    );
}
