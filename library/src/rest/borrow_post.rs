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

//! API to lend a book to a patron.

use crate::driver::Driver;
use crate::model::{BookId, BorrowingRecord, PatronId};
use axum::extract::{Path, State};
use axum::{Json, http};
use iii_iv_core::rest::{EmptyBody, RestError};

/// API handler.
pub(crate) async fn handler(
    State(driver): State<Driver>,
    Path((book_id, patron_id)): Path<(BookId, PatronId)>,
    _: EmptyBody,
) -> Result<(http::StatusCode, Json<BorrowingRecord>), RestError> {
    let record = driver.borrow(book_id, patron_id).await?;
    Ok((http::StatusCode::CREATED, Json(record)))
}
