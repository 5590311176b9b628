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

//! Entry point to the REST server.

use crate::driver::Driver;
use crate::model::{AdminCredentials, FieldErrors};
use axum::Router;
use axum::extract::{Request, State};
use axum::middleware::{self, Next};
use axum::response::Response;
use iii_iv_core::rest::RestError;
use log::info;
use std::sync::Arc;
use std::time::Instant;

mod book_delete;
mod book_get;
mod book_put;
mod books_get;
mod books_post;
mod borrow_post;
mod httputils;
mod patron_delete;
mod patron_get;
mod patron_put;
mod patron_records_get;
mod patrons_get;
mod patrons_post;
mod records_get;
mod return_put;
#[cfg(test)]
mod testutils;

/// Authentication realm advertised to clients.
const REALM: &str = "library";

impl From<FieldErrors> for RestError {
    fn from(errors: FieldErrors) -> Self {
        RestError::InvalidFields(errors.into_inner())
    }
}

/// Middleware that rejects requests that do not carry the administrator's credentials.
async fn require_admin(
    State(admin): State<Arc<AdminCredentials>>,
    request: Request,
    next: Next,
) -> Result<Response, RestError> {
    let (username, password) = httputils::get_basic_auth(request.headers(), REALM)?;

    // bcrypt verification is CPU-bound.
    let valid = tokio::task::spawn_blocking(move || admin.verify(&username, &password))
        .await
        .map_err(|e| RestError::InternalError(format!("Credentials check failed: {}", e)))?;
    if !valid {
        return Err(RestError::Unauthorized {
            scheme: "Basic",
            realm: REALM,
            message: "Invalid username or password".to_owned(),
        });
    }

    Ok(next.run(request).await)
}

/// Middleware that logs every request along with its outcome.
async fn log_request(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_owned();
    let start = Instant::now();

    let response = next.run(request).await;

    info!(
        "{} {} -> {} in {}ms",
        method,
        path,
        response.status().as_u16(),
        start.elapsed().as_millis()
    );
    response
}

/// Creates the router for the application.
///
/// All APIs live under `/api` and require HTTP basic authentication with the `admin` credentials.
pub(crate) fn app(driver: Driver, admin: AdminCredentials) -> Router {
    use axum::routing::{get, post, put};

    let api = Router::new()
        .route("/books", get(books_get::handler).post(books_post::handler))
        .route(
            "/books/:id",
            get(book_get::handler).put(book_put::handler).delete(book_delete::handler),
        )
        .route("/patrons", get(patrons_get::handler).post(patrons_post::handler))
        .route(
            "/patrons/:id",
            get(patron_get::handler).put(patron_put::handler).delete(patron_delete::handler),
        )
        .route("/patrons/:id/records", get(patron_records_get::handler))
        .route("/borrow", get(records_get::handler))
        .route("/borrow/:book_id/patron/:patron_id", post(borrow_post::handler))
        .route("/return/:book_id/patron/:patron_id", put(return_put::handler))
        .route_layer(middleware::from_fn_with_state(Arc::from(admin), require_admin))
        .with_state(driver);

    Router::new().nest("/api", api).layer(middleware::from_fn(log_request))
}
