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

//! Utilities to deal with HTTP basic authentication.

use axum::http::header::HeaderMap;
use base64::Engine;
use base64::engine::general_purpose;
use iii_iv_core::rest::{RestError, RestResult, get_unique_header};

/// Authentication scheme accepted by the API.
const SCHEME: &str = "Basic";

/// Builds an authentication error for `realm` with the given `message`.
fn unauthorized<S: Into<String>>(realm: &'static str, message: S) -> RestError {
    RestError::Unauthorized { scheme: SCHEME, realm, message: message.into() }
}

/// Assumes that the `headers` contain basic authentication credentials and extracts the
/// username and password pair from them.
pub(crate) fn get_basic_auth(
    headers: &HeaderMap,
    realm: &'static str,
) -> RestResult<(String, String)> {
    let authz = match get_unique_header(headers, "Authorization") {
        Ok(Some(value)) => value,
        Ok(None) => return Err(unauthorized(realm, "Missing Authorization header")),
        Err(e) => return Err(unauthorized(realm, e.to_string())),
    };

    let authz = authz
        .to_str()
        .map_err(|e| unauthorized(realm, format!("Bad encoding in Authorization header: {}", e)))?;

    let (scheme, payload) = match authz.split_once(' ') {
        Some((scheme, payload)) if !scheme.is_empty() => (scheme, payload),
        _ => return Err(unauthorized(realm, "Bad Authorization header")),
    };
    if scheme != SCHEME {
        return Err(unauthorized(realm, "Unsupported scheme"));
    }

    let payload = general_purpose::STANDARD
        .decode(payload)
        .map_err(|e| unauthorized(realm, format!("Bad base64 encoding in payload: {}", e)))?;

    // Both the username and the password have to be strings, so it is easier to convert the
    // payload first in one go instead of doing two conversion after splitting the bytes.
    let payload = String::from_utf8(payload)
        .map_err(|e| unauthorized(realm, format!("Bad UTF-8 encoding in payload: {}", e)))?;

    match payload.split_once(':') {
        Some((username, password)) => Ok((username.to_owned(), password.to_owned())),
        None => Err(unauthorized(realm, "Bad content")),
    }
}
