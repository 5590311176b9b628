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

//! Shared building blocks for database-backed REST services.
//!
//! A service built on top of this crate is split in the following layers, each living in a module
//! of the same name inside the service crate:
//!
//! 1.  `model`: Domain types.  Values are validated when constructed from untrusted input so that
//!     the layers above can rely on them being well-formed.
//!
//! 1.  `db`: Persistence.  Free functions that take an `Executor` and issue queries against it,
//!     with one arm per supported database backend.
//!
//! 1.  `driver`: Business logic.  A `Driver` type owns the database handle plus any in-memory
//!     state and coordinates transactions across multiple `db` calls.
//!
//! 1.  `rest`: HTTP.  An `axum::Router` whose handlers translate requests into `Driver` calls and
//!     results into responses.
//!
//! 1.  `main`: Launcher.  Reads configuration from the environment and starts serving.
//!
//! Each layer has its own error type (`ModelError`, `DbError`, `DriverError` and `RestError`) and
//! errors convert upwards so that `?` carries them to the REST layer, where they become HTTP
//! status codes.

// Keep these in sync with other top-level files.
#![warn(anonymous_parameters, bad_style, clippy::missing_docs_in_private_items, missing_docs)]
#![warn(unused, unused_extern_crates, unused_import_braces, unused_qualifications)]
#![warn(unsafe_code)]

pub mod clocks;
pub mod db;
pub mod driver;
pub mod env;
pub mod model;
pub mod rest;
