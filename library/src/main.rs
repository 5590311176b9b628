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

//! Entry point to the library service.

// Keep these in sync with other top-level files.
#![warn(anonymous_parameters, bad_style, clippy::missing_docs_in_private_items, missing_docs)]
#![warn(unused, unused_extern_crates, unused_import_braces, unused_qualifications)]
#![warn(unsafe_code)]

use iii_iv_core::db::Db;
#[cfg(feature = "postgres")]
use iii_iv_core::db::postgres::{PostgresDb, PostgresOptions};
#[cfg(feature = "sqlite")]
use iii_iv_core::db::sqlite;
use iii_iv_core::env::get_optional_var;
use iii_iv_library::db::init_schema;
use iii_iv_library::{AdminCredentials, DriverOptions, serve};
use std::error::Error;
use std::net::Ipv4Addr;
use std::process;
use std::sync::Arc;

/// Prefix of all environment variables that configure the service.
const ENV_PREFIX: &str = "LIBRARY";

/// Port to listen on when `LIBRARY_PORT` is not set.
const DEFAULT_PORT: u16 = 3000;

/// Connects to the database selected by the environment.
///
/// `LIBRARY_SQLITE_PATH` picks a SQLite file, created if missing.  Otherwise, the PostgreSQL
/// connection is configured from the `PGSQL_PROD_*` variables.
#[allow(unreachable_code)]
async fn connect_db() -> Result<Arc<dyn Db + Send + Sync>, String> {
    #[cfg(feature = "sqlite")]
    {
        if let Some(path) = get_optional_var::<String>(ENV_PREFIX, "SQLITE_PATH")? {
            let db = sqlite::connect(&format!("sqlite://{}?mode=rwc", path))
                .await
                .map_err(|e| format!("Cannot open SQLite database {}: {}", path, e))?;
            return Ok(Arc::new(db));
        }
    }

    #[cfg(feature = "postgres")]
    {
        let opts = PostgresOptions::from_env("PGSQL_PROD")?;
        let db = PostgresDb::connect(opts)
            .map_err(|e| format!("Cannot connect to PostgreSQL: {}", e))?;
        return Ok(Arc::new(db));
    }

    Err("No database backend available in this build".to_owned())
}

/// Reads the configuration, prepares the database and serves requests until shutdown.
async fn run() -> Result<(), Box<dyn Error>> {
    let port = get_optional_var::<u16>(ENV_PREFIX, "PORT")?.unwrap_or(DEFAULT_PORT);
    let admin = AdminCredentials::from_env(ENV_PREFIX)?;
    let opts = DriverOptions::from_env(ENV_PREFIX)?;

    let db = connect_db().await?;
    init_schema(&mut db.ex().await?).await?;

    let result = serve((Ipv4Addr::LOCALHOST, port), db.clone(), opts, admin).await;
    db.close().await;
    result
}

#[tokio::main]
async fn main() {
    env_logger::init();

    if let Err(e) = run().await {
        eprintln!("library: {}", e);
        process::exit(1);
    }
}
