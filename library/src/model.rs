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

//! High-level data types.

use derivative::Derivative;
use derive_getters::Getters;
use derive_more::{Constructor, Display};
use iii_iv_core::env::{get_optional_var, get_required_var};
use iii_iv_core::model::{ModelError, ModelResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use time::Date;

/// Message attached to string fields that are missing or only contain whitespace.
const MUST_NOT_BE_BLANK: &str = "must not be blank";

/// Message attached to non-string fields that are missing.
const MUST_NOT_BE_NULL: &str = "must not be null";

/// Default username of the administrator account when not configured.
const DEFAULT_ADMIN_USERNAME: &str = "admin";

/// Identifier of a book in the catalog.
#[derive(Clone, Copy, Constructor, Debug, Deserialize, Display, Eq, Ord, PartialEq, PartialOrd)]
#[derive(Serialize)]
#[serde(transparent)]
pub(crate) struct BookId(i64);

impl BookId {
    /// Returns the raw value of the identifier.
    pub(crate) fn as_i64(&self) -> i64 {
        self.0
    }
}

/// Identifier of a patron.
#[derive(Clone, Copy, Constructor, Debug, Deserialize, Display, Eq, Ord, PartialEq, PartialOrd)]
#[derive(Serialize)]
#[serde(transparent)]
pub(crate) struct PatronId(i64);

impl PatronId {
    /// Returns the raw value of the identifier.
    pub(crate) fn as_i64(&self) -> i64 {
        self.0
    }
}

/// Identifier of a borrowing record.
#[derive(Clone, Copy, Constructor, Debug, Deserialize, Display, Eq, Ord, PartialEq, PartialOrd)]
#[derive(Serialize)]
#[serde(transparent)]
pub(crate) struct RecordId(i64);

impl RecordId {
    /// Returns the raw value of the identifier.
    pub(crate) fn as_i64(&self) -> i64 {
        self.0
    }
}

/// Collection of validation problems found in a request, keyed by the name of the offending
/// field as it appears in the JSON representation.
#[derive(Debug, Default, PartialEq)]
pub(crate) struct FieldErrors(BTreeMap<String, String>);

impl FieldErrors {
    /// Records that `field` is invalid because of `message`.
    fn add(&mut self, field: &str, message: &str) {
        self.0.insert(field.to_owned(), message.to_owned());
    }

    /// Returns true if no problems have been recorded.
    fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Consumes the errors and returns the field to message mapping.
    pub(crate) fn into_inner(self) -> BTreeMap<String, String> {
        self.0
    }
}

impl From<FieldErrors> for ModelError {
    fn from(errors: FieldErrors) -> Self {
        let details: Vec<String> =
            errors.0.into_iter().map(|(field, message)| format!("{} {}", field, message)).collect();
        ModelError(format!("Invalid fields: {}", details.join(", ")))
    }
}

/// Returns the value of an optional string `field`, or records a problem in `errors` if the value
/// is missing or blank.
fn require_not_blank(errors: &mut FieldErrors, field: &str, value: Option<String>) -> String {
    match value {
        Some(value) if !value.trim().is_empty() => value,
        _ => {
            errors.add(field, MUST_NOT_BE_BLANK);
            String::new()
        }
    }
}

/// Validated mutable properties of a book.
#[derive(Clone, Debug, Getters, PartialEq)]
pub(crate) struct BookDetails {
    /// Title of the book.
    title: String,

    /// Name of the author of the book.
    author: String,

    /// Year in which the book was published.
    publication_year: i32,

    /// ISBN of the book.
    isbn: String,
}

impl BookDetails {
    /// Creates a new set of book details, validating that they are well-formed.
    pub(crate) fn new<S1, S2, S3>(
        title: S1,
        author: S2,
        publication_year: i32,
        isbn: S3,
    ) -> ModelResult<Self>
    where
        S1: Into<String>,
        S2: Into<String>,
        S3: Into<String>,
    {
        let request = BookRequest {
            title: Some(title.into()),
            author: Some(author.into()),
            publication_year: Some(publication_year),
            isbn: Some(isbn.into()),
        };
        Ok(request.validate()?)
    }
}

/// Untrusted representation of a book as received in a request body.
#[derive(Debug, Default, Deserialize)]
#[cfg_attr(test, derive(PartialEq, Serialize))]
#[serde(rename_all = "camelCase")]
pub(crate) struct BookRequest {
    /// Title of the book.
    pub(crate) title: Option<String>,

    /// Name of the author of the book.
    pub(crate) author: Option<String>,

    /// Year in which the book was published.
    pub(crate) publication_year: Option<i32>,

    /// ISBN of the book.
    pub(crate) isbn: Option<String>,
}

impl BookRequest {
    /// Validates the request and returns the book details it carries, or every field that is
    /// not valid.
    pub(crate) fn validate(self) -> Result<BookDetails, FieldErrors> {
        let mut errors = FieldErrors::default();
        let title = require_not_blank(&mut errors, "title", self.title);
        let author = require_not_blank(&mut errors, "author", self.author);
        let publication_year = match self.publication_year {
            Some(year) => year,
            None => {
                errors.add("publicationYear", MUST_NOT_BE_NULL);
                0
            }
        };
        let isbn = require_not_blank(&mut errors, "isbn", self.isbn);

        if !errors.is_empty() {
            return Err(errors);
        }
        Ok(BookDetails { title, author, publication_year, isbn })
    }
}

/// A book in the catalog.
#[derive(Clone, Debug, Deserialize, Getters, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Book {
    /// Identifier of the book.
    id: BookId,

    /// Title of the book.
    title: String,

    /// Name of the author of the book.
    author: String,

    /// Year in which the book was published.
    publication_year: i32,

    /// ISBN of the book.
    isbn: String,
}

impl Book {
    /// Creates a book from its identifier and its validated details.
    pub(crate) fn new(id: BookId, details: BookDetails) -> Self {
        let BookDetails { title, author, publication_year, isbn } = details;
        Self { id, title, author, publication_year, isbn }
    }
}

/// Validated mutable properties of a patron.
#[derive(Clone, Debug, Getters, PartialEq)]
pub(crate) struct PatronDetails {
    /// Full name of the patron.
    name: String,

    /// Free-form means to reach the patron, such as an email address.
    contact_information: String,
}

impl PatronDetails {
    /// Creates a new set of patron details, validating that they are well-formed.
    pub(crate) fn new<S1, S2>(name: S1, contact_information: S2) -> ModelResult<Self>
    where
        S1: Into<String>,
        S2: Into<String>,
    {
        let request = PatronRequest {
            name: Some(name.into()),
            contact_information: Some(contact_information.into()),
        };
        Ok(request.validate()?)
    }
}

/// Untrusted representation of a patron as received in a request body.
#[derive(Debug, Default, Deserialize)]
#[cfg_attr(test, derive(PartialEq, Serialize))]
#[serde(rename_all = "camelCase")]
pub(crate) struct PatronRequest {
    /// Full name of the patron.
    pub(crate) name: Option<String>,

    /// Free-form means to reach the patron.
    pub(crate) contact_information: Option<String>,
}

impl PatronRequest {
    /// Validates the request and returns the patron details it carries, or every field that is
    /// not valid.
    pub(crate) fn validate(self) -> Result<PatronDetails, FieldErrors> {
        let mut errors = FieldErrors::default();
        let name = require_not_blank(&mut errors, "name", self.name);
        let contact_information =
            require_not_blank(&mut errors, "contactInformation", self.contact_information);

        if !errors.is_empty() {
            return Err(errors);
        }
        Ok(PatronDetails { name, contact_information })
    }
}

/// A registered library patron.
#[derive(Clone, Debug, Deserialize, Getters, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Patron {
    /// Identifier of the patron.
    id: PatronId,

    /// Full name of the patron.
    name: String,

    /// Free-form means to reach the patron.
    contact_information: String,
}

impl Patron {
    /// Creates a patron from its identifier and its validated details.
    pub(crate) fn new(id: PatronId, details: PatronDetails) -> Self {
        let PatronDetails { name, contact_information } = details;
        Self { id, name, contact_information }
    }
}

/// A loan of a book to a patron.
///
/// A record is open while `return_date` is `None` and becomes closed, permanently, once the book
/// is returned.
#[derive(Clone, Debug, Deserialize, Getters, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct BorrowingRecord {
    /// Identifier of the record.
    id: RecordId,

    /// The borrowed book.
    book_id: BookId,

    /// The patron that borrowed the book.
    patron_id: PatronId,

    /// Date on which the book was lent.
    borrow_date: Date,

    /// Date on which the book came back, if it did.
    return_date: Option<Date>,
}

impl BorrowingRecord {
    /// Creates a new record from its raw parts.
    pub(crate) fn new(
        id: RecordId,
        book_id: BookId,
        patron_id: PatronId,
        borrow_date: Date,
        return_date: Option<Date>,
    ) -> ModelResult<Self> {
        if let Some(return_date) = return_date {
            if return_date < borrow_date {
                return Err(ModelError(format!(
                    "Return date {} cannot precede borrow date {}",
                    return_date, borrow_date
                )));
            }
        }
        Ok(Self { id, book_id, patron_id, borrow_date, return_date })
    }

    /// Returns true if the book has not been returned yet.
    pub(crate) fn is_open(&self) -> bool {
        self.return_date.is_none()
    }

    /// Closes an open record by setting its return date to `date`.
    pub(crate) fn close(self, date: Date) -> ModelResult<Self> {
        if let Some(return_date) = self.return_date {
            return Err(ModelError(format!(
                "Borrowing record {} was already closed on {}",
                self.id, return_date
            )));
        }
        Self::new(self.id, self.book_id, self.patron_id, self.borrow_date, Some(date))
    }
}

/// Credentials of the single administrator account allowed to use the API.
#[derive(Clone, Derivative)]
#[derivative(Debug)]
pub struct AdminCredentials {
    /// Name of the administrator account.
    username: String,

    /// Password of the administrator account, hashed with bcrypt.
    #[derivative(Debug = "ignore")]
    password_hash: String,
}

impl AdminCredentials {
    /// Creates the credentials for `username` by hashing `password` with the given bcrypt `cost`.
    pub fn new<U: Into<String>>(username: U, password: &str, cost: u32) -> Result<Self, String> {
        let username = username.into();
        if username.trim().is_empty() {
            return Err("Administrator username cannot be empty".to_owned());
        }
        if password.is_empty() {
            return Err("Administrator password cannot be empty".to_owned());
        }
        let password_hash = bcrypt::hash(password, cost)
            .map_err(|e| format!("Failed to hash administrator password: {}", e))?;
        Ok(Self { username, password_hash })
    }

    /// Creates the credentials from environment variables whose name is prefixed with the given
    /// `prefix`.
    ///
    /// This will use the variables `<prefix>_ADMIN_USERNAME` and `<prefix>_ADMIN_PASSWORD`.
    pub fn from_env(prefix: &str) -> Result<Self, String> {
        let username = get_optional_var::<String>(prefix, "ADMIN_USERNAME")?
            .unwrap_or_else(|| DEFAULT_ADMIN_USERNAME.to_owned());
        let password = get_required_var::<String>(prefix, "ADMIN_PASSWORD")?;
        Self::new(username, &password, bcrypt::DEFAULT_COST)
    }

    /// Returns the name of the administrator account.
    #[cfg(test)]
    pub(crate) fn username(&self) -> &str {
        &self.username
    }

    /// Checks if the given `username` and `password` pair matches these credentials.
    pub(crate) fn verify(&self, username: &str, password: &str) -> bool {
        if username != self.username {
            return false;
        }
        bcrypt::verify(password, &self.password_hash).unwrap_or(false)
    }
}
