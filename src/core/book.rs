//! Purpose: Book record, request payload, and list projection types.
//! Exports: `Book`, `BookInput`, `BookSummary`.
//! Role: Data model shared by the store and the HTTP layer.
//! Invariants: A stored `Book` always has a non-empty name and `read_page <= page_count`.
//! Invariants: `finished` is derived only when a book is created.

use serde::Deserialize;
use time::OffsetDateTime;

use super::error::{Error, Violation};

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Book {
    pub id: String,
    pub name: String,
    pub year: i32,
    pub author: String,
    pub summary: String,
    pub publisher: String,
    pub page_count: u32,
    pub read_page: u32,
    pub finished: bool,
    pub reading: bool,
    pub inserted_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

/// Fields supplied by a client when adding or updating a book.
///
/// Every field may be omitted on the wire. A missing `name` stays `None` so
/// that it fails the same rule as an empty one; everything else falls back
/// to its zero value.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct BookInput {
    pub name: Option<String>,
    pub year: i32,
    pub author: String,
    pub summary: String,
    pub publisher: String,
    pub page_count: u32,
    pub read_page: u32,
    pub reading: bool,
}

impl BookInput {
    fn name_violation(&self) -> Option<Violation> {
        match self.name.as_deref() {
            Some(name) if !name.is_empty() => None,
            _ => Some(Violation::MissingName),
        }
    }

    fn page_violation(&self) -> Option<Violation> {
        (self.read_page > self.page_count).then_some(Violation::ReadPageExceedsPageCount)
    }

    /// Rules for a new book: the name is checked before the page counts.
    pub(crate) fn check_for_add(&self) -> Result<(), Error> {
        match self.name_violation().or_else(|| self.page_violation()) {
            Some(violation) => Err(Error::validation(violation)),
            None => Ok(()),
        }
    }

    /// Rules for an update: a page-count violation outranks a missing name.
    pub(crate) fn check_for_update(&self) -> Result<(), Error> {
        match self.page_violation().or_else(|| self.name_violation()) {
            Some(violation) => Err(Error::validation(violation)),
            None => Ok(()),
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct BookSummary {
    pub id: String,
    pub name: String,
    pub publisher: String,
}

impl From<&Book> for BookSummary {
    fn from(book: &Book) -> Self {
        Self {
            id: book.id.clone(),
            name: book.name.clone(),
            publisher: book.publisher.clone(),
        }
    }
}
