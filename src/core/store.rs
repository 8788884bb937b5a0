//! Purpose: In-memory book collection and its CRUD operations.
//! Exports: `BookStore`, `Clock`.
//! Role: Single owner of stored books; callers serialize access (one lock per operation).
//! Invariants: Ids are unique and never reused while their book is stored.
//! Invariants: Every stored book has a non-empty name and `read_page <= page_count`.
//! Invariants: Insertion order is preserved; updates replace records in place.
//! Notes: `finished` is derived on add only; updates keep the stored value.

use time::OffsetDateTime;

use super::book::{Book, BookInput, BookSummary};
use super::error::{Error, ErrorKind};
use super::filter::ListFilter;
use super::id;

pub type Clock = fn() -> OffsetDateTime;

#[derive(Clone, Debug)]
pub struct BookStore {
    books: Vec<Book>,
    clock: Clock,
}

impl Default for BookStore {
    fn default() -> Self {
        Self::new()
    }
}

impl BookStore {
    pub fn new() -> Self {
        Self {
            books: Vec::new(),
            clock: OffsetDateTime::now_utc,
        }
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn len(&self) -> usize {
        self.books.len()
    }

    pub fn is_empty(&self) -> bool {
        self.books.is_empty()
    }

    pub fn add(&mut self, input: BookInput) -> Result<String, Error> {
        input.check_for_add()?;

        let id = self.fresh_id()?;
        let now = (self.clock)();
        let BookInput {
            name,
            year,
            author,
            summary,
            publisher,
            page_count,
            read_page,
            reading,
        } = input;
        self.books.push(Book {
            id: id.clone(),
            name: name.unwrap_or_default(),
            year,
            author,
            summary,
            publisher,
            page_count,
            read_page,
            finished: page_count == read_page,
            reading,
            inserted_at: now,
            updated_at: now,
        });

        if self.position(&id).is_none() {
            self.books.retain(|book| book.id != id);
            return Err(Error::new(ErrorKind::Internal)
                .with_message("book missing after insert")
                .with_book_id(id));
        }
        Ok(id)
    }

    pub fn list(&self, filter: &ListFilter) -> Vec<BookSummary> {
        let matches = filter.matcher();
        self.books
            .iter()
            .filter(|book| matches(*book))
            .map(BookSummary::from)
            .collect()
    }

    pub fn get(&self, id: &str) -> Result<&Book, Error> {
        self.position(id)
            .map(|index| &self.books[index])
            .ok_or_else(|| not_found(id))
    }

    pub fn update(&mut self, id: &str, input: BookInput) -> Result<(), Error> {
        input.check_for_update()?;
        let index = self.position(id).ok_or_else(|| not_found(id))?;
        let now = (self.clock)();

        let book = &mut self.books[index];
        book.name = input.name.unwrap_or_default();
        book.year = input.year;
        book.author = input.author;
        book.summary = input.summary;
        book.publisher = input.publisher;
        book.page_count = input.page_count;
        book.read_page = input.read_page;
        book.reading = input.reading;
        book.updated_at = now;
        Ok(())
    }

    pub fn delete(&mut self, id: &str) -> Result<(), Error> {
        let index = self.position(id).ok_or_else(|| not_found(id))?;
        self.books.remove(index);
        Ok(())
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.books.iter().position(|book| book.id == id)
    }

    fn fresh_id(&self) -> Result<String, Error> {
        loop {
            let candidate = id::generate()?;
            if self.position(&candidate).is_none() {
                return Ok(candidate);
            }
        }
    }
}

fn not_found(id: &str) -> Error {
    Error::new(ErrorKind::NotFound)
        .with_message("book not found")
        .with_book_id(id)
}
