//! Purpose: Define the public Rust API boundary for the bookshelf crate.
//! Exports: Book types, the store, list filters, and errors.
//! Role: Public, additive-only surface; hides internal module layout.
//! Invariants: This module is the only public path to core types.

#[doc(hidden)]
pub use crate::core::error::to_exit_code;
pub use crate::core::book::{Book, BookInput, BookSummary};
pub use crate::core::error::{Error, ErrorKind, Violation};
pub use crate::core::filter::ListFilter;
pub use crate::core::id::ID_LEN;
pub use crate::core::store::{BookStore, Clock};
