//! Purpose: Shared library crate used by the `bookshelf` binary and tests.
//! Exports: `api` (book model, store, filters, errors).
//! Role: Keeps domain logic free of HTTP so it can be tested directly.
//! Invariants: Core modules prefer explicit inputs/outputs over hidden state.
//! Invariants: No process-wide collection exists; callers own their `BookStore`.
pub mod api;
mod core;
