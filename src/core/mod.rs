// Core modules implementing the book model, the in-memory store, and error modeling.
pub mod book;
pub mod error;
pub mod filter;
pub mod id;
pub mod store;
