//! # quarry-store
//!
//! Annotation store backends: an in-memory store for tests and demos and a
//! SQLite store that an external annotation UI can share through the
//! database file. Both evaluate the same filter expression language.

pub mod memory;
pub mod query;
pub mod sqlite;

pub use memory::InMemoryStore;
pub use query::Filter;
pub use sqlite::SqliteStore;

use quarry_core::errors::{QuarryError, StoreError};

/// Wrap a backend failure message as a store error.
pub(crate) fn to_store_err(message: String) -> QuarryError {
    StoreError::SqliteError { message }.into()
}
