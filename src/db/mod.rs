//! Persistence module split across logical submodules: `connection` owns the
//! store handle, its error taxonomy, and schema migrations; `books` holds the
//! record operations.

mod books;
mod connection;

pub use connection::{LibraryStore, StoreError, StoreResult};
