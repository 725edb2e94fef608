//! Core library surface for the Book Library Manager TUI application.
//!
//! The crate splits into the persistent library store (`db`), the remote
//! catalog clients (`api`), the shared book model (`models`), and the
//! terminal front-end (`ui`). The public re-exports below are the small API
//! that `main.rs` and external tooling actually need.

pub mod api;
pub mod db;
pub mod models;
pub mod ui;

/// The persistence layer: the opened store handle and its error taxonomy.
pub use db::{LibraryStore, StoreError};

/// Remote catalog collaborators.
pub use api::{SearchClient, SearchQuery};

/// The one domain type every layer passes around.
pub use models::BookRecord;

/// The interactive application entry point and state container.
pub use ui::{run_app, App};
