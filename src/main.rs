//! Binary entry point gluing the persistent library store and the catalog
//! client to the TUI. An unopenable store is not fatal here: the app starts
//! in search-only mode and reports why, since searching the catalog never
//! touches local persistence.

use anyhow::Context;
use book_library_manager::{run_app, App, LibraryStore, SearchClient};

fn main() -> anyhow::Result<()> {
    let store = LibraryStore::open();
    let client = SearchClient::new().context("failed to build the catalog search client")?;

    let mut app = App::new(store, client);
    run_app(&mut app)
}
