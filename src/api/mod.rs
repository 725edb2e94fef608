//! Clients for the remote catalog collaborators: free-text search and cover
//! image URLs. Both are treated as opaque external interfaces; nothing in
//! here persists anything.

mod covers;
mod search;

pub use covers::{cover_url, CoverSize};
pub use search::{SearchClient, SearchError, SearchQuery, SearchResults, MAX_RESULTS};
