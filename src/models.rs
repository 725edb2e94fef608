//! Domain model shared between the catalog clients, the persistence layer,
//! and the TUI. A `BookRecord` starts life as an ephemeral search hit decoded
//! straight from the catalog's JSON and becomes durable only when the user
//! adds it to the library. Keeping one struct for both halves means the store
//! can promise full-record overwrites without any mapping layer in between.

use serde::{Deserialize, Serialize};

/// A single book. `key` is the catalog-assigned work identifier (for example
/// `/works/OL45883W`); it is immutable and doubles as the primary key in the
/// local store. The serde renames line the struct up with the catalog's
/// search response documents so results deserialize without glue code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookRecord {
    pub key: String,
    pub title: String,
    /// Every listed author; may be empty. Only the first entry is displayed.
    #[serde(rename = "author_name", default)]
    pub author_names: Vec<String>,
    #[serde(default)]
    pub first_publish_year: Option<i64>,
    #[serde(rename = "number_of_pages_median", default)]
    pub pages_median: Option<i64>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(rename = "cover_i", default)]
    pub cover_id: Option<i64>,
    /// False for ephemeral search hits; the catalog never sends this field.
    /// Once persisted it is the only field that changes, and it changes by
    /// rewriting the whole record.
    #[serde(default)]
    pub is_read: bool,
}

impl BookRecord {
    /// First author with any non-blank content, if there is one.
    pub fn primary_author(&self) -> Option<&str> {
        self.author_names
            .iter()
            .map(|name| name.trim())
            .find(|name| !name.is_empty())
    }

    /// Author text for list rows, falling back the way the original UI did.
    pub fn display_author(&self) -> &str {
        self.primary_author().unwrap_or("Unknown")
    }

    pub fn display_year(&self) -> String {
        match self.first_publish_year {
            Some(year) => year.to_string(),
            None => "Unknown".to_string(),
        }
    }

    pub fn display_pages(&self) -> String {
        match self.pages_median {
            Some(pages) => pages.to_string(),
            None => "Unknown".to_string(),
        }
    }

    pub fn display_description(&self) -> &str {
        self.description
            .as_deref()
            .map(str::trim)
            .filter(|text| !text.is_empty())
            .unwrap_or("No description available")
    }
}
