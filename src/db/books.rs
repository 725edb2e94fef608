use rusqlite::types::Type;
use rusqlite::{params, OptionalExtension, Row};

use crate::models::BookRecord;

use super::connection::{LibraryStore, StoreError, StoreResult};

/// Column list shared by every SELECT so `row_to_book` can stay positional.
const BOOK_COLUMNS: &str =
    "key, title, authors, first_publish_year, pages_median, description, cover_id, is_read";

impl LibraryStore {
    /// Write `book`, replacing any stored record with the same key. The whole
    /// record is overwritten; there is no field-level merge, so fields absent
    /// from `book` do not survive from an earlier version of the record.
    pub fn upsert_book(&self, book: &BookRecord) -> StoreResult<()> {
        let authors = serde_json::to_string(&book.author_names).map_err(|err| {
            StoreError::WriteFailed(rusqlite::Error::ToSqlConversionFailure(Box::new(err)))
        })?;

        self.conn
            .execute(
                "INSERT OR REPLACE INTO books
                    (key, title, authors, first_publish_year, pages_median,
                     description, cover_id, is_read)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    book.key,
                    book.title,
                    authors,
                    book.first_publish_year,
                    book.pages_median,
                    book.description,
                    book.cover_id,
                    book.is_read,
                ],
            )
            .map_err(StoreError::WriteFailed)?;
        Ok(())
    }

    /// Delete the record with `key`. An absent key is a no-op, not an error.
    pub fn remove_book(&self, key: &str) -> StoreResult<()> {
        self.conn
            .execute("DELETE FROM books WHERE key = ?1", params![key])
            .map_err(StoreError::WriteFailed)?;
        Ok(())
    }

    /// Load the whole library, sorted by title for display. An empty store
    /// yields an empty vector. Callers must not read insertion order into the
    /// result; the table does not keep one.
    pub fn fetch_books(&self) -> StoreResult<Vec<BookRecord>> {
        let mut stmt = self
            .conn
            .prepare(&format!(
                "SELECT {BOOK_COLUMNS} FROM books ORDER BY title COLLATE NOCASE"
            ))
            .map_err(StoreError::ReadFailed)?;

        let books = stmt
            .query_map([], row_to_book)
            .map_err(StoreError::ReadFailed)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(StoreError::ReadFailed)?;

        Ok(books)
    }

    /// Look up a single record by key. Absence is `None`, never an error.
    pub fn fetch_book(&self, key: &str) -> StoreResult<Option<BookRecord>> {
        self.conn
            .query_row(
                &format!("SELECT {BOOK_COLUMNS} FROM books WHERE key = ?1"),
                params![key],
                row_to_book,
            )
            .optional()
            .map_err(StoreError::ReadFailed)
    }
}

fn row_to_book(row: &Row<'_>) -> rusqlite::Result<BookRecord> {
    let authors_raw: String = row.get(2)?;
    let author_names = serde_json::from_str(&authors_raw)
        .map_err(|err| rusqlite::Error::FromSqlConversionFailure(2, Type::Text, Box::new(err)))?;

    Ok(BookRecord {
        key: row.get(0)?,
        title: row.get(1)?,
        author_names,
        first_publish_year: row.get(3)?,
        pages_median: row.get(4)?,
        description: row.get(5)?,
        cover_id: row.get(6)?,
        is_read: row.get(7)?,
    })
}

#[cfg(test)]
mod tests {
    use crate::models::BookRecord;

    use super::super::connection::LibraryStore;

    fn sample_book(key: &str, title: &str) -> BookRecord {
        BookRecord {
            key: key.to_string(),
            title: title.to_string(),
            author_names: vec!["Frank Herbert".to_string()],
            first_publish_year: Some(1965),
            pages_median: Some(612),
            description: Some("Melange.".to_string()),
            cover_id: Some(11481354),
            is_read: false,
        }
    }

    #[test]
    fn upsert_then_fetch_returns_a_deep_equal_record() {
        let store = LibraryStore::open_in_memory().expect("open should succeed");
        let book = sample_book("/works/OL1W", "Dune");

        store.upsert_book(&book).expect("upsert should succeed");
        let fetched = store
            .fetch_book("/works/OL1W")
            .expect("lookup should succeed");
        assert_eq!(fetched, Some(book));
    }

    #[test]
    fn upsert_is_idempotent() {
        let store = LibraryStore::open_in_memory().expect("open should succeed");
        let book = sample_book("/works/OL1W", "Dune");

        store.upsert_book(&book).expect("first upsert");
        store.upsert_book(&book).expect("second upsert");

        let all = store.fetch_books().expect("fetch should succeed");
        assert_eq!(all, vec![book]);
    }

    #[test]
    fn upsert_replaces_the_whole_record() {
        let store = LibraryStore::open_in_memory().expect("open should succeed");
        store
            .upsert_book(&sample_book("/works/OL1W", "Dune"))
            .expect("insert");

        let replacement = BookRecord {
            key: "/works/OL1W".to_string(),
            title: "Dune Messiah".to_string(),
            author_names: vec![],
            first_publish_year: None,
            pages_median: None,
            description: None,
            cover_id: None,
            is_read: true,
        };
        store.upsert_book(&replacement).expect("replace");

        let fetched = store
            .fetch_book("/works/OL1W")
            .expect("lookup should succeed")
            .expect("record should exist");
        assert_eq!(fetched, replacement, "no field may survive the overwrite");
    }

    #[test]
    fn remove_then_fetch_is_none_and_absent_remove_is_a_noop() {
        let store = LibraryStore::open_in_memory().expect("open should succeed");
        store
            .upsert_book(&sample_book("/works/OL1W", "Dune"))
            .expect("insert");

        store.remove_book("/works/OL1W").expect("remove present");
        assert_eq!(store.fetch_book("/works/OL1W").expect("lookup"), None);

        store.remove_book("/works/OL1W").expect("remove absent");
        store.remove_book("/works/never-there").expect("remove unknown");
    }

    #[test]
    fn fetch_books_on_an_empty_store_is_an_empty_vector() {
        let store = LibraryStore::open_in_memory().expect("open should succeed");
        assert!(store.fetch_books().expect("fetch should succeed").is_empty());
    }

    #[test]
    fn adding_one_record_makes_it_the_whole_library() {
        let store = LibraryStore::open_in_memory().expect("open should succeed");
        let book = sample_book("OL1", "Dune");
        store.upsert_book(&book).expect("insert");

        assert_eq!(store.fetch_books().expect("fetch"), vec![book]);
    }

    #[test]
    fn add_then_remove_leaves_the_library_empty() {
        let store = LibraryStore::open_in_memory().expect("open should succeed");
        store.upsert_book(&sample_book("OL1", "Dune")).expect("insert");
        store.remove_book("OL1").expect("remove");

        assert!(store.fetch_books().expect("fetch").is_empty());
    }

    #[test]
    fn toggling_read_twice_restores_full_equality() {
        let store = LibraryStore::open_in_memory().expect("open should succeed");
        let original = sample_book("/works/OL1W", "Dune");
        store.upsert_book(&original).expect("insert");

        for _ in 0..2 {
            let mut current = store
                .fetch_book(&original.key)
                .expect("lookup")
                .expect("record should exist");
            current.is_read = !current.is_read;
            store.upsert_book(&current).expect("rewrite");
        }

        let fetched = store
            .fetch_book(&original.key)
            .expect("lookup")
            .expect("record should exist");
        assert_eq!(fetched, original);
    }

    #[test]
    fn records_survive_closing_and_reopening_the_store() {
        let dir = std::env::temp_dir().join(format!(
            "book-library-manager-test-{}-reopen",
            std::process::id()
        ));
        let path = dir.join("library.sqlite");
        let _ = std::fs::remove_dir_all(&dir);

        let book = sample_book("/works/OL1W", "Dune");
        {
            let store = LibraryStore::open_at(&path).expect("first open");
            store.upsert_book(&book).expect("insert");
        }

        let store = LibraryStore::open_at(&path).expect("reopen");
        assert_eq!(store.fetch_books().expect("fetch"), vec![book]);

        drop(store);
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn fetch_books_sorts_by_title_case_insensitively() {
        let store = LibraryStore::open_in_memory().expect("open should succeed");
        store.upsert_book(&sample_book("OL2", "the dispossessed")).expect("insert");
        store.upsert_book(&sample_book("OL1", "Anathem")).expect("insert");
        store.upsert_book(&sample_book("OL3", "Solaris")).expect("insert");

        let titles: Vec<String> = store
            .fetch_books()
            .expect("fetch")
            .into_iter()
            .map(|book| book.title)
            .collect();
        assert_eq!(titles, vec!["Anathem", "Solaris", "the dispossessed"]);
    }
}
