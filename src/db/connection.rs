use std::fs;
use std::path::{Path, PathBuf};

use directories::BaseDirs;
use rusqlite::Connection;
use thiserror::Error;

/// Folder name used beneath the user's home directory for application data.
const DATA_DIR_NAME: &str = ".book-library-manager";
/// SQLite file name stored inside the application data directory.
const DB_FILE_NAME: &str = "library.sqlite";
/// Value stamped into `PRAGMA user_version` once migrations have run. Bump it
/// together with a new step in `migrate` whenever the schema grows; steps are
/// additive and must leave existing rows intact.
const SCHEMA_VERSION: i64 = 1;

/// Failures surfaced by the library store. Absence of a record is never an
/// error here; lookups report it as `None` instead.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The store could not be opened at all: no usable home directory, an
    /// unwritable data directory, or a database file this build cannot use.
    /// Persistence stays off for the rest of the session; searching the
    /// catalog does not depend on it.
    #[error("library store unavailable: {0}")]
    Unavailable(String),
    /// A single read failed. The store handle stays valid; the user can retry
    /// the triggering action.
    #[error("library read failed: {0}")]
    ReadFailed(#[source] rusqlite::Error),
    /// A single write failed. SQLite applies each statement atomically, so no
    /// partial record is left behind.
    #[error("library write failed: {0}")]
    WriteFailed(#[source] rusqlite::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Handle to the opened library database.
///
/// Every operation other than opening is a method on this type, and the type
/// only exists once `open` has succeeded, so "store not ready" is not a state
/// a caller can reach. A failed open is terminal for the session: surface the
/// error and carry on without persistence rather than retrying.
///
/// The handle is single-threaded. The UI issues one operation at a time, and
/// each method runs as one implicit SQLite transaction, which is all the
/// isolation this schema needs.
pub struct LibraryStore {
    pub(crate) conn: Connection,
}

impl LibraryStore {
    /// Open (creating on first use) the library database in the per-user data
    /// directory and bring its schema up to date.
    pub fn open() -> StoreResult<Self> {
        let path = default_db_path()?;
        Self::open_at(&path)
    }

    /// Open the library database at an explicit path. Repeated opens are
    /// idempotent: each migration step runs exactly once per database file.
    pub fn open_at(path: &Path) -> StoreResult<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|err| {
                StoreError::Unavailable(format!("cannot create data directory: {err}"))
            })?;
        }

        let conn = Connection::open(path)
            .map_err(|err| StoreError::Unavailable(format!("cannot open database: {err}")))?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> StoreResult<Self> {
        migrate(&conn)?;
        Ok(Self { conn })
    }

    #[cfg(test)]
    pub(crate) fn open_in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|err| StoreError::Unavailable(format!("cannot open database: {err}")))?;
        Self::from_connection(conn)
    }
}

/// Walk the database from its stamped version up to `SCHEMA_VERSION`, one
/// step at a time. A file stamped with a version this build does not know is
/// refused outright instead of being guessed at.
fn migrate(conn: &Connection) -> StoreResult<()> {
    let mut version = stamped_version(conn)?;
    if version > SCHEMA_VERSION {
        return Err(StoreError::Unavailable(format!(
            "database schema version {version} is newer than this build supports"
        )));
    }

    while version < SCHEMA_VERSION {
        match version {
            0 => {
                conn.execute(
                    "CREATE TABLE IF NOT EXISTS books (
                        key TEXT PRIMARY KEY,
                        title TEXT NOT NULL,
                        authors TEXT NOT NULL,
                        first_publish_year INTEGER,
                        pages_median INTEGER,
                        description TEXT,
                        cover_id INTEGER,
                        is_read INTEGER NOT NULL DEFAULT 0
                    )",
                    [],
                )
                .map_err(StoreError::WriteFailed)?;
            }
            _ => {
                return Err(StoreError::Unavailable(format!(
                    "no migration step from schema version {version}"
                )));
            }
        }

        version += 1;
        conn.pragma_update(None, "user_version", version)
            .map_err(StoreError::WriteFailed)?;
    }

    Ok(())
}

fn stamped_version(conn: &Connection) -> StoreResult<i64> {
    conn.pragma_query_value(None, "user_version", |row| row.get(0))
        .map_err(StoreError::ReadFailed)
}

/// Resolve the absolute path of the SQLite file inside the user's home.
fn default_db_path() -> StoreResult<PathBuf> {
    let base_dirs = BaseDirs::new()
        .ok_or_else(|| StoreError::Unavailable("could not locate home directory".to_string()))?;
    Ok(base_dirs.home_dir().join(DATA_DIR_NAME).join(DB_FILE_NAME))
}

#[cfg(test)]
mod tests {
    use rusqlite::Connection;

    use super::{stamped_version, LibraryStore, StoreError, SCHEMA_VERSION};

    #[test]
    fn opening_stamps_the_current_schema_version() {
        let store = LibraryStore::open_in_memory().expect("open should succeed");
        let version = stamped_version(&store.conn).expect("version should be readable");
        assert_eq!(version, SCHEMA_VERSION);
    }

    #[test]
    fn opening_twice_is_idempotent() {
        let dir = std::env::temp_dir().join(format!(
            "book-library-manager-test-{}-idempotent",
            std::process::id()
        ));
        let path = dir.join("library.sqlite");
        let _ = std::fs::remove_dir_all(&dir);

        {
            let store = LibraryStore::open_at(&path).expect("first open should succeed");
            store
                .conn
                .execute(
                    "INSERT INTO books (key, title, authors) VALUES ('k', 'T', '[]')",
                    [],
                )
                .expect("insert should succeed");
        }

        let store = LibraryStore::open_at(&path).expect("second open should succeed");
        let count: i64 = store
            .conn
            .query_row("SELECT COUNT(*) FROM books", [], |row| row.get(0))
            .expect("count should be readable");
        assert_eq!(count, 1, "reopening must not disturb existing rows");
        assert_eq!(
            stamped_version(&store.conn).expect("version should be readable"),
            SCHEMA_VERSION
        );

        drop(store);
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn refuses_a_database_from_the_future() {
        let dir = std::env::temp_dir().join(format!(
            "book-library-manager-test-{}-future",
            std::process::id()
        ));
        let path = dir.join("library.sqlite");
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).expect("temp dir should be creatable");

        {
            let conn = Connection::open(&path).expect("raw open should succeed");
            conn.pragma_update(None, "user_version", SCHEMA_VERSION + 7)
                .expect("stamping should succeed");
        }

        let result = LibraryStore::open_at(&path);
        assert!(matches!(result, Err(StoreError::Unavailable(_))));

        let _ = std::fs::remove_dir_all(&dir);
    }
}
