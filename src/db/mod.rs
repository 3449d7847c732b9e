//! Database layer for the todo manager.

pub mod todos;

use crate::error::{TodoError, TodoResult};
use crate::types::{Todo, TodoId};
use rusqlite::Connection;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;

mod embedded {
    use refinery::embed_migrations;
    embed_migrations!("migrations");
}

/// Storage operations on todo records.
///
/// Every read excludes soft-deleted rows. Implemented by [`Database`]; tests
/// can substitute their own implementation.
pub trait TodoStore: Send + Sync {
    /// All live todos ordered by id ascending.
    fn find_all(&self) -> TodoResult<Vec<Todo>>;

    fn find_by_id(&self, id: TodoId) -> TodoResult<Todo>;

    /// First live todo with exactly this title (case-sensitive).
    fn find_by_title(&self, title: &str) -> TodoResult<Todo>;

    /// Insert a record and return its assigned id. The record's own id is ignored.
    fn insert(&self, todo: &Todo) -> TodoResult<TodoId>;

    /// Overwrite every mutable field of the live record with `todo.id`.
    fn save(&self, todo: &Todo) -> TodoResult<()>;

    /// Soft-delete by id. Missing or already deleted ids are not an error.
    fn soft_delete(&self, id: TodoId) -> TodoResult<()>;

    /// Soft-delete every live record created strictly before `cutoff_ms`.
    /// Returns the number of records swept.
    fn delete_created_before(&self, cutoff_ms: i64) -> TodoResult<usize>;
}

/// Database handle wrapping a SQLite connection.
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Open or create the database at the given path.
    ///
    /// Any failure here is reported as [`TodoError::ConnectionFailure`].
    pub fn open<P: AsRef<Path>>(path: P) -> TodoResult<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(TodoError::connection)?;
        }

        let conn = Connection::open(path).map_err(TodoError::connection)?;

        // WAL lets the index page read while a write is in flight
        conn.execute_batch(
            "PRAGMA journal_mode=WAL;
             PRAGMA busy_timeout=5000;",
        )
        .map_err(TodoError::connection)?;

        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };

        db.run_migrations()?;
        debug!(path = %path.display(), "Database opened");

        Ok(db)
    }

    /// Open an in-memory database (for testing).
    pub fn open_in_memory() -> TodoResult<Self> {
        let conn = Connection::open_in_memory().map_err(TodoError::connection)?;

        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };

        db.run_migrations()?;

        Ok(db)
    }

    /// Run database migrations.
    fn run_migrations(&self) -> TodoResult<()> {
        let mut conn = self.lock();
        embedded::migrations::runner()
            .run(&mut *conn)
            .map_err(TodoError::connection)?;
        Ok(())
    }

    fn lock(&self) -> MutexGuard<'_, Connection> {
        // Recover from poisoning; each statement is atomic on its own.
        self.conn.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Execute a function with exclusive access to the connection.
    pub fn with_conn<F, T>(&self, f: F) -> TodoResult<T>
    where
        F: FnOnce(&Connection) -> TodoResult<T>,
    {
        let conn = self.lock();
        f(&conn)
    }
}

/// Get the current timestamp in milliseconds.
pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
