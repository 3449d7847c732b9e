//! Todo operations used by the web handlers and the startup sequence.
//!
//! Each operation is one or two calls into a [`TodoStore`]. Failures are
//! returned immediately as a [`TodoError`]; nothing is retried.

use crate::db::{TodoStore, now_ms};
use crate::error::{TodoError, TodoResult};
use crate::types::{Todo, TodoId};
use chrono::Duration;
use std::sync::Arc;
use tracing::{debug, info};

/// Records older than this many days are swept at startup.
pub const DEFAULT_RETENTION_DAYS: i64 = 30;

/// Todo operations over a shared store.
pub struct TodoService<S: TodoStore> {
    store: Arc<S>,
    retention: Duration,
}

impl<S: TodoStore> Clone for TodoService<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            retention: self.retention,
        }
    }
}

impl<S: TodoStore> TodoService<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            retention: Duration::days(DEFAULT_RETENTION_DAYS),
        }
    }

    pub fn with_retention(mut self, retention: Duration) -> Self {
        self.retention = retention;
        self
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn retention(&self) -> Duration {
        self.retention
    }

    /// All live todos, ordered by id.
    pub fn list(&self) -> TodoResult<Vec<Todo>> {
        self.store.find_all()
    }

    /// Create a todo unless a live todo already has this title.
    ///
    /// The lookup and the insert are separate store calls, so two concurrent
    /// creates with the same title can both succeed.
    pub fn create(&self, title: &str, priority: &str) -> TodoResult<TodoId> {
        match self.store.find_by_title(title) {
            Ok(_) => return Err(TodoError::DuplicateTitle(title.to_string())),
            Err(e) if e.is_not_found() => {}
            Err(e) => return Err(e),
        }

        let id = self.store.insert(&Todo::new(title, priority, now_ms()))?;
        debug!(id, title, priority, "Todo created");
        Ok(id)
    }

    /// Replace the title and priority of an existing todo.
    ///
    /// Title uniqueness is not re-checked here.
    pub fn update(&self, id: TodoId, title: &str, priority: &str) -> TodoResult<()> {
        let mut todo = self.store.find_by_id(id)?;
        todo.title = title.to_string();
        todo.priority = priority.to_string();
        self.store.save(&todo)?;
        debug!(id, title, priority, "Todo updated");
        Ok(())
    }

    /// Flip the completed flag. Returns the new value.
    pub fn toggle_completed(&self, id: TodoId) -> TodoResult<bool> {
        let mut todo = self.store.find_by_id(id)?;
        todo.completed = !todo.completed;
        self.store.save(&todo)?;
        debug!(id, completed = todo.completed, "Todo toggled");
        Ok(todo.completed)
    }

    /// Soft-delete a todo. Deleting a missing todo succeeds.
    pub fn delete(&self, id: TodoId) -> TodoResult<()> {
        self.store.soft_delete(id)?;
        debug!(id, "Todo deleted");
        Ok(())
    }

    /// Sweep todos older than the retention period, measured from now.
    pub fn cleanup_old_todos(&self) -> TodoResult<usize> {
        self.cleanup_old_todos_at(now_ms())
    }

    /// Sweep todos created strictly before `now - retention`.
    pub fn cleanup_old_todos_at(&self, now: i64) -> TodoResult<usize> {
        let cutoff = now.saturating_sub(self.retention.num_milliseconds());
        let swept = self.store.delete_created_before(cutoff)?;
        info!(
            swept,
            retention_days = self.retention.num_days(),
            "Old todos cleaned up"
        );
        Ok(swept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Store whose lookups fail with a storage error and which records inserts.
    #[derive(Default)]
    struct BrokenLookupStore {
        inserts: Mutex<Vec<Todo>>,
    }

    impl TodoStore for BrokenLookupStore {
        fn find_all(&self) -> TodoResult<Vec<Todo>> {
            Ok(self.inserts.lock().unwrap().clone())
        }

        fn find_by_id(&self, id: TodoId) -> TodoResult<Todo> {
            Err(TodoError::not_found_id(id))
        }

        fn find_by_title(&self, _title: &str) -> TodoResult<Todo> {
            Err(TodoError::Storage(rusqlite::Error::InvalidQuery))
        }

        fn insert(&self, todo: &Todo) -> TodoResult<TodoId> {
            let mut inserts = self.inserts.lock().unwrap();
            inserts.push(todo.clone());
            Ok(inserts.len() as TodoId)
        }

        fn save(&self, todo: &Todo) -> TodoResult<()> {
            Err(TodoError::not_found_id(todo.id))
        }

        fn soft_delete(&self, _id: TodoId) -> TodoResult<()> {
            Ok(())
        }

        fn delete_created_before(&self, _cutoff_ms: i64) -> TodoResult<usize> {
            Ok(0)
        }
    }

    #[test]
    fn create_propagates_lookup_failure_without_inserting() {
        let store = Arc::new(BrokenLookupStore::default());
        let service = TodoService::new(Arc::clone(&store));

        let err = service.create("Buy milk", "High").unwrap_err();

        assert!(matches!(err, TodoError::Storage(_)));
        assert!(store.inserts.lock().unwrap().is_empty());
    }

    #[test]
    fn update_of_missing_todo_is_not_found() {
        let service = TodoService::new(Arc::new(BrokenLookupStore::default()));

        let err = service.update(42, "x", "y").unwrap_err();

        assert!(err.is_not_found());
    }

    #[test]
    fn default_retention_is_thirty_days() {
        let service = TodoService::new(Arc::new(BrokenLookupStore::default()));
        assert_eq!(service.retention().num_days(), DEFAULT_RETENTION_DAYS);

        let service = service.with_retention(Duration::days(7));
        assert_eq!(service.retention().num_days(), 7);
    }

    #[test]
    fn cleanup_cutoff_saturates_instead_of_overflowing() {
        let service = TodoService::new(Arc::new(BrokenLookupStore::default()));

        assert_eq!(service.cleanup_old_todos_at(i64::MIN).unwrap(), 0);
    }
}
