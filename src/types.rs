//! Core types for the todo manager.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Todo identifier, assigned by the database and never reused.
pub type TodoId = i64;

/// A todo record.
///
/// Timestamps are milliseconds since the Unix epoch (UTC).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Todo {
    pub id: TodoId,
    pub title: String,
    pub completed: bool,
    /// Free-text label, stored as given.
    pub priority: String,
    pub created_at: i64,
    pub updated_at: i64,
    /// Set when the record has been soft-deleted.
    pub deleted_at: Option<i64>,
}

impl Todo {
    /// Build an unsaved record. The id is assigned on insert.
    pub fn new(title: impl Into<String>, priority: impl Into<String>, now: i64) -> Self {
        Self {
            id: 0,
            title: title.into(),
            completed: false,
            priority: priority.into(),
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    /// Creation date as `YYYY-MM-DD` in UTC.
    pub fn created_date(&self) -> String {
        format_date(self.created_at)
    }
}

/// Format a millisecond timestamp as a `YYYY-MM-DD` date.
pub fn format_date(ms: i64) -> String {
    DateTime::<Utc>::from_timestamp_millis(ms)
        .map(|dt| dt.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "-".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_todo_starts_incomplete() {
        let todo = Todo::new("Buy milk", "High", 1_000);
        assert!(!todo.completed);
        assert_eq!(todo.created_at, todo.updated_at);
        assert!(todo.deleted_at.is_none());
    }

    #[test]
    fn format_date_uses_utc_calendar_day() {
        // 2024-03-01T23:59:59Z
        assert_eq!(format_date(1_709_337_599_000), "2024-03-01");
        assert_eq!(format_date(0), "1970-01-01");
    }
}
