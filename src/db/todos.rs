//! Todo CRUD queries.

use super::{Database, TodoStore, now_ms};
use crate::error::{TodoError, TodoResult};
use crate::types::{Todo, TodoId};
use rusqlite::{Connection, OptionalExtension, Row, params};

const TODO_COLUMNS: &str = "id, title, completed, priority, created_at, updated_at, deleted_at";

pub fn parse_todo_row(row: &Row) -> rusqlite::Result<Todo> {
    Ok(Todo {
        id: row.get("id")?,
        title: row.get("title")?,
        completed: row.get("completed")?,
        priority: row.get("priority")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
        deleted_at: row.get("deleted_at")?,
    })
}

/// Internal helper to get a live todo using an existing connection.
fn get_todo_internal(conn: &Connection, id: TodoId) -> TodoResult<Option<Todo>> {
    let sql = format!(
        "SELECT {} FROM todos WHERE id = ?1 AND deleted_at IS NULL",
        TODO_COLUMNS
    );
    let todo = conn
        .query_row(&sql, params![id], parse_todo_row)
        .optional()?;
    Ok(todo)
}

impl TodoStore for Database {
    fn find_all(&self) -> TodoResult<Vec<Todo>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {} FROM todos WHERE deleted_at IS NULL ORDER BY id ASC",
                TODO_COLUMNS
            );
            let mut stmt = conn.prepare(&sql)?;
            let todos = stmt
                .query_map([], parse_todo_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(todos)
        })
    }

    fn find_by_id(&self, id: TodoId) -> TodoResult<Todo> {
        self.with_conn(|conn| {
            get_todo_internal(conn, id)?.ok_or_else(|| TodoError::not_found_id(id))
        })
    }

    fn find_by_title(&self, title: &str) -> TodoResult<Todo> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {} FROM todos WHERE title = ?1 AND deleted_at IS NULL
                 ORDER BY id ASC LIMIT 1",
                TODO_COLUMNS
            );
            conn.query_row(&sql, params![title], parse_todo_row)
                .optional()?
                .ok_or_else(|| TodoError::not_found_title(title))
        })
    }

    fn insert(&self, todo: &Todo) -> TodoResult<TodoId> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO todos (title, completed, priority, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?4)",
                params![todo.title, todo.completed, todo.priority, todo.created_at],
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    fn save(&self, todo: &Todo) -> TodoResult<()> {
        let now = now_ms();
        self.with_conn(|conn| {
            let rows_affected = conn.execute(
                "UPDATE todos SET title = ?1, completed = ?2, priority = ?3, updated_at = ?4
                 WHERE id = ?5 AND deleted_at IS NULL",
                params![todo.title, todo.completed, todo.priority, now, todo.id],
            )?;

            if rows_affected == 0 {
                return Err(TodoError::not_found_id(todo.id));
            }
            Ok(())
        })
    }

    fn soft_delete(&self, id: TodoId) -> TodoResult<()> {
        let now = now_ms();
        self.with_conn(|conn| {
            conn.execute(
                "UPDATE todos SET deleted_at = ?1, updated_at = ?1
                 WHERE id = ?2 AND deleted_at IS NULL",
                params![now, id],
            )?;
            Ok(())
        })
    }

    fn delete_created_before(&self, cutoff_ms: i64) -> TodoResult<usize> {
        let now = now_ms();
        self.with_conn(|conn| {
            let swept = conn.execute(
                "UPDATE todos SET deleted_at = ?1, updated_at = ?1
                 WHERE created_at < ?2 AND deleted_at IS NULL",
                params![now, cutoff_ms],
            )?;
            Ok(swept)
        })
    }
}

impl Database {
    /// Number of soft-deleted rows still kept in the table.
    pub fn count_deleted(&self) -> TodoResult<i64> {
        self.with_conn(|conn| {
            let count = conn.query_row(
                "SELECT COUNT(*) FROM todos WHERE deleted_at IS NOT NULL",
                [],
                |row| row.get(0),
            )?;
            Ok(count)
        })
    }
}
