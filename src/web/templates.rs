//! HTML templates for the web UI.
//!
//! The index page is loaded from `<templates_dir>/index.html` at startup.
//! When that file is missing, the copy embedded at compile time is used.

use crate::types::{Todo, TodoId};
use serde::Serialize;
use std::path::Path;
use tera::{Context, Tera};
use tracing::{info, warn};

/// Template name; the `.html` suffix turns on tera's autoescaping.
pub const INDEX_TEMPLATE_NAME: &str = "index.html";

/// The index page template, embedded at compile time.
pub const INDEX_TEMPLATE: &str = include_str!("../../templates/index.html");

/// One table row as seen by the template.
#[derive(Debug, Serialize)]
struct TodoRow<'a> {
    id: TodoId,
    title: &'a str,
    completed: bool,
    priority: &'a str,
    created_at: String,
}

impl<'a> From<&'a Todo> for TodoRow<'a> {
    fn from(todo: &'a Todo) -> Self {
        Self {
            id: todo.id,
            title: &todo.title,
            completed: todo.completed,
            priority: &todo.priority,
            created_at: todo.created_date(),
        }
    }
}

/// Parsed page templates.
pub struct Templates {
    tera: Tera,
}

impl Templates {
    /// Load the index template from `dir`, falling back to the embedded copy.
    pub fn load(dir: &Path) -> tera::Result<Self> {
        let path = dir.join(INDEX_TEMPLATE_NAME);
        if !path.is_file() {
            warn!(path = %path.display(), "Index template not found, using embedded copy");
            return Self::embedded();
        }

        let mut tera = Tera::default();
        tera.add_template_file(&path, Some(INDEX_TEMPLATE_NAME))?;
        info!(path = %path.display(), "Index template loaded");
        Ok(Self { tera })
    }

    /// Use only the embedded templates.
    pub fn embedded() -> tera::Result<Self> {
        let mut tera = Tera::default();
        tera.add_raw_template(INDEX_TEMPLATE_NAME, INDEX_TEMPLATE)?;
        Ok(Self { tera })
    }

    /// Render the index page for the given listing.
    pub fn render_index(&self, todos: &[Todo]) -> tera::Result<String> {
        let rows: Vec<TodoRow<'_>> = todos.iter().map(TodoRow::from).collect();
        let mut context = Context::new();
        context.insert("todos", &rows);
        self.tera.render(INDEX_TEMPLATE_NAME, &context)
    }
}
