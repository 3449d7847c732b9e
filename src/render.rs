//! Terminal table view of the todo list.

use crate::types::Todo;
use comfy_table::{Table, presets::UTF8_FULL};

pub const COMPLETED_GLYPH: &str = "✅";
pub const PENDING_GLYPH: &str = "❌";

/// Format todos as a table with Title, Completed, Priority and CreatedAt columns.
pub fn render_table(todos: &[Todo]) -> String {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_header(vec!["Title", "Completed", "Priority", "CreatedAt"]);

    for todo in todos {
        let glyph = if todo.completed {
            COMPLETED_GLYPH
        } else {
            PENDING_GLYPH
        };
        table.add_row(vec![
            todo.title.clone(),
            glyph.to_string(),
            todo.priority.clone(),
            todo.created_date(),
        ]);
    }

    table.to_string()
}

/// Print the table to stdout.
pub fn print_table(todos: &[Todo]) {
    println!("{}", render_table(todos));
}
