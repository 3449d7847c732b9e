//! Web UI HTTP server module.
//!
//! Serves the todo list page, the form endpoints that mutate it, and the
//! static asset directory.

mod server;
pub mod templates;

pub use server::{AppState, build_router, start_server};
