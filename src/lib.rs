//! Todo list manager library.
//!
//! This module exports the core components for testing and integration.

pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod render;
pub mod service;
pub mod types;
pub mod web;
