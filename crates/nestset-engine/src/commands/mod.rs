//! Command orchestration layer.
//!
//! Provides high-level command functions that coordinate between
//! core tree logic and a row store.

pub mod tree_command;
pub mod tree_query;
