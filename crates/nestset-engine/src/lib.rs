//! nestset engine - Orchestration layer
//!
//! Provides high-level command orchestration over a `NestedSet` and any
//! `RowStore`. Commands and queries load what they need into a fresh
//! arena, run one core operation, and emit the start/end/error log events.

pub mod commands;

pub use commands::tree_command::{apply_tree_command, NodeSpec, TreeCommand, TreeCommandResult};
pub use commands::tree_query::{apply_tree_query, TreeQuery, TreeQueryResult};
