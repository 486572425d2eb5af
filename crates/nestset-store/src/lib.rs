//! nestset store - SQLite persistence for nested-set trees
//!
//! Provides:
//! - Connection helpers (`db`) enabling foreign keys and WAL
//! - Embedded SQL migrations with SHA-256 checksums
//! - `SqliteRowStore`, the `RowStore` implementation issuing one
//!   `UPDATE ... CASE` statement per range shift

pub mod db;
pub mod errors;
pub mod migrations;
pub mod repo;

// Re-export key types
pub use errors::Result;
pub use migrations::apply_migrations;
pub use repo::SqliteRowStore;
