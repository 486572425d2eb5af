//! Repository layer - SQLite implementation of the row store

pub mod hydration;
pub mod sql;
mod sqlite_repo;

pub use sqlite_repo::SqliteRowStore;
