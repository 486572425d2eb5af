pub mod subtree;
pub mod tree_queries;

pub use subtree::{load_subtree, LoadedSubtree};
