pub mod memory_store;
pub mod store;

pub use memory_store::MemoryRowStore;
pub use store::{RangePredicate, RowStore};
