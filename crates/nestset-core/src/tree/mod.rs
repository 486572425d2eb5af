pub mod arena;
pub mod assign;
pub mod nested_set;
pub mod session;
pub mod shift;

pub use arena::{NodeHandle, NodeState, TreeArena, TreeNode};
pub use assign::assign;
pub use nested_set::{DestroyReport, MoveReport, NestedSet};
pub use session::{CommitSession, SaveReport};
pub use shift::{EdgeRange, Shift};
