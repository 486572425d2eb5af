//! nestset core - nested-set tree engine
//!
//! Hierarchies are stored as flat rows carrying `[left, right]` intervals,
//! so ancestor, descendant and subtree reads are interval comparisons.
//! This crate provides:
//! - Node, scope, payload and column-layout models
//! - The `RowStore` contract and an in-memory implementation
//! - Interval assignment for staged subtrees and single-statement range shifts
//! - The commit coordinator (`NestedSet`) for save, move and destroy
//! - Stateless tree queries and scope invariant checks
//! - The structured error facility and logging macros shared by the workspace

pub use nestset_core_types as core_types;

pub mod errors;
pub mod logging_facility;
pub mod model;
pub mod ops;
pub mod queries;
pub mod rules;
pub mod tree;

// Re-export commonly used types
pub use errors::{ExError, ExErrorKind, Result, StoreResult, TreeError};
pub use model::{NodeId, NodeRow, Payload, Position, Scope, Span, TreeConfig};
pub use ops::{MemoryRowStore, RangePredicate, RowStore};
pub use queries::LoadedSubtree;
pub use tree::{
    DestroyReport, MoveReport, NestedSet, NodeHandle, NodeState, SaveReport, Shift, TreeArena,
};
