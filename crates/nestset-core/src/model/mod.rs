pub mod config;
pub mod node;
pub mod payload;

pub use config::TreeConfig;
pub use node::{NodeId, NodeRow, Position, Scope, Span};
pub use payload::Payload;
