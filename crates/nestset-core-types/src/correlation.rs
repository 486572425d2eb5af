//! Correlation ids for structural operations
//!
//! Every save, move or destroy runs under one `OperationId`. The commit
//! session carries it so that shift, insert and delete log lines emitted
//! by different layers can be tied back to the operation that issued them.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for one logical tree operation
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OperationId(String);

impl OperationId {
    /// Generate a new random OperationId using UUIDv7
    pub fn new() -> Self {
        Self(Uuid::now_v7().to_string())
    }

    /// Get the string representation
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Create from an existing string (for deserialization)
    pub fn from_string(s: String) -> Self {
        Self(s)
    }
}

impl Default for OperationId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for OperationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_id_generation() {
        let id1 = OperationId::new();
        let id2 = OperationId::new();

        assert_ne!(id1, id2);
        assert!(!id1.as_str().is_empty());
    }

    #[test]
    fn test_operation_id_display() {
        let id = OperationId::new();
        assert_eq!(format!("{}", id), id.as_str());
    }

    #[test]
    fn test_serialization() {
        let id = OperationId::new();
        let json = serde_json::to_string(&id).unwrap();
        let deserialized: OperationId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, deserialized);
    }
}
