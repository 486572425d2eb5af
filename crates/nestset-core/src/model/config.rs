//! Nested-set table configuration
//!
//! Column names are chosen once, validated, and handed to the row store.
//! Every name ends up interpolated into SQL, so each one must be a plain
//! identifier.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::errors::{Result, TreeError};

/// Table and column layout of a nested-set store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TreeConfig {
    pub table: String,
    pub id_column: String,
    pub parent_column: String,
    pub left_column: String,
    pub right_column: String,
    pub level_column: String,
    /// Maintain `level_column` (root = 1) on insert and move
    pub track_level: bool,
    pub scope_column: String,
    pub payload_column: String,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            table: "nodes".to_string(),
            id_column: "id".to_string(),
            parent_column: "parent_id".to_string(),
            left_column: "lft".to_string(),
            right_column: "rgt".to_string(),
            level_column: "level".to_string(),
            track_level: true,
            scope_column: "scope".to_string(),
            payload_column: "payload".to_string(),
        }
    }
}

impl TreeConfig {
    /// Default layout without a level column
    pub fn without_levels() -> Self {
        Self {
            track_level: false,
            ..Self::default()
        }
    }

    /// Level column name when levels are tracked
    pub fn level_column(&self) -> Option<&str> {
        self.track_level.then_some(self.level_column.as_str())
    }

    /// Parse a configuration from TOML text; missing keys take defaults
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: TreeConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| TreeError::Configuration {
            reason: format!("Cannot read {}: {}", path.display(), e),
        })?;
        Self::from_toml_str(&text)
    }

    /// Structural column names; callers may not use them as payload keys
    pub fn reserved_keys(&self) -> Vec<&str> {
        let mut keys = vec![
            self.id_column.as_str(),
            self.parent_column.as_str(),
            self.left_column.as_str(),
            self.right_column.as_str(),
            self.scope_column.as_str(),
            "parent",
        ];
        if let Some(level) = self.level_column() {
            keys.push(level);
        }
        keys
    }

    /// Check identifiers and that no two columns share a name
    pub fn validate(&self) -> Result<()> {
        let mut columns = vec![
            &self.id_column,
            &self.parent_column,
            &self.left_column,
            &self.right_column,
            &self.scope_column,
            &self.payload_column,
        ];
        if self.track_level {
            columns.push(&self.level_column);
        }

        for name in std::iter::once(&self.table).chain(columns.iter().copied()) {
            if !is_identifier(name) {
                return Err(TreeError::Configuration {
                    reason: format!("'{}' is not a valid SQL identifier", name),
                });
            }
        }

        let mut seen = std::collections::HashSet::new();
        for name in columns {
            if !seen.insert(name.to_ascii_lowercase()) {
                return Err(TreeError::Configuration {
                    reason: format!("column '{}' is configured twice", name),
                });
            }
        }

        Ok(())
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
