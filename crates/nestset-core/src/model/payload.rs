use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Caller-owned node attributes
///
/// Stored as a JSON object. Tree mechanics never read it; the only rule is
/// that it must not carry the configured structural column names (see
/// `TreeConfig::reserved_keys`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct Payload {
    data: BTreeMap<String, serde_json::Value>,
}

impl Payload {
    /// Create a new empty Payload instance
    pub fn new() -> Self {
        Self {
            data: BTreeMap::new(),
        }
    }

    /// Payload with a single `name` attribute
    pub fn named(name: impl Into<String>) -> Self {
        let mut payload = Self::new();
        payload.set("name", serde_json::Value::String(name.into()));
        payload
    }

    /// Get a value by key
    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.data.get(key)
    }

    /// Convenience accessor for the `name` attribute
    pub fn name(&self) -> Option<&str> {
        self.get("name").and_then(|v| v.as_str())
    }

    /// Set a value by key
    pub fn set(&mut self, key: impl Into<String>, value: serde_json::Value) {
        self.data.insert(key.into(), value);
    }

    /// Remove a value by key
    pub fn remove(&mut self, key: &str) -> Option<serde_json::Value> {
        self.data.remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.data.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.data.keys()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Serialize to the JSON text stored in the payload column
    pub fn to_json_string(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.data)
    }

    /// Parse the JSON text stored in the payload column
    pub fn from_json_str(s: &str) -> Result<Self, serde_json::Error> {
        Ok(Self {
            data: serde_json::from_str(s)?,
        })
    }
}

impl From<BTreeMap<String, serde_json::Value>> for Payload {
    fn from(data: BTreeMap<String, serde_json::Value>) -> Self {
        Self { data }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_named_payload() {
        let payload = Payload::named("etc");
        assert_eq!(payload.name(), Some("etc"));
        assert_eq!(payload.len(), 1);
    }

    #[test]
    fn test_json_text_is_key_ordered() {
        let mut payload = Payload::new();
        payload.set("zeta", json!(1));
        payload.set("alpha", json!("x"));

        let text = payload.to_json_string().unwrap();
        assert_eq!(text, r#"{"alpha":"x","zeta":1}"#);
        assert_eq!(Payload::from_json_str(&text).unwrap(), payload);
    }

    #[test]
    fn test_rejects_non_object_json() {
        assert!(Payload::from_json_str("[1,2]").is_err());
    }
}
