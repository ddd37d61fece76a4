//! Validation results

use serde::{Deserialize, Serialize};

/// Outcome of a read-only precondition check
///
/// Each validation route reports the outcome under its own flag name
/// (`canCreate`, `canPlace`, ...), so the wire form is produced by
/// [`ValidationResult::to_json`] rather than by serializing this struct.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub allowed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl ValidationResult {
    pub fn allow() -> Self {
        Self {
            allowed: true,
            reason: None,
        }
    }

    pub fn deny(reason: impl Into<String>) -> Self {
        Self {
            allowed: false,
            reason: Some(reason.into()),
        }
    }

    pub fn is_allowed(&self) -> bool {
        self.allowed
    }

    /// `{<flag>: allowed, reason?}`
    pub fn to_json(&self, flag: &str) -> serde_json::Value {
        let mut map = serde_json::Map::new();
        map.insert(flag.to_string(), serde_json::Value::Bool(self.allowed));
        if let Some(reason) = &self.reason {
            map.insert("reason".into(), serde_json::Value::String(reason.clone()));
        }
        serde_json::Value::Object(map)
    }
}
