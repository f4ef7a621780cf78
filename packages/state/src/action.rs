use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Message handed to every reducer on dispatch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    #[serde(rename = "type")]
    pub kind: String,

    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub payload: Value,
}

impl Action {
    /// Action sent to a reducer when it is registered
    pub const INIT: &'static str = "@@init";

    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            payload: Value::Null,
        }
    }

    pub fn with_payload(kind: impl Into<String>, payload: Value) -> Self {
        Self {
            kind: kind.into(),
            payload,
        }
    }

    pub fn init() -> Self {
        Self::new(Self::INIT)
    }

    pub fn is(&self, kind: &str) -> bool {
        self.kind == kind
    }
}
