use editron_pointer::Pointer;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
        }
    }
}

/// One issue reported by a validator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorRecord {
    pub pointer: Pointer,
    pub message: String,
    pub severity: Severity,

    /// Validator-specific issue data, kept as reported
    #[serde(default)]
    pub raw: Value,
}

impl ErrorRecord {
    pub fn error(pointer: Pointer, message: impl Into<String>) -> Self {
        Self {
            pointer,
            message: message.into(),
            severity: Severity::Error,
            raw: Value::Null,
        }
    }

    pub fn warning(pointer: Pointer, message: impl Into<String>) -> Self {
        Self {
            pointer,
            message: message.into(),
            severity: Severity::Warning,
            raw: Value::Null,
        }
    }

    pub fn with_raw(mut self, raw: Value) -> Self {
        self.raw = raw;
        self
    }

    pub fn is_warning(&self) -> bool {
        self.severity == Severity::Warning
    }

    /// Store representation
    pub fn to_value(&self) -> Value {
        let mut map = Map::new();
        map.insert("pointer".into(), Value::String(self.pointer.to_string()));
        map.insert("message".into(), Value::String(self.message.clone()));
        map.insert("severity".into(), Value::String(self.severity.as_str().into()));
        map.insert("raw".into(), self.raw.clone());
        Value::Object(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_representation_reads_back() {
        let record = ErrorRecord::warning(Pointer::parse("#/a").unwrap(), "check me")
            .with_raw(serde_json::json!({ "code": "min-length" }));

        let back: ErrorRecord = serde_json::from_value(record.to_value()).unwrap();

        assert_eq!(back, record);
        assert!(back.is_warning());
    }
}
