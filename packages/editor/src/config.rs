use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_CONFIG_NAME: &str = "editron.config.json";

/// Editor configuration file format
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditronConfig {
    /// Prefix for the DOM ids of rendered editors
    #[serde(default = "default_id_prefix")]
    pub id_prefix: String,

    /// Controls offered by array editors
    #[serde(default)]
    pub array: ArrayOptions,

    #[serde(default)]
    pub validation: ValidationOptions,
}

fn default_id_prefix() -> String {
    "editron-".to_string()
}

fn enabled() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArrayOptions {
    /// Show the item index next to each child
    #[serde(default)]
    pub show_index: bool,

    #[serde(default = "enabled")]
    pub add: bool,

    #[serde(default = "enabled")]
    pub remove: bool,

    #[serde(default = "enabled", rename = "move")]
    pub move_items: bool,

    /// Offer inserting between items, not only appending
    #[serde(default = "enabled")]
    pub insert: bool,
}

impl Default for ArrayOptions {
    fn default() -> Self {
        Self {
            show_index: false,
            add: true,
            remove: true,
            move_items: true,
            insert: true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationOptions {
    /// Revalidate the edited location on every value change
    #[serde(default)]
    pub live_validation: bool,
}

impl EditronConfig {
    /// Load config from a directory
    pub fn load(dir: impl AsRef<Path>) -> anyhow::Result<Self> {
        let config_path = dir.as_ref().join(DEFAULT_CONFIG_NAME);

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: EditronConfig = serde_json::from_str(&content)?;
            Ok(config)
        } else {
            // Return default config if none exists
            Ok(EditronConfig::default())
        }
    }
}

impl Default for EditronConfig {
    fn default() -> Self {
        Self {
            id_prefix: default_id_prefix(),
            array: ArrayOptions::default(),
            validation: ValidationOptions::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config() {
        let json = r#"{
            "idPrefix": "form-",
            "array": { "showIndex": true, "move": false },
            "validation": { "liveValidation": true }
        }"#;

        let config: EditronConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.id_prefix, "form-");
        assert!(config.array.show_index);
        assert!(!config.array.move_items);
        assert!(config.array.insert);
        assert!(config.validation.live_validation);
    }

    #[test]
    fn test_default_config() {
        let config = EditronConfig::default();
        assert_eq!(config.id_prefix, "editron-");
        assert_eq!(config.array, ArrayOptions::default());
    }

    #[test]
    fn test_load_from_directory() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(EditronConfig::load(dir.path()).unwrap(), EditronConfig::default());

        std::fs::write(dir.path().join(DEFAULT_CONFIG_NAME), r#"{ "array": { "add": false } }"#).unwrap();
        let config = EditronConfig::load(dir.path()).unwrap();
        assert!(!config.array.add);
        assert_eq!(config.id_prefix, "editron-");
    }

    #[test]
    fn test_load_rejects_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(DEFAULT_CONFIG_NAME), "{ not json").unwrap();
        assert!(EditronConfig::load(dir.path()).is_err());
    }
}
