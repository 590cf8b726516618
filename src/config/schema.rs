//! KDL schema for `backlog/config.kdl`.
//!
//! This module provides:
//! - A Rust struct representing the KDL schema
//! - Conversion to/from KDL documents
//! - Validation

use kdl::{KdlDocument, KdlEntry, KdlNode, KdlValue};
use serde::{Deserialize, Serialize};

/// Known configuration keys, in the order they are written.
pub const CONFIG_KEYS: [&str; 2] = ["project-name", "default-editor"];

/// Project preferences stored in config.kdl.
///
/// # KDL Schema
///
/// ```kdl
/// project-name "My Project"
/// default-editor "nvim -u NONE"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BacklogConfig {
    /// Human-readable project name shown in the views
    pub project_name: Option<String>,

    /// Editor command used for task bodies (may include arguments)
    pub default_editor: Option<String>,
}

impl BacklogConfig {
    /// Create an empty config with no values set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate the config values.
    ///
    /// Returns an error message if any value is invalid.
    pub fn validate(&self) -> Result<(), String> {
        if let Some(ref editor) = self.default_editor {
            if editor.trim().is_empty() {
                return Err("default-editor cannot be empty".to_string());
            }
        }
        if let Some(ref name) = self.project_name {
            if name.contains('\n') {
                return Err("project-name must be a single line".to_string());
            }
        }
        Ok(())
    }

    /// Parse config from a KDL document. Unknown nodes are ignored.
    pub fn from_kdl(doc: &KdlDocument) -> Self {
        Self {
            project_name: first_string(doc, "project-name"),
            default_editor: first_string(doc, "default-editor"),
        }
    }

    /// Convert config to a KDL document.
    pub fn to_kdl(&self) -> KdlDocument {
        let mut doc = KdlDocument::new();

        if let Some(ref name) = self.project_name {
            let mut node = KdlNode::new("project-name");
            node.push(KdlEntry::new(KdlValue::String(name.clone())));
            doc.nodes_mut().push(node);
        }

        if let Some(ref editor) = self.default_editor {
            let mut node = KdlNode::new("default-editor");
            node.push(KdlEntry::new(KdlValue::String(editor.clone())));
            doc.nodes_mut().push(node);
        }

        doc
    }

    /// Merge another config into this one.
    /// Values from `other` override values in `self` if they are Some.
    pub fn merge(&mut self, other: &BacklogConfig) {
        if other.project_name.is_some() {
            self.project_name = other.project_name.clone();
        }
        if other.default_editor.is_some() {
            self.default_editor = other.default_editor.clone();
        }
    }

    /// Get a value by its KDL key.
    pub fn get(&self, key: &str) -> Option<Option<&str>> {
        match key {
            "project-name" => Some(self.project_name.as_deref()),
            "default-editor" => Some(self.default_editor.as_deref()),
            _ => None,
        }
    }

    /// Set a value by its KDL key. Returns an error for unknown keys.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), String> {
        let value = Some(value.to_string());
        match key {
            "project-name" => self.project_name = value,
            "default-editor" => self.default_editor = value,
            _ => {
                return Err(format!(
                    "unknown config key '{}' (expected one of: {})",
                    key,
                    CONFIG_KEYS.join(", ")
                ));
            }
        }
        self.validate()
    }
}

fn first_string(doc: &KdlDocument, name: &str) -> Option<String> {
    doc.get(name)
        .and_then(|node| node.entries().first())
        .and_then(|entry| entry.value().as_string())
        .map(|s| s.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kdl_roundtrip() {
        let config = BacklogConfig {
            project_name: Some("Demo".to_string()),
            default_editor: Some("nvim -u NONE".to_string()),
        };
        let text = config.to_kdl().to_string();
        let doc: KdlDocument = text.parse().unwrap();
        assert_eq!(BacklogConfig::from_kdl(&doc), config);
    }

    #[test]
    fn test_from_kdl_ignores_unknown_nodes() {
        let doc: KdlDocument = "default-editor \"vim\"\ncolor \"blue\"\n".parse().unwrap();
        let config = BacklogConfig::from_kdl(&doc);
        assert_eq!(config.default_editor.as_deref(), Some("vim"));
        assert!(config.project_name.is_none());
    }

    #[test]
    fn test_validate_rejects_blank_editor() {
        let config = BacklogConfig {
            default_editor: Some("   ".to_string()),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_merge_overrides_present_values() {
        let mut base = BacklogConfig {
            project_name: Some("Base".to_string()),
            default_editor: Some("vi".to_string()),
        };
        base.merge(&BacklogConfig {
            project_name: None,
            default_editor: Some("nano".to_string()),
        });
        assert_eq!(base.project_name.as_deref(), Some("Base"));
        assert_eq!(base.default_editor.as_deref(), Some("nano"));
    }

    #[test]
    fn test_get_and_set_by_key() {
        let mut config = BacklogConfig::new();
        config.set("default-editor", "hx").unwrap();
        assert_eq!(config.get("default-editor"), Some(Some("hx")));
        assert_eq!(config.get("project-name"), Some(None));
        assert_eq!(config.get("nope"), None);
        assert!(config.set("nope", "x").is_err());
    }
}
