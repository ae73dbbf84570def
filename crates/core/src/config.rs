//! Converter configuration loaded from TOML.
//!
//! Every section and field has a default, so an empty document is valid.
//! Unknown keys are rejected to surface typos early.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{IrError, IrResult};

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConverterConfig {
    pub layout: LayoutConfig,
    pub generator: GeneratorConfig,
    pub conversion: ConversionConfig,
}

/// Coordinates assigned by the AST to IR converter and the visual auto-layout.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LayoutConfig {
    pub start_x: f64,
    pub start_y: f64,
    /// Vertical distance between consecutive statements.
    pub node_spacing: f64,
    /// Horizontal distance between scene columns.
    pub scene_spacing: f64,
    /// Horizontal offset of each control-flow arm from its parent.
    pub arm_offset: f64,
    pub column_spacing: f64,
    pub row_spacing: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            start_x: 100.0,
            start_y: 100.0,
            node_spacing: 100.0,
            scene_spacing: 400.0,
            arm_offset: 250.0,
            column_spacing: 300.0,
            row_spacing: 120.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GeneratorConfig {
    pub indent_width: usize,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self { indent_width: 4 }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConversionConfig {
    pub comments: CommentPolicy,
}

/// What IR to AST conversion does with `Comment` nodes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommentPolicy {
    /// Emit a comment statement for every comment node.
    #[default]
    Preserve,
    /// Skip comment nodes but keep following their continuation.
    Drop,
}

impl ConverterConfig {
    pub fn from_toml_str(input: &str) -> IrResult<Self> {
        toml::from_str(input).map_err(|err| IrError::Config(err.to_string()))
    }

    /// Loads a config file. A missing file yields the defaults.
    pub fn load(path: &Path) -> IrResult<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = fs::read_to_string(path).map_err(|err| IrError::io(path, err))?;
        Self::from_toml_str(&raw)
    }

    pub fn to_toml_string(&self) -> IrResult<String> {
        toml::to_string_pretty(self).map_err(|err| IrError::Config(err.to_string()))
    }

    pub fn save(&self, path: &Path) -> IrResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|err| IrError::io(parent, err))?;
        }
        let payload = self.to_toml_string()?;
        fs::write(path, payload).map_err(|err| IrError::io(path, err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_yields_defaults() {
        let config = ConverterConfig::from_toml_str("").expect("empty config");
        assert_eq!(config, ConverterConfig::default());
        assert_eq!(config.layout.node_spacing, 100.0);
        assert_eq!(config.generator.indent_width, 4);
        assert_eq!(config.conversion.comments, CommentPolicy::Preserve);
    }

    #[test]
    fn test_partial_sections_keep_other_defaults() {
        let config = ConverterConfig::from_toml_str(
            "[layout]\nnode_spacing = 80.0\n\n[conversion]\ncomments = \"drop\"\n",
        )
        .expect("partial config");
        assert_eq!(config.layout.node_spacing, 80.0);
        assert_eq!(config.layout.scene_spacing, 400.0);
        assert_eq!(config.conversion.comments, CommentPolicy::Drop);
    }

    #[test]
    fn test_unknown_keys_are_rejected() {
        let err = ConverterConfig::from_toml_str("[layout]\nspacing = 1.0\n")
            .expect_err("unknown key");
        assert!(matches!(err, IrError::Config(_)));
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("vnir.toml");
        let mut config = ConverterConfig::default();
        config.generator.indent_width = 2;
        config.save(&path).expect("save");

        let loaded = ConverterConfig::load(&path).expect("load");
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let loaded = ConverterConfig::load(&dir.path().join("absent.toml")).expect("load");
        assert_eq!(loaded, ConverterConfig::default());
    }
}
