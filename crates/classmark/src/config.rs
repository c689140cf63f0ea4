//! Configuration types for the Classmark annotation engine.
//!
//! This module provides configuration structures that control how
//! annotations are created, how much history is kept, and how models are
//! exported. All types implement [`serde::Deserialize`] for flexible loading
//! from external sources.
//!
//! # Overview
//!
//! - [`AppConfig`] - Top-level configuration combining every section.
//! - [`ModelConfig`] - Defaults applied to new entities.
//! - [`HistoryConfig`] - Bounds on the undo history.
//! - [`ExportConfig`] - JSON output formatting.
//!
//! # Example
//!
//! ```
//! # use classmark::config::AppConfig;
//! let config = AppConfig::default();
//! assert_eq!(config.model().default_attribute_type(), "String");
//! assert_eq!(config.history().max_depth(), None);
//! ```

use serde::Deserialize;

use classmark_core::model::DEFAULT_ATTRIBUTE_TYPE;
use classmark_sync::ExportOptions;

/// Top-level application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Model defaults section.
    #[serde(default)]
    model: ModelConfig,

    /// Undo history section.
    #[serde(default)]
    history: HistoryConfig,

    /// Export formatting section.
    #[serde(default)]
    export: ExportConfig,
}

impl AppConfig {
    /// Creates a new [`AppConfig`] from its sections.
    pub fn new(model: ModelConfig, history: HistoryConfig, export: ExportConfig) -> Self {
        Self {
            model,
            history,
            export,
        }
    }

    /// Returns the model configuration.
    pub fn model(&self) -> &ModelConfig {
        &self.model
    }

    /// Returns the history configuration.
    pub fn history(&self) -> &HistoryConfig {
        &self.history
    }

    /// Returns the export configuration.
    pub fn export(&self) -> &ExportConfig {
        &self.export
    }
}

/// Defaults applied to entities created by tagging or pre-annotation.
#[derive(Debug, Clone, Deserialize)]
pub struct ModelConfig {
    /// Type marker given to new attributes.
    #[serde(default = "default_attribute_type")]
    default_attribute_type: String,
}

impl ModelConfig {
    pub fn new(default_attribute_type: impl Into<String>) -> Self {
        Self {
            default_attribute_type: default_attribute_type.into(),
        }
    }

    /// Returns the type marker given to new attributes.
    pub fn default_attribute_type(&self) -> &str {
        &self.default_attribute_type
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self::new(DEFAULT_ATTRIBUTE_TYPE)
    }
}

fn default_attribute_type() -> String {
    DEFAULT_ATTRIBUTE_TYPE.to_string()
}

/// Undo history configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HistoryConfig {
    /// Maximum number of snapshots kept on the undo stack, baseline
    /// included. Unbounded when unset.
    #[serde(default)]
    max_depth: Option<usize>,
}

impl HistoryConfig {
    pub fn new(max_depth: Option<usize>) -> Self {
        Self { max_depth }
    }

    /// Returns the undo stack bound, if any.
    pub fn max_depth(&self) -> Option<usize> {
        self.max_depth
    }
}

/// JSON export configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ExportConfig {
    /// Indent exported JSON.
    #[serde(default = "enabled")]
    pretty: bool,

    /// Replace line breaks in the exported text with spaces.
    #[serde(default = "enabled")]
    flatten_newlines: bool,
}

impl ExportConfig {
    pub fn new(pretty: bool, flatten_newlines: bool) -> Self {
        Self {
            pretty,
            flatten_newlines,
        }
    }

    pub fn pretty(&self) -> bool {
        self.pretty
    }

    pub fn flatten_newlines(&self) -> bool {
        self.flatten_newlines
    }

    /// The sync-layer options matching this configuration.
    pub fn options(&self) -> ExportOptions {
        ExportOptions {
            pretty: self.pretty,
            flatten_newlines: self.flatten_newlines,
        }
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self::new(true, true)
    }
}

fn enabled() -> bool {
    true
}
