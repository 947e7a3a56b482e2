#![forbid(unsafe_code)]

//! Configuration for the undo manager.
//!
//! [`UndoConfig`] only governs presentation: how step display names are
//! synthesized for menus and history panels. It has no influence on what
//! gets recorded or on stack capacity (eviction is always explicit).
//!
//! # Loading
//!
//! With the `config` feature enabled the config can be read from TOML or
//! JSON. Missing keys fall back to their defaults.
//!
//! ```toml
//! # undo.toml
//! display_width = 48
//! multiple_objects_label = "(Multiple Objects)"
//! name_separator = ", "
//! ```
//!
//! ```rust,ignore
//! let config = UndoConfig::from_toml_file("undo.toml")?;
//! let manager = UndoManager::with_config(config);
//! ```

#[cfg(feature = "config")]
use std::path::Path;

#[cfg(feature = "config")]
use serde::{Deserialize, Serialize};

#[cfg(feature = "config")]
use crate::error::ConfigError;

/// Presentation settings for the undo manager.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "config", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config", serde(default))]
pub struct UndoConfig {
    /// Widest display name, in terminal columns, before the object-name list
    /// collapses into `multiple_objects_label`.
    pub display_width: usize,
    /// Suffix used instead of the object-name list when it is too wide.
    pub multiple_objects_label: String,
    /// Separator between distinct object names.
    pub name_separator: String,
}

impl Default for UndoConfig {
    fn default() -> Self {
        Self {
            display_width: 64,
            multiple_objects_label: "(Multiple Objects)".to_owned(),
            name_separator: ", ".to_owned(),
        }
    }
}

impl UndoConfig {
    /// Set the display-width threshold.
    #[must_use]
    pub fn with_display_width(mut self, width: usize) -> Self {
        self.display_width = width;
        self
    }

    /// Set the collapsed-name label.
    #[must_use]
    pub fn with_multiple_objects_label(mut self, label: impl Into<String>) -> Self {
        self.multiple_objects_label = label.into();
        self
    }

    /// Set the object-name separator.
    #[must_use]
    pub fn with_name_separator(mut self, separator: impl Into<String>) -> Self {
        self.name_separator = separator.into();
        self
    }

    /// Validate all parameters.
    ///
    /// Returns a list of validation errors. An empty list means the config
    /// is valid.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if self.display_width == 0 {
            errors.push("display_width must be > 0".to_owned());
        }
        if self.multiple_objects_label.trim().is_empty() {
            errors.push("multiple_objects_label must not be empty".to_owned());
        }
        errors
    }

    /// Load from a TOML string.
    #[cfg(feature = "config")]
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.validated()
    }

    /// Load from a TOML file on disk.
    #[cfg(feature = "config")]
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&content)
    }

    /// Load from a JSON string.
    #[cfg(feature = "config")]
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(s)?;
        config.validated()
    }

    /// Load from a JSON file on disk.
    #[cfg(feature = "config")]
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&content)
    }

    #[cfg(feature = "config")]
    fn validated(self) -> Result<Self, ConfigError> {
        let errors = self.validate();
        if errors.is_empty() {
            Ok(self)
        } else {
            Err(ConfigError::Validation(errors))
        }
    }
}
