//! Session configuration
//!
//! Everything here is fixed when the session is constructed. `is_modal` in
//! particular never changes for the lifetime of a session.

use crate::error::ConfigError;
use crate::types::RecordId;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Edit session configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Record to load; `RecordId::UNASSIGNED` edits a new record
    pub record_id: RecordId,
    /// Form is hosted in an overlay; exit closes it instead of navigating
    pub is_modal: bool,
    /// Record-type description used when the service has none
    pub default_description: String,
    /// Alert texts raised by the session itself
    pub messages: AlertTexts,
}

impl SessionConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With record to load
    #[inline]
    #[must_use]
    pub fn with_record_id(mut self, id: impl Into<RecordId>) -> Self {
        self.record_id = id.into();
        self
    }

    /// Host the form in an overlay
    #[inline]
    #[must_use]
    pub fn modal(mut self, is_modal: bool) -> Self {
        self.is_modal = is_modal;
        self
    }

    /// With fallback record-type description
    #[inline]
    #[must_use]
    pub fn with_default_description(mut self, description: impl Into<String>) -> Self {
        self.default_description = description.into();
        self
    }

    /// Parse a TOML document
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(source)?)
    }

    /// Read and parse a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let source = std::fs::read_to_string(path)?;
        Self::from_toml_str(&source)
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            record_id: RecordId::UNASSIGNED,
            is_modal: false,
            default_description: "Record".to_string(),
            messages: AlertTexts::default(),
        }
    }
}

/// Alert texts raised by the session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertTexts {
    /// Shown while the record is dirty
    pub unsaved: String,
    /// Shown when validation rejects a save
    pub validation_error: String,
}

impl Default for AlertTexts {
    fn default() -> Self {
        Self {
            unsaved: "The Record isn't Saved".to_string(),
            validation_error:
                "A validation error occurred.  Check individual fields for the relevant error."
                    .to_string(),
        }
    }
}
