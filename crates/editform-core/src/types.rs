//! Core types for edit sessions
//!
//! Defines the values that flow between the controller and its collaborators:
//! - Record identifiers and the "unassigned" sentinel
//! - Alert messages and their severity
//! - Exit routing outcomes
//! - The serializable view-state snapshot

use crate::save_phase::SavePhase;
use serde::{Deserialize, Serialize};

/// Record identifier as issued by the persistence layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(pub u64);

impl RecordId {
    /// Identifier carried by a record that has never been persisted
    pub const UNASSIGNED: RecordId = RecordId(0);

    /// True when the record has not been persisted yet
    #[inline]
    #[must_use]
    pub fn is_unassigned(self) -> bool {
        self == Self::UNASSIGNED
    }
}

impl From<u64> for RecordId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl std::fmt::Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Alert colour code understood by the alert surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Primary
    Primary,
    /// Secondary
    Secondary,
    /// Success
    Success,
    /// Danger
    Danger,
    /// Warning
    Warning,
    /// Info
    #[default]
    Info,
    /// Light
    Light,
    /// Dark
    Dark,
}

impl Severity {
    /// CSS suffix used by the alert surface (`alert-{suffix}`)
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Primary => "primary",
            Self::Secondary => "secondary",
            Self::Success => "success",
            Self::Danger => "danger",
            Self::Warning => "warning",
            Self::Info => "info",
            Self::Light => "light",
            Self::Dark => "dark",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A message for the alert surface
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AlertMessage {
    /// Text shown to the user
    pub text: String,
    /// Colour code
    pub severity: Severity,
}

impl AlertMessage {
    /// Create a new alert
    #[inline]
    #[must_use]
    pub fn new(text: impl Into<String>, severity: Severity) -> Self {
        Self {
            text: text.into(),
            severity,
        }
    }

    /// Warning-level alert
    #[inline]
    #[must_use]
    pub fn warning(text: impl Into<String>) -> Self {
        Self::new(text, Severity::Warning)
    }

    /// Danger-level alert
    #[inline]
    #[must_use]
    pub fn danger(text: impl Into<String>) -> Self {
        Self::new(text, Severity::Danger)
    }

    /// Success-level alert
    #[inline]
    #[must_use]
    pub fn success(text: impl Into<String>) -> Self {
        Self::new(text, Severity::Success)
    }

    /// Info-level alert
    #[inline]
    #[must_use]
    pub fn info(text: impl Into<String>) -> Self {
        Self::new(text, Severity::Info)
    }
}

impl std::fmt::Display for AlertMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.severity, self.text)
    }
}

/// Which exit action the session dispatched to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExitPath {
    /// The overlay hosting the form was closed
    ModalClose,
    /// The router navigated away from the form
    Navigate,
}

/// Outcome of [`EditSessionController::try_exit`](crate::EditSessionController::try_exit)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitDecision {
    /// The record was clean and the session exited
    Exited(ExitPath),
    /// The record is dirty; the caller has to ask the user before calling
    /// `confirm_exit`
    ConfirmationRequired,
}

impl ExitDecision {
    /// True when an exit path was taken
    #[inline]
    #[must_use]
    pub fn exited(self) -> bool {
        matches!(self, Self::Exited(_))
    }
}

/// Snapshot of everything the form renders from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewState {
    pub page_title: String,
    pub is_clean: bool,
    pub is_new_record: bool,
    pub is_modal: bool,
    pub is_error: bool,
    pub card_border_class: String,
    pub card_header_class: String,
    pub card_css: String,
    pub save_phase: SavePhase,
}
