//! Error types for edit sessions
//!
//! Validation failures and failed persists are not errors: `save` reports
//! them as `Ok(false)` and surfaces an alert. What remains here are misuse of
//! the session lifecycle, load failures from the record service, and
//! configuration loading.

use crate::save_phase::SavePhase;
use crate::types::RecordId;

/// Main session error type
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// No record has been loaded, so there is no validation context
    #[error("no record loaded")]
    NotLoaded,

    /// The session was disposed
    #[error("session disposed")]
    Disposed,

    /// A save was requested from a phase that does not allow it
    #[error("illegal save transition: {from:?} -> {to:?}")]
    IllegalTransition {
        /// Current phase
        from: SavePhase,
        /// Requested phase
        to: SavePhase,
    },

    /// The record service failed to load the record
    #[error("load failed: {0}")]
    Load(#[from] ServiceError),
}

impl SessionError {
    /// Whether the user can recover by acting on the form again
    #[inline]
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Self::Disposed)
    }
}

/// Errors reported by a record service
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ServiceError {
    /// No record with this identifier
    #[error("record not found: {0}")]
    NotFound(RecordId),

    /// Storage or transport failure
    #[error("backend error: {0}")]
    Backend(String),
}

/// Configuration loading errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the file
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    /// File is not valid TOML for a session config
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_error_display() {
        let err = SessionError::Load(ServiceError::NotFound(RecordId(7)));
        assert_eq!(err.to_string(), "load failed: record not found: 7");
    }

    #[test]
    fn disposed_is_not_recoverable() {
        assert!(!SessionError::Disposed.is_recoverable());
        assert!(SessionError::NotLoaded.is_recoverable());
        assert!(SessionError::Load(ServiceError::Backend("timeout".to_string())).is_recoverable());
    }

    #[test]
    fn service_error_converts() {
        let err: SessionError = ServiceError::Backend("down".into()).into();
        assert!(matches!(err, SessionError::Load(ServiceError::Backend(_))));
    }
}
