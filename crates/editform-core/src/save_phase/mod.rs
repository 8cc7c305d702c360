use crate::error::SessionError;
use serde::{Deserialize, Serialize};

/// Where a save request currently is.
///
/// `Idle -> Validating -> {Saving -> {Saved | Failed} | Invalid} -> Idle`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SavePhase {
    #[default]
    Idle,
    Validating,
    Saving,
    Saved,
    Failed,
    Invalid,
}

impl SavePhase {
    /// True while a save holds the session (validation or persistence)
    #[must_use]
    pub fn in_flight(self) -> bool {
        matches!(self, Self::Validating | Self::Saving)
    }
}

/// Validates a save-phase transition.
pub fn validate_transition(from: SavePhase, to: SavePhase) -> Result<(), SessionError> {
    if allowed(from, to) {
        Ok(())
    } else {
        Err(SessionError::IllegalTransition { from, to })
    }
}

pub fn allowed_transitions(from: SavePhase) -> Vec<SavePhase> {
    use SavePhase::*;
    match from {
        Idle => vec![Validating],
        Validating => vec![Saving, Invalid],
        Saving => vec![Saved, Failed],
        Saved | Failed | Invalid => vec![Idle],
    }
}

fn allowed(from: SavePhase, to: SavePhase) -> bool {
    allowed_transitions(from).into_iter().any(|s| s == to)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn happy_path() {
        assert!(validate_transition(SavePhase::Idle, SavePhase::Validating).is_ok());
        assert!(validate_transition(SavePhase::Validating, SavePhase::Saving).is_ok());
        assert!(validate_transition(SavePhase::Saving, SavePhase::Saved).is_ok());
        assert!(validate_transition(SavePhase::Saved, SavePhase::Idle).is_ok());
    }

    #[test]
    fn no_second_save_while_saving() {
        let err = validate_transition(SavePhase::Saving, SavePhase::Validating).unwrap_err();
        assert!(matches!(
            err,
            SessionError::IllegalTransition {
                from: SavePhase::Saving,
                to: SavePhase::Validating
            }
        ));
    }

    #[test]
    fn invalid_skips_persistence() {
        assert!(validate_transition(SavePhase::Validating, SavePhase::Invalid).is_ok());
        assert!(validate_transition(SavePhase::Invalid, SavePhase::Saving).is_err());
    }

    #[test]
    fn in_flight() {
        assert!(SavePhase::Saving.in_flight());
        assert!(!SavePhase::Idle.in_flight());
    }
}
