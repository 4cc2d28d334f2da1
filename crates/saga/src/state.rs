//! Saga transaction state machine.

use serde::{Deserialize, Serialize};

/// Lifecycle stage of a saga transaction.
///
/// State transitions:
/// ```text
/// PENDING ──► IN_PROGRESS ──┬──► COMPLETED
///    │                      └──► COMPENSATING ──► COMPENSATED
///    └──► FAILED
/// ```
///
/// `FAILED` covers failures detected before any step executed (nothing to
/// undo, so COMPENSATING is bypassed). `COMPLETED`, `FAILED` and
/// `COMPENSATED` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SagaState {
    /// Transaction created, no step executed yet.
    #[default]
    Pending,

    /// Forward steps are being executed.
    InProgress,

    /// All steps completed successfully (terminal).
    Completed,

    /// Failed before any step executed (terminal).
    Failed,

    /// A step failed and compensations are running.
    Compensating,

    /// Compensation finished after a failure (terminal).
    Compensated,
}

impl SagaState {
    /// Returns true if no further transition can occur.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SagaState::Completed | SagaState::Failed | SagaState::Compensated
        )
    }

    /// Returns true while the saga still requires driving.
    pub fn is_active(&self) -> bool {
        !self.is_terminal()
    }

    /// Validates a transition along the monotonic state graph.
    pub fn can_transition_to(&self, next: SagaState) -> bool {
        matches!(
            (self, next),
            (SagaState::Pending, SagaState::InProgress)
                | (SagaState::Pending, SagaState::Failed)
                | (SagaState::InProgress, SagaState::Completed)
                | (SagaState::InProgress, SagaState::Compensating)
                | (SagaState::Compensating, SagaState::Compensated)
        )
    }

    /// Returns the persisted state tag.
    pub fn as_str(&self) -> &'static str {
        match self {
            SagaState::Pending => "PENDING",
            SagaState::InProgress => "IN_PROGRESS",
            SagaState::Completed => "COMPLETED",
            SagaState::Failed => "FAILED",
            SagaState::Compensating => "COMPENSATING",
            SagaState::Compensated => "COMPENSATED",
        }
    }
}

impl std::fmt::Display for SagaState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_state_is_pending() {
        assert_eq!(SagaState::default(), SagaState::Pending);
    }

    #[test]
    fn test_terminal_states() {
        assert!(!SagaState::Pending.is_terminal());
        assert!(!SagaState::InProgress.is_terminal());
        assert!(!SagaState::Compensating.is_terminal());
        assert!(SagaState::Completed.is_terminal());
        assert!(SagaState::Failed.is_terminal());
        assert!(SagaState::Compensated.is_terminal());
    }

    #[test]
    fn test_valid_transitions() {
        assert!(SagaState::Pending.can_transition_to(SagaState::InProgress));
        assert!(SagaState::Pending.can_transition_to(SagaState::Failed));
        assert!(SagaState::InProgress.can_transition_to(SagaState::Completed));
        assert!(SagaState::InProgress.can_transition_to(SagaState::Compensating));
        assert!(SagaState::Compensating.can_transition_to(SagaState::Compensated));
    }

    #[test]
    fn test_failure_never_skips_compensating() {
        assert!(!SagaState::InProgress.can_transition_to(SagaState::Compensated));
        assert!(!SagaState::InProgress.can_transition_to(SagaState::Failed));
    }

    #[test]
    fn test_terminal_states_have_no_transitions() {
        for terminal in [
            SagaState::Completed,
            SagaState::Failed,
            SagaState::Compensated,
        ] {
            for next in [
                SagaState::Pending,
                SagaState::InProgress,
                SagaState::Completed,
                SagaState::Failed,
                SagaState::Compensating,
                SagaState::Compensated,
            ] {
                assert!(!terminal.can_transition_to(next));
            }
        }
    }

    #[test]
    fn test_display_matches_persisted_tag() {
        assert_eq!(SagaState::Pending.to_string(), "PENDING");
        assert_eq!(SagaState::InProgress.to_string(), "IN_PROGRESS");
        assert_eq!(SagaState::Completed.to_string(), "COMPLETED");
        assert_eq!(SagaState::Failed.to_string(), "FAILED");
        assert_eq!(SagaState::Compensating.to_string(), "COMPENSATING");
        assert_eq!(SagaState::Compensated.to_string(), "COMPENSATED");
    }

    #[test]
    fn test_serialization_uses_screaming_snake_case() {
        let json = serde_json::to_string(&SagaState::InProgress).unwrap();
        assert_eq!(json, "\"IN_PROGRESS\"");
        let state: SagaState = serde_json::from_str("\"COMPENSATED\"").unwrap();
        assert_eq!(state, SagaState::Compensated);
    }
}
