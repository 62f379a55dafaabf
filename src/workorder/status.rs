// Work order lifecycle: the transition table is the single authority on
// which status changes are legal. Anything not listed here is rejected.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Lifecycle states of a maintenance work order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkOrderStatus {
    /// Created, nobody responsible yet
    Open,
    /// A technician or crew has been designated
    Assigned,
    /// Field work underway
    InProgress,
    /// Work finished, pending operator validation
    WaitingValidation,
    /// Validated and archived; terminal
    Closed,
    /// Work interrupted (parts, weather, access); resumes into InProgress
    Blocked,
}

impl WorkOrderStatus {
    pub const ALL: [WorkOrderStatus; 6] = [
        WorkOrderStatus::Open,
        WorkOrderStatus::Assigned,
        WorkOrderStatus::InProgress,
        WorkOrderStatus::WaitingValidation,
        WorkOrderStatus::Closed,
        WorkOrderStatus::Blocked,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            WorkOrderStatus::Open => "OPEN",
            WorkOrderStatus::Assigned => "ASSIGNED",
            WorkOrderStatus::InProgress => "IN_PROGRESS",
            WorkOrderStatus::WaitingValidation => "WAITING_VALIDATION",
            WorkOrderStatus::Closed => "CLOSED",
            WorkOrderStatus::Blocked => "BLOCKED",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, WorkOrderStatus::Closed)
    }

    /// Statuses a work order in `self` may legally move to.
    ///
    /// Forward progression follows the listed sequence exactly; `Blocked` is
    /// reachable from every non-terminal state and resumes only into
    /// `InProgress`. `Closed` has no outgoing transitions.
    pub fn next_valid_statuses(&self) -> &'static [WorkOrderStatus] {
        match self {
            WorkOrderStatus::Open => &[WorkOrderStatus::Assigned, WorkOrderStatus::Blocked],
            WorkOrderStatus::Assigned => {
                &[WorkOrderStatus::InProgress, WorkOrderStatus::Blocked]
            }
            WorkOrderStatus::InProgress => {
                &[WorkOrderStatus::WaitingValidation, WorkOrderStatus::Blocked]
            }
            WorkOrderStatus::WaitingValidation => {
                &[WorkOrderStatus::Closed, WorkOrderStatus::Blocked]
            }
            WorkOrderStatus::Blocked => &[WorkOrderStatus::InProgress],
            WorkOrderStatus::Closed => &[],
        }
    }
}

impl std::fmt::Display for WorkOrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for WorkOrderStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        WorkOrderStatus::ALL
            .iter()
            .copied()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| UnknownStatus(s.to_string()))
    }
}

#[derive(Debug, Error, PartialEq)]
#[error("unknown work order status: {0}")]
pub struct UnknownStatus(pub String);

/// Rejected status change, naming the attempted pair
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransitionError {
    #[error("invalid work order status transition: {from} -> {to}")]
    InvalidTransition {
        from: WorkOrderStatus,
        to: WorkOrderStatus,
    },
}

/// True when `requested` is a legal next status for `current`.
///
/// Same-status requests are invalid, as is anything not in the table
/// (default-deny).
pub fn is_valid_transition(current: WorkOrderStatus, requested: WorkOrderStatus) -> bool {
    current != requested && current.next_valid_statuses().contains(&requested)
}

/// Validate a transition, producing the typed rejection callers surface as a
/// client error. No state is touched here; persistence happens only after
/// this returns Ok.
pub fn check_transition(
    current: WorkOrderStatus,
    requested: WorkOrderStatus,
) -> Result<(), TransitionError> {
    if is_valid_transition(current, requested) {
        Ok(())
    } else {
        Err(TransitionError::InvalidTransition {
            from: current,
            to: requested,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use WorkOrderStatus::*;

    #[test]
    fn test_forward_progression() {
        assert!(is_valid_transition(Open, Assigned));
        assert!(is_valid_transition(Assigned, InProgress));
        assert!(is_valid_transition(InProgress, WaitingValidation));
        assert!(is_valid_transition(WaitingValidation, Closed));
    }

    #[test]
    fn test_no_stage_skipping() {
        assert!(!is_valid_transition(Open, InProgress));
        assert!(!is_valid_transition(Open, WaitingValidation));
        assert!(!is_valid_transition(Open, Closed));
        assert!(!is_valid_transition(Assigned, WaitingValidation));
        assert!(!is_valid_transition(Assigned, Closed));
        assert!(!is_valid_transition(InProgress, Closed));
    }

    #[test]
    fn test_no_backward_transitions() {
        assert!(!is_valid_transition(Assigned, Open));
        assert!(!is_valid_transition(InProgress, Assigned));
        assert!(!is_valid_transition(WaitingValidation, InProgress));
    }

    #[test]
    fn test_blocked_reachable_from_non_terminal_states() {
        for status in [Open, Assigned, InProgress, WaitingValidation] {
            assert!(
                is_valid_transition(status, Blocked),
                "{status} -> BLOCKED should be legal"
            );
        }
    }

    #[test]
    fn test_blocked_resumes_only_into_in_progress() {
        assert!(is_valid_transition(Blocked, InProgress));
        for status in [Open, Assigned, WaitingValidation, Closed] {
            assert!(!is_valid_transition(Blocked, status));
        }
    }

    #[test]
    fn test_closed_is_terminal() {
        for status in WorkOrderStatus::ALL {
            assert!(
                !is_valid_transition(Closed, status),
                "CLOSED -> {status} should be rejected"
            );
        }
        assert!(Closed.next_valid_statuses().is_empty());
    }

    #[test]
    fn test_same_status_rejected() {
        for status in WorkOrderStatus::ALL {
            assert!(!is_valid_transition(status, status));
        }
    }

    #[test]
    fn test_default_deny_everything_not_enumerated() {
        // Exhaustive sweep: exactly the enumerated pairs are legal.
        let legal: &[(WorkOrderStatus, WorkOrderStatus)] = &[
            (Open, Assigned),
            (Open, Blocked),
            (Assigned, InProgress),
            (Assigned, Blocked),
            (InProgress, WaitingValidation),
            (InProgress, Blocked),
            (WaitingValidation, Closed),
            (WaitingValidation, Blocked),
            (Blocked, InProgress),
        ];

        for from in WorkOrderStatus::ALL {
            for to in WorkOrderStatus::ALL {
                let expected = legal.contains(&(from, to));
                assert_eq!(
                    is_valid_transition(from, to),
                    expected,
                    "unexpected verdict for {from} -> {to}"
                );
            }
        }
    }

    #[test]
    fn test_check_transition_names_the_pair() {
        let err = check_transition(Open, InProgress).unwrap_err();
        assert_eq!(
            err,
            TransitionError::InvalidTransition {
                from: Open,
                to: InProgress,
            }
        );
        assert_eq!(
            err.to_string(),
            "invalid work order status transition: OPEN -> IN_PROGRESS"
        );
    }

    #[test]
    fn test_status_round_trip_through_str() {
        for status in WorkOrderStatus::ALL {
            assert_eq!(status.as_str().parse::<WorkOrderStatus>(), Ok(status));
        }
        assert!("PENDING".parse::<WorkOrderStatus>().is_err());
    }
}
