//! Meeting status values and the transition guard.

use std::fmt;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::error::MeetError;

/// Lifecycle status of a meeting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeetingStatus {
    Scheduled,
    InProgress,
    Completed,
    Cancelled,
}

impl MeetingStatus {
    pub const ALL: [MeetingStatus; 4] = [
        Self::Scheduled,
        Self::InProgress,
        Self::Completed,
        Self::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Scheduled => "scheduled",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Result<MeetingStatus> {
        match s {
            "scheduled" => Ok(Self::Scheduled),
            "in_progress" => Ok(Self::InProgress),
            "completed" => Ok(Self::Completed),
            "cancelled" => Ok(Self::Cancelled),
            _ => anyhow::bail!("Invalid meeting status: {}", s),
        }
    }

    /// Human-readable label used in notification emails.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Scheduled => "Scheduled",
            Self::InProgress => "In Progress",
            Self::Completed => "Completed",
            Self::Cancelled => "Cancelled",
        }
    }

    /// Statuses reachable from this one in a single step.
    pub fn allowed_transitions(&self) -> &'static [MeetingStatus] {
        match self {
            Self::Scheduled => &[Self::InProgress, Self::Completed, Self::Cancelled],
            Self::InProgress => &[Self::Completed, Self::Cancelled],
            Self::Completed | Self::Cancelled => &[],
        }
    }

    pub fn can_transition_to(&self, target: MeetingStatus) -> bool {
        self.allowed_transitions().contains(&target)
    }
}

impl fmt::Display for MeetingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of asking for a status change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionOutcome {
    Transitioned {
        from: MeetingStatus,
        to: MeetingStatus,
    },
    AlreadyInState(MeetingStatus),
}

impl TransitionOutcome {
    pub fn changed(&self) -> bool {
        matches!(self, Self::Transitioned { .. })
    }
}

/// Decide what moving from `current` to `target` means, without side effects.
///
/// Same-state requests are a no-op even for terminal statuses; anything not in
/// the table is rejected.
pub fn plan_transition(
    current: MeetingStatus,
    target: MeetingStatus,
) -> Result<TransitionOutcome, MeetError> {
    if current == target {
        return Ok(TransitionOutcome::AlreadyInState(current));
    }

    if current.can_transition_to(target) {
        Ok(TransitionOutcome::Transitioned {
            from: current,
            to: target,
        })
    } else {
        Err(MeetError::InvalidTransition {
            from: current,
            to: target,
        })
    }
}

/// Kind of meeting, stored alongside the schedule.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeetingType {
    #[default]
    InPerson,
    Online,
}

impl MeetingType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InPerson => "in_person",
            Self::Online => "online",
        }
    }

    pub fn parse(s: &str) -> Result<MeetingType> {
        match s {
            "in_person" => Ok(Self::InPerson),
            "online" => Ok(Self::Online),
            _ => anyhow::bail!("Invalid meeting type: {}", s),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::InPerson => "In Person",
            Self::Online => "Online",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_as_str_round_trips_through_parse() {
        for status in MeetingStatus::ALL {
            assert_eq!(MeetingStatus::parse(status.as_str()).unwrap(), status);
        }
        assert!(MeetingStatus::parse("done").is_err());
        assert!(MeetingStatus::parse("Scheduled").is_err());
    }

    #[test]
    fn test_status_serialization() {
        let json = serde_json::to_string(&MeetingStatus::InProgress).unwrap();
        assert_eq!(json, "\"in_progress\"");

        let parsed: MeetingStatus = serde_json::from_str("\"cancelled\"").unwrap();
        assert_eq!(parsed, MeetingStatus::Cancelled);
    }

    #[test]
    fn test_transition_table() {
        use MeetingStatus::*;

        assert_eq!(
            Scheduled.allowed_transitions(),
            &[InProgress, Completed, Cancelled]
        );
        assert_eq!(InProgress.allowed_transitions(), &[Completed, Cancelled]);
        assert!(Completed.allowed_transitions().is_empty());
        assert!(Cancelled.allowed_transitions().is_empty());

        assert!(!InProgress.can_transition_to(Scheduled));
    }

    #[test]
    fn test_plan_same_state_is_noop() {
        for status in MeetingStatus::ALL {
            assert_eq!(
                plan_transition(status, status).unwrap(),
                TransitionOutcome::AlreadyInState(status)
            );
        }
    }

    #[test]
    fn test_plan_valid_transition() {
        let outcome =
            plan_transition(MeetingStatus::Scheduled, MeetingStatus::InProgress).unwrap();
        assert!(outcome.changed());
        assert_eq!(
            outcome,
            TransitionOutcome::Transitioned {
                from: MeetingStatus::Scheduled,
                to: MeetingStatus::InProgress,
            }
        );
    }

    #[test]
    fn test_plan_rejects_leaving_terminal_states() {
        for terminal in [MeetingStatus::Completed, MeetingStatus::Cancelled] {
            for target in MeetingStatus::ALL.into_iter().filter(|s| *s != terminal) {
                let err = plan_transition(terminal, target).unwrap_err();
                assert!(matches!(err, MeetError::InvalidTransition { .. }));
            }
        }
    }

    #[test]
    fn test_plan_rejects_going_back_to_scheduled() {
        let err = plan_transition(MeetingStatus::InProgress, MeetingStatus::Scheduled).unwrap_err();
        assert!(matches!(
            err,
            MeetError::InvalidTransition {
                from: MeetingStatus::InProgress,
                to: MeetingStatus::Scheduled,
            }
        ));
    }

    #[test]
    fn test_meeting_type_parse() {
        assert_eq!(MeetingType::parse("online").unwrap(), MeetingType::Online);
        assert_eq!(MeetingType::default(), MeetingType::InPerson);
        assert_eq!(MeetingType::InPerson.as_str(), "in_person");
        assert!(MeetingType::parse("hybrid").is_err());
    }
}
