//! Events emitted by a session for renderers and notification sinks
//!
//! The core never draws anything. Every visible change is reported as a
//! [`SessionEvent`] and the collaborator decides how to show it.

use serde::{Deserialize, Serialize};

use crate::core::types::{EntityId, Location, SlotId, StationType};

/// How loudly a notice should be presented
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeKind {
    Arrival,
    Completion,
    PhaseChange,
    WrongPlacement,
    SlotOccupied,
    Queued,
}

/// Fire-and-forget message for a toast or log line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notice {
    pub severity: Severity,
    pub kind: NoticeKind,
    pub message: String,
}

impl Notice {
    pub fn new(severity: Severity, kind: NoticeKind, message: impl Into<String>) -> Self {
        Self {
            severity,
            kind,
            message: message.into(),
        }
    }
}

/// Countdown colouring
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerUrgency {
    Normal,
    Warning,
    Danger,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RemovalReason {
    Completed,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "cause", rename_all = "snake_case")]
pub enum DefeatCause {
    /// An unplaced employee ran out of patience
    PatienceExhausted { entity: EntityId, name: String },
    /// The countdown reached zero before everyone was served
    TimeExpired,
}

/// Outcome of a finished session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum Outcome {
    Victory,
    Defeat { cause: DefeatCause },
}

impl Outcome {
    pub fn is_victory(&self) -> bool {
        matches!(self, Outcome::Victory)
    }
}

/// Where a placement request wants to put an employee
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlacementTarget {
    /// The waiting room
    Queue,
    Slot(SlotId),
}

/// Result of a placement request that reached a valid target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlacementOutcome {
    PlacedInQueue,
    PlacedInService,
    /// Station does not serve this type; the countdown was penalized
    RejectedWrongType,
    RejectedSlotOccupied,
}

impl PlacementOutcome {
    pub fn is_placed(&self) -> bool {
        matches!(self, PlacementOutcome::PlacedInQueue | PlacementOutcome::PlacedInService)
    }
}

/// Everything a session reports to the outside
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SessionEvent {
    EntityCreated {
        id: EntityId,
        name: String,
        station_type: StationType,
    },
    EntityMoved {
        id: EntityId,
        location: Location,
        slot: Option<SlotId>,
    },
    /// Per-loop refresh of gauges
    EntityUpdated {
        id: EntityId,
        patience: f32,
        low_patience: bool,
        service_progress: Option<f32>,
        remaining_service_secs: Option<u32>,
    },
    EntityRemoved {
        id: EntityId,
        reason: RemovalReason,
    },
    SlotReleased {
        slot: SlotId,
    },
    ClockTicked {
        time_remaining: u32,
        urgency: TimerUrgency,
    },
    PhaseChanged {
        index: u32,
        label: String,
    },
    Notice(Notice),
    /// Terminal event, emitted once per session
    SessionEnded {
        outcome: Outcome,
        completed: usize,
        spawned: usize,
    },
}

impl SessionEvent {
    pub fn notice(severity: Severity, kind: NoticeKind, message: impl Into<String>) -> Self {
        SessionEvent::Notice(Notice::new(severity, kind, message))
    }

    /// Per-tick gauge updates are high-volume; most sinks skip them
    pub fn is_gauge_update(&self) -> bool {
        matches!(self, SessionEvent::EntityUpdated { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_json_is_tagged() {
        let event = SessionEvent::EntityRemoved {
            id: EntityId(3),
            reason: RemovalReason::Completed,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "entity_removed");
        assert_eq!(json["id"], 3);
        assert_eq!(json["reason"], "completed");
    }

    #[test]
    fn test_defeat_outcome_json() {
        let outcome = Outcome::Defeat {
            cause: DefeatCause::PatienceExhausted {
                entity: EntityId(2),
                name: "Bruno".into(),
            },
        };
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["result"], "defeat");
        assert_eq!(json["cause"]["cause"], "patience_exhausted");
        assert_eq!(json["cause"]["name"], "Bruno");
        assert!(!outcome.is_victory());
    }

    #[test]
    fn test_placement_outcome_placed() {
        assert!(PlacementOutcome::PlacedInQueue.is_placed());
        assert!(PlacementOutcome::PlacedInService.is_placed());
        assert!(!PlacementOutcome::RejectedWrongType.is_placed());
        assert!(!PlacementOutcome::RejectedSlotOccupied.is_placed());
    }
}
