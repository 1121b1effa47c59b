//! Core type definitions used throughout the codebase

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for employees, monotonic within a session (first is 1)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(pub u32);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Identifier of a single station slot ("open-a", "phone", ...)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SlotId(pub String);

impl SlotId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SlotId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Kind of work an employee needs; each kind is served by one station
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StationType {
    /// E-mail / chat, served in the open space
    Blue,
    /// Confidential talks, served in the phone booth
    Red,
    /// Dailies and alignment meetings, served in the huddle room
    Green,
}

impl StationType {
    pub const ALL: [StationType; 3] = [StationType::Blue, StationType::Red, StationType::Green];
}

impl fmt::Display for StationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StationType::Blue => "blue",
            StationType::Red => "red",
            StationType::Green => "green",
        };
        f.write_str(name)
    }
}

/// Where an employee currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Location {
    /// Reception desk: newly arrived, fastest patience decay
    Holding,
    /// Waiting room: acknowledged, slower decay
    Queued,
    /// Occupying a station slot; patience is frozen
    InService,
}

impl Location {
    /// Patience only decays outside of service
    pub fn decays(&self) -> bool {
        !matches!(self, Location::InService)
    }
}

/// Run token handed out by each session start
///
/// Scheduled activations carry the generation they were armed with and are
/// ignored once a newer session has started.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Generation(pub u64);

impl Generation {
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_id_ordering() {
        assert!(EntityId(1) < EntityId(2));
        assert_eq!(EntityId(7).to_string(), "#7");
    }

    #[test]
    fn test_station_type_serde_lowercase() {
        let json = serde_json::to_string(&StationType::Green).unwrap();
        assert_eq!(json, "\"green\"");
        let parsed: StationType = serde_json::from_str("\"red\"").unwrap();
        assert_eq!(parsed, StationType::Red);
    }

    #[test]
    fn test_location_decay() {
        assert!(Location::Holding.decays());
        assert!(Location::Queued.decays());
        assert!(!Location::InService.decays());
    }

    #[test]
    fn test_generation_next() {
        let g = Generation::default();
        assert_eq!(g.next(), Generation(1));
        assert!(g.next() > g);
    }
}
