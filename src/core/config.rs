//! Game configuration with documented constants
//!
//! The whole session is described by one immutable [`GameConfig`] table:
//! station types and their slots, the phase windows, patience rules and the
//! roster of employees. `GameConfig::default()` is the standard two-minute
//! office; a TOML file can override any subset of it.

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;
use std::time::Duration;

use ahash::AHashSet;
use serde::{Deserialize, Serialize};

use crate::core::error::{Result, TrafficError};
use crate::core::types::{SlotId, StationType};

/// Patience gauge rules
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatienceConfig {
    /// Full gauge; every employee arrives with this much patience
    pub max: f32,

    /// Loss per second at the reception desk
    ///
    /// At 4.0 an unattended arrival gives up after 25 seconds.
    pub holding_decay: f32,

    /// Loss per second in the waiting room
    ///
    /// At 1.5 a queued employee lasts roughly 67 seconds.
    pub queued_decay: f32,

    /// Patience restored when an employee is first moved to the waiting room
    pub queue_bonus: f32,

    /// Below this the employee is flagged as running out of patience
    pub low_threshold: f32,
}

impl Default for PatienceConfig {
    fn default() -> Self {
        Self {
            max: 100.0,
            holding_decay: 4.0,
            queued_decay: 1.5,
            queue_bonus: 10.0,
            low_threshold: 30.0,
        }
    }
}

/// One kind of work station
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationConfig {
    pub station_type: StationType,
    /// Short label ("E-mail")
    pub name: String,
    pub full_name: String,
    pub icon: String,
    /// Area of the office the slots belong to
    pub workspace: String,
    /// How long one employee occupies a slot
    pub service_duration_ms: u64,
    pub slots: Vec<SlotId>,
}

impl StationConfig {
    pub fn service_duration(&self) -> Duration {
        Duration::from_millis(self.service_duration_ms)
    }
}

/// A window of elapsed session time with its own arrival cadence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Phase {
    pub index: u32,
    pub label: String,
    #[serde(default)]
    pub description: String,
    /// Inclusive start, seconds since session start
    pub start_secs: u32,
    /// Exclusive end
    pub end_secs: u32,
    pub arrival_interval_ms: u64,
    /// Employees the phase is tuned around (informational)
    #[serde(default)]
    pub planned_count: u32,
}

impl Phase {
    pub fn contains(&self, elapsed_secs: u32) -> bool {
        elapsed_secs >= self.start_secs && elapsed_secs < self.end_secs
    }

    pub fn arrival_interval(&self) -> Duration {
        Duration::from_millis(self.arrival_interval_ms)
    }
}

/// One employee that can show up during a session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterEntry {
    pub name: String,
    pub station_type: StationType,
}

impl RosterEntry {
    pub fn new(name: impl Into<String>, station_type: StationType) -> Self {
        Self {
            name: name.into(),
            station_type,
        }
    }
}

/// Configuration for a whole session
///
/// Pacing was tuned so that a careful player can just finish all fifteen
/// employees: the single huddle slot alone needs 100 seconds of service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Countdown length in seconds
    pub game_duration_secs: u32,

    /// Employees that must be served to win
    pub total_entities: usize,

    /// Simulation loop cadence in milliseconds
    ///
    /// Patience decays by `rate * update_interval` per loop pass. The
    /// countdown ticks independently once per second.
    pub update_interval_ms: u64,

    /// Seconds removed from the countdown for a wrong-station placement
    pub wrong_place_penalty_secs: u32,

    /// Maximum employees waiting at the reception desk
    ///
    /// Arrivals that find the desk full are skipped, not queued.
    pub holding_capacity: usize,

    /// Countdown at or below which the timer is shown as a warning
    pub timer_warning_secs: u32,

    /// Countdown at or below which the timer is shown as critical
    pub timer_danger_secs: u32,

    pub patience: PatienceConfig,
    pub stations: Vec<StationConfig>,
    pub phases: Vec<Phase>,
    pub roster: Vec<RosterEntry>,
}

/// Names of the standard roster, in arrival-pool order
const DEFAULT_NAMES: [&str; 15] = [
    "Ana", "Carlos", "Maria", "João", "Lucia", "Pedro", "Julia", "Lucas", "Fernanda", "Rafael",
    "Camila", "Bruno", "Larissa", "Thiago", "Amanda",
];

impl Default for GameConfig {
    fn default() -> Self {
        let stations = vec![
            StationConfig {
                station_type: StationType::Blue,
                name: "E-mail".into(),
                full_name: "E-mail / Chat".into(),
                icon: "📧".into(),
                workspace: "open-space".into(),
                service_duration_ms: 5_000,
                slots: vec![SlotId::new("open-a"), SlotId::new("open-b")],
            },
            StationConfig {
                station_type: StationType::Red,
                name: "Confid.".into(),
                full_name: "Confidential / Feedback".into(),
                icon: "🔐".into(),
                workspace: "phonebooth".into(),
                service_duration_ms: 10_000,
                slots: vec![SlotId::new("phone")],
            },
            StationConfig {
                station_type: StationType::Green,
                name: "Daily".into(),
                full_name: "Daily / Alignment".into(),
                icon: "🤝".into(),
                workspace: "huddle-room".into(),
                service_duration_ms: 20_000,
                slots: vec![SlotId::new("huddle")],
            },
        ];

        let phases = vec![
            Phase {
                index: 1,
                label: "Warm-up".into(),
                description: "All rooms free, relaxed pace".into(),
                start_secs: 0,
                end_secs: 40,
                arrival_interval_ms: 6_000,
                planned_count: 5,
            },
            Phase {
                index: 2,
                label: "Bottleneck".into(),
                description: "Rooms start filling up".into(),
                start_secs: 40,
                end_secs: 80,
                arrival_interval_ms: 4_000,
                planned_count: 5,
            },
            Phase {
                index: 3,
                label: "Rush".into(),
                description: "Intense pace, critical management".into(),
                start_secs: 80,
                end_secs: 120,
                arrival_interval_ms: 3_000,
                planned_count: 5,
            },
        ];

        // Round-robin keeps the standard roster at five employees per station
        let roster = DEFAULT_NAMES
            .iter()
            .enumerate()
            .map(|(i, name)| RosterEntry::new(*name, StationType::ALL[i % StationType::ALL.len()]))
            .collect();

        Self {
            game_duration_secs: 120,
            total_entities: 15,
            update_interval_ms: 100,
            wrong_place_penalty_secs: 5,
            holding_capacity: 4,
            timer_warning_secs: 60,
            timer_danger_secs: 30,
            patience: PatienceConfig::default(),
            stations,
            phases,
            roster,
        }
    }
}

impl GameConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a TOML table; missing keys fall back to the defaults
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: GameConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML config file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        tracing::debug!("Loaded config from {}", path.display());
        Self::from_toml_str(&content)
    }

    pub fn update_interval(&self) -> Duration {
        Duration::from_millis(self.update_interval_ms)
    }

    /// Seconds of patience decay applied per loop pass
    pub fn tick_delta_secs(&self) -> f32 {
        self.update_interval_ms as f32 / 1000.0
    }

    pub fn station(&self, station_type: StationType) -> Option<&StationConfig> {
        self.stations.iter().find(|s| s.station_type == station_type)
    }

    pub fn service_duration(&self, station_type: StationType) -> Option<Duration> {
        self.station(station_type).map(StationConfig::service_duration)
    }

    /// Phases sorted by their explicit index
    pub fn phases_in_order(&self) -> Vec<Phase> {
        let mut phases = self.phases.clone();
        phases.sort_by_key(|p| p.index);
        phases
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: String| Err(TrafficError::InvalidConfig(msg));

        if self.game_duration_secs == 0 {
            return invalid("game_duration_secs must be positive".into());
        }
        if self.total_entities == 0 {
            return invalid("total_entities must be positive".into());
        }
        if self.update_interval_ms == 0 {
            return invalid("update_interval_ms must be positive".into());
        }

        if self.holding_capacity == 0 {
            return invalid("holding_capacity must be positive".into());
        }
        if self.timer_danger_secs > self.timer_warning_secs {
            return invalid(format!(
                "timer_danger_secs ({}) must not exceed timer_warning_secs ({})",
                self.timer_danger_secs, self.timer_warning_secs
            ));
        }

        let p = &self.patience;
        let fields = [
            ("max", p.max),
            ("holding_decay", p.holding_decay),
            ("queued_decay", p.queued_decay),
            ("queue_bonus", p.queue_bonus),
            ("low_threshold", p.low_threshold),
        ];
        if let Some((name, value)) = fields.iter().find(|(_, v)| !v.is_finite()) {
            return invalid(format!("patience.{} ({}) must be finite", name, value));
        }
        if !(p.max > 0.0) {
            return invalid(format!("patience.max ({}) must be positive", p.max));
        }
        if !(p.holding_decay > 0.0) || !(p.queued_decay > 0.0) {
            return invalid("patience decay rates must be positive".into());
        }
        if !(p.queue_bonus >= 0.0) {
            return invalid(format!("patience.queue_bonus ({}) must not be negative", p.queue_bonus));
        }
        if !(0.0..=p.max).contains(&p.low_threshold) {
            return invalid(format!(
                "patience.low_threshold ({}) must lie within [0, {}]",
                p.low_threshold, p.max
            ));
        }

        if self.stations.is_empty() {
            return invalid("at least one station is required".into());
        }
        let mut types = BTreeSet::new();
        let mut slots = AHashSet::new();
        for station in &self.stations {
            if !types.insert(station.station_type) {
                return invalid(format!("station type {} declared twice", station.station_type));
            }
            if station.slots.is_empty() {
                return invalid(format!("station {} has no slots", station.station_type));
            }
            if station.service_duration_ms == 0 {
                return invalid(format!("station {} has zero service duration", station.station_type));
            }
            for slot in &station.slots {
                if !slots.insert(slot.clone()) {
                    return invalid(format!("slot {} used by more than one station", slot));
                }
            }
        }

        if self.phases.is_empty() {
            return invalid("at least one phase is required".into());
        }
        let mut indices = BTreeSet::new();
        for phase in &self.phases {
            if !indices.insert(phase.index) {
                return invalid(format!("phase index {} declared twice", phase.index));
            }
            if phase.start_secs >= phase.end_secs {
                return invalid(format!(
                    "phase {} starts at {} but ends at {}",
                    phase.index, phase.start_secs, phase.end_secs
                ));
            }
            if phase.arrival_interval_ms == 0 {
                return invalid(format!("phase {} has zero arrival interval", phase.index));
            }
        }

        if let Some(entry) = self.roster.iter().find(|e| !types.contains(&e.station_type)) {
            return invalid(format!(
                "roster entry {} needs station {} which is not configured",
                entry.name, entry.station_type
            ));
        }
        if self.roster.len() < self.total_entities {
            return invalid(format!(
                "roster has {} entries but total_entities is {}",
                self.roster.len(),
                self.total_entities
            ));
        }

        Ok(())
    }
}
