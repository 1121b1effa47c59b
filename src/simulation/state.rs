//! Session state - everything one running session owns
//!
//! Mutated only through the controller and the per-tick systems it calls.

use std::collections::BTreeMap;
use std::time::Instant;

use serde::Serialize;

use crate::core::config::GameConfig;
use crate::core::types::{EntityId, Location, SlotId, StationType};
use crate::entity::employee::{Employee, EmployeeView};
use crate::simulation::clock::SessionClock;
use crate::simulation::events::TimerUrgency;

/// A typed service position holding at most one employee
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StationSlot {
    pub id: SlotId,
    pub accepted: StationType,
    pub occupied_by: Option<EntityId>,
}

impl StationSlot {
    pub fn is_free(&self) -> bool {
        self.occupied_by.is_none()
    }
}

#[derive(Debug, Clone)]
pub struct SessionState {
    pub clock: SessionClock,
    /// Live employees, iterated in id order
    pub entities: BTreeMap<EntityId, Employee>,
    pub slots: Vec<StationSlot>,
    pub spawned_count: usize,
    pub completed_count: usize,
    pub total_entities: usize,
    pub is_running: bool,
}

impl SessionState {
    pub fn new(config: &GameConfig) -> Self {
        let clock = SessionClock::new(config.game_duration_secs, config.phases_in_order())
            .with_urgency_thresholds(config.timer_warning_secs, config.timer_danger_secs);

        let slots = config
            .stations
            .iter()
            .flat_map(|station| {
                station.slots.iter().map(|id| StationSlot {
                    id: id.clone(),
                    accepted: station.station_type,
                    occupied_by: None,
                })
            })
            .collect();

        Self {
            clock,
            entities: BTreeMap::new(),
            slots,
            spawned_count: 0,
            completed_count: 0,
            total_entities: config.total_entities,
            is_running: false,
        }
    }

    /// Back to the initial state of a session (not running)
    pub fn reset(&mut self) {
        self.clock.reset();
        self.entities.clear();
        for slot in &mut self.slots {
            slot.occupied_by = None;
        }
        self.spawned_count = 0;
        self.completed_count = 0;
        self.is_running = false;
    }

    pub fn count_at(&self, location: Location) -> usize {
        self.entities.values().filter(|e| e.location() == location).count()
    }

    /// Employees waiting at the reception desk
    pub fn holding_count(&self) -> usize {
        self.count_at(Location::Holding)
    }

    pub fn slot(&self, id: &SlotId) -> Option<&StationSlot> {
        self.slots.iter().find(|s| &s.id == id)
    }

    pub fn slot_mut(&mut self, id: &SlotId) -> Option<&mut StationSlot> {
        self.slots.iter_mut().find(|s| &s.id == id)
    }

    /// Free the slot; returns whether it was occupied
    pub fn release_slot(&mut self, id: &SlotId) -> bool {
        self.slot_mut(id)
            .and_then(|slot| slot.occupied_by.take())
            .is_some()
    }

    pub fn free_slots_for(&self, station_type: StationType) -> impl Iterator<Item = &StationSlot> + '_ {
        self.slots
            .iter()
            .filter(move |s| s.accepted == station_type && s.is_free())
    }

    pub fn all_served(&self) -> bool {
        self.completed_count >= self.total_entities
    }

    /// Share of the roster served so far, 0-100
    pub fn progress_percent(&self) -> f32 {
        if self.total_entities == 0 {
            return 0.0;
        }
        self.completed_count as f32 / self.total_entities as f32 * 100.0
    }

    pub fn snapshot(&self, now: Instant, config: &GameConfig) -> SessionSnapshot {
        let phase = self.clock.current_phase();
        SessionSnapshot {
            is_running: self.is_running,
            time_remaining: self.clock.time_remaining(),
            elapsed: self.clock.elapsed(),
            urgency: self.clock.urgency(),
            phase_index: phase.index,
            phase_label: phase.label.clone(),
            spawned_count: self.spawned_count,
            completed_count: self.completed_count,
            total_entities: self.total_entities,
            progress_percent: self.progress_percent(),
            entities: self
                .entities
                .values()
                .map(|e| e.view(now, &config.patience))
                .collect(),
            slots: self.slots.clone(),
        }
    }
}

/// Serializable picture of a session for renderers
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSnapshot {
    pub is_running: bool,
    pub time_remaining: u32,
    pub elapsed: u32,
    pub urgency: TimerUrgency,
    pub phase_index: u32,
    pub phase_label: String,
    pub spawned_count: usize,
    pub completed_count: usize,
    pub total_entities: usize,
    pub progress_percent: f32,
    pub entities: Vec<EmployeeView>,
    pub slots: Vec<StationSlot>,
}

impl SessionSnapshot {
    pub fn entity(&self, id: EntityId) -> Option<&EmployeeView> {
        self.entities.iter().find(|e| e.id == id)
    }
}
