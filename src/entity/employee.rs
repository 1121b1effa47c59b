//! Employee lifecycle: patience decay, placement and timed service

use std::time::{Duration, Instant};

use serde::Serialize;

use crate::core::config::PatienceConfig;
use crate::core::types::{EntityId, Location, SlotId, StationType};

/// One work item moving through the office
///
/// Lifecycle: `Holding -> (Queued) -> InService -> completed`. An employee
/// whose patience runs out before reaching service ends the session.
#[derive(Debug, Clone)]
pub struct Employee {
    pub id: EntityId,
    pub name: String,
    pub station_type: StationType,
    /// Position in the configured roster this employee was drawn from
    pub roster_index: usize,
    patience: f32,
    location: Location,
    slot: Option<SlotId>,
    service_started_at: Option<Instant>,
    service_duration: Duration,
    service_progress: f32,
}

impl Employee {
    pub fn new(
        id: EntityId,
        name: String,
        station_type: StationType,
        roster_index: usize,
        patience_max: f32,
        service_duration: Duration,
    ) -> Self {
        Self {
            id,
            name,
            station_type,
            roster_index,
            patience: patience_max,
            location: Location::Holding,
            slot: None,
            service_started_at: None,
            service_duration,
            service_progress: 0.0,
        }
    }

    pub fn patience(&self) -> f32 {
        self.patience
    }

    pub fn location(&self) -> Location {
        self.location
    }

    pub fn slot(&self) -> Option<&SlotId> {
        self.slot.as_ref()
    }

    pub fn is_in_service(&self) -> bool {
        self.location == Location::InService
    }

    pub fn can_work_at(&self, station_type: StationType) -> bool {
        self.station_type == station_type
    }

    pub fn is_patience_low(&self, rules: &PatienceConfig) -> bool {
        self.patience < rules.low_threshold
    }

    /// Decay patience over `dt_secs`
    ///
    /// Returns false once patience has run out. In service this is a no-op.
    pub fn update_patience(&mut self, dt_secs: f32, rules: &PatienceConfig) -> bool {
        let rate = match self.location {
            Location::InService => return true,
            Location::Holding => rules.holding_decay,
            Location::Queued => rules.queued_decay,
        };

        self.patience -= rate * dt_secs;
        if self.patience <= 0.0 {
            self.patience = 0.0;
            return false;
        }
        true
    }

    /// Move from the reception desk to the waiting room
    ///
    /// The first move restores `queue_bonus` patience; moving an already
    /// queued employee changes nothing and returns false.
    pub fn move_to_queue(&mut self, rules: &PatienceConfig) -> bool {
        if self.location != Location::Holding {
            return false;
        }
        self.location = Location::Queued;
        self.slot = None;
        self.patience = (self.patience + rules.queue_bonus).min(rules.max);
        true
    }

    /// Occupy `slot` starting at `now`; patience freezes at its current value
    pub fn start_service(&mut self, slot: SlotId, now: Instant) {
        self.location = Location::InService;
        self.slot = Some(slot);
        self.service_started_at = Some(now);
        self.service_progress = 0.0;
    }

    /// Recompute service progress from wall-clock time
    ///
    /// Returns true once the service is complete.
    pub fn update_work(&mut self, now: Instant) -> bool {
        let Some(started) = self.service_started_at.filter(|_| self.is_in_service()) else {
            return false;
        };

        let elapsed = now.saturating_duration_since(started);
        let progress = if self.service_duration.is_zero() {
            100.0
        } else {
            (elapsed.as_secs_f32() / self.service_duration.as_secs_f32() * 100.0).min(100.0)
        };
        // Irregular tick timing must never move the bar backwards
        self.service_progress = self.service_progress.max(progress);

        self.service_progress >= 100.0
    }

    /// Service progress in [0, 100], only while in service
    pub fn service_progress(&self) -> Option<f32> {
        self.is_in_service().then_some(self.service_progress)
    }

    /// Whole seconds of service left, rounded up
    pub fn remaining_service_secs(&self, now: Instant) -> u32 {
        match self.service_started_at {
            Some(started) if self.is_in_service() => {
                let elapsed = now.saturating_duration_since(started);
                let remaining = self.service_duration.saturating_sub(elapsed);
                remaining.as_millis().div_ceil(1000) as u32
            }
            _ => 0,
        }
    }

    pub fn view(&self, now: Instant, rules: &PatienceConfig) -> EmployeeView {
        EmployeeView {
            id: self.id,
            name: self.name.clone(),
            station_type: self.station_type,
            patience: self.patience,
            low_patience: self.is_patience_low(rules),
            location: self.location,
            slot: self.slot.clone(),
            service_progress: self.service_progress(),
            remaining_service_secs: self.is_in_service().then(|| self.remaining_service_secs(now)),
        }
    }
}

/// Serializable read-only picture of an employee for renderers
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmployeeView {
    pub id: EntityId,
    pub name: String,
    pub station_type: StationType,
    pub patience: f32,
    pub low_patience: bool,
    pub location: Location,
    pub slot: Option<SlotId>,
    pub service_progress: Option<f32>,
    pub remaining_service_secs: Option<u32>,
}
