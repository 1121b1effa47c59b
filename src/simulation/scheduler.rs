//! Arrival scheduler - brings new employees to the reception desk
//!
//! Each activation makes at most one arrival attempt and then reports the
//! delay until the next one, read from the phase active at that moment.
//! A full desk skips the attempt rather than saving it for later.

use std::time::Duration;

use rand::Rng;

use crate::core::config::GameConfig;
use crate::core::types::{EntityId, StationType};
use crate::entity::supply::EntitySupply;
use crate::simulation::state::SessionState;

/// What a single arrival attempt did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArrivalAttempt {
    Arrived { id: EntityId, station_type: StationType },
    /// Reception desk at capacity; retried at the next interval
    HoldingFull,
    /// Supply had nothing left to issue
    RosterExhausted,
    /// Every employee of the session has already arrived
    Finished,
}

#[derive(Debug, Clone)]
pub struct ArrivalScheduler {
    holding_capacity: usize,
    finished: bool,
}

impl ArrivalScheduler {
    pub fn new(holding_capacity: usize) -> Self {
        Self {
            holding_capacity,
            finished: false,
        }
    }

    pub fn reset(&mut self) {
        self.finished = false;
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Try to bring in one employee
    pub fn attempt(
        &mut self,
        state: &mut SessionState,
        supply: &mut EntitySupply,
        rng: &mut impl Rng,
        config: &GameConfig,
    ) -> ArrivalAttempt {
        if self.finished || state.spawned_count >= state.total_entities {
            self.finished = true;
            return ArrivalAttempt::Finished;
        }

        if state.holding_count() >= self.holding_capacity {
            return ArrivalAttempt::HoldingFull;
        }

        let requested = supply.random_available_type(rng);
        let Some(employee) = supply.create(requested, rng, config) else {
            self.finished = true;
            return ArrivalAttempt::RosterExhausted;
        };

        let id = employee.id;
        let station_type = employee.station_type;
        state.entities.insert(id, employee);
        state.spawned_count += 1;

        if state.spawned_count >= state.total_entities {
            self.finished = true;
        }

        ArrivalAttempt::Arrived { id, station_type }
    }

    /// Delay until the next attempt, or `None` once arrivals are over
    pub fn next_delay(&self, state: &SessionState) -> Option<Duration> {
        if self.finished || state.spawned_count >= state.total_entities {
            return None;
        }
        Some(state.clock.current_phase().arrival_interval())
    }
}
