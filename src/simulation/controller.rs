//! Session controller - composes clock, scheduler, supply and loop
//!
//! The controller is the only owner of [`SessionState`]. Collaborators call
//! [`start`](SessionController::start), [`stop`](SessionController::stop) and
//! [`place_entity`](SessionController::place_entity); the runtime forwards
//! the three timed activations. Every activation carries the
//! [`Generation`] it was armed with and does nothing once that generation is
//! stale or the session is no longer running.

use std::time::{Duration, Instant};

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::core::config::GameConfig;
use crate::core::error::{Result, TrafficError};
use crate::core::types::{EntityId, Generation, Location};
use crate::entity::supply::EntitySupply;
use crate::simulation::events::{
    NoticeKind, Outcome, PlacementOutcome, PlacementTarget, SessionEvent, Severity,
};
use crate::simulation::scheduler::{ArrivalAttempt, ArrivalScheduler};
use crate::simulation::state::{SessionSnapshot, SessionState};
use crate::simulation::tick::run_simulation_tick;

pub struct SessionController {
    config: GameConfig,
    state: SessionState,
    supply: EntitySupply,
    scheduler: ArrivalScheduler,
    rng: ChaCha8Rng,
    generation: Generation,
    outcome: Option<Outcome>,
    events: Vec<SessionEvent>,
}

impl SessionController {
    pub fn new(config: GameConfig, rng: ChaCha8Rng) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            state: SessionState::new(&config),
            supply: EntitySupply::new(config.roster.clone()),
            scheduler: ArrivalScheduler::new(config.holding_capacity),
            rng,
            generation: Generation::default(),
            outcome: None,
            events: Vec::new(),
            config,
        })
    }

    pub fn with_seed(config: GameConfig, seed: u64) -> Result<Self> {
        Self::new(config, ChaCha8Rng::seed_from_u64(seed))
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn is_running(&self) -> bool {
        self.state.is_running
    }

    /// Outcome of the last finished session, cleared on start
    pub fn outcome(&self) -> Option<&Outcome> {
        self.outcome.as_ref()
    }

    pub fn snapshot(&self, now: Instant) -> SessionSnapshot {
        self.state.snapshot(now, &self.config)
    }

    /// Take every event emitted since the last drain
    pub fn drain_events(&mut self) -> Vec<SessionEvent> {
        std::mem::take(&mut self.events)
    }

    fn is_current(&self, generation: Generation) -> bool {
        self.state.is_running && generation == self.generation
    }

    /// Reset everything and begin a new session with one immediate arrival
    ///
    /// Undrained events of the previous session stay buffered ahead of the
    /// new session's events.
    pub fn start(&mut self) -> Generation {
        self.generation = self.generation.next();
        self.state.reset();
        self.supply.reset();
        self.scheduler.reset();
        self.outcome = None;
        self.state.is_running = true;

        tracing::info!(
            "Session {} started: {} employees in {}s",
            self.generation.0,
            self.state.total_entities,
            self.state.clock.duration()
        );

        let phase = self.state.clock.current_phase();
        self.events.push(SessionEvent::PhaseChanged {
            index: phase.index,
            label: phase.label.clone(),
        });
        self.events.push(SessionEvent::ClockTicked {
            time_remaining: self.state.clock.time_remaining(),
            urgency: self.state.clock.urgency(),
        });

        self.arrive();
        self.generation
    }

    /// Stop the session without resolving it; returns false if already stopped
    pub fn stop(&mut self) -> bool {
        if !self.state.is_running {
            return false;
        }
        self.state.is_running = false;
        tracing::info!("Session {} stopped", self.generation.0);
        true
    }

    pub fn restart(&mut self) -> Generation {
        self.stop();
        self.start()
    }

    /// Loop activation: decay, service progress, win/loss detection
    pub fn on_simulation_tick(&mut self, generation: Generation, now: Instant) {
        if !self.is_current(generation) {
            return;
        }
        let dt = self.config.tick_delta_secs();
        let report = run_simulation_tick(&mut self.state, &self.config, now, dt);
        self.events.extend(report.events);
        if let Some(outcome) = report.outcome {
            self.finish(outcome);
        }
    }

    /// Countdown activation, once per second
    pub fn on_clock_tick(&mut self, generation: Generation) {
        if !self.is_current(generation) {
            return;
        }
        let tick = self.state.clock.tick();
        self.events.push(SessionEvent::ClockTicked {
            time_remaining: tick.time_remaining,
            urgency: self.state.clock.urgency(),
        });

        if tick.phase_change.is_some() {
            let phase = self.state.clock.current_phase();
            tracing::info!("Phase {}: {}", phase.index, phase.label);
            let label = phase.label.clone();
            let index = phase.index;
            self.events.push(SessionEvent::PhaseChanged {
                index,
                label: label.clone(),
            });
            self.events.push(SessionEvent::notice(
                Severity::Warning,
                NoticeKind::PhaseChange,
                format!("Phase {}: {}", index, label),
            ));
        }

        if tick.expired {
            let outcome = self
                .state
                .clock
                .resolve_expiry(self.state.completed_count, self.state.total_entities);
            self.finish(outcome);
        }
    }

    /// Arrival activation; returns the delay before the next one
    pub fn on_arrival(&mut self, generation: Generation) -> Option<Duration> {
        if !self.is_current(generation) {
            return None;
        }
        self.arrive();
        self.next_arrival_delay()
    }

    /// Delay until the next arrival while the session runs
    pub fn next_arrival_delay(&self) -> Option<Duration> {
        if !self.state.is_running {
            return None;
        }
        self.scheduler.next_delay(&self.state)
    }

    fn arrive(&mut self) {
        let attempt =
            self.scheduler
                .attempt(&mut self.state, &mut self.supply, &mut self.rng, &self.config);

        match attempt {
            ArrivalAttempt::Arrived { id, station_type } => {
                let name = self
                    .state
                    .entities
                    .get(&id)
                    .map(|e| e.name.clone())
                    .unwrap_or_default();
                tracing::debug!("{} ({}, {}) arrived at reception", name, id, station_type);

                self.events.push(SessionEvent::EntityCreated {
                    id,
                    name: name.clone(),
                    station_type,
                });
                if self.state.spawned_count == 1 {
                    self.events.push(SessionEvent::notice(
                        Severity::Success,
                        NoticeKind::Arrival,
                        format!("{} arrived! Send them to the right room.", name),
                    ));
                }
            }
            ArrivalAttempt::HoldingFull => {
                tracing::debug!("Reception full, arrival skipped");
            }
            ArrivalAttempt::RosterExhausted | ArrivalAttempt::Finished => {}
        }
    }

    /// Move an employee to the waiting room or into a station slot
    ///
    /// Invalid requests (no session, unknown employee or slot, employee
    /// already serving) are errors and change nothing. A wrong station costs
    /// the configured penalty; the employee stays where it was.
    pub fn place_entity(
        &mut self,
        id: EntityId,
        target: PlacementTarget,
        now: Instant,
    ) -> Result<PlacementOutcome> {
        if !self.state.is_running {
            return Err(TrafficError::SessionNotRunning);
        }

        let employee = self
            .state
            .entities
            .get(&id)
            .ok_or(TrafficError::EntityNotFound(id))?;
        if employee.is_in_service() {
            return Err(TrafficError::AlreadyInService(id));
        }
        let station_type = employee.station_type;

        let slot_id = match target {
            PlacementTarget::Queue => return Ok(self.queue(id)),
            PlacementTarget::Slot(slot_id) => slot_id,
        };

        let (free, accepted) = self
            .state
            .slot(&slot_id)
            .map(|s| (s.is_free(), s.accepted))
            .ok_or_else(|| TrafficError::UnknownSlot(slot_id.clone()))?;

        if !free {
            self.events.push(SessionEvent::notice(
                Severity::Warning,
                NoticeKind::SlotOccupied,
                format!("{} is already taken", slot_id),
            ));
            return Ok(PlacementOutcome::RejectedSlotOccupied);
        }

        if accepted != station_type {
            let applied = self
                .state
                .clock
                .apply_penalty(self.config.wrong_place_penalty_secs);
            tracing::warn!(
                "{} ({}) does not belong in {} ({}), -{}s",
                id,
                station_type,
                slot_id,
                accepted,
                applied
            );
            self.events.push(SessionEvent::ClockTicked {
                time_remaining: self.state.clock.time_remaining(),
                urgency: self.state.clock.urgency(),
            });
            self.events.push(SessionEvent::notice(
                Severity::Error,
                NoticeKind::WrongPlacement,
                format!("Wrong room! -{}s", self.config.wrong_place_penalty_secs),
            ));
            return Ok(PlacementOutcome::RejectedWrongType);
        }

        if let Some(slot) = self.state.slot_mut(&slot_id) {
            slot.occupied_by = Some(id);
        }
        if let Some(employee) = self.state.entities.get_mut(&id) {
            employee.start_service(slot_id.clone(), now);
        }
        tracing::debug!("{} started service in {}", id, slot_id);

        self.events.push(SessionEvent::EntityMoved {
            id,
            location: Location::InService,
            slot: Some(slot_id),
        });
        Ok(PlacementOutcome::PlacedInService)
    }

    fn queue(&mut self, id: EntityId) -> PlacementOutcome {
        let rules = &self.config.patience;
        let moved = self
            .state
            .entities
            .get_mut(&id)
            .map(|e| e.move_to_queue(rules))
            .unwrap_or(false);

        if moved {
            self.events.push(SessionEvent::EntityMoved {
                id,
                location: Location::Queued,
                slot: None,
            });
            self.events.push(SessionEvent::notice(
                Severity::Success,
                NoticeKind::Queued,
                "Waiting in the waiting room",
            ));
        }
        PlacementOutcome::PlacedInQueue
    }

    /// End the session once; later outcomes of the same session are ignored
    fn finish(&mut self, outcome: Outcome) {
        if !self.state.is_running {
            return;
        }
        self.state.is_running = false;

        match &outcome {
            Outcome::Victory => tracing::info!(
                "Session {} won: {}/{} served",
                self.generation.0,
                self.state.completed_count,
                self.state.total_entities
            ),
            Outcome::Defeat { cause } => tracing::info!(
                "Session {} lost ({:?}): {}/{} served",
                self.generation.0,
                cause,
                self.state.completed_count,
                self.state.total_entities
            ),
        }

        self.events.push(SessionEvent::SessionEnded {
            outcome: outcome.clone(),
            completed: self.state.completed_count,
            spawned: self.state.spawned_count,
        });
        self.outcome = Some(outcome);
    }
}
