//! Tick system - the fixed-cadence simulation loop
//!
//! One pass visits every live employee exactly once, in id order:
//! unplaced employees lose patience, employees in service make progress.
//! A single employee running out of patience ends the session on the spot;
//! serving the whole roster wins without waiting for the countdown.

use std::time::Instant;

use crate::core::config::GameConfig;
use crate::core::types::EntityId;
use crate::simulation::events::{
    DefeatCause, NoticeKind, Outcome, RemovalReason, SessionEvent, Severity,
};
use crate::simulation::state::SessionState;

/// Everything one loop pass produced
#[derive(Debug, Clone, Default)]
pub struct TickReport {
    pub events: Vec<SessionEvent>,
    /// Set when this pass ended the session
    pub outcome: Option<Outcome>,
}

/// Run a single simulation loop pass
///
/// `dt_secs` is the nominal loop interval; service progress reads `now`
/// directly so it does not depend on tick regularity.
pub fn run_simulation_tick(
    state: &mut SessionState,
    config: &GameConfig,
    now: Instant,
    dt_secs: f32,
) -> TickReport {
    let mut report = TickReport::default();
    let ids: Vec<EntityId> = state.entities.keys().copied().collect();

    for id in ids {
        let Some(employee) = state.entities.get_mut(&id) else {
            continue;
        };

        if !employee.is_in_service() {
            if !employee.update_patience(dt_secs, &config.patience) {
                let name = employee.name.clone();
                tracing::info!("{} ({}) ran out of patience", name, id);
                state.entities.remove(&id);
                report.events.push(SessionEvent::EntityRemoved {
                    id,
                    reason: RemovalReason::Failed,
                });
                report.outcome = Some(Outcome::Defeat {
                    cause: DefeatCause::PatienceExhausted { entity: id, name },
                });
                return report;
            }
        } else if employee.update_work(now) {
            let name = employee.name.clone();
            let slot = employee.slot().cloned();
            state.entities.remove(&id);
            state.completed_count += 1;

            tracing::debug!(
                "{} ({}) completed service, {}/{} done",
                name,
                id,
                state.completed_count,
                state.total_entities
            );

            report.events.push(SessionEvent::EntityRemoved {
                id,
                reason: RemovalReason::Completed,
            });
            if let Some(slot) = slot {
                state.release_slot(&slot);
                report.events.push(SessionEvent::SlotReleased { slot });
            }
            report.events.push(SessionEvent::notice(
                Severity::Success,
                NoticeKind::Completion,
                format!("{} finished the task!", name),
            ));
            continue;
        }

        report.events.push(SessionEvent::EntityUpdated {
            id,
            patience: employee.patience(),
            low_patience: employee.is_patience_low(&config.patience),
            service_progress: employee.service_progress(),
            remaining_service_secs: employee
                .is_in_service()
                .then(|| employee.remaining_service_secs(now)),
        });
    }

    if state.all_served() {
        report.outcome = Some(Outcome::Victory);
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{SlotId, StationType};
    use crate::entity::employee::Employee;
    use std::time::Duration;

    fn add(state: &mut SessionState, id: u32, station_type: StationType, secs: u64) {
        let employee = Employee::new(
            EntityId(id),
            format!("E{}", id),
            station_type,
            id as usize,
            100.0,
            Duration::from_secs(secs),
        );
        state.entities.insert(EntityId(id), employee);
        state.spawned_count += 1;
    }

    #[test]
    fn test_tick_decays_holding() {
        let config = GameConfig::default();
        let mut state = SessionState::new(&config);
        add(&mut state, 1, StationType::Blue, 5);

        let report = run_simulation_tick(&mut state, &config, Instant::now(), 0.1);
        assert!(report.outcome.is_none());
        let patience = state.entities[&EntityId(1)].patience();
        assert!((patience - 99.6).abs() < 1e-3);
        assert!(matches!(report.events[0], SessionEvent::EntityUpdated { .. }));
    }

    #[test]
    fn test_completion_releases_slot() {
        let config = GameConfig::default();
        let mut state = SessionState::new(&config);
        add(&mut state, 1, StationType::Red, 10);

        let start = Instant::now();
        let phone = SlotId::new("phone");
        state.slot_mut(&phone).unwrap().occupied_by = Some(EntityId(1));
        state.entities.get_mut(&EntityId(1)).unwrap().start_service(phone.clone(), start);

        let report = run_simulation_tick(&mut state, &config, start + Duration::from_secs(5), 0.1);
        assert!(report.outcome.is_none());
        assert_eq!(state.completed_count, 0);

        let report = run_simulation_tick(&mut state, &config, start + Duration::from_secs(10), 0.1);
        assert_eq!(state.completed_count, 1);
        assert!(state.entities.is_empty());
        assert!(state.slot(&phone).unwrap().is_free());
        assert!(report.events.contains(&SessionEvent::SlotReleased { slot: phone }));
    }

    #[test]
    fn test_exhaustion_defeats_even_with_service_running() {
        let config = GameConfig::default();
        let mut state = SessionState::new(&config);
        add(&mut state, 1, StationType::Green, 20);
        add(&mut state, 2, StationType::Blue, 5);

        let start = Instant::now();
        state.entities.get_mut(&EntityId(1)).unwrap().start_service(SlotId::new("huddle"), start);

        let report = run_simulation_tick(&mut state, &config, start, 30.0);
        assert_eq!(
            report.outcome,
            Some(Outcome::Defeat {
                cause: DefeatCause::PatienceExhausted {
                    entity: EntityId(2),
                    name: "E2".into()
                }
            })
        );
        assert!(report.events.contains(&SessionEvent::EntityRemoved {
            id: EntityId(2),
            reason: RemovalReason::Failed
        }));
        assert!(state.entities.contains_key(&EntityId(1)));
    }

    #[test]
    fn test_victory_when_all_served() {
        let mut config = GameConfig::default();
        config.total_entities = 1;
        let mut state = SessionState::new(&config);
        add(&mut state, 1, StationType::Blue, 5);

        let start = Instant::now();
        let slot = SlotId::new("open-a");
        state.slot_mut(&slot).unwrap().occupied_by = Some(EntityId(1));
        state.entities.get_mut(&EntityId(1)).unwrap().start_service(slot, start);

        let report = run_simulation_tick(&mut state, &config, start + Duration::from_secs(5), 0.1);
        assert_eq!(report.outcome, Some(Outcome::Victory));
    }
}
