//! Session clock - countdown, phase selection and time penalties
//!
//! The countdown moves in whole seconds, independent of the faster
//! simulation loop. Phase selection looks at elapsed time
//! (`duration - remaining`), so penalties also push the session into later
//! phases sooner.

use crate::core::config::Phase;
use crate::simulation::events::{DefeatCause, Outcome, TimerUrgency};

/// Result of one countdown second
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClockTick {
    pub time_remaining: u32,
    /// New phase index, only when the active phase actually changed
    pub phase_change: Option<u32>,
    /// Countdown reached zero; the session must be resolved now
    pub expired: bool,
}

#[derive(Debug, Clone)]
pub struct SessionClock {
    duration: u32,
    time_remaining: u32,
    /// Sorted by `index`
    phases: Vec<Phase>,
    current: usize,
    warning_secs: u32,
    danger_secs: u32,
}

impl SessionClock {
    /// `phases` must be non-empty (guaranteed by config validation)
    pub fn new(duration: u32, mut phases: Vec<Phase>) -> Self {
        phases.sort_by_key(|p| p.index);
        let mut clock = Self {
            duration,
            time_remaining: duration,
            phases,
            current: 0,
            warning_secs: 60,
            danger_secs: 30,
        };
        clock.reset();
        clock
    }

    pub fn with_urgency_thresholds(mut self, warning_secs: u32, danger_secs: u32) -> Self {
        self.warning_secs = warning_secs;
        self.danger_secs = danger_secs;
        self
    }

    pub fn reset(&mut self) {
        self.time_remaining = self.duration;
        self.current = self.active_position(0).unwrap_or(0);
    }

    pub fn duration(&self) -> u32 {
        self.duration
    }

    pub fn time_remaining(&self) -> u32 {
        self.time_remaining
    }

    pub fn elapsed(&self) -> u32 {
        self.duration - self.time_remaining
    }

    pub fn current_phase(&self) -> &Phase {
        &self.phases[self.current]
    }

    /// Phase whose window contains `elapsed`; later indices win overlaps
    pub fn active_phase_at(&self, elapsed: u32) -> Option<&Phase> {
        self.active_position(elapsed).map(|i| &self.phases[i])
    }

    fn active_position(&self, elapsed: u32) -> Option<usize> {
        self.phases.iter().rposition(|p| p.contains(elapsed))
    }

    /// Advance the countdown by one second
    pub fn tick(&mut self) -> ClockTick {
        self.time_remaining = self.time_remaining.saturating_sub(1);

        // Past every window (e.g. after heavy penalties) the last phase sticks
        let phase_change = match self.active_position(self.elapsed()) {
            Some(pos) if pos != self.current => {
                self.current = pos;
                Some(self.phases[pos].index)
            }
            _ => None,
        };

        ClockTick {
            time_remaining: self.time_remaining,
            phase_change,
            expired: self.time_remaining == 0,
        }
    }

    /// Remove `secs` from the countdown, never below zero
    ///
    /// Returns the seconds actually removed. Expiry is only resolved by the
    /// next [`tick`](Self::tick).
    pub fn apply_penalty(&mut self, secs: u32) -> u32 {
        let applied = secs.min(self.time_remaining);
        self.time_remaining -= applied;
        applied
    }

    /// Outcome when the countdown runs out
    pub fn resolve_expiry(&self, completed: usize, total: usize) -> Outcome {
        if completed >= total {
            Outcome::Victory
        } else {
            Outcome::Defeat {
                cause: DefeatCause::TimeExpired,
            }
        }
    }

    pub fn urgency(&self) -> TimerUrgency {
        if self.time_remaining <= self.danger_secs {
            TimerUrgency::Danger
        } else if self.time_remaining <= self.warning_secs {
            TimerUrgency::Warning
        } else {
            TimerUrgency::Normal
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::GameConfig;

    fn clock() -> SessionClock {
        let config = GameConfig::default();
        SessionClock::new(config.game_duration_secs, config.phases)
    }

    fn phase(index: u32, start: u32, end: u32) -> Phase {
        Phase {
            index,
            label: format!("P{}", index),
            description: String::new(),
            start_secs: start,
            end_secs: end,
            arrival_interval_ms: 1000,
            planned_count: 0,
        }
    }

    #[test]
    fn test_phase_selection_by_elapsed() {
        let clock = clock();
        assert_eq!(clock.active_phase_at(0).unwrap().index, 1);
        assert_eq!(clock.active_phase_at(39).unwrap().index, 1);
        assert_eq!(clock.active_phase_at(41).unwrap().index, 2);
        assert_eq!(clock.active_phase_at(80).unwrap().index, 3);
        assert!(clock.active_phase_at(120).is_none());
    }

    #[test]
    fn test_overlapping_phases_highest_index_wins() {
        let clock = SessionClock::new(60, vec![phase(2, 20, 60), phase(1, 0, 30)]);
        assert_eq!(clock.active_phase_at(10).unwrap().index, 1);
        assert_eq!(clock.active_phase_at(25).unwrap().index, 2);
    }

    #[test]
    fn test_tick_reports_phase_change_once() {
        let mut clock = clock();
        let mut changes = Vec::new();
        for _ in 0..45 {
            if let Some(index) = clock.tick().phase_change {
                changes.push((clock.elapsed(), index));
            }
        }
        assert_eq!(changes, vec![(40, 2)]);
        assert_eq!(clock.current_phase().index, 2);
    }

    #[test]
    fn test_expiry_after_full_duration() {
        let mut clock = clock();
        for _ in 0..119 {
            assert!(!clock.tick().expired);
        }
        let last = clock.tick();
        assert!(last.expired);
        assert_eq!(last.time_remaining, 0);
        // Past the last window the final phase is kept
        assert_eq!(clock.current_phase().index, 3);
    }

    #[test]
    fn test_penalty_floors_at_zero() {
        let mut clock = clock();
        assert_eq!(clock.apply_penalty(5), 5);
        assert_eq!(clock.time_remaining(), 115);

        let mut short = SessionClock::new(3, vec![phase(1, 0, 3)]);
        assert_eq!(short.apply_penalty(5), 3);
        assert_eq!(short.time_remaining(), 0);
        assert!(short.tick().expired);
    }

    #[test]
    fn test_resolve_expiry() {
        let clock = clock();
        assert_eq!(clock.resolve_expiry(15, 15), Outcome::Victory);
        assert_eq!(
            clock.resolve_expiry(14, 15),
            Outcome::Defeat {
                cause: DefeatCause::TimeExpired
            }
        );
    }

    #[test]
    fn test_urgency_levels() {
        let mut clock = clock();
        assert_eq!(clock.urgency(), TimerUrgency::Normal);
        clock.apply_penalty(60);
        assert_eq!(clock.urgency(), TimerUrgency::Warning);
        clock.apply_penalty(30);
        assert_eq!(clock.urgency(), TimerUrgency::Danger);
    }

    #[test]
    fn test_reset_restores_duration_and_phase() {
        let mut clock = clock();
        for _ in 0..50 {
            clock.tick();
        }
        clock.reset();
        assert_eq!(clock.time_remaining(), 120);
        assert_eq!(clock.current_phase().index, 1);
    }
}
