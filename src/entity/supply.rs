//! Entity supply - draws employees from the roster without repetition

use ahash::AHashSet;
use rand::seq::SliceRandom;
use rand::Rng;

use crate::core::config::{GameConfig, RosterEntry};
use crate::core::types::{EntityId, StationType};
use crate::entity::employee::Employee;

/// Remaining roster entries for the current session
///
/// Every roster entry is issued at most once between two calls to
/// [`EntitySupply::reset`], and ids are handed out monotonically from 1.
#[derive(Debug, Clone)]
pub struct EntitySupply {
    roster: Vec<RosterEntry>,
    /// Indices into `roster` that have not been issued yet
    available: Vec<usize>,
    issued: AHashSet<usize>,
    next_id: u32,
}

impl EntitySupply {
    pub fn new(roster: Vec<RosterEntry>) -> Self {
        let available = (0..roster.len()).collect();
        Self {
            roster,
            available,
            issued: AHashSet::new(),
            next_id: 0,
        }
    }

    /// Make the whole roster available again and restart ids
    pub fn reset(&mut self) {
        self.available = (0..self.roster.len()).collect();
        self.issued.clear();
        self.next_id = 0;
    }

    pub fn remaining(&self) -> usize {
        self.available.len()
    }

    pub fn remaining_of(&self, station_type: StationType) -> usize {
        self.available
            .iter()
            .filter(|&&i| self.roster[i].station_type == station_type)
            .count()
    }

    pub fn is_exhausted(&self) -> bool {
        self.available.is_empty()
    }

    pub fn issued_count(&self) -> usize {
        self.issued.len()
    }

    /// Type of a random still-available roster entry
    ///
    /// Types are weighted by how many entries of each remain, so the draw
    /// trends towards the roster's mix without guaranteeing it.
    pub fn random_available_type(&self, rng: &mut impl Rng) -> Option<StationType> {
        self.available
            .choose(rng)
            .map(|&i| self.roster[i].station_type)
    }

    /// Issue a new employee, preferring `requested` when given
    ///
    /// If no entry of the requested type is left any remaining entry is used
    /// instead. Returns `None` once the roster is exhausted.
    pub fn create(
        &mut self,
        requested: Option<StationType>,
        rng: &mut impl Rng,
        config: &GameConfig,
    ) -> Option<Employee> {
        let matching: Vec<usize> = match requested {
            Some(t) => (0..self.available.len())
                .filter(|&pos| self.roster[self.available[pos]].station_type == t)
                .collect(),
            None => Vec::new(),
        };

        let pos = if matching.is_empty() {
            if self.available.is_empty() {
                return None;
            }
            rng.gen_range(0..self.available.len())
        } else {
            matching[rng.gen_range(0..matching.len())]
        };

        let roster_index = self.available.swap_remove(pos);
        let fresh = self.issued.insert(roster_index);
        debug_assert!(fresh, "roster entry {} issued twice", roster_index);

        let entry = &self.roster[roster_index];
        let service_duration = config.service_duration(entry.station_type).unwrap_or_default();

        self.next_id += 1;
        Some(Employee::new(
            EntityId(self.next_id),
            entry.name.clone(),
            entry.station_type,
            roster_index,
            config.patience.max,
            service_duration,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn supply() -> (EntitySupply, GameConfig) {
        let config = GameConfig::default();
        (EntitySupply::new(config.roster.clone()), config)
    }

    #[test]
    fn test_create_requested_type() {
        let (mut supply, config) = supply();
        let mut rng = ChaCha8Rng::seed_from_u64(7);

        let e = supply.create(Some(StationType::Red), &mut rng, &config).unwrap();
        assert_eq!(e.station_type, StationType::Red);
        assert_eq!(e.id, EntityId(1));
        assert_eq!(e.patience(), 100.0);
        assert_eq!(supply.remaining(), 14);
        assert_eq!(supply.remaining_of(StationType::Red), 4);
    }

    #[test]
    fn test_falls_back_when_type_exhausted() {
        let (mut supply, config) = supply();
        let mut rng = ChaCha8Rng::seed_from_u64(1);

        for _ in 0..5 {
            let e = supply.create(Some(StationType::Green), &mut rng, &config).unwrap();
            assert_eq!(e.station_type, StationType::Green);
        }
        let substitute = supply.create(Some(StationType::Green), &mut rng, &config).unwrap();
        assert_ne!(substitute.station_type, StationType::Green);
    }

    #[test]
    fn test_never_repeats_roster_entries() {
        let (mut supply, config) = supply();
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let mut seen = AHashSet::new();

        while let Some(e) = supply.create(Some(StationType::Green), &mut rng, &config) {
            assert!(seen.insert(e.roster_index), "duplicate roster entry {}", e.roster_index);
        }
        assert_eq!(seen.len(), 15);
        assert!(supply.is_exhausted());
        assert!(supply.create(None, &mut rng, &config).is_none());
        assert!(supply.random_available_type(&mut rng).is_none());
    }

    #[test]
    fn test_ids_are_monotonic() {
        let (mut supply, config) = supply();
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let ids: Vec<u32> = (0..4)
            .filter_map(|_| supply.create(None, &mut rng, &config))
            .map(|e| e.id.0)
            .collect();
        assert_eq!(ids, vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_reset_restores_roster() {
        let (mut supply, config) = supply();
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        for _ in 0..6 {
            supply.create(None, &mut rng, &config);
        }
        supply.reset();
        assert_eq!(supply.remaining(), 15);
        assert_eq!(supply.issued_count(), 0);
        let e = supply.create(None, &mut rng, &config).unwrap();
        assert_eq!(e.id, EntityId(1));
    }

    #[test]
    fn test_service_duration_from_station() {
        let (mut supply, config) = supply();
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let mut e = supply.create(Some(StationType::Blue), &mut rng, &config).unwrap();
        let now = std::time::Instant::now();
        e.start_service("open-a".into(), now);
        assert_eq!(e.remaining_service_secs(now), 5);
    }
}
