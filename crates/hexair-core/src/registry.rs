//! Registry of live aircraft for one episode.

use std::collections::BTreeMap;

use crate::aircraft::{Aircraft, AircraftId};

/// Live aircraft keyed by id.
///
/// Ids are handed out monotonically, so id order is insertion order and
/// iteration is deterministic.
#[derive(Debug, Clone, Default)]
pub struct AircraftRegistry {
    aircraft: BTreeMap<AircraftId, Aircraft>,
}

impl AircraftRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of aircraft currently en route.
    pub fn len(&self) -> usize {
        self.aircraft.len()
    }

    pub fn is_empty(&self) -> bool {
        self.aircraft.is_empty()
    }

    /// Register a new aircraft.
    ///
    /// # Panics
    /// If the id is already registered; ids are never reused in an episode.
    pub fn add(&mut self, aircraft: Aircraft) {
        assert!(
            !self.aircraft.contains_key(&aircraft.id),
            "aircraft id {} already registered",
            aircraft.id
        );
        self.aircraft.insert(aircraft.id, aircraft);
    }

    /// Remove an aircraft; absent ids are ignored.
    pub fn remove(&mut self, id: AircraftId) -> Option<Aircraft> {
        self.aircraft.remove(&id)
    }

    pub fn get(&self, id: AircraftId) -> Option<&Aircraft> {
        self.aircraft.get(&id)
    }

    pub fn get_mut(&mut self, id: AircraftId) -> Option<&mut Aircraft> {
        self.aircraft.get_mut(&id)
    }

    pub fn contains(&self, id: AircraftId) -> bool {
        self.aircraft.contains_key(&id)
    }

    pub fn ids(&self) -> Vec<AircraftId> {
        self.aircraft.keys().copied().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Aircraft> {
        self.aircraft.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Aircraft> {
        self.aircraft.values_mut()
    }

    pub fn clear(&mut self) {
        self.aircraft.clear();
    }
}
