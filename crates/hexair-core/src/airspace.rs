//! The airspace engine: spawning, kinematics, scoring and sector hand-off.
//!
//! One call to [`Airspace::step`] runs the tick in a fixed order:
//! apply actions, move aircraft, attempt spawns, score, remove finished
//! aircraft, reassign sectors, emit the next observation.

use std::collections::BTreeMap;

use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};
use serde::Serialize;

use crate::aircraft::{Action, Aircraft, AircraftId, Kinematics, Priority};
use crate::config::SimConfig;
use crate::error::SimError;
use crate::geometry::{distance, Point};
use crate::layout;
use crate::observation::{build_observation, Observation};
use crate::registry::AircraftRegistry;
use crate::scoring::{score_tick, Outcome, ScoringRules};
use crate::sector::{Sector, SectorId};
use crate::vertiport::Vertiport;

/// Actions for one tick, keyed by aircraft.
///
/// Aircraft without an entry hold their heading.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActionMap(BTreeMap<AircraftId, Action>);

impl ActionMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: AircraftId, action: Action) -> Option<Action> {
        self.0.insert(id, action)
    }

    pub fn get(&self, id: AircraftId) -> Option<Action> {
        self.0.get(&id).copied()
    }

    /// Action for `id`, falling back to [`Action::Hold`].
    pub fn action_for(&self, id: AircraftId) -> Action {
        self.get(id).unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (AircraftId, Action)> + '_ {
        self.0.iter().map(|(id, action)| (*id, *action))
    }
}

impl FromIterator<(AircraftId, Action)> for ActionMap {
    fn from_iter<I: IntoIterator<Item = (AircraftId, Action)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Flight time of one aircraft that reached its goal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RouteTime {
    pub priority: Priority,
    pub route_class: u8,
    pub ticks: u64,
}

/// Flight times of arrived aircraft.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RouteTimes {
    pub records: Vec<RouteTime>,
}

impl RouteTimes {
    pub fn record(&mut self, priority: Priority, route_class: u8, ticks: u64) {
        self.records.push(RouteTime {
            priority,
            route_class,
            ticks,
        });
    }

    /// Mean flight time for a tier and route class, if any aircraft arrived.
    pub fn mean(&self, priority: Priority, route_class: u8) -> Option<f64> {
        let (sum, count) = self
            .records
            .iter()
            .filter(|r| r.priority == priority && r.route_class == route_class)
            .fold((0u64, 0u64), |(sum, count), r| (sum + r.ticks, count + 1));
        (count > 0).then(|| sum as f64 / count as f64)
    }
}

/// Result of one tick.
#[derive(Debug, Clone)]
pub struct StepResult {
    pub observation: Observation,
    pub reward: f64,
    /// Always false; episode termination is the runner's decision
    pub terminal: bool,
    /// Distance from each live (scored) aircraft to its nearest neighbour
    pub min_separation: BTreeMap<AircraftId, f64>,
}

/// Hexagonal sector airspace simulator.
pub struct Airspace {
    config: SimConfig,
    scoring: ScoringRules,
    kinematics: Kinematics,
    sectors: Vec<Sector>,
    vertiports: Vec<Vertiport>,
    registry: AircraftRegistry,
    rng: StdRng,
    id_tracker: u64,
    conflicts: u64,
    goals: u64,
    nmacs: u64,
    total_timesteps: u64,
    tick: u64,
    route_times: RouteTimes,
}

impl Airspace {
    /// Build the airspace from validated configuration and a seed.
    pub fn new(config: SimConfig, seed: u64) -> Result<Self, SimError> {
        config.validate()?;
        let kinematics = Kinematics::from_config(&config)?;
        let mut rng = StdRng::seed_from_u64(seed);

        let sectors = layout::sector_vertices(config.map_center, config.hex_radius)
            .into_iter()
            .enumerate()
            .map(|(id, ring)| Sector::new(SectorId(id), ring, config.sector_exit_len))
            .collect();
        let vertiports = new_vertiports(&config, &mut rng);

        Ok(Self {
            scoring: ScoringRules::from(&config),
            kinematics,
            sectors,
            vertiports,
            registry: AircraftRegistry::new(),
            rng,
            id_tracker: 0,
            conflicts: 0,
            goals: 0,
            nmacs: 0,
            total_timesteps: 0,
            tick: 0,
            route_times: RouteTimes::default(),
            config,
        })
    }

    /// Start a new episode and return the (empty) initial observation.
    pub fn reset(&mut self) -> Observation {
        self.registry.clear();
        for sector in &mut self.sectors {
            sector.controlled.clear();
            sector.exited.clear();
        }
        self.vertiports = new_vertiports(&self.config, &mut self.rng);
        self.id_tracker = 0;
        self.conflicts = 0;
        self.goals = 0;
        self.nmacs = 0;
        self.total_timesteps = 0;
        self.tick = 0;
        self.route_times = RouteTimes::default();
        self.observation()
    }

    /// Advance the simulation by one tick.
    ///
    /// While `near_end` is set no new aircraft are spawned.
    pub fn step(&mut self, actions: &ActionMap, near_end: bool) -> StepResult {
        for aircraft in self.registry.iter_mut() {
            aircraft.step(actions.action_for(aircraft.id), &self.kinematics, &mut self.rng);
        }

        self.spawn_aircraft(near_end);

        let score = score_tick(&mut self.registry, &self.scoring);
        self.conflicts += score.new_conflicts;
        self.nmacs += score.nmacs;
        self.goals += score.goals;
        for (id, outcome) in score.removals() {
            self.remove_aircraft(id, outcome);
        }

        self.assign_sectors();

        self.total_timesteps += self.registry.len() as u64;
        self.tick += 1;

        StepResult {
            observation: self.observation(),
            reward: score.reward,
            terminal: false,
            min_separation: score.min_separation,
        }
    }

    /// Current observation of every sector.
    pub fn observation(&self) -> Observation {
        let lookahead = self.config.observation_lookahead_multiple * self.config.minimum_separation;
        build_observation(&self.sectors, &self.registry, lookahead)
    }

    /// Place an aircraft directly, bypassing vertiport clocks and the
    /// spawn safety check. Used by scripted scenarios.
    pub fn inject(&mut self, position: Point, goal: Point, priority: Priority) -> AircraftId {
        let id = AircraftId(self.id_tracker);
        let aircraft = Aircraft::new(
            id,
            position,
            goal,
            self.nearest_vertiport(position),
            self.nearest_vertiport(goal),
            self.config.init_speed,
            priority,
            self.tick,
        );
        self.registry.add(aircraft);
        self.id_tracker += 1;
        self.assign_sectors();
        id
    }

    fn spawn_aircraft(&mut self, near_end: bool) {
        let interval = self.config.time_interval_lower..self.config.time_interval_upper;
        let port_ids: Vec<usize> = self.vertiports.iter().map(|port| port.id).collect();

        for index in 0..self.vertiports.len() {
            self.vertiports[index].step();
            if near_end || !self.vertiports[index].ready_to_spawn() {
                continue;
            }

            let origin = self.vertiports[index].id;
            let destinations: Vec<usize> = port_ids.iter().copied().filter(|id| *id != origin).collect();
            let Some(&goal_port) = destinations.choose(&mut self.rng) else {
                continue;
            };
            let position = self.vertiports[index].position;
            let goal = self.vertiports[goal_port].position;

            let min_dist = self
                .registry
                .iter()
                .map(|aircraft| distance(aircraft.position, position))
                .fold(f64::INFINITY, f64::min);
            if min_dist <= self.config.start_safe_dist {
                tracing::trace!(vertiport = origin, min_dist, "spawn deferred, departure not clear");
                continue;
            }

            let priority = if self.rng.random_bool(self.config.high_priority_probability) {
                Priority::High
            } else {
                Priority::Low
            };
            let id = AircraftId(self.id_tracker);
            self.registry.add(Aircraft::new(
                id,
                position,
                goal,
                origin,
                goal_port,
                self.config.init_speed,
                priority,
                self.tick,
            ));
            self.id_tracker += 1;
            self.vertiports[index].generate_interval(interval.clone(), &mut self.rng);

            tracing::debug!(%id, origin, goal_port, ?priority, "aircraft departed");
        }
    }

    fn remove_aircraft(&mut self, id: AircraftId, outcome: Outcome) {
        let Some(aircraft) = self.registry.remove(id) else {
            return;
        };
        if let Some(sector_id) = aircraft.sector_id {
            self.sectors[sector_id.0].controlled.remove(&id);
        }

        match outcome {
            Outcome::Goal => {
                let ticks = self.tick.saturating_sub(aircraft.spawn_tick);
                self.route_times
                    .record(aircraft.priority, aircraft.route_class(), ticks);
                tracing::debug!(%id, ticks, "aircraft arrived");
            }
            Outcome::Nmac => {
                tracing::warn!(%id, x = aircraft.position.x, y = aircraft.position.y, "NMAC");
            }
            Outcome::Conflict | Outcome::Clear => {}
        }
    }

    /// Move every aircraft into the first sector containing it.
    fn assign_sectors(&mut self) {
        let tick = self.tick;
        for aircraft in self.registry.iter_mut() {
            let Some(index) = self
                .sectors
                .iter()
                .position(|sector| sector.in_sector(aircraft.position))
            else {
                continue;
            };
            let sector_id = SectorId(index);
            if aircraft.sector_id == Some(sector_id) {
                continue;
            }

            if let Some(previous) = aircraft.sector_id {
                let previous = &mut self.sectors[previous.0];
                previous.controlled.remove(&aircraft.id);
                previous.exited.insert(aircraft.id, tick);
            }
            tracing::trace!(id = %aircraft.id, from = ?aircraft.sector_id, to = %sector_id, "sector hand-off");

            aircraft.sector_id = Some(sector_id);
            let sector = &mut self.sectors[index];
            sector.controlled.insert(aircraft.id);
            sector.assign_exit(aircraft);
        }
    }

    fn nearest_vertiport(&self, point: Point) -> usize {
        self.vertiports
            .iter()
            .min_by(|a, b| distance(a.position, point).total_cmp(&distance(b.position, point)))
            .map(|port| port.id)
            .unwrap_or(0)
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn sectors(&self) -> &[Sector] {
        &self.sectors
    }

    pub fn vertiports(&self) -> &[Vertiport] {
        &self.vertiports
    }

    pub fn registry(&self) -> &AircraftRegistry {
        &self.registry
    }

    pub fn num_aircraft(&self) -> usize {
        self.registry.len()
    }

    /// Aircraft generated so far; also the next id to assign.
    pub fn id_tracker(&self) -> u64 {
        self.id_tracker
    }

    /// Conflict pairs entered this episode.
    pub fn conflicts(&self) -> u64 {
        self.conflicts
    }

    pub fn goals(&self) -> u64 {
        self.goals
    }

    /// Aircraft lost to NMAC; each event removes two.
    pub fn nmacs(&self) -> u64 {
        self.nmacs
    }

    /// Aircraft-ticks flown this episode.
    pub fn total_timesteps(&self) -> u64 {
        self.total_timesteps
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn route_times(&self) -> &RouteTimes {
        &self.route_times
    }
}

fn new_vertiports<R: Rng + ?Sized>(config: &SimConfig, rng: &mut R) -> Vec<Vertiport> {
    layout::vertiport_positions(config.map_center, config.hex_radius)
        .into_iter()
        .enumerate()
        .map(|(id, position)| Vertiport::new(id, position, config.initial_spawn_window, rng))
        .collect()
}
