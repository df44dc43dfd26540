pub mod aircraft;
pub mod airspace;
pub mod config;
pub mod decision;
pub mod episode;
pub mod error;
pub mod geometry;
pub mod layout;
pub mod observation;
pub mod planner;
pub mod registry;
pub mod scoring;
pub mod sector;
pub mod vertiport;

pub use aircraft::{Action, Aircraft, AircraftId, FeatureRow, Kinematics, Priority};
pub use airspace::{ActionMap, Airspace, RouteTime, RouteTimes, StepResult};
pub use config::{DecisionConfig, EpisodeConfig, SearchBudget, SimConfig};
pub use decision::DecisionCycle;
pub use episode::{nmac_rate, EpisodeRunner, EpisodeStats, RouteTimeSummary};
pub use error::{ConfigError, DecisionError, ObservationError, SimError};
pub use geometry::{distance, point_in_polygon, point_to_segment_distance, Point};
pub use observation::{build_observation, Observation, SectorObservation, TieredObservation};
pub use planner::{HoldPlanner, LookaheadPlanner, PlanRequest, Planner};
pub use registry::AircraftRegistry;
pub use scoring::{score_tick, Outcome, ScoringRules, TickScore};
pub use sector::{ExitId, Gate, Sector, SectorId};
pub use vertiport::Vertiport;
