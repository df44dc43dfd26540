//! Aircraft state and per-tick kinematics.

use std::collections::BTreeSet;
use std::fmt;

use rand::Rng;
use rand_distr::{Distribution, Normal, NormalError};
use serde::{Deserialize, Serialize};

use crate::config::SimConfig;
use crate::geometry::Point;
use crate::layout;
use crate::sector::{ExitId, SectorId};

/// Aircraft identity, assigned monotonically at spawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AircraftId(pub u64);

impl fmt::Display for AircraftId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AC{:05}", self.0)
    }
}

/// Decision tier of an aircraft.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    /// Planned first; its actions are fixed context for the low tier
    High,
    Low,
}

/// Heading-change command.
///
/// Headings are counter-clockwise, so a right turn decreases the heading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    TurnRight,
    #[default]
    Hold,
    TurnLeft,
}

impl Action {
    /// All actions in code order.
    pub const ALL: [Action; 3] = [Action::TurnRight, Action::Hold, Action::TurnLeft];

    /// Wire code: 0, 1 or 2, with 1 neutral.
    pub fn code(self) -> u8 {
        match self {
            Action::TurnRight => 0,
            Action::Hold => 1,
            Action::TurnLeft => 2,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Action::TurnRight),
            1 => Some(Action::Hold),
            2 => Some(Action::TurnLeft),
            _ => None,
        }
    }

    /// Signed number of heading increments this action applies.
    pub fn offset(self) -> f64 {
        f64::from(self.code()) - 1.0
    }
}

/// Speed and heading dynamics shared by every aircraft.
#[derive(Debug, Clone)]
pub struct Kinematics {
    pub cruise_speed: f64,
    pub min_speed: f64,
    pub max_speed: f64,
    pub d_heading: f64,
    speed_noise: Normal<f64>,
    heading_noise: Normal<f64>,
}

impl Kinematics {
    pub fn from_config(config: &SimConfig) -> Result<Self, NormalError> {
        Ok(Self {
            cruise_speed: config.init_speed,
            min_speed: config.min_speed,
            max_speed: config.max_speed,
            d_heading: config.d_heading,
            speed_noise: Normal::new(0.0, config.speed_sigma)?,
            heading_noise: Normal::new(0.0, config.heading_sigma)?,
        })
    }
}

/// One row of a sector observation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureRow {
    pub x: f64,
    pub y: f64,
    pub vx: f64,
    pub vy: f64,
    pub speed: f64,
    pub heading: f64,
    pub sub_goal_x: f64,
    pub sub_goal_y: f64,
}

impl FeatureRow {
    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn sub_goal(&self) -> Point {
        Point::new(self.sub_goal_x, self.sub_goal_y)
    }
}

/// A live aircraft.
#[derive(Debug, Clone, Serialize)]
pub struct Aircraft {
    pub id: AircraftId,
    pub position: Point,
    /// Radians, counter-clockwise from +x
    pub heading: f64,
    pub speed: f64,
    pub velocity: Point,
    /// Final destination
    pub goal: Point,
    /// Current waypoint: a gate anchor or the goal itself
    pub sub_goal: Point,
    pub goal_exit_id: ExitId,
    pub origin_vertiport: usize,
    pub goal_vertiport: usize,
    pub sector_id: Option<SectorId>,
    pub priority: Priority,
    /// Aircraft currently in loss of separation with this one
    pub conflict_ids: BTreeSet<AircraftId>,
    /// Reward earned on the last scored tick
    pub reward: f64,
    pub spawn_tick: u64,
}

impl Aircraft {
    /// Create an aircraft heading straight at its goal.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: AircraftId,
        position: Point,
        goal: Point,
        origin_vertiport: usize,
        goal_vertiport: usize,
        speed: f64,
        priority: Priority,
        spawn_tick: u64,
    ) -> Self {
        let heading = goal.sub(position).angle();
        Self {
            id,
            position,
            heading,
            speed,
            velocity: Point::from_heading(heading).scale(speed),
            goal,
            sub_goal: goal,
            goal_exit_id: ExitId::Direct,
            origin_vertiport,
            goal_vertiport,
            sector_id: None,
            priority,
            conflict_ids: BTreeSet::new(),
            reward: 0.0,
            spawn_tick,
        }
    }

    /// Advance one tick under `action`.
    pub fn step<R: Rng + ?Sized>(&mut self, action: Action, kinematics: &Kinematics, rng: &mut R) {
        let speed = kinematics.cruise_speed + kinematics.speed_noise.sample(rng);
        self.speed = speed.clamp(kinematics.min_speed, kinematics.max_speed);
        self.heading += action.offset() * kinematics.d_heading + kinematics.heading_noise.sample(rng);
        self.velocity = Point::from_heading(self.heading).scale(self.speed);
        self.position = self.position.add(self.velocity);
    }

    pub fn features(&self) -> FeatureRow {
        FeatureRow {
            x: self.position.x,
            y: self.position.y,
            vx: self.velocity.x,
            vy: self.velocity.y,
            speed: self.speed,
            heading: self.heading,
            sub_goal_x: self.sub_goal.x,
            sub_goal_y: self.sub_goal.y,
        }
    }

    pub fn route_class(&self) -> u8 {
        layout::route_class(self.origin_vertiport, self.goal_vertiport)
    }
}

impl fmt::Display for Aircraft {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} pos ({:.2}, {:.2}) speed {:.2} heading {:.2}° goal ({:.2}, {:.2}) sub-goal ({:.2}, {:.2})",
            self.id,
            self.position.x,
            self.position.y,
            self.speed,
            self.heading.to_degrees(),
            self.goal.x,
            self.goal.y,
            self.sub_goal.x,
            self.sub_goal.y
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn quiet_kinematics() -> Kinematics {
        let config = SimConfig {
            speed_sigma: 0.0,
            heading_sigma: 0.0,
            ..SimConfig::default()
        };
        Kinematics::from_config(&config).unwrap()
    }

    #[test]
    fn spawn_heading_points_at_goal() {
        let aircraft = Aircraft::new(
            AircraftId(1),
            Point::new(0.0, 0.0),
            Point::new(0.0, 10.0),
            1,
            4,
            1.0,
            Priority::High,
            0,
        );
        assert!((aircraft.heading - std::f64::consts::FRAC_PI_2).abs() < 1e-12);
        assert_eq!(aircraft.sub_goal, aircraft.goal);
        assert_eq!(aircraft.route_class(), 3);
    }

    #[test]
    fn hold_flies_straight_at_cruise_speed() {
        let kinematics = quiet_kinematics();
        let mut rng = StdRng::seed_from_u64(7);
        let mut aircraft = Aircraft::new(
            AircraftId(0),
            Point::new(0.0, 0.0),
            Point::new(100.0, 0.0),
            1,
            2,
            0.0,
            Priority::Low,
            0,
        );
        aircraft.step(Action::Hold, &kinematics, &mut rng);
        aircraft.step(Action::Hold, &kinematics, &mut rng);
        assert!((aircraft.position.x - 2.0 * kinematics.cruise_speed).abs() < 1e-12);
        assert!(aircraft.position.y.abs() < 1e-12);
        assert!(aircraft.heading.abs() < 1e-12);
    }

    #[test]
    fn turns_change_heading_by_increment() {
        let kinematics = quiet_kinematics();
        let mut rng = StdRng::seed_from_u64(7);
        let mut aircraft = Aircraft::new(
            AircraftId(0),
            Point::new(0.0, 0.0),
            Point::new(100.0, 0.0),
            1,
            2,
            1.0,
            Priority::Low,
            0,
        );
        aircraft.step(Action::TurnLeft, &kinematics, &mut rng);
        assert!((aircraft.heading - kinematics.d_heading).abs() < 1e-12);
        aircraft.step(Action::TurnRight, &kinematics, &mut rng);
        aircraft.step(Action::TurnRight, &kinematics, &mut rng);
        assert!((aircraft.heading + kinematics.d_heading).abs() < 1e-12);
    }

    #[test]
    fn noisy_speed_stays_in_bounds() {
        let config = SimConfig {
            speed_sigma: 5.0,
            ..SimConfig::default()
        };
        let kinematics = Kinematics::from_config(&config).unwrap();
        let mut rng = StdRng::seed_from_u64(11);
        let mut aircraft = Aircraft::new(
            AircraftId(0),
            Point::new(0.0, 0.0),
            Point::new(100.0, 0.0),
            1,
            2,
            1.0,
            Priority::Low,
            0,
        );
        for _ in 0..200 {
            aircraft.step(Action::Hold, &kinematics, &mut rng);
            assert!(aircraft.speed >= config.min_speed && aircraft.speed <= config.max_speed);
            assert!((aircraft.velocity.length() - aircraft.speed).abs() < 1e-9);
        }
    }

    #[test]
    fn action_codes_round_trip() {
        for action in Action::ALL {
            assert_eq!(Action::from_code(action.code()), Some(action));
        }
        assert_eq!(Action::from_code(3), None);
        assert_eq!(Action::default(), Action::Hold);
        assert_eq!(Action::TurnRight.offset(), -1.0);
    }
}
