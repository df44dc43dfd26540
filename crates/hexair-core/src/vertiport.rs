//! Vertiports: spawn and sink nodes with a randomized departure clock.

use std::ops::Range;

use rand::Rng;
use serde::Serialize;

use crate::geometry::Point;

#[derive(Debug, Clone, Serialize)]
pub struct Vertiport {
    pub id: usize,
    pub position: Point,
    /// Ticks since the last departure
    pub clock_counter: u64,
    /// Departure threshold for the next aircraft
    pub time_next_aircraft: f64,
}

impl Vertiport {
    /// New vertiport whose first departure is drawn from `[0, initial_window)`.
    pub fn new<R: Rng + ?Sized>(id: usize, position: Point, initial_window: f64, rng: &mut R) -> Self {
        Self {
            id,
            position,
            clock_counter: 0,
            time_next_aircraft: rng.random_range(0.0..initial_window),
        }
    }

    pub fn step(&mut self) {
        self.clock_counter += 1;
    }

    /// Redraw the departure threshold and restart the clock.
    pub fn generate_interval<R: Rng + ?Sized>(&mut self, interval: Range<f64>, rng: &mut R) {
        self.time_next_aircraft = rng.random_range(interval);
        self.clock_counter = 0;
    }

    pub fn ready_to_spawn(&self) -> bool {
        self.clock_counter as f64 >= self.time_next_aircraft
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn clock_counts_up_until_ready() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut port = Vertiport::new(1, Point::new(0.0, 0.0), 10.0, &mut rng);
        assert!(port.time_next_aircraft < 10.0);
        for _ in 0..10 {
            port.step();
        }
        assert!(port.ready_to_spawn());
    }

    #[test]
    fn generate_interval_resets_clock() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut port = Vertiport::new(1, Point::new(0.0, 0.0), 10.0, &mut rng);
        port.step();
        port.step();
        port.generate_interval(20.0..30.0, &mut rng);
        assert_eq!(port.clock_counter, 0);
        assert!((20.0..30.0).contains(&port.time_next_aircraft));
        assert!(!port.ready_to_spawn());
    }
}
