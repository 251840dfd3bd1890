#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Simulated mouse driving through a known ground-truth maze.
//!
//! The body drives forward continuously and only changes heading when asked
//! to rotate. Motion is integrated lazily from the tokio clock whenever the
//! body is queried, so paused-clock tests see exact, repeatable poses.

mod generator;
mod ray;

use std::{
    sync::{Mutex, MutexGuard, PoisonError},
    time::Duration,
};

use micromouse_core::{
    Direction, DistanceReadings, Mouse, Position, RotationError, DEFAULT_TILES_PER_SECOND,
};
use micromouse_maze::WallGrid;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal, NormalError};
use serde::Deserialize;
use thiserror::Error;
use tokio::time::Instant;
use tracing::{debug, warn};

pub use generator::generate_maze;

/// Distance the body keeps from a wall it drives into, in tiles.
pub const WALL_CLEARANCE: f64 = 0.3;

/// Largest deviation from a grid axis a rotation may leave, in degrees.
const AXIS_TOLERANCE: f64 = 1.0;

/// Physical behaviour of the simulated body.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct SimulatorConfig {
    /// Seed for sensor noise and generated mazes.
    pub seed: u64,
    /// Standard deviation of the sensor noise, in tiles.
    pub sensor_noise: f64,
    /// Delay before every reply, in milliseconds.
    pub latency_ms: u64,
    /// Forward speed in tiles per second.
    pub tiles_per_second: f64,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            sensor_noise: 0.0,
            latency_ms: 0,
            tiles_per_second: DEFAULT_TILES_PER_SECOND,
        }
    }
}

/// Reasons a simulator cannot be built.
#[derive(Debug, Error)]
pub enum SimulatorError {
    /// The sensor noise is negative.
    #[error("sensor noise {noise} is negative")]
    NegativeNoise {
        /// Configured standard deviation.
        noise: f64,
    },
    /// The sensor noise is not a valid standard deviation.
    #[error("invalid sensor noise {noise}")]
    SensorNoise {
        /// Configured standard deviation.
        noise: f64,
        /// Rejection from the distribution.
        #[source]
        source: NormalError,
    },
}

#[derive(Debug)]
struct Body {
    position: Position,
    heading: Direction,
    clock: Instant,
    jammed: bool,
    rng: ChaCha8Rng,
}

/// Mouse backed by a ground-truth wall grid.
#[derive(Debug)]
pub struct SimulatedMouse {
    walls: WallGrid,
    config: SimulatorConfig,
    noise: Normal<f64>,
    body: Mutex<Body>,
}

impl SimulatedMouse {
    /// Creates a body at the centre of the bottom-left tile facing `+y`.
    pub fn new(walls: WallGrid, config: SimulatorConfig) -> Result<Self, SimulatorError> {
        if config.sensor_noise < 0.0 {
            return Err(SimulatorError::NegativeNoise {
                noise: config.sensor_noise,
            });
        }
        let noise =
            Normal::new(0.0, config.sensor_noise).map_err(|source| SimulatorError::SensorNoise {
                noise: config.sensor_noise,
                source,
            })?;
        Ok(Self {
            walls,
            config,
            noise,
            body: Mutex::new(Body {
                position: Position::new(-7.5, -7.5),
                heading: Direction::Up,
                clock: Instant::now(),
                jammed: false,
                rng: ChaCha8Rng::seed_from_u64(config.seed),
            }),
        })
    }

    /// Ground truth the body drives through.
    #[must_use]
    pub fn walls(&self) -> &WallGrid {
        &self.walls
    }

    /// Moves the body to a pose and restarts its motion clock.
    ///
    /// The heading snaps to the nearest grid axis.
    pub fn place(&self, position: Position, heading_degrees: f64) {
        let mut body = self.body();
        body.position = position;
        body.heading = ray::nearest_cardinal(heading_degrees);
        body.clock = Instant::now();
        debug!(?position, heading = ?body.heading, "body placed");
    }

    /// Makes every later rotation fail.
    pub fn jam(&self) {
        self.body().jammed = true;
    }

    /// True position of the body now.
    #[must_use]
    pub fn position(&self) -> Position {
        let mut body = self.body();
        self.advance(&mut body);
        body.position
    }

    /// True heading of the body in degrees.
    #[must_use]
    pub fn heading(&self) -> f64 {
        self.body().heading.degrees()
    }

    fn body(&self) -> MutexGuard<'_, Body> {
        self.body.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn latency(&self) -> Duration {
        Duration::from_millis(self.config.latency_ms)
    }

    /// Integrates forward motion since the last query, stopping short of the
    /// wall ahead.
    fn advance(&self, body: &mut Body) {
        let now = Instant::now();
        let elapsed = now.saturating_duration_since(body.clock);
        body.clock = now;

        let wanted = elapsed.as_secs_f64() * self.config.tiles_per_second;
        let free = (ray::cast(&self.walls, body.position, body.heading) - WALL_CLEARANCE).max(0.0);
        let travelled = wanted.min(free);
        body.position += body.heading.int_delta().as_dvec2() * travelled;
    }

    fn range(&self, body: &mut Body, quarter_turns: f64) -> f64 {
        let heading = body.heading.degrees() + 90.0 * quarter_turns;
        let truth = ray::cast(&self.walls, body.position, ray::nearest_cardinal(heading));
        (truth + self.noise.sample(&mut body.rng)).max(0.0)
    }
}

impl Mouse for SimulatedMouse {
    async fn get_distances(&self) -> DistanceReadings {
        let readings = {
            let mut body = self.body();
            self.advance(&mut body);
            DistanceReadings {
                forward: self.range(&mut body, 0.0),
                right: self.range(&mut body, 1.0),
                back: self.range(&mut body, 2.0),
                left: self.range(&mut body, 3.0),
                rotation: body.heading.degrees(),
            }
        };
        tokio::time::sleep(self.latency()).await;
        readings
    }

    async fn rotate(&self, degrees: f64) -> Result<f64, RotationError> {
        tokio::time::sleep(self.latency()).await;

        let mut body = self.body();
        self.advance(&mut body);
        if body.jammed {
            warn!(degrees, "rotation refused, body is jammed");
            return Err(RotationError::new("body is jammed"));
        }
        if !degrees.is_finite() {
            return Err(RotationError::new(format!("cannot rotate by {degrees}")));
        }

        let target = (body.heading.degrees() + degrees).rem_euclid(360.0);
        let snapped = (target / 90.0).round() * 90.0;
        if (target - snapped).abs() > AXIS_TOLERANCE {
            return Err(RotationError::new(format!(
                "heading {target:.1} is off the grid axes"
            )));
        }

        body.heading = ray::nearest_cardinal(snapped);
        let heading = body.heading.degrees();
        debug!(degrees, heading, "body rotated");
        Ok(heading)
    }
}
