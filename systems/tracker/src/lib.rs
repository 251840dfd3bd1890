#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Dead-reckoning pose tracker and wall sensor fusion for a single run.
//!
//! The tracker never measures its position. It integrates the commanded
//! forward speed over elapsed time and snaps its heading to the canonical
//! angle of every turn it issues. Sensor readings are projected from that
//! estimate onto the wall grid of a [`Maze`].

use std::{
    f64::consts::{PI, TAU},
    sync::Arc,
    time::Duration,
};

use micromouse_core::{
    heading_vector, organize_by_angles, to_list_grid, Direction, GeometryError, Mouse,
    PerDirection, Position, PositionReset, RotationError, Tile, DEFAULT_TILES_PER_SECOND,
};
use micromouse_maze::{Maze, WallChange};
use serde::Deserialize;
use thiserror::Error;
use tokio::time::Instant;
use tracing::debug;

/// Motion and sensing constants used by the tracker.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Assumed constant forward speed in tiles per second.
    pub tiles_per_second: f64,
    /// Distance, in tiles, a projected wall point is pulled back toward the
    /// sensor before it is snapped onto the grid.
    pub wall_nudge: f64,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            tiles_per_second: DEFAULT_TILES_PER_SECOND,
            wall_nudge: 0.1,
        }
    }
}

/// Faults that end a run.
#[derive(Debug, Error)]
pub enum TrackerError {
    /// The mouse could not complete a rotation.
    #[error(transparent)]
    Actuation(#[from] RotationError),
    /// A sensor ray did not resolve to a cardinal direction.
    #[error(transparent)]
    Geometry(#[from] GeometryError),
}

/// Estimated pose of the mouse together with its actuation handle.
#[derive(Debug)]
pub struct MouseTracker<M> {
    mouse: Arc<M>,
    config: TrackerConfig,
    start_time: Instant,
    start_position: Position,
    goal: Position,
    position: Position,
    heading: f64,
}

impl<M: Mouse> MouseTracker<M> {
    /// Creates a tracker at the reset's start pose, starting its clock now.
    #[must_use]
    pub fn new(mouse: Arc<M>, reset: &PositionReset, config: TrackerConfig) -> Self {
        Self {
            mouse,
            config,
            start_time: Instant::now(),
            start_position: reset.start(),
            goal: reset.target(),
            position: reset.start(),
            heading: reset.heading(),
        }
    }

    /// Estimated position in the map grid.
    #[must_use]
    pub fn position(&self) -> Position {
        self.position
    }

    /// Estimated heading in radians, clockwise from `+y`.
    #[must_use]
    pub fn heading(&self) -> f64 {
        self.heading
    }

    /// Position the run started from.
    #[must_use]
    pub fn start_position(&self) -> Position {
        self.start_position
    }

    /// Goal position of the run.
    #[must_use]
    pub fn goal(&self) -> Position {
        self.goal
    }

    /// Time since the tracker was created.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Rotates the mouse to face `direction`, taking the shorter way round.
    ///
    /// The heading only changes once the mouse confirms the rotation.
    pub async fn turn(&mut self, direction: Direction) -> Result<(), TrackerError> {
        let degrees = shortest_turn(direction.angle() - self.heading).to_degrees();
        let reported = self.mouse.rotate(degrees).await?;
        debug!(?direction, degrees, reported, "turned");
        self.heading = direction.angle();
        Ok(())
    }

    /// Advances the position estimate by the distance covered in `elapsed`.
    pub fn add_distance_for(&mut self, elapsed: Duration) {
        let distance = elapsed.as_secs_f64() * self.config.tiles_per_second;
        self.position += heading_vector(self.heading) * distance;
    }

    /// Waits for `elapsed` and then advances the position estimate.
    pub async fn move_forward_until(&mut self, elapsed: Duration) {
        tokio::time::sleep(elapsed).await;
        self.add_distance_for(elapsed);
    }

    /// Projects the current sensor readings into map-grid wall points keyed by
    /// the world direction each sensor faces.
    pub async fn get_wall_positions(&self) -> Result<PerDirection<Position>, TrackerError> {
        let readings = self.mouse.get_distances().await;
        let ranges = [readings.right, readings.back, readings.forward, readings.left];
        let angles = Direction::ALL.map(|direction| self.heading - direction.angle());

        let points = angles
            .into_iter()
            .zip(ranges)
            .map(|(angle, range)| self.position + heading_vector(angle) * range);
        Ok(organize_by_angles(angles, points)?)
    }

    /// Tiles containing the projected wall points.
    pub async fn get_wall_tiles(&self) -> Result<PerDirection<Tile>, TrackerError> {
        let walls = self.get_wall_positions().await?;
        Ok(walls.map(|_, point| to_list_grid(point)))
    }

    /// Marks every observed wall closed in the maze and returns how many were
    /// previously open.
    ///
    /// Observations that land outside the wall arrays are dropped.
    pub async fn update_walls(&self, maze: &mut Maze) -> Result<usize, TrackerError> {
        let walls = self.get_wall_positions().await?;
        let mut closed = 0;

        for (direction, point) in walls.iter() {
            let cell = to_list_grid(*point - direction.delta() * self.config.wall_nudge)
                + direction.wall_offset();
            match maze.close_wall(direction.intersecting_axis(), cell) {
                WallChange::Closed => closed += 1,
                WallChange::AlreadyClosed => {}
                WallChange::OutOfBounds => {
                    debug!(?direction, ?cell, "dropping wall observation outside the maze");
                }
            }
        }
        Ok(closed)
    }
}

/// Normalises an angle into `(-π, π]`.
fn shortest_turn(radians: f64) -> f64 {
    let turn = radians.rem_euclid(TAU);
    if turn > PI {
        turn - TAU
    } else {
        turn
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use glam::{DVec2, IVec2};
    use micromouse_core::{Axis, DistanceReadings};

    use super::*;

    struct ScriptedMouse {
        readings: DistanceReadings,
        rotations: Mutex<Vec<f64>>,
        jammed: bool,
    }

    impl ScriptedMouse {
        fn new(left: f64, right: f64, forward: f64, back: f64) -> Self {
            Self {
                readings: DistanceReadings {
                    left,
                    right,
                    forward,
                    back,
                    rotation: 0.0,
                },
                rotations: Mutex::new(Vec::new()),
                jammed: false,
            }
        }

        fn rotations(&self) -> Vec<f64> {
            self.rotations.lock().expect("rotation log").clone()
        }
    }

    impl Mouse for ScriptedMouse {
        async fn get_distances(&self) -> DistanceReadings {
            self.readings
        }

        async fn rotate(&self, degrees: f64) -> Result<f64, RotationError> {
            if self.jammed {
                return Err(RotationError::new("jammed"));
            }
            self.rotations.lock().expect("rotation log").push(degrees);
            Ok(degrees)
        }
    }

    fn reset(rotation: f64) -> PositionReset {
        PositionReset {
            run_number: 0,
            runs_remaining: 0,
            position: (0.5, 0.5),
            rotation,
            target_position: (-7.5, -7.5),
        }
    }

    fn close(actual: f64, expected: f64) -> bool {
        (actual - expected).abs() < 1e-9
    }

    #[tokio::test]
    async fn turns_take_the_short_way_round() {
        let mouse = Arc::new(ScriptedMouse::new(0.5, 0.5, 0.5, 0.5));
        let mut tracker =
            MouseTracker::new(Arc::clone(&mouse), &reset(0.0), TrackerConfig::default());

        tracker.turn(Direction::Left).await.expect("turn left");
        tracker.turn(Direction::Right).await.expect("reverse");
        tracker.turn(Direction::Right).await.expect("stay");

        let rotations = mouse.rotations();
        assert_eq!(rotations.len(), 3);
        assert!(close(rotations[0], -90.0), "{rotations:?}");
        assert!(close(rotations[1], 180.0), "{rotations:?}");
        assert!(close(rotations[2], 0.0), "{rotations:?}");
        assert_eq!(tracker.heading(), Direction::Right.angle());
    }

    #[tokio::test]
    async fn failed_turn_keeps_heading() {
        let mut mouse = ScriptedMouse::new(0.5, 0.5, 0.5, 0.5);
        mouse.jammed = true;
        let mut tracker = MouseTracker::new(Arc::new(mouse), &reset(0.0), TrackerConfig::default());

        let error = tracker.turn(Direction::Down).await.expect_err("jammed");
        assert!(matches!(error, TrackerError::Actuation(_)));
        assert_eq!(error.to_string(), "rotation failed: jammed");
        assert_eq!(tracker.heading(), 0.0);
    }

    #[test]
    fn dead_reckoning_follows_heading() {
        let mouse = Arc::new(ScriptedMouse::new(0.5, 0.5, 0.5, 0.5));
        let mut tracker = MouseTracker::new(mouse, &reset(90.0), TrackerConfig::default());

        tracker.add_distance_for(Duration::from_millis(250));

        assert!((tracker.position() - DVec2::new(1.0, 0.5)).length() < 1e-9);
        assert_eq!(tracker.start_position(), DVec2::new(0.5, 0.5));
    }

    #[tokio::test(start_paused = true)]
    async fn moving_forward_waits_out_the_interval() {
        let mouse = Arc::new(ScriptedMouse::new(0.5, 0.5, 0.5, 0.5));
        let mut tracker = MouseTracker::new(mouse, &reset(0.0), TrackerConfig::default());

        tracker.move_forward_until(Duration::from_millis(400)).await;

        assert!(tracker.elapsed() >= Duration::from_millis(400));
        assert!((tracker.position() - DVec2::new(0.5, 1.3)).length() < 1e-9);
    }

    #[tokio::test]
    async fn readings_project_onto_world_directions() {
        let mouse = Arc::new(ScriptedMouse::new(0.5, 1.5, 2.5, 0.5));
        let tracker = MouseTracker::new(mouse, &reset(0.0), TrackerConfig::default());

        let walls = tracker.get_wall_positions().await.expect("cardinal heading");
        let expect = |direction, x, y| {
            let point = walls.get(direction).copied().expect("every side observed");
            assert!(
                (point - DVec2::new(x, y)).length() < 1e-9,
                "{direction:?}: {point}"
            );
        };
        expect(Direction::Left, 0.0, 0.5);
        expect(Direction::Right, 2.0, 0.5);
        expect(Direction::Up, 0.5, 3.0);
        expect(Direction::Down, 0.5, 0.0);

        let tiles = tracker.get_wall_tiles().await.expect("cardinal heading");
        assert_eq!(tiles.get(Direction::Up), Some(&IVec2::new(8, 11)));
    }

    #[tokio::test]
    async fn update_walls_closes_the_observed_segments_once() {
        let mouse = Arc::new(ScriptedMouse::new(0.5, 1.5, 2.5, 0.5));
        let tracker = MouseTracker::new(mouse, &reset(0.0), TrackerConfig::default());
        let mut maze = Maze::new(tracker.goal());

        assert_eq!(tracker.update_walls(&mut maze).await.expect("update"), 4);
        assert_eq!(tracker.update_walls(&mut maze).await.expect("update"), 0);

        let closed: Vec<_> = maze.walls().closed_walls().collect();
        assert!(closed.contains(&(Axis::X, IVec2::new(8, 8))));
        assert!(closed.contains(&(Axis::X, IVec2::new(8, 11))));
        assert!(closed.contains(&(Axis::Y, IVec2::new(8, 8))));
        assert!(closed.contains(&(Axis::Y, IVec2::new(10, 8))));
    }

    #[tokio::test]
    async fn observations_beyond_the_grid_are_dropped() {
        let mouse = Arc::new(ScriptedMouse::new(0.5, 0.5, 40.0, 0.5));
        let tracker = MouseTracker::new(mouse, &reset(0.0), TrackerConfig::default());
        let mut maze = Maze::new(tracker.goal());

        assert_eq!(tracker.update_walls(&mut maze).await.expect("update"), 3);
        assert_eq!(maze.walls().closed_count(), 3);
    }

    #[test]
    fn shortest_turn_stays_in_half_open_range() {
        assert!(close(shortest_turn(1.5 * PI), -0.5 * PI));
        assert!(close(shortest_turn(-PI), PI));
        assert!(close(shortest_turn(0.25 * PI), 0.25 * PI));
    }
}
