//! The per-tile exploration cycle.

use std::{sync::Arc, time::Duration};

use micromouse_core::{to_list_grid, Mouse, PositionReset, Tile};
use micromouse_maze::Maze;
use micromouse_system_tracker::{MouseTracker, TrackerError};
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::{cancel::CancelToken, config::ExploreConfig};

/// How a run ended without a fault.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunStatus {
    /// The mouse committed to a step onto a goal tile, or stood on one.
    GoalReached,
    /// The tile budget ran out first.
    BudgetExhausted,
    /// The run was cancelled.
    Cancelled,
    /// The map offered no descending step from the tile.
    Stranded {
        /// Tile the mouse was on when planning failed.
        tile: Tile,
    },
}

/// Result of a run that ended without a fault.
#[derive(Debug)]
pub struct RunReport {
    /// Maze with every wall learnt during the run.
    pub maze: Maze,
    /// Why the run ended.
    pub status: RunStatus,
    /// Completed tile cycles.
    pub tiles_travelled: u32,
}

/// A run that ended on a fault, with the walls it learnt so far.
#[derive(Debug, Error)]
#[error("exploration run failed")]
pub struct RunFailure {
    /// Maze with every wall learnt before the fault.
    pub maze: Maze,
    /// Fault that ended the run.
    pub source: TrackerError,
}

/// Explores from the reset's start pose until the goal, the budget, a
/// cancellation, or a fault ends the run.
///
/// The maze is handed back in every outcome so learnt walls survive.
pub async fn explore<M: Mouse>(
    mouse: Arc<M>,
    mut maze: Maze,
    start: &PositionReset,
    time_remaining: f64,
    config: &ExploreConfig,
    cancel: CancelToken,
) -> Result<RunReport, RunFailure> {
    let tracker = MouseTracker::new(mouse, start, config.tracker);
    maze.update_goal(tracker.goal());
    let budget = config.tile_budget(time_remaining);
    info!(
        run = start.run_number,
        budget,
        goal = ?maze.goal_tiles(),
        "exploration started"
    );

    let mut run = Run {
        tracker,
        config,
        cancel,
        tiles_travelled: 0,
    };
    match run.drive(&mut maze, budget).await {
        Ok(status) => {
            info!(
                run = start.run_number,
                ?status,
                tiles = run.tiles_travelled,
                walls = maze.walls().closed_count(),
                "exploration finished"
            );
            Ok(RunReport {
                maze,
                status,
                tiles_travelled: run.tiles_travelled,
            })
        }
        Err(source) => {
            error!(run = start.run_number, %source, "exploration failed");
            Err(RunFailure { maze, source })
        }
    }
}

struct Run<'a, M> {
    tracker: MouseTracker<M>,
    config: &'a ExploreConfig,
    cancel: CancelToken,
    tiles_travelled: u32,
}

impl<M: Mouse> Run<'_, M> {
    async fn drive(&mut self, maze: &mut Maze, budget: u32) -> Result<RunStatus, TrackerError> {
        let _ = self.tracker.update_walls(maze).await?;
        if self.cancel.is_cancelled() {
            return Ok(RunStatus::Cancelled);
        }

        let decision = self.config.decision_interval();
        let rest = self.config.rest_interval();
        let period = self.config.tile_period();

        for _ in 0..budget {
            tokio::select! {
                () = self.tracker.move_forward_until(decision) => {}
                () = self.cancel.cancelled() => return Ok(RunStatus::Cancelled),
            }

            let grid = to_list_grid(self.tracker.position());
            let learnt = self.tracker.update_walls(maze).await?;
            if self.cancel.is_cancelled() {
                return Ok(RunStatus::Cancelled);
            }

            maze.update_distances();
            if maze.goal_tiles().contains(&grid) {
                return Ok(RunStatus::GoalReached);
            }
            let Some(step) = maze.next_move(grid) else {
                warn!(tile = ?grid, "no way forward from tile");
                return Ok(RunStatus::Stranded { tile: grid });
            };
            debug!(
                tile = ?grid,
                learnt,
                direction = ?step.direction,
                distance = step.distance,
                "chose next step\n{}",
                maze.render(Some(grid))
            );

            self.tracker.add_distance_for(rest);
            let wait = until_next_tick(self.tracker.elapsed(), period);
            tokio::select! {
                () = tokio::time::sleep(wait) => {}
                () = self.cancel.cancelled() => return Ok(RunStatus::Cancelled),
            }

            self.tracker.turn(step.direction).await?;
            self.tiles_travelled += 1;
            if self.cancel.is_cancelled() {
                return Ok(RunStatus::Cancelled);
            }
            if step.distance == 0 {
                return Ok(RunStatus::GoalReached);
            }
        }
        Ok(RunStatus::BudgetExhausted)
    }
}

/// Time left until `elapsed` reaches the next whole multiple of `period`.
///
/// A full period when `elapsed` already sits on a multiple.
fn until_next_tick(elapsed: Duration, period: Duration) -> Duration {
    let period_nanos = period.as_nanos();
    if period_nanos == 0 {
        return Duration::ZERO;
    }
    let remaining = period_nanos - elapsed.as_nanos() % period_nanos;
    Duration::from_nanos(u64::try_from(remaining).unwrap_or(u64::MAX))
}

#[cfg(test)]
mod tests {
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Mutex,
    };

    use micromouse_core::{DistanceReadings, Position, RotationError};

    use super::*;
    use crate::cancel::cancel_pair;

    /// Sees the same ranges everywhere and logs every rotation.
    struct Blindfolded {
        readings: DistanceReadings,
        jammed: bool,
        observations: AtomicUsize,
        rotations: Mutex<Vec<f64>>,
    }

    impl Blindfolded {
        fn seeing(left: f64, right: f64, forward: f64, back: f64) -> Self {
            Self {
                readings: DistanceReadings {
                    left,
                    right,
                    forward,
                    back,
                    rotation: 0.0,
                },
                jammed: false,
                observations: AtomicUsize::new(0),
                rotations: Mutex::new(Vec::new()),
            }
        }

        fn nothing() -> Self {
            Self::seeing(100.0, 100.0, 100.0, 100.0)
        }
    }

    impl Mouse for Blindfolded {
        async fn get_distances(&self) -> DistanceReadings {
            let _ = self.observations.fetch_add(1, Ordering::SeqCst);
            self.readings
        }

        async fn rotate(&self, degrees: f64) -> Result<f64, RotationError> {
            if self.jammed {
                return Err(RotationError::new("motor stalled"));
            }
            self.rotations.lock().expect("rotation log").push(degrees);
            Ok(degrees)
        }
    }

    fn corner_start() -> PositionReset {
        PositionReset {
            run_number: 1,
            runs_remaining: 0,
            position: (-7.5, -7.5),
            rotation: 0.0,
            target_position: (0.5, 0.5),
        }
    }

    fn fresh_maze() -> Maze {
        Maze::new(Position::new(0.5, 0.5))
    }

    #[tokio::test(start_paused = true)]
    async fn open_field_run_reaches_the_goal() {
        let mouse = Arc::new(Blindfolded::nothing());
        let (_handle, token) = cancel_pair();

        let report = explore(
            Arc::clone(&mouse),
            fresh_maze(),
            &corner_start(),
            20.0,
            &ExploreConfig::default(),
            token,
        )
        .await
        .expect("no faults");

        assert_eq!(report.status, RunStatus::GoalReached);
        assert_eq!(report.tiles_travelled, 15);
        assert_eq!(report.maze.walls().closed_count(), 0);
        assert_eq!(
            mouse.rotations.lock().expect("rotation log").len(),
            15,
            "one turn per completed tile"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn short_budget_is_exhausted() {
        let mouse = Arc::new(Blindfolded::nothing());
        let (_handle, token) = cancel_pair();
        let started = tokio::time::Instant::now();

        let report = explore(
            mouse,
            fresh_maze(),
            &corner_start(),
            2.0,
            &ExploreConfig::default(),
            token,
        )
        .await
        .expect("no faults");

        assert_eq!(report.status, RunStatus::BudgetExhausted);
        assert_eq!(report.tiles_travelled, 4);
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_secs(2), "{elapsed:?}");
        assert!(elapsed < Duration::from_millis(2100), "{elapsed:?}");
    }

    #[tokio::test(start_paused = true)]
    async fn sub_tile_budget_still_observes_once() {
        let mouse = Arc::new(Blindfolded::nothing());
        let (_handle, token) = cancel_pair();

        let report = explore(
            Arc::clone(&mouse),
            fresh_maze(),
            &corner_start(),
            0.3,
            &ExploreConfig::default(),
            token,
        )
        .await
        .expect("no faults");

        assert_eq!(report.status, RunStatus::BudgetExhausted);
        assert_eq!(report.tiles_travelled, 0);
        assert_eq!(mouse.observations.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_before_the_first_tile() {
        let mouse = Arc::new(Blindfolded::seeing(0.5, 100.0, 100.0, 0.5));
        let (handle, token) = cancel_pair();
        handle.cancel();

        let report = explore(
            mouse,
            fresh_maze(),
            &corner_start(),
            20.0,
            &ExploreConfig::default(),
            token,
        )
        .await
        .expect("no faults");

        assert_eq!(report.status, RunStatus::Cancelled);
        assert_eq!(report.tiles_travelled, 0);
        assert_eq!(report.maze.walls().closed_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_turn_hands_back_learnt_walls() {
        let mut mouse = Blindfolded::seeing(0.5, 100.0, 100.0, 100.0);
        mouse.jammed = true;
        let (_handle, token) = cancel_pair();

        let failure = explore(
            Arc::new(mouse),
            fresh_maze(),
            &corner_start(),
            20.0,
            &ExploreConfig::default(),
            token,
        )
        .await
        .expect_err("turn fails");

        assert!(matches!(failure.source, TrackerError::Actuation(_)));
        assert_eq!(failure.maze.walls().closed_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn boxed_in_mouse_is_stranded() {
        let mouse = Arc::new(Blindfolded::seeing(0.5, 0.5, 0.5, 0.5));
        let (_handle, token) = cancel_pair();

        let report = explore(
            mouse,
            fresh_maze(),
            &corner_start(),
            20.0,
            &ExploreConfig::default(),
            token,
        )
        .await
        .expect("no faults");

        assert_eq!(
            report.status,
            RunStatus::Stranded {
                tile: Tile::new(0, 1)
            }
        );
        assert_eq!(report.tiles_travelled, 0);
    }

    #[test]
    fn next_tick_realigns_to_the_period() {
        let period = Duration::from_millis(500);
        assert_eq!(
            until_next_tick(Duration::from_millis(430), period),
            Duration::from_millis(70)
        );
        assert_eq!(
            until_next_tick(Duration::from_millis(1510), period),
            Duration::from_millis(490)
        );
        assert_eq!(until_next_tick(Duration::from_millis(1000), period), period);
        assert_eq!(until_next_tick(Duration::from_secs(3), Duration::ZERO), Duration::ZERO);
    }
}
