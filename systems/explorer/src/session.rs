//! Event-driven owner of the maze across runs.

use std::sync::Arc;

use micromouse_core::{Event, Mouse, PositionReset, StartData};
use micromouse_maze::Maze;
use micromouse_system_tracker::TrackerError;
use thiserror::Error;
use tokio::task::{JoinError, JoinHandle};
use tracing::{error, info};

use crate::{
    cancel::{cancel_pair, CancelHandle},
    config::ExploreConfig,
    explore::{explore, RunFailure, RunReport, RunStatus},
};

/// Lifecycle of the most recent run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
    /// No run has been started.
    Idle,
    /// A run is active or has finished without being collected yet.
    Exploring,
    /// The last run ended on its own.
    Completed,
    /// The last run was cancelled.
    Cancelled,
    /// The last run ended on a fault.
    Failed,
}

/// How a collected run ended.
#[derive(Debug)]
pub enum RunOutcome {
    /// The run ended without a fault.
    Finished {
        /// Why the run ended.
        status: RunStatus,
        /// Completed tile cycles.
        tiles_travelled: u32,
    },
    /// The run ended on a fault. Its learnt walls were kept.
    Failed(TrackerError),
}

/// Session misuse and lost runs.
#[derive(Debug, Error)]
pub enum SessionError {
    /// A run was started before any position reset arrived.
    #[error("cannot start a run before a position reset")]
    NotPositioned,
    /// The run task panicked or was aborted. Its maze is lost.
    #[error("exploration task aborted")]
    RunAborted(#[source] JoinError),
}

struct ActiveRun {
    cancel: CancelHandle,
    task: JoinHandle<Result<RunReport, RunFailure>>,
}

/// Routes session events and keeps the learnt maze between runs.
///
/// At most one run is active. Starting another cancels and collects the
/// previous one first.
pub struct Session<M> {
    mouse: Arc<M>,
    config: ExploreConfig,
    start: Option<PositionReset>,
    maze: Option<Maze>,
    active: Option<ActiveRun>,
    state: SessionState,
}

impl<M: Mouse + 'static> Session<M> {
    /// Creates an idle session driving the given mouse.
    #[must_use]
    pub fn new(mouse: Arc<M>, config: ExploreConfig) -> Self {
        Self {
            mouse,
            config,
            start: None,
            maze: None,
            active: None,
            state: SessionState::Idle,
        }
    }

    /// Reacts to a session event, returning the outcome of any run it had to
    /// collect.
    ///
    /// Must be called from within a tokio runtime.
    pub async fn handle(&mut self, event: Event) -> Result<Option<RunOutcome>, SessionError> {
        match event {
            Event::PositionReset { data } => {
                info!(
                    run = data.run_number,
                    remaining = data.runs_remaining,
                    "position reset"
                );
                self.start = Some(data);
                Ok(None)
            }
            Event::Start { data } => self.start_run(data).await,
            Event::End { complete } => {
                info!(complete, "end requested");
                self.collect(true).await
            }
        }
    }

    /// Waits for the active run to finish and collects it.
    pub async fn wait(&mut self) -> Result<Option<RunOutcome>, SessionError> {
        self.collect(false).await
    }

    /// Lifecycle of the most recent run.
    #[must_use]
    pub fn state(&self) -> SessionState {
        if self.active.is_some() {
            SessionState::Exploring
        } else {
            self.state
        }
    }

    /// Learnt maze, unless a run currently holds it or none has run yet.
    #[must_use]
    pub fn maze(&self) -> Option<&Maze> {
        self.maze.as_ref()
    }

    async fn start_run(&mut self, data: StartData) -> Result<Option<RunOutcome>, SessionError> {
        let start = self.start.clone().ok_or(SessionError::NotPositioned)?;
        let previous = self.collect(true).await?;

        let maze = self
            .maze
            .take()
            .unwrap_or_else(|| Maze::new(start.target()));
        let (cancel, token) = cancel_pair();
        let mouse = Arc::clone(&self.mouse);
        let config = self.config;
        let task = tokio::spawn(async move {
            explore(mouse, maze, &start, data.time_remaining, &config, token).await
        });

        self.active = Some(ActiveRun { cancel, task });
        Ok(previous)
    }

    async fn collect(&mut self, cancel: bool) -> Result<Option<RunOutcome>, SessionError> {
        let Some(active) = self.active.take() else {
            return Ok(None);
        };
        if cancel {
            active.cancel.cancel();
        }

        match active.task.await {
            Ok(Ok(report)) => {
                self.state = match report.status {
                    RunStatus::Cancelled => SessionState::Cancelled,
                    _ => SessionState::Completed,
                };
                self.maze = Some(report.maze);
                Ok(Some(RunOutcome::Finished {
                    status: report.status,
                    tiles_travelled: report.tiles_travelled,
                }))
            }
            Ok(Err(failure)) => {
                self.state = SessionState::Failed;
                self.maze = Some(failure.maze);
                Ok(Some(RunOutcome::Failed(failure.source)))
            }
            Err(join) => {
                error!(%join, "exploration task lost");
                self.state = SessionState::Failed;
                Err(SessionError::RunAborted(join))
            }
        }
    }
}

impl<M> Drop for Session<M> {
    fn drop(&mut self) {
        if let Some(active) = &self.active {
            active.cancel.cancel();
        }
    }
}
