#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the micromouse client.
//!
//! This crate defines the vocabulary that connects the maze model, the pure
//! systems, and the adapters. Positions and tiles are plain `glam` vectors,
//! [`Direction`] carries the fixed per-heading geometry, [`Event`] is the
//! closed set of signals that drive a session, and [`Mouse`] is the contract
//! every actuation/sensing backend implements. Nothing here performs I/O.

mod direction;
mod event;
mod geometry;

use std::future::Future;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use direction::{organize_by_angles, Axis, Direction, PerDirection};
pub use event::{Event, EventError, PositionReset, StartData};
pub use geometry::{
    heading_vector, is_legal, to_list_grid, to_map_grid, GeometryError, Position, Tile,
};

/// Number of tiles along each edge of the maze.
pub const SIZE: i32 = 16;

/// Total number of tiles contained in the maze.
pub const TILE_COUNT: i32 = SIZE * SIZE;

/// Forward speed of the mouse assumed when no configuration overrides it.
pub const DEFAULT_TILES_PER_SECOND: f64 = 2.0;

/// Snapshot of the four distance sensors reported by the mouse.
///
/// Distances are measured in tiles from the mouse's centre, relative to its
/// current heading. `rotation` is the absolute heading in degrees.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct DistanceReadings {
    /// Distance to the nearest wall on the mouse's left.
    pub left: f64,
    /// Distance to the nearest wall on the mouse's right.
    pub right: f64,
    /// Distance to the nearest wall straight ahead.
    pub forward: f64,
    /// Distance to the nearest wall behind the mouse.
    pub back: f64,
    /// Absolute heading of the mouse in degrees.
    pub rotation: f64,
}

/// Failure reported by the mouse when a rotation could not be completed.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("rotation failed: {reason}")]
pub struct RotationError {
    reason: String,
}

impl RotationError {
    /// Creates a rotation error carrying the collaborator's explanation.
    #[must_use]
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }

    /// Explanation supplied by the collaborator.
    #[must_use]
    pub fn reason(&self) -> &str {
        &self.reason
    }
}

/// Actuation and sensing surface of a physical or simulated mouse.
///
/// A request that never resolves blocks the caller; no timeout is modelled.
pub trait Mouse: Send + Sync {
    /// Requests the current distance readings from all four sensors.
    fn get_distances(&self) -> impl Future<Output = DistanceReadings> + Send;

    /// Rotates the mouse by `degrees` (positive turns clockwise, so `90.0`
    /// is a right turn) and resolves with the resulting absolute heading.
    fn rotate(&self, degrees: f64) -> impl Future<Output = Result<f64, RotationError>> + Send;
}
