//! Coordinate spaces used by the maze and the mouse.
//!
//! The map grid is the real-world frame: `f64` positions measured in tiles
//! with the origin at the centre of the maze. The list grid is the integer
//! frame used to index arrays, with `(0, 0)` at the bottom-left tile.

use glam::{DVec2, IVec2};
use thiserror::Error;

use crate::SIZE;

/// Real-valued location in the map grid, measured in tiles.
pub type Position = DVec2;

/// Integer tile index in the list grid.
pub type Tile = IVec2;

const LIST_GRID_OFFSET: IVec2 = IVec2::new(SIZE / 2, SIZE / 2);

/// Violations of the geometric invariants the planner relies on.
///
/// These indicate a defect upstream and are never recovered from locally.
#[derive(Clone, Copy, Debug, PartialEq, Error)]
pub enum GeometryError {
    /// The angle does not point along one of the four grid axes.
    #[error("angle {angle} rad does not match any cardinal direction")]
    NotCardinal {
        /// Offending angle in radians.
        angle: f64,
    },
}

/// Unit vector for a heading, with angle `0` pointing along `+y` and angles
/// increasing clockwise.
#[must_use]
pub fn heading_vector(angle: f64) -> Position {
    DVec2::new(angle.sin(), angle.cos())
}

/// Converts a map-grid position into the list-grid tile that contains it.
#[must_use]
pub fn to_list_grid(position: Position) -> Tile {
    position.floor().as_ivec2() + LIST_GRID_OFFSET
}

/// Converts a list-grid tile into the map-grid position of its lower-left corner.
#[must_use]
pub fn to_map_grid(tile: Tile) -> Position {
    (tile - LIST_GRID_OFFSET).as_dvec2()
}

/// Reports whether the tile lies inside the maze.
#[must_use]
pub fn is_legal(tile: Tile) -> bool {
    (0..SIZE).contains(&tile.x) && (0..SIZE).contains(&tile.y)
}
