#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Partially observed maze model and flood-fill planner.
//!
//! A [`Maze`] starts with every wall open and learns walls as the mouse
//! reports them. Planning runs on a [`DistanceField`] that must be rebuilt
//! with [`Maze::update_distances`] after walls change; the maze never does
//! this on its own.

mod ascii;
mod navigation;
mod walls;

use glam::IVec2;
use micromouse_core::{is_legal, to_list_grid, Axis, Direction, PerDirection, Position, Tile};
use tracing::warn;

pub use ascii::LayoutError;
pub use navigation::DistanceField;
pub use walls::{wall_cell, WallChange, WallGrid};

/// Single planning step returned by [`Maze::next_move`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NextMove {
    /// Direction to leave the current tile in.
    pub direction: Direction,
    /// Distance to the goal from the tile the move leads to.
    pub distance: u16,
}

/// Learnt walls, the distance field, and the goal tiles it is seeded from.
#[derive(Clone, Debug)]
pub struct Maze {
    walls: WallGrid,
    field: DistanceField,
    goal_tiles: Vec<Tile>,
}

impl Maze {
    /// Creates a maze with no known walls aiming at the given goal position.
    #[must_use]
    pub fn new(goal: Position) -> Self {
        let mut maze = Self {
            walls: WallGrid::new(),
            field: DistanceField::default(),
            goal_tiles: Vec::new(),
        };
        maze.update_goal(goal);
        maze
    }

    /// Relocates the goal, recomputing the goal tiles.
    ///
    /// A goal on a tile boundary covers the tiles on both sides of it, so a
    /// goal on a grid vertex yields four tiles. Tiles outside the maze are
    /// dropped. Walls and distances are left untouched.
    pub fn update_goal(&mut self, goal: Position) {
        let base = to_list_grid(goal);
        let mut tiles = vec![base];

        if goal.x.fract() == 0.0 {
            tiles.push(base - IVec2::X);
        }
        if goal.y.fract() == 0.0 {
            let below: Vec<Tile> = tiles.iter().map(|tile| *tile - IVec2::Y).collect();
            tiles.extend(below);
        }

        tiles.retain(|tile| {
            let legal = is_legal(*tile);
            if !legal {
                warn!(?goal, ?tile, "discarding goal tile outside the maze");
            }
            legal
        });
        self.goal_tiles = tiles;
    }

    /// Tiles the distance field is seeded from.
    #[must_use]
    pub fn goal_tiles(&self) -> &[Tile] {
        &self.goal_tiles
    }

    /// Learnt walls.
    #[must_use]
    pub fn walls(&self) -> &WallGrid {
        &self.walls
    }

    /// Current distance field.
    #[must_use]
    pub fn distances(&self) -> &DistanceField {
        &self.field
    }

    /// Distance from the tile to the goal, or `None` outside the maze.
    #[must_use]
    pub fn distance(&self, tile: Tile) -> Option<u16> {
        self.field.distance(tile)
    }

    /// Passability of the four sides of a tile, or `None` outside the maze.
    #[must_use]
    pub fn passability(&self, tile: Tile) -> Option<PerDirection<bool>> {
        self.walls.passability(tile)
    }

    /// Records an observed wall. The distance field goes stale until
    /// [`Maze::update_distances`] runs.
    pub fn close_wall(&mut self, axis: Axis, cell: Tile) -> WallChange {
        self.walls.close(axis, cell)
    }

    /// Picks the first open side, in [`Direction::ALL`] order, whose neighbour
    /// is one step closer to the goal.
    ///
    /// Returns `None` on a goal tile, outside the maze, and when the map
    /// offers no descending step; the last case is logged since it means the
    /// distance field and the walls disagree.
    #[must_use]
    pub fn next_move(&self, tile: Tile) -> Option<NextMove> {
        let aim = self.distance(tile)?.checked_sub(1)?;
        let passability = self.passability(tile)?;

        let found = passability
            .iter()
            .filter(|(_, passable)| **passable)
            .map(|(direction, _)| direction)
            .find(|direction| self.distance(tile + direction.int_delta()) == Some(aim));

        match found {
            Some(direction) => Some(NextMove {
                direction,
                distance: aim,
            }),
            None => {
                warn!(?tile, aim, "no descending step from tile, map is inconsistent");
                None
            }
        }
    }

    /// Rebuilds the distance field from the goal tiles through the known
    /// walls.
    pub fn update_distances(&mut self) {
        self.field.flood_from(&self.goal_tiles, &self.walls);
    }

    /// Renders the learnt walls and distances, marking the mouse's tile.
    #[must_use]
    pub fn render(&self, mouse: Option<Tile>) -> String {
        ascii::render(&self.walls, |tile| {
            let distance = self.field.distance(tile).unwrap_or(u16::MAX);
            ascii::distance_cell(distance, mouse == Some(tile))
        })
    }
}

impl WallGrid {
    /// Renders the walls with empty tiles.
    #[must_use]
    pub fn to_layout(&self) -> String {
        ascii::render(self, |_| "   ".to_owned())
    }

    /// Reads walls from the text format produced by [`WallGrid::to_layout`].
    pub fn parse_layout(text: &str) -> Result<WallGrid, LayoutError> {
        ascii::parse(text)
    }
}
