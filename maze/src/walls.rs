//! Passability of every wall segment in the maze.

use glam::IVec2;
use micromouse_core::{is_legal, Axis, Direction, PerDirection, Tile, SIZE};

pub(crate) const SIZE_USIZE: usize = SIZE as usize;

/// Outcome of an attempt to close a wall segment.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WallChange {
    /// The segment was open and is now closed.
    Closed,
    /// The segment was already closed.
    AlreadyClosed,
    /// The segment lies outside the wall arrays.
    OutOfBounds,
}

/// Both wall arrays of the maze, `true` meaning passable.
///
/// The arrays have different shapes. Walls along the X axis form 17 rows of
/// 16 segments, walls along the Y axis form 16 rows of 17 segments. Both are
/// indexed `[y][x]` by wall cell, where a tile's wall cell on a given side is
/// the tile plus [`Direction::wall_offset`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WallGrid {
    along_x: [[bool; SIZE_USIZE]; SIZE_USIZE + 1],
    along_y: [[bool; SIZE_USIZE + 1]; SIZE_USIZE],
}

impl Default for WallGrid {
    fn default() -> Self {
        Self {
            along_x: [[true; SIZE_USIZE]; SIZE_USIZE + 1],
            along_y: [[true; SIZE_USIZE + 1]; SIZE_USIZE],
        }
    }
}

impl WallGrid {
    /// Creates a grid where every segment is open.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a grid where only the outer boundary is closed.
    #[must_use]
    pub fn with_border() -> Self {
        let mut walls = Self::new();
        for index in 0..SIZE_USIZE {
            walls.along_x[0][index] = false;
            walls.along_x[SIZE_USIZE][index] = false;
            walls.along_y[index][0] = false;
            walls.along_y[index][SIZE_USIZE] = false;
        }
        walls
    }

    /// Whether the segment at `cell` is open, or `None` outside the arrays.
    #[must_use]
    pub fn is_open(&self, axis: Axis, cell: Tile) -> Option<bool> {
        let (row, column) = index(axis, cell)?;
        Some(match axis {
            Axis::X => self.along_x[row][column],
            Axis::Y => self.along_y[row][column],
        })
    }

    /// Marks the segment at `cell` impassable. Segments never reopen.
    pub fn close(&mut self, axis: Axis, cell: Tile) -> WallChange {
        let Some((row, column)) = index(axis, cell) else {
            return WallChange::OutOfBounds;
        };
        let slot = match axis {
            Axis::X => &mut self.along_x[row][column],
            Axis::Y => &mut self.along_y[row][column],
        };
        if *slot {
            *slot = false;
            WallChange::Closed
        } else {
            WallChange::AlreadyClosed
        }
    }

    /// Closes the wall on the given side of a tile.
    pub fn close_edge(&mut self, tile: Tile, direction: Direction) -> WallChange {
        self.close(direction.intersecting_axis(), wall_cell(tile, direction))
    }

    /// Opens the wall on the given side of a tile.
    ///
    /// Only meant for building ground-truth layouts; a learnt map never
    /// reopens a wall. Returns `false` when the segment is out of bounds.
    pub fn open_edge(&mut self, tile: Tile, direction: Direction) -> bool {
        let Some((row, column)) = index(direction.intersecting_axis(), wall_cell(tile, direction))
        else {
            return false;
        };
        match direction.intersecting_axis() {
            Axis::X => self.along_x[row][column] = true,
            Axis::Y => self.along_y[row][column] = true,
        }
        true
    }

    /// Whether the wall on the given side of a tile is open.
    ///
    /// Segments outside the arrays count as closed.
    #[must_use]
    pub fn is_passable(&self, tile: Tile, direction: Direction) -> bool {
        self.is_open(direction.intersecting_axis(), wall_cell(tile, direction))
            .unwrap_or(false)
    }

    /// Passability of all four sides of a tile, or `None` outside the maze.
    #[must_use]
    pub fn passability(&self, tile: Tile) -> Option<PerDirection<bool>> {
        is_legal(tile).then(|| PerDirection::from_fn(|direction| self.is_passable(tile, direction)))
    }

    /// Number of closed segments across both arrays.
    #[must_use]
    pub fn closed_count(&self) -> usize {
        self.closed_walls().count()
    }

    /// Iterates over every closed segment as `(axis, wall cell)`.
    pub fn closed_walls(&self) -> impl Iterator<Item = (Axis, Tile)> + '_ {
        let along_x = self.along_x.iter().enumerate().flat_map(|(row, cells)| {
            cells
                .iter()
                .enumerate()
                .filter(|(_, open)| !**open)
                .map(move |(column, _)| (Axis::X, cell_at(row, column)))
        });
        let along_y = self.along_y.iter().enumerate().flat_map(|(row, cells)| {
            cells
                .iter()
                .enumerate()
                .filter(|(_, open)| !**open)
                .map(move |(column, _)| (Axis::Y, cell_at(row, column)))
        });
        along_x.chain(along_y)
    }
}

/// Wall cell holding the wall on the given side of a tile.
#[must_use]
pub fn wall_cell(tile: Tile, direction: Direction) -> Tile {
    tile + direction.wall_offset()
}

fn index(axis: Axis, cell: Tile) -> Option<(usize, usize)> {
    let (rows, columns) = match axis {
        Axis::X => (SIZE + 1, SIZE),
        Axis::Y => (SIZE, SIZE + 1),
    };
    if (0..rows).contains(&cell.y) && (0..columns).contains(&cell.x) {
        Some((usize::try_from(cell.y).ok()?, usize::try_from(cell.x).ok()?))
    } else {
        None
    }
}

fn cell_at(row: usize, column: usize) -> Tile {
    // Both indices are bounded by the array shapes, far below i32::MAX.
    IVec2::new(column as i32, row as i32)
}
