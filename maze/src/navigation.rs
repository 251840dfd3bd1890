//! Flood-fill distance field used by the maze planner.

use std::collections::VecDeque;

use micromouse_core::{Direction, Tile, TILE_COUNT};

use crate::walls::{WallGrid, SIZE_USIZE};

/// Dense tile-count distances to the nearest goal tile.
///
/// The field is rebuilt with a multi-source breadth-first search across open
/// walls. Tiles the search cannot reach keep whatever value they held before,
/// so a fresh field reports `0` for them until they become reachable.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DistanceField {
    distances: [[u16; SIZE_USIZE]; SIZE_USIZE],
}

impl DistanceField {
    /// Rebuilds the distances from the goal tiles through the open walls.
    pub(crate) fn flood_from(&mut self, goals: &[Tile], walls: &WallGrid) {
        let mut seen = [[false; SIZE_USIZE]; SIZE_USIZE];
        let mut queue = VecDeque::with_capacity(TILE_COUNT as usize);

        for &goal in goals {
            let Some((row, column)) = index(goal) else {
                continue;
            };
            self.distances[row][column] = 0;
            if !seen[row][column] {
                seen[row][column] = true;
                queue.push_back(goal);
            }
        }

        while let Some(tile) = queue.pop_front() {
            let Some(current) = self.distance(tile) else {
                continue;
            };
            let next = current.saturating_add(1);

            for direction in Direction::ALL {
                if !walls.is_passable(tile, direction) {
                    continue;
                }

                let neighbor = tile + direction.int_delta();
                let Some((row, column)) = index(neighbor) else {
                    continue;
                };

                if seen[row][column] && self.distances[row][column] <= next {
                    continue;
                }

                self.distances[row][column] = next;
                seen[row][column] = true;
                queue.push_back(neighbor);
            }
        }
    }

    /// Distance stored for the tile, if it lies within the maze.
    #[must_use]
    pub fn distance(&self, tile: Tile) -> Option<u16> {
        index(tile).map(|(row, column)| self.distances[row][column])
    }
}

fn index(tile: Tile) -> Option<(usize, usize)> {
    let row = usize::try_from(tile.y).ok()?;
    let column = usize::try_from(tile.x).ok()?;
    (row < SIZE_USIZE && column < SIZE_USIZE).then_some((row, column))
}

#[cfg(test)]
mod tests {
    use glam::IVec2;

    use super::*;

    #[test]
    fn flood_sets_goal_tiles_to_zero() {
        let mut field = DistanceField::default();
        let goal = IVec2::new(1, 2);

        field.flood_from(&[goal], &WallGrid::with_border());

        assert_eq!(field.distance(goal), Some(0));
        assert_eq!(field.distance(IVec2::new(1, 1)), Some(1));
        assert_eq!(field.distance(IVec2::new(1, 0)), Some(2));
        assert_eq!(field.distance(IVec2::new(0, 0)), Some(3));
    }

    #[test]
    fn flood_respects_walls() {
        let mut walls = WallGrid::with_border();
        let goal = IVec2::new(1, 2);
        let _ = walls.close_edge(goal, Direction::Down);

        let mut field = DistanceField::default();
        field.flood_from(&[goal], &walls);

        assert_eq!(field.distance(IVec2::new(1, 1)), Some(3));
        assert_eq!(field.distance(IVec2::new(0, 1)), Some(2));
    }

    #[test]
    fn unreachable_tiles_keep_their_previous_value() {
        let mut walls = WallGrid::with_border();
        let mut field = DistanceField::default();
        let goal = IVec2::new(8, 8);
        field.flood_from(&[goal], &walls);
        let corner = IVec2::new(0, 0);
        assert_eq!(field.distance(corner), Some(16));

        let _ = walls.close_edge(corner, Direction::Up);
        let _ = walls.close_edge(corner, Direction::Right);
        field.flood_from(&[goal], &walls);

        assert_eq!(field.distance(corner), Some(16));
    }

    #[test]
    fn out_of_grid_tiles_have_no_distance() {
        let field = DistanceField::default();
        assert_eq!(field.distance(IVec2::new(-1, 0)), None);
        assert_eq!(field.distance(IVec2::new(0, 16)), None);
    }
}
