//! Axis-aligned ray casting against a wall grid.

use micromouse_core::{is_legal, to_list_grid, Direction, Position, SIZE};
use micromouse_maze::WallGrid;

/// Distance from `origin` to the first closed wall met travelling along
/// `direction`. Leaving the maze counts as meeting a wall.
pub(crate) fn cast(walls: &WallGrid, origin: Position, direction: Direction) -> f64 {
    let mut tile = to_list_grid(origin);
    let offset = origin - origin.floor();
    let mut distance = match direction {
        Direction::Left => offset.x,
        Direction::Down => offset.y,
        Direction::Up => 1.0 - offset.y,
        Direction::Right => 1.0 - offset.x,
    };

    for _ in 0..SIZE {
        if !is_legal(tile) || !walls.is_passable(tile, direction) {
            break;
        }
        tile += direction.int_delta();
        distance += 1.0;
    }
    distance
}

/// Cardinal direction nearest to a heading in degrees.
pub(crate) fn nearest_cardinal(degrees: f64) -> Direction {
    let quarter = (degrees / 90.0).round().rem_euclid(4.0);
    if quarter < 0.5 {
        Direction::Up
    } else if quarter < 1.5 {
        Direction::Right
    } else if quarter < 2.5 {
        Direction::Down
    } else {
        Direction::Left
    }
}
