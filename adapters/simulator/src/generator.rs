//! Seeded ground-truth maze generation.

use glam::IVec2;
use micromouse_core::{is_legal, Direction, Tile, SIZE};
use micromouse_maze::WallGrid;
use rand::{seq::SliceRandom, Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

const SIDE: usize = SIZE as usize;

/// Builds a maze by carving a spanning tree with a randomised depth-first
/// backtracker, then opening each remaining interior wall with probability
/// `braid` to add loops.
///
/// Every tile is reachable from every other. The outer boundary stays closed.
#[must_use]
pub fn generate_maze(seed: u64, braid: f64) -> WallGrid {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut walls = fully_closed();

    let mut visited = [[false; SIDE]; SIDE];
    let origin = IVec2::ZERO;
    mark(&mut visited, origin);
    let mut stack = vec![origin];

    while let Some(&current) = stack.last() {
        let options: Vec<Direction> = Direction::ALL
            .into_iter()
            .filter(|direction| {
                let next = current + direction.int_delta();
                is_legal(next) && !is_visited(&visited, next)
            })
            .collect();

        match options.choose(&mut rng) {
            Some(&direction) => {
                let next = current + direction.int_delta();
                let _ = walls.open_edge(current, direction);
                mark(&mut visited, next);
                stack.push(next);
            }
            None => {
                let _ = stack.pop();
            }
        }
    }

    let braid = if braid.is_nan() {
        0.0
    } else {
        braid.clamp(0.0, 1.0)
    };
    if braid > 0.0 {
        for tile in tiles() {
            for direction in [Direction::Up, Direction::Right] {
                let interior = is_legal(tile + direction.int_delta());
                if interior && !walls.is_passable(tile, direction) && rng.gen_bool(braid) {
                    let _ = walls.open_edge(tile, direction);
                }
            }
        }
    }
    walls
}

fn fully_closed() -> WallGrid {
    let mut walls = WallGrid::new();
    for tile in tiles() {
        for direction in Direction::ALL {
            let _ = walls.close_edge(tile, direction);
        }
    }
    walls
}

fn tiles() -> impl Iterator<Item = Tile> {
    (0..SIZE).flat_map(|y| (0..SIZE).map(move |x| IVec2::new(x, y)))
}

fn index(tile: Tile) -> (usize, usize) {
    // Callers only pass legal tiles.
    (tile.y as usize, tile.x as usize)
}

fn is_visited(visited: &[[bool; SIDE]; SIDE], tile: Tile) -> bool {
    let (row, column) = index(tile);
    visited[row][column]
}

fn mark(visited: &mut [[bool; SIDE]; SIDE], tile: Tile) {
    let (row, column) = index(tile);
    visited[row][column] = true;
}
