use glam::IVec2;
use micromouse_core::{Direction, Position, Tile, SIZE};
use micromouse_maze::{Maze, WallGrid};

fn learn(maze: &mut Maze, walls: &WallGrid) {
    for (axis, cell) in walls.closed_walls() {
        let _ = maze.close_wall(axis, cell);
    }
    maze.update_distances();
}

/// Border plus horizontal baffles that leave a gap at alternating ends.
fn serpentine() -> WallGrid {
    let mut walls = WallGrid::with_border();
    for y in 0..SIZE - 1 {
        let gap = if y % 2 == 0 { SIZE - 1 } else { 0 };
        for x in (0..SIZE).filter(|x| *x != gap) {
            let _ = walls.close_edge(IVec2::new(x, y), Direction::Up);
        }
    }
    walls
}

fn tiles() -> impl Iterator<Item = Tile> {
    (0..SIZE).flat_map(|y| (0..SIZE).map(move |x| IVec2::new(x, y)))
}

#[test]
fn every_non_goal_tile_is_one_more_than_its_best_neighbour() {
    let mut maze = Maze::new(Position::new(0.0, 0.0));
    learn(&mut maze, &serpentine());

    for tile in tiles() {
        let distance = maze.distance(tile).expect("legal tile");
        if maze.goal_tiles().contains(&tile) {
            assert_eq!(distance, 0, "goal tile {tile}");
            continue;
        }

        let passability = maze.passability(tile).expect("legal tile");
        let best = passability
            .iter()
            .filter(|(_, open)| **open)
            .filter_map(|(direction, _)| maze.distance(tile + direction.int_delta()))
            .min()
            .expect("every tile has an open side");
        assert_eq!(distance, best + 1, "tile {tile}");
    }
}

#[test]
fn following_next_move_reaches_the_goal_in_distance_steps() {
    let mut maze = Maze::new(Position::new(0.5, 0.5));
    learn(&mut maze, &serpentine());

    let mut tile = IVec2::new(0, 0);
    let expected = maze.distance(tile).expect("legal tile");
    let mut steps = 0;
    while let Some(step) = maze.next_move(tile) {
        tile += step.direction.int_delta();
        steps += 1;
        assert_eq!(maze.distance(tile), Some(step.distance));
        assert!(steps <= expected, "walked past the expected distance");
    }

    assert_eq!(tile, IVec2::new(8, 8));
    assert_eq!(steps, expected);
}

#[test]
fn open_field_distances_are_manhattan() {
    let mut maze = Maze::new(Position::new(0.5, 0.5));
    learn(&mut maze, &WallGrid::with_border());

    let goal = IVec2::new(8, 8);
    for tile in tiles() {
        let manhattan = (tile - goal).abs();
        let expected = u16::try_from(manhattan.x + manhattan.y).expect("small");
        assert_eq!(maze.distance(tile), Some(expected));
    }

    let step = maze.next_move(IVec2::new(0, 0)).expect("descending step");
    assert_eq!(step.direction, Direction::Up);
    assert_eq!(step.distance, 15);
}

#[test]
fn hand_written_layout_round_trips_through_the_maze_render() {
    let walls = serpentine();
    let parsed = WallGrid::parse_layout(&walls.to_layout()).expect("layout parses");
    assert_eq!(parsed, walls);

    let mut maze = Maze::new(Position::new(0.5, 0.5));
    learn(&mut maze, &walls);
    let rendered = maze.render(None);
    assert_eq!(WallGrid::parse_layout(&rendered).expect("render parses"), walls);
}
