//! Text rendering of wall layouts in the classic micromouse format.
//!
//! ```text
//! +---+---+
//! | 2   1 |
//! +   +---+
//! | 3   0 |
//! +---+---+
//! ```
//!
//! Rows are printed top (`y = 15`) first. Every tile is three characters wide
//! and the rendered cell contents are ignored when parsing.

use glam::IVec2;
use micromouse_core::{Axis, Tile, SIZE, TILE_COUNT};
use thiserror::Error;

use crate::walls::WallGrid;

const LINE_COUNT: usize = 2 * SIZE as usize + 1;
const LINE_WIDTH: usize = 4 * SIZE as usize + 1;

/// Reasons a text layout could not be read.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum LayoutError {
    /// The layout does not have one line per wall row and tile row.
    #[error("expected {expected} layout lines, found {found}")]
    LineCount {
        /// Number of lines a complete layout has.
        expected: usize,
        /// Number of lines found between the first and last non-blank line.
        found: usize,
    },
    /// A post position on a wall line holds something other than `+`.
    #[error("line {line}: expected `+` at column {column}")]
    MissingPost {
        /// One-based line number.
        line: usize,
        /// Zero-based character column.
        column: usize,
    },
}

/// Renders the walls with the given content in every tile.
///
/// `cell` must produce exactly three characters per tile.
pub(crate) fn render(walls: &WallGrid, mut cell: impl FnMut(Tile) -> String) -> String {
    let mut text = String::with_capacity(LINE_COUNT * (LINE_WIDTH + 1));
    for y in (0..SIZE).rev() {
        push_wall_line(&mut text, walls, y + 1);
        for x in 0..SIZE {
            text.push(vertical(walls, IVec2::new(x, y)));
            text.push_str(&cell(IVec2::new(x, y)));
        }
        text.push(vertical(walls, IVec2::new(SIZE, y)));
        text.push('\n');
    }
    push_wall_line(&mut text, walls, 0);
    text
}

/// Formats a flood-fill distance the way the debug view shows it.
///
/// Small values print in decimal, larger ones in hexadecimal, and anything
/// beyond the tile count as `NA`. The mouse's tile is marked with `@`.
pub(crate) fn distance_cell(distance: u16, has_mouse: bool) -> String {
    let value = if distance < 99 {
        format!("{distance:>2}")
    } else if i32::from(distance) < TILE_COUNT {
        format!("{distance:>2x}")
    } else {
        "NA".to_owned()
    };
    let marker = if has_mouse { '@' } else { ' ' };
    format!("{marker}{value}")
}

/// Parses a layout produced by [`render`] or written by hand.
pub(crate) fn parse(text: &str) -> Result<WallGrid, LayoutError> {
    let all: Vec<&str> = text.lines().map(str::trim_end).collect();
    let first = all.iter().position(|line| !line.is_empty()).unwrap_or(0);
    let last = all.iter().rposition(|line| !line.is_empty()).map_or(0, |last| last + 1);
    let lines: Vec<Vec<char>> = all[first..last.max(first)]
        .iter()
        .map(|line| {
            let mut chars: Vec<char> = line.chars().collect();
            chars.resize(chars.len().max(LINE_WIDTH), ' ');
            chars
        })
        .collect();

    if lines.len() != LINE_COUNT {
        return Err(LayoutError::LineCount {
            expected: LINE_COUNT,
            found: lines.len(),
        });
    }

    let mut walls = WallGrid::new();
    for (number, line) in lines.iter().enumerate() {
        // Line 0 holds the top boundary, so wall row `SIZE - number / 2`.
        let row = SIZE - (number / 2) as i32;
        if number % 2 == 0 {
            for x in 0..SIZE {
                let post = 4 * x as usize;
                if line[post] != '+' {
                    return Err(LayoutError::MissingPost {
                        line: number + 1,
                        column: post,
                    });
                }
                if line[post + 1..post + 4].contains(&'-') {
                    let _ = walls.close(Axis::X, IVec2::new(x, row));
                }
            }
        } else {
            for x in 0..=SIZE {
                if line[4 * x as usize] == '|' {
                    let _ = walls.close(Axis::Y, IVec2::new(x, row - 1));
                }
            }
        }
    }
    Ok(walls)
}

fn push_wall_line(text: &mut String, walls: &WallGrid, row: i32) {
    text.push('+');
    for x in 0..SIZE {
        let open = walls.is_open(Axis::X, IVec2::new(x, row)).unwrap_or(true);
        text.push_str(if open { "   " } else { "---" });
        text.push('+');
    }
    text.push('\n');
}

fn vertical(walls: &WallGrid, cell: Tile) -> char {
    if walls.is_open(Axis::Y, cell).unwrap_or(true) {
        ' '
    } else {
        '|'
    }
}

#[cfg(test)]
mod tests {
    use micromouse_core::Direction;

    use super::*;

    #[test]
    fn rendered_layout_parses_back() {
        let mut walls = WallGrid::with_border();
        let _ = walls.close_edge(IVec2::new(3, 4), Direction::Up);
        let _ = walls.close_edge(IVec2::new(15, 0), Direction::Left);
        let _ = walls.close_edge(IVec2::new(0, 15), Direction::Right);

        let text = render(&walls, |_| "   ".to_owned());
        assert_eq!(text.lines().count(), LINE_COUNT);
        assert!(text.lines().all(|line| line.chars().count() == LINE_WIDTH));

        assert_eq!(parse(&text), Ok(walls));
    }

    #[test]
    fn top_left_corner_renders_first() {
        let mut walls = WallGrid::new();
        let _ = walls.close_edge(IVec2::new(0, 15), Direction::Up);
        let text = render(&walls, |_| "   ".to_owned());
        assert!(text.starts_with("+---+   +"));
    }

    #[test]
    fn distances_format_like_the_debug_view() {
        assert_eq!(distance_cell(7, false), "  7");
        assert_eq!(distance_cell(42, true), "@42");
        assert_eq!(distance_cell(200, false), " c8");
        assert_eq!(distance_cell(u16::MAX, false), " NA");
    }

    #[test]
    fn short_layouts_are_rejected() {
        assert_eq!(
            parse("+---+\n|   |\n+---+\n"),
            Err(LayoutError::LineCount {
                expected: LINE_COUNT,
                found: 3
            })
        );
    }

    #[test]
    fn broken_posts_are_reported() {
        let text = render(&WallGrid::new(), |_| "   ".to_owned()).replacen('+', "x", 1);
        assert!(text.lines().nth(1).is_some_and(|line| line.trim().is_empty()));
        assert_eq!(
            parse(&text),
            Err(LayoutError::MissingPost { line: 1, column: 0 })
        );
    }
}
