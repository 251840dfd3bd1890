//! Cardinal directions and the fixed geometry attached to each of them.

use std::f64::consts::TAU;

use glam::IVec2;

use crate::geometry::{heading_vector, GeometryError, Position, Tile};

const ANGLE_TOLERANCE: f64 = 1e-9;

/// Axis along which a wall segment lies.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Axis {
    /// Walls running along the X axis, crossed when moving up or down.
    X,
    /// Walls running along the Y axis, crossed when moving left or right.
    Y,
}

/// One of the four headings the mouse may travel in.
///
/// The declaration order is significant: planning breaks ties between equally
/// good moves by taking the first direction in this order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Direction {
    /// Towards decreasing X.
    Left,
    /// Towards decreasing Y.
    Down,
    /// Towards increasing Y.
    Up,
    /// Towards increasing X.
    Right,
}

#[derive(Debug)]
struct Heading {
    degrees: f64,
    axis: Axis,
    positive: bool,
}

// Indexed by `Direction as usize`.
static HEADINGS: [Heading; 4] = [
    Heading {
        degrees: 270.0,
        axis: Axis::Y,
        positive: false,
    },
    Heading {
        degrees: 180.0,
        axis: Axis::X,
        positive: false,
    },
    Heading {
        degrees: 0.0,
        axis: Axis::X,
        positive: true,
    },
    Heading {
        degrees: 90.0,
        axis: Axis::Y,
        positive: true,
    },
];

impl Direction {
    /// Every direction in tie-break order.
    pub const ALL: [Direction; 4] = [
        Direction::Left,
        Direction::Down,
        Direction::Up,
        Direction::Right,
    ];

    fn heading(self) -> &'static Heading {
        &HEADINGS[self as usize]
    }

    /// Position of the direction within [`Direction::ALL`].
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Absolute angle of the direction in radians, clockwise from `+y`.
    #[must_use]
    pub fn angle(self) -> f64 {
        self.degrees().to_radians()
    }

    /// Absolute angle of the direction in degrees, clockwise from `+y`.
    #[must_use]
    pub fn degrees(self) -> f64 {
        self.heading().degrees
    }

    /// Unit vector pointing along the direction.
    #[must_use]
    pub fn delta(self) -> Position {
        heading_vector(self.angle())
    }

    /// [`Direction::delta`] rounded onto the integer grid.
    #[must_use]
    pub fn int_delta(self) -> Tile {
        self.delta().round().as_ivec2()
    }

    /// Axis of the wall array holding this direction's walls.
    #[must_use]
    pub fn intersecting_axis(self) -> Axis {
        self.heading().axis
    }

    /// Offset from a tile to the wall cell on this side of it.
    ///
    /// Walls on the negative side of a tile share the tile's index; walls on
    /// the positive side belong to the next tile over.
    #[must_use]
    pub fn wall_offset(self) -> Tile {
        if self.heading().positive {
            self.int_delta()
        } else {
            IVec2::ZERO
        }
    }

    /// Direction pointing the opposite way.
    #[must_use]
    pub const fn opposite(self) -> Direction {
        match self {
            Direction::Left => Direction::Right,
            Direction::Down => Direction::Up,
            Direction::Up => Direction::Down,
            Direction::Right => Direction::Left,
        }
    }

    /// Resolves an angle, taken modulo a full turn, to its direction.
    ///
    /// Only the four canonical angles resolve; anything else is a geometry
    /// fault.
    pub fn from_angle(angle: f64) -> Result<Direction, GeometryError> {
        let normalized = angle.rem_euclid(TAU);
        Direction::ALL
            .into_iter()
            .find(|direction| {
                let difference = (normalized - direction.angle()).abs();
                difference.min(TAU - difference) < ANGLE_TOLERANCE
            })
            .ok_or(GeometryError::NotCardinal { angle })
    }
}

/// Fixed mapping from each [`Direction`] to an optional value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PerDirection<T> {
    slots: [Option<T>; 4],
}

impl<T> Default for PerDirection<T> {
    fn default() -> Self {
        Self {
            slots: [None, None, None, None],
        }
    }
}

impl<T> PerDirection<T> {
    /// Creates an empty mapping.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a mapping with a value for every direction.
    #[must_use]
    pub fn from_fn(mut value: impl FnMut(Direction) -> T) -> Self {
        Self {
            slots: Direction::ALL.map(|direction| Some(value(direction))),
        }
    }

    /// Value stored for the direction, if any.
    #[must_use]
    pub fn get(&self, direction: Direction) -> Option<&T> {
        self.slots[direction.index()].as_ref()
    }

    /// Stores a value for the direction, returning the one it replaced.
    pub fn insert(&mut self, direction: Direction, value: T) -> Option<T> {
        self.slots[direction.index()].replace(value)
    }

    /// Iterates over the stored entries in tie-break order.
    pub fn iter(&self) -> impl Iterator<Item = (Direction, &T)> {
        Direction::ALL
            .into_iter()
            .zip(self.slots.iter())
            .filter_map(|(direction, slot)| slot.as_ref().map(|value| (direction, value)))
    }

    /// Number of directions holding a value.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    /// Reports whether no direction holds a value.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Transforms every stored value, keeping the directions.
    #[must_use]
    pub fn map<U>(self, mut transform: impl FnMut(Direction, T) -> U) -> PerDirection<U> {
        let mut mapped = PerDirection::new();
        for (direction, slot) in Direction::ALL.into_iter().zip(self.slots) {
            if let Some(value) = slot {
                let _ = mapped.insert(direction, transform(direction, value));
            }
        }
        mapped
    }
}

/// Buckets values by the direction their paired angle resolves to.
///
/// A later value for a repeated direction replaces the earlier one.
pub fn organize_by_angles<T>(
    angles: impl IntoIterator<Item = f64>,
    items: impl IntoIterator<Item = T>,
) -> Result<PerDirection<T>, GeometryError> {
    let mut organized = PerDirection::new();
    for (angle, item) in angles.into_iter().zip(items) {
        let _ = organized.insert(Direction::from_angle(angle)?, item);
    }
    Ok(organized)
}
