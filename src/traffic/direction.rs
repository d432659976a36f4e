/*!
 * Directions and Paths
 * Compass approaches of the intersection and the 16 routes across it
 */

use serde::{Deserialize, Serialize};
use std::fmt;

/// Compass approach of the intersection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    North,
    East,
    South,
    West,
}

impl Direction {
    /// All directions in index order
    pub const ALL: [Direction; 4] = [
        Direction::North,
        Direction::East,
        Direction::South,
        Direction::West,
    ];

    #[inline(always)]
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Direction::North => 0,
            Direction::East => 1,
            Direction::South => 2,
            Direction::West => 3,
        }
    }

    /// Inverse of [`Direction::index`], wrapping modulo 4
    #[inline]
    #[must_use]
    pub const fn from_index(index: usize) -> Self {
        Self::ALL[index % 4]
    }

    /// Exit a vehicle arriving from `self` takes when turning right
    #[inline]
    #[must_use]
    pub const fn right_of(self) -> Self {
        match self {
            Direction::North => Direction::West,
            Direction::East => Direction::North,
            Direction::South => Direction::East,
            Direction::West => Direction::South,
        }
    }

    #[inline]
    #[must_use]
    pub const fn opposite(self) -> Self {
        Self::from_index(self.index() + 2)
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Direction::North => "north",
            Direction::East => "east",
            Direction::South => "south",
            Direction::West => "west",
        };
        f.write_str(name)
    }
}

/// Route a vehicle takes: the approach it arrives on and the exit it leaves by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Path {
    pub origin: Direction,
    pub destination: Direction,
}

impl Path {
    /// Number of distinct paths, U-turns included
    pub const COUNT: usize = 16;

    #[inline]
    #[must_use]
    pub const fn new(origin: Direction, destination: Direction) -> Self {
        Self {
            origin,
            destination,
        }
    }

    /// Dense index in `0..16`, origin-major
    #[inline(always)]
    #[must_use]
    pub const fn index(self) -> usize {
        self.origin.index() * 4 + self.destination.index()
    }

    #[inline]
    #[must_use]
    pub const fn from_index(index: usize) -> Self {
        Self::new(
            Direction::from_index(index / 4),
            Direction::from_index(index % 4),
        )
    }

    /// Every path in index order
    pub fn all() -> impl Iterator<Item = Path> {
        (0..Self::COUNT).map(Self::from_index)
    }

    #[inline]
    #[must_use]
    pub const fn is_right_turn(self) -> bool {
        self.origin.right_of().index() == self.destination.index()
    }

    #[inline]
    #[must_use]
    pub const fn is_u_turn(self) -> bool {
        self.origin.index() == self.destination.index()
    }

    #[inline]
    #[must_use]
    pub const fn is_straight(self) -> bool {
        self.origin.opposite().index() == self.destination.index()
    }

    /// The same route driven the other way
    #[inline]
    #[must_use]
    pub const fn reverse(self) -> Self {
        Self::new(self.destination, self.origin)
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}->{}", self.origin, self.destination)
    }
}

impl From<(Direction, Direction)> for Path {
    fn from((origin, destination): (Direction, Direction)) -> Self {
        Self::new(origin, destination)
    }
}
