//! Grid coordinates and cardinal directions.
//!
//! Positions are plain `Copy` values. Interactions, updates and chains all
//! hold their own copy of a position, so nothing in the engine ever aliases a
//! coordinate owned by another component.
//!
//! # Example
//!
//! ```
//! use tandem_core::position::{Direction, Position};
//!
//! let start = Position::new(3, 1);
//! assert_eq!(start.step(Direction::North), Position::new(3, 0));
//! assert_eq!(start.step(Direction::West), Position::new(2, 1));
//! ```

use glam::IVec2;
use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// Position
// =============================================================================

/// A cell coordinate on the map grid.
///
/// `x` grows to the east, `y` grows to the south. Positions may be negative or
/// beyond the map edge; bounds are checked by [`Map`](crate::map::Map) when a
/// position is used, never by the position itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Position {
    /// Column index.
    pub x: i32,
    /// Row index.
    pub y: i32,
}

impl Position {
    /// Creates a new position.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Returns the neighbouring position one cell away in `direction`.
    #[must_use]
    pub fn step(self, direction: Direction) -> Self {
        (IVec2::from(self) + direction.offset()).into()
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

impl From<IVec2> for Position {
    fn from(v: IVec2) -> Self {
        Self::new(v.x, v.y)
    }
}

impl From<Position> for IVec2 {
    fn from(p: Position) -> Self {
        IVec2::new(p.x, p.y)
    }
}

impl From<(i32, i32)> for Position {
    fn from((x, y): (i32, i32)) -> Self {
        Self::new(x, y)
    }
}

// =============================================================================
// Direction
// =============================================================================

/// One of the four cardinal directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Towards row 0.
    North,
    /// Towards increasing columns.
    East,
    /// Towards increasing rows.
    South,
    /// Towards column 0.
    West,
}

impl Direction {
    /// All directions in clockwise order starting at north.
    pub const ALL: [Direction; 4] = [
        Direction::North,
        Direction::East,
        Direction::South,
        Direction::West,
    ];

    /// Unit grid offset for this direction.
    #[must_use]
    pub const fn offset(self) -> IVec2 {
        match self {
            Self::North => IVec2::new(0, -1),
            Self::East => IVec2::new(1, 0),
            Self::South => IVec2::new(0, 1),
            Self::West => IVec2::new(-1, 0),
        }
    }

    /// The direction pointing the other way.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::North => Self::South,
            Self::East => Self::West,
            Self::South => Self::North,
            Self::West => Self::East,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::North => write!(f, "North"),
            Self::East => write!(f, "East"),
            Self::South => write!(f, "South"),
            Self::West => write!(f, "West"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_moves_one_cell() {
        let p = Position::new(8, 2);
        assert_eq!(p.step(Direction::North), Position::new(8, 1));
        assert_eq!(p.step(Direction::South), Position::new(8, 3));
        assert_eq!(p.step(Direction::East), Position::new(9, 2));
        assert_eq!(p.step(Direction::West), Position::new(7, 2));
    }

    #[test]
    fn step_can_leave_the_grid() {
        // Bounds are the map's concern.
        assert_eq!(Position::new(0, 0).step(Direction::North), Position::new(0, -1));
    }

    #[test]
    fn opposite_round_trips() {
        for dir in Direction::ALL {
            assert_eq!(dir.opposite().opposite(), dir);
            assert_eq!(dir.offset() + dir.opposite().offset(), IVec2::ZERO);
        }
    }

    #[test]
    fn ivec_conversion() {
        let p = Position::new(-4, 7);
        let v: IVec2 = p.into();
        assert_eq!(Position::from(v), p);
    }
}
