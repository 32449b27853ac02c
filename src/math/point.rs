use super::vec::Offset;
use serde::{Deserialize, Serialize};
use std::{fmt, ops::Add};

/// A grid coordinate. Signed so that a candidate move can be expressed before it's bounds-checked.
#[derive(Deserialize, Serialize, PartialEq, Eq, Hash, PartialOrd, Ord, Clone, Copy, Debug, Default)]
pub struct Cell {
    pub x: i32,
    pub y: i32,
}

impl Cell {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub const fn origin() -> Self {
        Self { x: 0, y: 0 }
    }
}

impl Add<Offset> for Cell {
    type Output = Cell;

    fn add(self, rhs: Offset) -> Self::Output {
        Cell {
            x: self.x + rhs.dx,
            y: self.y + rhs.dy,
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{})", self.x, self.y)
    }
}
