use serde::{Deserialize, Serialize};
use std::ops::Mul;

/// A displacement between two cells.
#[derive(Deserialize, Serialize, PartialEq, Eq, Clone, Copy, Debug, Default)]
pub struct Offset {
    pub dx: i32,
    pub dy: i32,
}

impl Offset {
    pub const fn new(dx: i32, dy: i32) -> Self {
        Self { dx, dy }
    }
}

impl Mul<i32> for Offset {
    type Output = Self;

    fn mul(self, rhs: i32) -> Self::Output {
        Self {
            dx: self.dx * rhs,
            dy: self.dy * rhs,
        }
    }
}
