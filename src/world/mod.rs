mod grid;
mod robot;

// EXPORTS
pub use grid::{Grid, DEFAULT_GRID_SIZE, DEFAULT_OBSTACLES};
pub use robot::{
    Direction, MoveError, Robot, RobotKind, RobotSnapshot, FULL_BATTERY, LOW_BATTERY_THRESHOLD,
};
