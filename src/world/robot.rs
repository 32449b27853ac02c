use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, warn};

use super::Grid;
use crate::math::{Cell, Offset};

/// below this battery percentage a robot refuses to move
pub const LOW_BATTERY_THRESHOLD: u8 = 10;
pub const FULL_BATTERY: u8 = 100;

#[derive(Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Debug)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    /// displacement of a move of `stride` cells, up is +y
    pub fn offset(self, stride: i32) -> Offset {
        let unit = match self {
            Direction::Up => Offset::new(0, 1),
            Direction::Down => Offset::new(0, -1),
            Direction::Left => Offset::new(-1, 0),
            Direction::Right => Offset::new(1, 0),
        };
        unit * stride
    }

    /// menu numbering: 1. Up 2. Down 3. Left 4. Right
    pub fn from_choice(choice: u32) -> Result<Self, crate::fleet::SelectionError> {
        match choice {
            1 => Ok(Direction::Up),
            2 => Ok(Direction::Down),
            3 => Ok(Direction::Left),
            4 => Ok(Direction::Right),
            other => Err(crate::fleet::SelectionError::InvalidDirection(other)),
        }
    }
}

/// The robot variants. Everything that differs between them lives in the methods below.
#[derive(Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Debug)]
pub enum RobotKind {
    Wheeled,
    Legged,
    Flying,
}

impl RobotKind {
    /// cells covered by a single move
    pub fn stride(self) -> i32 {
        match self {
            RobotKind::Wheeled | RobotKind::Legged => 1,
            RobotKind::Flying => 3,
        }
    }

    /// battery percentage spent per committed move
    pub fn cost(self) -> u8 {
        match self {
            RobotKind::Wheeled => 5,
            RobotKind::Legged => 10,
            RobotKind::Flying => 18,
        }
    }

    pub fn glyph(self) -> char {
        match self {
            RobotKind::Wheeled => 'W',
            RobotKind::Legged => 'L',
            RobotKind::Flying => 'F',
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            RobotKind::Wheeled => "Wheeled",
            RobotKind::Legged => "Legged",
            RobotKind::Flying => "Flying",
        }
    }

    /// Direction picked by the autonomous policy for a robot of this kind standing on `pos`.
    ///
    /// Legged robots walk right, climb when the next column is blocked or is the last one,
    /// and back off to the left when climbing isn't possible either. None of this is a search:
    /// the chosen move can still be refused.
    pub fn autonomous_direction(self, pos: Cell, grid: &Grid) -> Direction {
        match self {
            RobotKind::Wheeled => Direction::Right,
            RobotKind::Flying => Direction::Up,
            RobotKind::Legged => {
                let right = pos + Direction::Right.offset(1);
                if !grid.is_blocked(right) && right.x < grid.size() - 1 {
                    return Direction::Right;
                }
                let up = pos + Direction::Up.offset(1);
                if grid.is_blocked(up) || up.y >= grid.size() - 1 {
                    Direction::Left
                } else {
                    Direction::Up
                }
            }
        }
    }
}

impl fmt::Display for RobotKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Why a move was refused. A refused move leaves the robot untouched.
#[derive(Serialize, Clone, Copy, PartialEq, Eq, Debug)]
pub enum MoveError {
    LowBattery { battery: u8 },
    OutOfBounds { target: Cell },
    Blocked { target: Cell },
}

impl fmt::Display for MoveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MoveError::LowBattery { battery } => write!(f, "low battery ({battery}%)"),
            MoveError::OutOfBounds { target } => write!(f, "cannot move to {target}, boundary"),
            MoveError::Blocked { target } => write!(f, "blocked by obstacle at {target}"),
        }
    }
}

impl std::error::Error for MoveError {}

#[derive(Clone, Debug)]
pub struct Robot {
    kind: RobotKind,
    name: String,
    pos: Cell,
    battery: u8,
    path: Vec<Cell>,
}

/// Copy of a robot's state, taken in one borrow.
#[derive(Deserialize, Serialize, Clone, PartialEq, Eq, Debug)]
pub struct RobotSnapshot {
    pub kind: RobotKind,
    pub name: String,
    pub glyph: char,
    pub pos: Cell,
    pub battery: u8,
    pub path: Vec<Cell>,
}

impl Robot {
    pub fn new(kind: RobotKind) -> Self {
        Self::at(kind, kind.label(), Cell::origin())
    }

    pub fn flying(name: impl Into<String>) -> Self {
        Self::at(RobotKind::Flying, name, Cell::origin())
    }

    /// Robot with a full battery standing on `pos`. The cell isn't checked against any grid,
    /// see [`crate::fleet::Fleet::push`] for that.
    pub fn at(kind: RobotKind, name: impl Into<String>, pos: Cell) -> Self {
        Self {
            kind,
            name: name.into(),
            pos,
            battery: FULL_BATTERY,
            path: vec![pos],
        }
    }

    pub fn kind(&self) -> RobotKind {
        self.kind
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn pos(&self) -> Cell {
        self.pos
    }

    pub fn battery(&self) -> u8 {
        self.battery
    }

    /// every cell the robot stood on, oldest first
    pub fn path(&self) -> &[Cell] {
        &self.path
    }

    pub fn is_depleted(&self) -> bool {
        self.battery < LOW_BATTERY_THRESHOLD
    }

    /// Moves one stride towards `direction`.
    ///
    /// Returns the new position, or the reason of the refusal. Checks run in order:
    /// battery, bounds, obstacles.
    pub fn step(&mut self, direction: Direction, grid: &Grid) -> Result<Cell, MoveError> {
        if self.is_depleted() {
            warn!(
                "{} refused to move {:?}: battery at {}%",
                self.name, direction, self.battery
            );
            return Err(MoveError::LowBattery {
                battery: self.battery,
            });
        }

        let target = self.pos + direction.offset(self.kind.stride());
        if !grid.in_bounds(target) {
            debug!("{} refused to move to {}: out of bounds", self.name, target);
            return Err(MoveError::OutOfBounds { target });
        }
        if grid.is_blocked(target) {
            debug!("{} refused to move to {}: obstacle", self.name, target);
            return Err(MoveError::Blocked { target });
        }

        self.pos = target;
        // only a flying robot leaving with 10..=17% can go under zero
        self.battery = self.battery.saturating_sub(self.kind.cost());
        self.path.push(target);
        debug!(
            "{} moved {:?} to {} (battery {}%)",
            self.name, direction, target, self.battery
        );
        Ok(target)
    }

    /// One autonomous move, following the kind's policy.
    pub fn update(&mut self, grid: &Grid) -> Result<Cell, MoveError> {
        let direction = self.kind.autonomous_direction(self.pos, grid);
        self.step(direction, grid)
    }

    pub fn status(&self) -> String {
        format!(
            "{} at ({}, {}) Battery: {}%",
            self.name, self.pos.x, self.pos.y, self.battery
        )
    }

    pub fn path_report(&self) -> String {
        self.path
            .iter()
            .map(Cell::to_string)
            .collect::<Vec<_>>()
            .join(" -> ")
    }

    pub fn snapshot(&self) -> RobotSnapshot {
        RobotSnapshot {
            kind: self.kind,
            name: self.name.clone(),
            glyph: self.kind.glyph(),
            pos: self.pos,
            battery: self.battery,
            path: self.path.clone(),
        }
    }
}
