//! Fleet coordinator.
//!
//! The [`Fleet`] owns the grid and every robot. All the simulation entry points go through it
//! and report what happened as a list of [`Event`]s, which the caller prints however it likes.
//!
//! # Examples
//!
//! ```
//! use gridbots::{fleet::{Event, Fleet}, world::{Direction, Grid, Robot, RobotKind}};
//!
//! let mut fleet = Fleet::new(Grid::default());
//! fleet.push(Robot::new(RobotKind::Wheeled)).expect("origin is free");
//!
//! let events = fleet.manual_step(1, Direction::Up).expect("robot 1 exists");
//! assert!(matches!(events[0], Event::Moved { battery: 95, .. }));
//! assert_eq!(fleet.robots()[0].path().len(), 2);
//! ```

use serde::Serialize;
use std::fmt;
use tracing::debug;

use crate::{
    math::Cell,
    world::{Direction, Grid, MoveError, Robot, RobotKind, RobotSnapshot},
};

/// upper bound of `Fleet::group_step` steps
pub const MAX_GROUP_STEPS: usize = 4;
/// upper bound of `Fleet::autonomous_run` steps
pub const MAX_AUTONOMOUS_STEPS: usize = 9;

const OBSTACLE_GLYPH: char = '#';
const EMPTY_GLYPH: char = '.';

/// Bad input at the coordinator boundary. Nothing is changed when one of these is returned.
#[derive(Serialize, Clone, Copy, PartialEq, Eq, Debug)]
pub enum SelectionError {
    /// 1-based robot index outside of the fleet
    InvalidRobot(usize),
    InvalidDirection(u32),
    InvalidSteps { steps: usize, max: usize },
}

impl fmt::Display for SelectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SelectionError::InvalidRobot(index) => write!(f, "invalid robot: {index}"),
            SelectionError::InvalidDirection(choice) => write!(f, "invalid direction: {choice}"),
            SelectionError::InvalidSteps { steps, max } => {
                write!(f, "invalid number of steps: {steps} (must be 1-{max})")
            }
        }
    }
}

impl std::error::Error for SelectionError {}

/// Narration of a simulation operation. `robot` fields are 1-based, like the selection.
#[derive(Serialize, Clone, PartialEq, Eq, Debug)]
pub enum Event {
    Step {
        number: usize,
    },
    Moved {
        robot: usize,
        name: String,
        to: Cell,
        battery: u8,
    },
    Refused {
        robot: usize,
        name: String,
        reason: MoveError,
    },
    Path {
        robot: usize,
        report: String,
    },
    Frame(String),
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Event::Step { number } => write!(f, "--- Simulation Step {number} ---"),
            Event::Moved {
                name, to, battery, ..
            } => write!(f, "{name} moved to {to}, battery {battery}%"),
            Event::Refused { name, reason, .. } => write!(f, "{name}: {reason}"),
            Event::Path { report, .. } => write!(f, "Path History: {report}"),
            Event::Frame(frame) => f.write_str(frame),
        }
    }
}

/// State of the whole fleet, copied at once.
#[derive(Serialize, Clone, PartialEq, Eq, Debug)]
pub struct FleetSnapshot {
    pub size: i32,
    pub obstacles: Vec<Cell>,
    pub ticks: usize,
    pub robots: Vec<RobotSnapshot>,
}

#[derive(Clone, Debug, Default)]
pub struct Fleet {
    grid: Grid,
    robots: Vec<Robot>,
    ticks: usize,
}

impl Fleet {
    pub fn new(grid: Grid) -> Self {
        Self {
            grid,
            robots: Vec::new(),
            ticks: 0,
        }
    }

    /// default map with a wheeled, a legged and a flying robot, in that order
    pub fn standard() -> Self {
        Self {
            grid: Grid::default(),
            robots: vec![
                Robot::new(RobotKind::Wheeled),
                Robot::new(RobotKind::Legged),
                Robot::flying("FlyingRobot"),
            ],
            ticks: 0,
        }
    }

    /// Adds a robot at the end of the fleet, returns its 1-based index.
    ///
    /// A robot can't join on a cell it wouldn't be allowed to move to.
    pub fn push(&mut self, robot: Robot) -> Result<usize, MoveError> {
        let pos = robot.pos();
        if !self.grid.in_bounds(pos) {
            return Err(MoveError::OutOfBounds { target: pos });
        }
        if self.grid.is_blocked(pos) {
            return Err(MoveError::Blocked { target: pos });
        }
        self.robots.push(robot);
        Ok(self.robots.len())
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn robots(&self) -> &[Robot] {
        &self.robots
    }

    pub fn len(&self) -> usize {
        self.robots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.robots.is_empty()
    }

    /// number of autonomous ticks run so far
    pub fn ticks(&self) -> usize {
        self.ticks
    }

    fn glyph_at(&self, cell: Cell) -> char {
        if self.grid.is_blocked(cell) {
            return OBSTACLE_GLYPH;
        }
        // first robot in fleet order wins the cell
        self.robots
            .iter()
            .find(|r| r.pos() == cell)
            .map_or(EMPTY_GLYPH, |r| r.kind().glyph())
    }

    /// Text snapshot of the grid, top row (max y) first.
    pub fn render(&self) -> String {
        let size = self.grid.size();
        let mut frame = format!("=== Grid World (0 to {}) ===", size - 1);
        for y in (0..size).rev() {
            let row: Vec<String> = (0..size)
                .map(|x| self.glyph_at(Cell::new(x, y)).to_string())
                .collect();
            frame.push('\n');
            frame.push_str(&row.join(" "));
        }
        frame
    }

    fn narrate(index: usize, robot: &Robot, outcome: Result<Cell, MoveError>) -> Event {
        match outcome {
            Ok(to) => Event::Moved {
                robot: index + 1,
                name: robot.name().to_string(),
                to,
                battery: robot.battery(),
            },
            Err(reason) => Event::Refused {
                robot: index + 1,
                name: robot.name().to_string(),
                reason,
            },
        }
    }

    /// Checks a 1-based robot selection, returns the matching 0-based index.
    pub fn check_index(&self, index: usize) -> Result<usize, SelectionError> {
        if index == 0 || index > self.robots.len() {
            return Err(SelectionError::InvalidRobot(index));
        }
        Ok(index - 1)
    }

    /// Moves the `index`-th robot (1-based) once, then reports its path.
    pub fn manual_step(
        &mut self,
        index: usize,
        direction: Direction,
    ) -> Result<Vec<Event>, SelectionError> {
        let i = self.check_index(index)?;
        let robot = &mut self.robots[i];
        let outcome = robot.step(direction, &self.grid);
        Ok(vec![
            Self::narrate(i, robot, outcome),
            Event::Path {
                robot: index,
                report: robot.path_report(),
            },
        ])
    }

    /// Every robot, in fleet order, moves `steps` times towards `direction`.
    /// The grid is rendered each time a robot is done.
    pub fn group_step(
        &mut self,
        steps: usize,
        direction: Direction,
    ) -> Result<Vec<Event>, SelectionError> {
        if !(1..=MAX_GROUP_STEPS).contains(&steps) {
            return Err(SelectionError::InvalidSteps {
                steps,
                max: MAX_GROUP_STEPS,
            });
        }
        let mut events = Vec::new();
        for i in 0..self.robots.len() {
            for number in 1..=steps {
                events.push(Event::Step { number });
                let robot = &mut self.robots[i];
                let outcome = robot.step(direction, &self.grid);
                events.push(Self::narrate(i, robot, outcome));
            }
            events.push(Event::Frame(self.render()));
        }
        Ok(events)
    }

    /// One autonomous tick: every robot updates in fleet order, then one frame is rendered.
    pub fn tick(&mut self) -> Vec<Event> {
        self.ticks += 1;
        debug!("autonomous tick {}", self.ticks);
        let mut events = Vec::with_capacity(self.robots.len() + 1);
        for (i, robot) in self.robots.iter_mut().enumerate() {
            let outcome = robot.update(&self.grid);
            events.push(Self::narrate(i, robot, outcome));
        }
        events.push(Event::Frame(self.render()));
        events
    }

    pub fn autonomous_run(&mut self, steps: usize) -> Result<Vec<Event>, SelectionError> {
        if !(1..=MAX_AUTONOMOUS_STEPS).contains(&steps) {
            return Err(SelectionError::InvalidSteps {
                steps,
                max: MAX_AUTONOMOUS_STEPS,
            });
        }
        let mut events = Vec::new();
        for number in 1..=steps {
            events.push(Event::Step { number });
            events.extend(self.tick());
        }
        Ok(events)
    }

    pub fn status_report(&self) -> Vec<String> {
        self.robots.iter().map(Robot::status).collect()
    }

    pub fn snapshot(&self) -> FleetSnapshot {
        FleetSnapshot {
            size: self.grid.size(),
            obstacles: self.grid.obstacles(),
            ticks: self.ticks,
            robots: self.robots.iter().map(Robot::snapshot).collect(),
        }
    }
}
