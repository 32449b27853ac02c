//! Single robot position and battery tracker.
//!
//! An unbounded plane with no obstacles, one cell per move, and a charger. The robot never
//! sees a [`Grid`](crate::world::Grid), so the only refusal is a low battery.

use std::fmt;
use tracing::{debug, warn};

use crate::{
    math::Cell,
    world::{Direction, MoveError, FULL_BATTERY, LOW_BATTERY_THRESHOLD},
};

pub const TRACKER_MOVE_COST: u8 = 8;
pub const CHARGE_AMOUNT: u8 = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackedRobot {
    pos: Cell,
    battery: u8,
}

impl Default for TrackedRobot {
    fn default() -> Self {
        Self {
            pos: Cell::origin(),
            battery: FULL_BATTERY,
        }
    }
}

impl TrackedRobot {
    pub fn pos(&self) -> Cell {
        self.pos
    }

    pub fn battery(&self) -> u8 {
        self.battery
    }

    /// battery under the move threshold, moves are refused until a charge
    pub fn is_critical(&self) -> bool {
        self.battery < LOW_BATTERY_THRESHOLD
    }

    /// Moves one cell towards `direction` (up is forward), returns the new position.
    pub fn step(&mut self, direction: Direction) -> Result<Cell, MoveError> {
        if self.is_critical() {
            warn!("tracked robot refused to move, battery at {}%", self.battery);
            return Err(MoveError::LowBattery {
                battery: self.battery,
            });
        }
        self.pos = self.pos + direction.offset(1);
        self.battery = self.battery.saturating_sub(TRACKER_MOVE_COST);
        debug!("tracked robot moved to {}, battery {}%", self.pos, self.battery);
        Ok(self.pos)
    }

    /// back to the origin with a full battery
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Adds `CHARGE_AMOUNT` percent, capped at a full battery. Returns the new level.
    pub fn charge(&mut self) -> u8 {
        self.battery = self
            .battery
            .saturating_add(CHARGE_AMOUNT)
            .min(FULL_BATTERY);
        self.battery
    }

    pub fn status(&self) -> Vec<String> {
        let mut lines = vec![
            "--- Robot Status ---".to_string(),
            format!("Position: {}", self.pos),
            format!("Battery: {}%", self.battery),
        ];
        if self.is_critical() {
            lines.push(critical_warning(self.battery));
        }
        lines
    }
}

impl fmt::Display for TrackedRobot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Robot at {} Battery: {}%", self.pos, self.battery)
    }
}

pub fn critical_warning(battery: u8) -> String {
    format!("=== CRITICAL === Battery is {battery}%! Recharge immediately!")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn moves_one_cell_per_step_without_bounds() {
        let mut robot = TrackedRobot::default();
        assert_eq!(robot.step(Direction::Down), Ok(Cell::new(0, -1)));
        assert_eq!(robot.step(Direction::Left), Ok(Cell::new(-1, -1)));
        assert_eq!(robot.battery(), 84);
    }

    #[test]
    fn refuses_to_move_below_ten_percent() {
        let mut robot = TrackedRobot::default();
        for _ in 0..11 {
            robot.step(Direction::Up).expect("battery is still high enough");
        }
        assert_eq!(robot.battery(), 12);
        assert!(!robot.is_critical());
        robot.step(Direction::Up).expect("12% is enough for one more move");
        assert_eq!(robot.battery(), 4);
        assert!(robot.is_critical());

        let before = robot;
        assert_eq!(
            robot.step(Direction::Right),
            Err(MoveError::LowBattery { battery: 4 })
        );
        assert_eq!(robot, before);
        assert_eq!(robot.pos(), Cell::new(0, 12));
    }

    #[test]
    fn charging_is_capped() {
        let mut robot = TrackedRobot::default();
        assert_eq!(robot.charge(), 100);
        robot.step(Direction::Right).expect("battery is full");
        assert_eq!(robot.charge(), 100);
        for _ in 0..12 {
            let _ = robot.step(Direction::Right);
        }
        assert_eq!(robot.battery(), 4);
        assert_eq!(robot.charge(), 24);
        assert!(robot.step(Direction::Left).is_ok());
    }

    #[test]
    fn reset_goes_back_to_origin() {
        let mut robot = TrackedRobot::default();
        robot.step(Direction::Up).expect("battery is full");
        robot.reset();
        assert_eq!(robot, TrackedRobot::default());
        assert_eq!(robot.pos(), Cell::new(0, 0));
        assert_eq!(robot.battery(), 100);
    }

    #[test]
    fn status_warns_when_critical() {
        let mut robot = TrackedRobot::default();
        assert_eq!(
            robot.status(),
            vec!["--- Robot Status ---", "Position: (0,0)", "Battery: 100%"]
        );
        while robot.step(Direction::Up).is_ok() {}
        let status = robot.status();
        assert_eq!(status.len(), 4);
        assert_eq!(status[3], "=== CRITICAL === Battery is 4%! Recharge immediately!");
        assert_eq!(robot.to_string(), "Robot at (0,12) Battery: 4%");
    }
}
