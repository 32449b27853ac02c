use gridbots::{
    tracker::{critical_warning, TrackedRobot, TRACKER_MOVE_COST},
    world::Direction,
};
use std::io::{self, BufRead, Write};
use tracing::warn;
use tracing_subscriber::EnvFilter;

const MENU: &str = "=== Main Menu ===\n\
                    1. Move forward\n\
                    2. Move backward\n\
                    3. Move left\n\
                    4. Move right\n\
                    5. Reset position\n\
                    6. Charge battery\n\
                    7. Show status\n\
                    8. Quit\n\
                    Enter your choice (1-8): ";

fn show_menu() {
    print!("\n{MENU}");
    if let Err(e) = io::stdout().flush() {
        warn!("couldn't flush stdout: {}", e);
    }
}

fn print_move(robot: &mut TrackedRobot, direction: Direction) {
    match robot.step(direction) {
        Ok(pos) => {
            println!("New position: {pos}");
            println!("Battery used {TRACKER_MOVE_COST}%, remaining {}%", robot.battery());
        }
        Err(e) => println!("Can't move: {e}. Please charge the robot."),
    }
}

/// One robot, no grid: move, reset, charge and check the battery from a text menu.
fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let mut robot = TrackedRobot::default();
    println!("{robot}");
    show_menu();

    for line in io::stdin().lock().lines() {
        let Ok(line) = line else {
            break;
        };
        match line.trim().parse::<u32>() {
            Ok(choice @ 1..=4) => match Direction::from_choice(choice) {
                // forward is up, backward is down
                Ok(direction) => print_move(&mut robot, direction),
                Err(e) => println!("{e}"),
            },
            Ok(5) => {
                robot.reset();
                println!("Robot reset. {robot}");
            }
            Ok(6) => println!("Battery: {}%", robot.charge()),
            Ok(7) => {
                for line in robot.status() {
                    println!("{line}");
                }
            }
            Ok(8) => break,
            Ok(other) => println!("Invalid choice {other}! Please enter 1-8."),
            Err(_) => println!("Invalid input {:?}! Please enter a number.", line.trim()),
        }
        if robot.is_critical() {
            println!("{}", critical_warning(robot.battery()));
        }
        show_menu();
    }
    println!("Shutting down. Goodbye!");
}
