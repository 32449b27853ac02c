use gridbots::{
    fleet::{Event, Fleet, SelectionError, MAX_AUTONOMOUS_STEPS, MAX_GROUP_STEPS},
    world::Direction,
};
use std::io::{self, BufRead, Write};
use tracing::warn;
use tracing_subscriber::EnvFilter;

enum Input {
    Number(u32),
    Invalid(String),
    Eof,
}

fn prompt(lines: &mut impl Iterator<Item = io::Result<String>>, message: &str) -> Input {
    print!("{message}");
    if let Err(e) = io::stdout().flush() {
        warn!("couldn't flush stdout: {}", e);
    }
    match lines.next() {
        Some(Ok(line)) => match line.trim().parse::<u32>() {
            Ok(n) => Input::Number(n),
            Err(_) => Input::Invalid(line),
        },
        Some(Err(_)) | None => Input::Eof,
    }
}

fn print_events(events: &[Event]) {
    for event in events {
        println!("{event}");
        if let Event::Frame(_) = event {
            println!();
        }
    }
}

fn ask_direction(lines: &mut impl Iterator<Item = io::Result<String>>) -> Option<Direction> {
    match prompt(lines, "Choose direction:\n1. Up  2. Down  3. Left  4. Right\n") {
        Input::Number(n) => match Direction::from_choice(n) {
            Ok(direction) => Some(direction),
            Err(e) => {
                println!("{e}");
                None
            }
        },
        Input::Invalid(line) => {
            println!("Invalid input {:?}! Please enter a number.", line.trim());
            None
        }
        Input::Eof => None,
    }
}

fn ask_steps(lines: &mut impl Iterator<Item = io::Result<String>>, max: usize) -> Option<usize> {
    match prompt(lines, &format!("How many simulation steps? (between 1-{max}) ")) {
        Input::Number(n) => Some(n as usize),
        Input::Invalid(line) => {
            println!("Invalid number of steps {:?}! (must be 1-{max})", line.trim());
            None
        }
        Input::Eof => None,
    }
}

fn report(result: Result<Vec<Event>, SelectionError>) {
    match result {
        Ok(events) => print_events(&events),
        Err(e) => println!("{e}"),
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let mut fleet = Fleet::standard();
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        println!("{}\n", fleet.render());
        let choice = prompt(
            &mut lines,
            "=== Robot Simulator Menu ===\n\
             1. Move robot\n\
             2. Move all robots together\n\
             3. Show all status\n\
             4. Autonomous movement (each robot uses own AI)\n\
             5. Quit\n",
        );
        match choice {
            Input::Number(1) => {
                let robot = match prompt(
                    &mut lines,
                    "Choose robot:\n1. Wheeled  2. Legged  3. Flying\n",
                ) {
                    Input::Number(n) => n as usize,
                    Input::Invalid(_) => 0,
                    Input::Eof => break,
                };
                if let Err(e) = fleet.check_index(robot) {
                    println!("{e}");
                    continue;
                }
                if let Some(direction) = ask_direction(&mut lines) {
                    report(fleet.manual_step(robot, direction));
                }
            }
            Input::Number(2) => {
                let Some(steps) = ask_steps(&mut lines, MAX_GROUP_STEPS) else {
                    continue;
                };
                if let Some(direction) = ask_direction(&mut lines) {
                    println!("\nStarting group simulation for {steps} steps...\n");
                    report(fleet.group_step(steps, direction));
                }
            }
            Input::Number(3) => {
                for line in fleet.status_report() {
                    println!("{line}");
                }
            }
            Input::Number(4) => {
                if let Some(steps) = ask_steps(&mut lines, MAX_AUTONOMOUS_STEPS) {
                    println!("\nStarting autonomous simulation for {steps} steps...\n");
                    report(fleet.autonomous_run(steps));
                }
            }
            Input::Number(5) | Input::Eof => break,
            Input::Number(other) => println!("Invalid choice {other}! Please enter 1-5."),
            Input::Invalid(line) => {
                println!("Invalid input {:?}! Please enter a number.", line.trim())
            }
        }
    }
    println!("Goodbye!");
}
