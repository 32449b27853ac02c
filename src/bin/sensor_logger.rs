use gridbots::sensors::{Sample, SensorError, SensorSuite, DEFAULT_ANOMALY_THRESHOLD};
use std::io::{self, BufRead};
use tracing::warn;
use tracing_subscriber::EnvFilter;

/// Reads `temperature distance light weight` samples from stdin, one per line.
fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let mut suite = SensorSuite::default();
    for line in io::stdin().lock().lines() {
        let Ok(line) = line else {
            break;
        };
        if line.trim().is_empty() {
            continue;
        }
        match line.parse::<Sample>().and_then(|s| suite.record(s)) {
            Ok(()) => {}
            Err(e @ SensorError::MalformedSample(_)) => {
                warn!("skipping line: {}", e);
                continue;
            }
            Err(e @ SensorError::LowBattery { .. }) => {
                println!("{e}");
                break;
            }
        }
        for anomaly in suite.anomalies(DEFAULT_ANOMALY_THRESHOLD) {
            println!("{anomaly}");
        }
    }

    for sensor in suite.sensors() {
        for line in sensor.history() {
            println!("{line}");
        }
        println!("Average {}: {:.2} {}\n", sensor.name(), sensor.average(), sensor.unit());
    }
    for line in suite.status() {
        println!("{line}");
    }
}
