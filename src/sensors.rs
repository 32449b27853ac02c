//! Sensor log with averages and threshold based anomaly detection.

use serde::Serialize;
use std::{fmt, str::FromStr};
use tracing::{debug, info, warn};

pub const DEFAULT_ANOMALY_THRESHOLD: f64 = 2.0;
/// sensing is refused at or under this battery percentage
const SENSING_MIN_BATTERY: u8 = 10;
const SENSING_COST: u8 = 5;

#[derive(Debug, Clone, PartialEq)]
pub enum SensorError {
    LowBattery { battery: u8 },
    MalformedSample(String),
}

impl fmt::Display for SensorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SensorError::LowBattery { battery } => {
                write!(f, "battery too low for sensing ({battery}%)")
            }
            SensorError::MalformedSample(line) => write!(f, "malformed sample: {line:?}"),
        }
    }
}

impl std::error::Error for SensorError {}

/// Latest reading is too far from the average.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Anomaly {
    pub sensor: String,
    pub unit: String,
    pub latest: f64,
    pub average: f64,
}

impl fmt::Display for Anomaly {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ANOMALY DETECTED in {}: {:.2} {} (avg: {:.2})",
            self.sensor, self.latest, self.unit, self.average
        )
    }
}

#[derive(Debug, Clone)]
pub struct Sensor {
    name: String,
    unit: String,
    readings: Vec<f64>,
}

impl Sensor {
    pub fn new(name: impl Into<String>, unit: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            unit: unit.into(),
            readings: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn unit(&self) -> &str {
        &self.unit
    }

    pub fn add_reading(&mut self, value: f64) {
        self.readings.push(value);
    }

    pub fn readings(&self) -> &[f64] {
        &self.readings
    }

    /// 0.0 when there is no reading yet
    pub fn average(&self) -> f64 {
        if self.readings.is_empty() {
            return 0.0;
        }
        self.readings.iter().sum::<f64>() / self.readings.len() as f64
    }

    pub fn history(&self) -> Vec<String> {
        let mut lines = vec![format!(
            "=== {} History ({} readings) ===",
            self.name,
            self.readings.len()
        )];
        if self.readings.is_empty() {
            lines.push("No data yet.".to_string());
        }
        lines.extend(
            self.readings
                .iter()
                .map(|v| format!("{} : {:.2} {}", self.name, v, self.unit)),
        );
        lines
    }

    /// The latest reading is anomalous when it's above `threshold` times the average,
    /// or under the average divided by `threshold`. Needs at least 2 readings.
    pub fn detect_anomaly(&self, threshold: f64) -> Option<Anomaly> {
        if self.readings.len() < 2 {
            return None;
        }
        let average = self.average();
        let latest = *self.readings.last()?;
        if latest > threshold * average || latest < average / threshold {
            Some(Anomaly {
                sensor: self.name.clone(),
                unit: self.unit.clone(),
                latest,
                average,
            })
        } else {
            None
        }
    }
}

/// One reading for each sensor of a [`SensorSuite`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub temperature: f64,
    pub distance: f64,
    pub light: f64,
    pub weight: f64,
}

impl FromStr for Sample {
    type Err = SensorError;

    /// whitespace separated `temperature distance light weight`
    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let malformed = || SensorError::MalformedSample(line.to_string());
        let values = line
            .split_whitespace()
            .map(str::parse::<f64>)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|_| malformed())?;
        match values[..] {
            [temperature, distance, light, weight] => Ok(Sample {
                temperature,
                distance,
                light,
                weight,
            }),
            _ => Err(malformed()),
        }
    }
}

/// The four sensors of the logger robot, sharing its battery.
#[derive(Debug, Clone)]
pub struct SensorSuite {
    pub temperature: Sensor,
    pub distance: Sensor,
    pub light: Sensor,
    pub weight: Sensor,
    battery: u8,
}

impl Default for SensorSuite {
    fn default() -> Self {
        Self {
            temperature: Sensor::new("Temperature", "°C"),
            distance: Sensor::new("Distance", "cm"),
            light: Sensor::new("Light", "lux"),
            weight: Sensor::new("Weight", "g"),
            battery: 100,
        }
    }
}

impl SensorSuite {
    pub fn battery(&self) -> u8 {
        self.battery
    }

    pub fn sensors(&self) -> [&Sensor; 4] {
        [&self.temperature, &self.distance, &self.light, &self.weight]
    }

    pub fn record(&mut self, sample: Sample) -> Result<(), SensorError> {
        if self.battery <= SENSING_MIN_BATTERY {
            warn!("sensing refused, battery at {}%", self.battery);
            return Err(SensorError::LowBattery {
                battery: self.battery,
            });
        }
        self.temperature.add_reading(sample.temperature);
        self.distance.add_reading(sample.distance);
        self.light.add_reading(sample.light);
        self.weight.add_reading(sample.weight);
        self.battery -= SENSING_COST;
        debug!("recorded {:?}, battery {}%", sample, self.battery);
        Ok(())
    }

    /// Battery report, with a warning once sensing is no longer possible.
    pub fn status(&self) -> Vec<String> {
        let mut lines = vec![
            "--- Robot Status ---".to_string(),
            format!("Battery: {}%", self.battery),
        ];
        if self.battery <= SENSING_MIN_BATTERY {
            lines.push(format!(
                "=== CRITICAL === Battery is {}%! Recharge before sensing again!",
                self.battery
            ));
        }
        lines
    }

    pub fn anomalies(&self, threshold: f64) -> Vec<Anomaly> {
        let anomalies: Vec<Anomaly> = self
            .sensors()
            .iter()
            .filter_map(|s| s.detect_anomaly(threshold))
            .collect();
        for anomaly in &anomalies {
            info!("{}", anomaly);
        }
        anomalies
    }
}
