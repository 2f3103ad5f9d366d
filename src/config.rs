use crate::control::FlightPhase;
use serde::Deserialize;
use std::time::Duration;
use std::{env, fs};
use strum_macros::Display;

/// Full tunable surface of the race loop.
///
/// Defaults match the practice track setup; `RACE_CONFIG` may name a JSON
/// file overriding any subset of fields.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RaceConfig {
    pub detector: DetectorConfig,
    pub publisher: PublisherConfig,
    pub choreography: ChoreographyConfig,
    pub limits: VelocityLimits,
    /// Control tick frequency in Hz.
    pub tick_rate_hz: u32,
    /// Forward speed held during line following.
    pub cruise_speed: f64,
    /// What to do in `LineFollow` when no steering signal is available.
    pub fallback: FallbackPolicy,
    /// Phase entered after the land choreography finishes.
    pub land_next_phase: FlightPhase,
}

impl RaceConfig {
    /// Loads the configuration from the file named by `RACE_CONFIG`, falling
    /// back to the built-in defaults when the variable is unset.
    pub fn from_env() -> Result<Self, ConfigError> {
        match env::var("RACE_CONFIG") {
            Ok(path) => {
                let raw = fs::read_to_string(&path).map_err(ConfigError::Io)?;
                serde_json::from_str(&raw).map_err(ConfigError::Parse)
            }
            Err(_) => Ok(Self::default()),
        }
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / f64::from(self.tick_rate_hz.max(1)))
    }
}

impl Default for RaceConfig {
    fn default() -> Self {
        Self {
            detector: DetectorConfig::default(),
            publisher: PublisherConfig::default(),
            choreography: ChoreographyConfig::default(),
            limits: VelocityLimits::default(),
            tick_rate_hz: 10,
            cruise_speed: 1.0,
            fallback: FallbackPolicy::HoldLast,
            land_next_phase: FlightPhase::Hover,
        }
    }
}

/// Thresholds of the fixed detection pipeline (inRange -> Canny -> Hough).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Inclusive lower color bound of the track line, per RGB channel.
    pub lower_bound: [u8; 3],
    /// Inclusive upper color bound of the track line, per RGB channel.
    pub upper_bound: [u8; 3],
    /// Canny hysteresis low threshold (L1 gradient magnitude).
    pub canny_low: f32,
    /// Canny hysteresis high threshold (L1 gradient magnitude).
    pub canny_high: f32,
    /// Accumulator votes required before a candidate line is traced.
    pub hough_threshold: u32,
    /// Largest run of non-edge pixels bridged inside one segment.
    pub max_line_gap: u32,
    /// Segments shorter than this are discarded.
    pub min_line_length: f32,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            lower_bound: [72, 72, 72],
            upper_bound: [90, 90, 90],
            canny_low: 75.0,
            canny_high: 150.0,
            hough_threshold: 50,
            max_line_gap: 50,
            min_line_length: 0.0,
        }
    }
}

/// Delivery policy of the command publisher.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PublisherConfig {
    /// Interval between consumer-attach polls for reliable sends, in ms.
    pub connect_poll_interval_ms: u64,
    /// Upper bound on the attach wait; `None` waits forever.
    pub connect_timeout_ms: Option<u64>,
    /// How often an idempotent lifecycle trigger is re-sent.
    pub lifecycle_repeats: u32,
    /// Delay after each lifecycle send, in ms.
    pub lifecycle_delay_ms: u64,
}

impl PublisherConfig {
    pub fn connect_poll_interval(&self) -> Duration {
        Duration::from_millis(self.connect_poll_interval_ms)
    }

    pub fn connect_timeout(&self) -> Option<Duration> {
        self.connect_timeout_ms.map(Duration::from_millis)
    }

    pub fn lifecycle_delay(&self) -> Duration { Duration::from_millis(self.lifecycle_delay_ms) }
}

impl Default for PublisherConfig {
    fn default() -> Self {
        Self {
            connect_poll_interval_ms: 100,
            connect_timeout_ms: None,
            lifecycle_repeats: 3,
            lifecycle_delay_ms: 1000,
        }
    }
}

/// Speeds and timings of the fixed takeoff choreography.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ChoreographyConfig {
    pub ascend_speed: f64,
    pub ascend_secs: f64,
    pub settle_speed: f64,
    pub settle_secs: f64,
    pub pause_secs: f64,
    pub yaw_rate: f64,
    pub yaw_secs: f64,
    pub yaw_settle_secs: f64,
    pub forward_speed: f64,
    pub forward_secs: f64,
}

impl ChoreographyConfig {
    pub fn ascend(&self) -> Duration { Duration::from_secs_f64(self.ascend_secs) }
    pub fn settle(&self) -> Duration { Duration::from_secs_f64(self.settle_secs) }
    pub fn pause(&self) -> Duration { Duration::from_secs_f64(self.pause_secs) }
    pub fn yaw(&self) -> Duration { Duration::from_secs_f64(self.yaw_secs) }
    pub fn yaw_settle(&self) -> Duration { Duration::from_secs_f64(self.yaw_settle_secs) }
    pub fn forward(&self) -> Duration { Duration::from_secs_f64(self.forward_secs) }
}

impl Default for ChoreographyConfig {
    fn default() -> Self {
        Self {
            ascend_speed: 1.2,
            ascend_secs: 0.6,
            settle_speed: -1.0,
            settle_secs: 0.1,
            pause_secs: 0.2,
            yaw_rate: -0.1,
            yaw_secs: 2.8,
            yaw_settle_secs: 0.5,
            forward_speed: 1.0,
            forward_secs: 2.0,
        }
    }
}

/// Saturation envelope applied to every outbound setpoint.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct VelocityLimits {
    pub max_linear: f64,
    pub max_yaw_rate: f64,
}

impl Default for VelocityLimits {
    fn default() -> Self { Self { max_linear: 2.0, max_yaw_rate: 1.0 } }
}

/// `LineFollow` behavior while the track is not visible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Display)]
pub enum FallbackPolicy {
    /// Keep commanding the last setpoint (recommended default).
    HoldLast,
    /// Zero every velocity until the track reappears.
    Stop,
}

#[derive(Debug, Display)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(serde_json::Error),
}

impl std::error::Error for ConfigError {}
