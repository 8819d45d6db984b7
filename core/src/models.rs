use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// One row as delivered by the data source. Every column may be null;
/// `ingest` decides which nulls are fatal.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawRecord {
    pub device_id: Option<i64>,
    pub device_time: Option<String>, // RFC 3339 or "YYYY-MM-DD HH:MM:SS[.f]" (UTC)
    pub speed: Option<f64>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub altitude: Option<f64>,
    pub event_id: Option<i64>,
}

/// Position fix. Components stay optional because trackers report partial fixes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub altitude: Option<f64>,
}

/// One telemetry reading after unit conversion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub device_id: i64,
    pub timestamp: DateTime<Utc>,
    pub speed: Option<f64>, // km/h; None = tracker sent no speed
    #[serde(flatten)]
    pub position: Position,
    #[serde(default)]
    pub event_id: Option<i64>,
}

impl Sample {
    pub fn new(device_id: i64, timestamp: DateTime<Utc>, speed: f64) -> Self {
        Self {
            device_id,
            timestamp,
            speed: Some(speed),
            position: Position::default(),
            event_id: None,
        }
    }

    pub fn at(mut self, latitude: f64, longitude: f64, altitude: f64) -> Self {
        self.position = Position {
            latitude: Some(latitude),
            longitude: Some(longitude),
            altitude: Some(altitude),
        };
        self
    }
}

/// Which boundary rule opened a track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoundaryReason {
    /// First sample seen for the device.
    FirstSample,
    /// Silence longer than `max_gap_seconds`.
    GapExceeded,
    /// Idle -> moving after a pause of exactly `max_gap_seconds`.
    IdleResume,
}

/// A reconstructed movement episode for one device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    pub track_id: String,
    pub device_id: i64,
    pub track_number: u32,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub start_position: Position,
    pub end_position: Position,
    pub average_speed: f64,
    pub max_speed: f64,
    pub min_speed: f64,
    pub sample_count: usize,
    pub opened_by: BoundaryReason,
}

impl Track {
    /// Whole seconds between first and last sample, truncated toward zero.
    pub fn duration_seconds(&self) -> i64 {
        (self.end_time - self.start_time).num_seconds()
    }
}

/// Per-device, per-calendar-day rollup of tracks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailySummary {
    pub device_id: i64,
    pub date: NaiveDate,
    pub total_active_seconds: i64,
    pub average_speed: f64,
    pub max_speed: f64,
    pub activity_window_start: DateTime<Utc>,
    pub activity_window_end: DateTime<Utc>,
    pub track_count: usize,
}
