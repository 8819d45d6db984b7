use chrono::{DateTime, Duration, FixedOffset, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Result, TrackError};

pub const DEFAULT_MOVING_SPEED_KMH: f64 = 3.0;
pub const DEFAULT_MAX_GAP_SECS: i64 = 300;
/// Tracker events that carry a usable position/speed fix.
pub const DEFAULT_EVENT_IDS: [i64; 5] = [2, 802, 803, 804, 811];

/// Divisors applied to raw columns at ingest.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UnitScale {
    pub speed_divisor: f64,
    pub position_divisor: f64,
}

impl UnitScale {
    /// Rows straight from the tracker store: speed in 1/100 km/h, degrees * 1e7.
    pub fn raw_telematics() -> Self {
        Self {
            speed_divisor: 1e2,
            position_divisor: 1e7,
        }
    }
}

impl Default for UnitScale {
    fn default() -> Self {
        Self {
            speed_divisor: 1.0,
            position_divisor: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShiftConfig {
    /// Speed (km/h) at or above which a device counts as moving.
    pub moving_speed_threshold: f64,
    /// Longest silence between two samples of the same track.
    pub max_gap_seconds: i64,
    /// Start a new track on idle -> moving when the pause equals `max_gap_seconds` exactly.
    pub split_idle_resume_at_gap: bool,
    pub units: UnitScale,
    /// Accepted event ids; empty accepts every event.
    pub event_ids: Vec<i64>,
    /// Offset from UTC (minutes) used to cut calendar days for summaries.
    pub day_offset_minutes: i32,
}

impl Default for ShiftConfig {
    fn default() -> Self {
        Self {
            moving_speed_threshold: DEFAULT_MOVING_SPEED_KMH,
            max_gap_seconds: DEFAULT_MAX_GAP_SECS,
            split_idle_resume_at_gap: true,
            units: UnitScale::default(),
            event_ids: DEFAULT_EVENT_IDS.to_vec(),
            day_offset_minutes: 0,
        }
    }
}

impl ShiftConfig {
    pub fn validate(&self) -> Result<()> {
        if !self.moving_speed_threshold.is_finite() || self.moving_speed_threshold < 0.0 {
            return Err(TrackError::InvalidConfig(format!(
                "moving_speed_threshold must be a non-negative number, got {}",
                self.moving_speed_threshold
            )));
        }
        if self.max_gap_seconds < 0 {
            return Err(TrackError::InvalidConfig(format!(
                "max_gap_seconds must be >= 0, got {}",
                self.max_gap_seconds
            )));
        }
        self.max_gap()?;
        for (name, v) in [
            ("units.speed_divisor", self.units.speed_divisor),
            ("units.position_divisor", self.units.position_divisor),
        ] {
            if !v.is_finite() || v <= 0.0 {
                return Err(TrackError::InvalidConfig(format!(
                    "{name} must be a positive number, got {v}"
                )));
            }
        }
        self.day_offset()?;
        Ok(())
    }

    pub fn max_gap(&self) -> Result<Duration> {
        Duration::try_seconds(self.max_gap_seconds).ok_or_else(|| {
            TrackError::InvalidConfig(format!(
                "max_gap_seconds out of range: {}",
                self.max_gap_seconds
            ))
        })
    }

    pub fn day_offset(&self) -> Result<FixedOffset> {
        self.day_offset_minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .ok_or_else(|| {
                TrackError::InvalidConfig(format!(
                    "day_offset_minutes out of range: {}",
                    self.day_offset_minutes
                ))
            })
    }

    pub fn accepts_event(&self, event_id: Option<i64>) -> bool {
        if self.event_ids.is_empty() {
            return true;
        }
        match event_id {
            Some(id) => self.event_ids.contains(&id),
            None => false,
        }
    }
}

/// Half-open `[start, end)` window on `device_time`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DateRange {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self> {
        if end < start {
            return Err(TrackError::InvalidConfig(format!(
                "date range end {end} precedes start {start}"
            )));
        }
        Ok(Self { start, end })
    }

    pub fn last_24h(now: DateTime<Utc>) -> Self {
        Self {
            start: now - Duration::days(1),
            end: now,
        }
    }

    /// Every representable instant except `DateTime::<Utc>::MAX_UTC`.
    pub fn unbounded() -> Self {
        Self {
            start: DateTime::<Utc>::MIN_UTC,
            end: DateTime::<Utc>::MAX_UTC,
        }
    }

    pub fn contains(&self, t: DateTime<Utc>) -> bool {
        t >= self.start && t < self.end
    }
}

/// What the caller asks for: a time window and optionally one device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShiftQuery {
    pub range: DateRange,
    pub device_id: Option<i64>,
}

impl ShiftQuery {
    pub fn last_24h(now: DateTime<Utc>) -> Self {
        Self {
            range: DateRange::last_24h(now),
            device_id: None,
        }
    }

    /// No time bound; only the event filter and `device_id` apply.
    pub fn all_time() -> Self {
        Self {
            range: DateRange::unbounded(),
            device_id: None,
        }
    }

    pub fn for_device(mut self, device_id: i64) -> Self {
        self.device_id = Some(device_id);
        self
    }

    pub fn matches(&self, device_id: i64, t: DateTime<Utc>) -> bool {
        self.range.contains(t) && self.device_id.map_or(true, |d| d == device_id)
    }
}
