//! Raw source rows -> validated, unit-converted, sorted samples.
//!
//! Fatal: rows without device id or timestamp, unparseable timestamps,
//! non-finite numbers. Tolerated (logged): null speed, duplicate timestamps.
//! Filtered (counted): foreign event ids, rows outside the query.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use log::{debug, warn};

use crate::config::{ShiftConfig, ShiftQuery};
use crate::error::{Result, TrackError};
use crate::models::{Position, RawRecord, Sample};

/// Column names every source must deliver.
pub const REQUIRED_COLUMNS: [&str; 7] = [
    "device_id",
    "device_time",
    "speed",
    "latitude",
    "longitude",
    "altitude",
    "event_id",
];

const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];

#[derive(Debug, Clone, Default)]
pub struct Prepared {
    pub samples: Vec<Sample>,
    /// Rows dropped by the event/window/device filters.
    pub rejected: usize,
    pub null_speed: usize,
    pub duplicate_timestamps: usize,
}

/// Fails with `MissingColumn` for the first required column absent from `header`.
pub fn check_columns<'a, I>(header: I) -> Result<()>
where
    I: IntoIterator<Item = &'a str>,
{
    let present: Vec<&str> = header.into_iter().map(str::trim).collect();
    for col in REQUIRED_COLUMNS {
        if !present.contains(&col) {
            return Err(TrackError::MissingColumn {
                column: col.to_string(),
            });
        }
    }
    Ok(())
}

/// Accepts RFC 3339, or a naive `YYYY-MM-DD HH:MM:SS[.f]` taken as UTC,
/// optionally followed by a numeric offset (`+00`, `+0200`).
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(t) = DateTime::parse_from_rfc3339(value) {
        return Some(t.with_timezone(&Utc));
    }
    if let Ok(t) = DateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S%.f%#z") {
        return Some(t.with_timezone(&Utc));
    }
    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .map(|naive| Utc.from_utc_datetime(&naive))
}

/// Window bound as typed by a user: any `parse_timestamp` shape, or a bare
/// `YYYY-MM-DD` meaning midnight UTC.
pub fn parse_instant(value: &str) -> Option<DateTime<Utc>> {
    if let Some(t) = parse_timestamp(value) {
        return Some(t);
    }
    let day = NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").ok()?;
    Some(Utc.from_utc_datetime(&day.and_hms_opt(0, 0, 0)?))
}

fn scaled(
    value: Option<f64>,
    divisor: f64,
    row: usize,
    device_id: i64,
    field: &'static str,
) -> Result<Option<f64>> {
    match value {
        Some(v) if !v.is_finite() => Err(TrackError::NonFinite {
            row,
            device_id,
            field,
        }),
        Some(v) => Ok(Some(v / divisor)),
        None => Ok(None),
    }
}

/// Converts one row. `row` is the 0-based position in the source, used in errors.
pub fn to_sample(record: &RawRecord, row: usize, cfg: &ShiftConfig) -> Result<Sample> {
    let device_id = record.device_id.ok_or(TrackError::MissingField {
        row,
        device_id: None,
        field: "device_id",
    })?;
    let raw_time = record
        .device_time
        .as_deref()
        .filter(|s| !s.trim().is_empty())
        .ok_or(TrackError::MissingField {
            row,
            device_id: Some(device_id),
            field: "device_time",
        })?;
    let timestamp = parse_timestamp(raw_time).ok_or_else(|| TrackError::InvalidTimestamp {
        row,
        value: raw_time.to_string(),
    })?;

    let units = cfg.units;
    let pos = |v: Option<f64>, field: &'static str| {
        scaled(v, units.position_divisor, row, device_id, field)
    };
    let speed = scaled(record.speed, units.speed_divisor, row, device_id, "speed")?;
    if matches!(speed, Some(v) if v < 0.0) {
        warn!("row {row}: device {device_id} reports negative speed {speed:?}");
    }

    Ok(Sample {
        device_id,
        timestamp,
        speed,
        position: Position {
            latitude: pos(record.latitude, "latitude")?,
            longitude: pos(record.longitude, "longitude")?,
            altitude: pos(record.altitude, "altitude")?,
        },
        event_id: record.event_id,
    })
}

/// Validates, filters and stably sorts rows by `(device_id, timestamp)`.
/// Ties keep their source order.
pub fn prepare(
    records: &[RawRecord],
    cfg: &ShiftConfig,
    query: Option<&ShiftQuery>,
) -> Result<Prepared> {
    cfg.validate()?;
    prepare_validated(records, cfg, query)
}

/// `prepare` for callers that already ran `ShiftConfig::validate`.
pub(crate) fn prepare_validated(
    records: &[RawRecord],
    cfg: &ShiftConfig,
    query: Option<&ShiftQuery>,
) -> Result<Prepared> {
    let mut out = Prepared::default();
    out.samples.reserve(records.len());

    for (row, record) in records.iter().enumerate() {
        let sample = to_sample(record, row, cfg)?;
        let wanted = cfg.accepts_event(sample.event_id)
            && query.map_or(true, |q| q.matches(sample.device_id, sample.timestamp));
        if !wanted {
            out.rejected += 1;
            continue;
        }
        if sample.speed.is_none() {
            out.null_speed += 1;
        }
        out.samples.push(sample);
    }

    out.samples.sort_by_key(|s| (s.device_id, s.timestamp));

    out.duplicate_timestamps = out
        .samples
        .windows(2)
        .filter(|w| w[0].device_id == w[1].device_id && w[0].timestamp == w[1].timestamp)
        .count();

    if out.null_speed > 0 {
        warn!("{} samples without speed kept as-is", out.null_speed);
    }
    if out.duplicate_timestamps > 0 {
        warn!(
            "{} duplicate (device_id, device_time) pairs kept as separate samples",
            out.duplicate_timestamps
        );
    }
    debug!(
        "prepared {} samples from {} rows ({} filtered out)",
        out.samples.len(),
        records.len(),
        out.rejected
    );
    Ok(out)
}
