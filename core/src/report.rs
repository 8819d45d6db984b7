use std::io::Write;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::models::{DailySummary, Track};

/// `H:MM:SS`, hours unbounded (`26:00:05` rather than `1 day, 2:00:05`).
pub fn format_hms(total_secs: i64) -> String {
    let sign = if total_secs < 0 { "-" } else { "" };
    let s = total_secs.unsigned_abs();
    format!("{sign}{}:{:02}:{:02}", s / 3600, (s / 60) % 60, s % 60)
}

/// One line of the track table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackRow {
    pub track_id: String,
    pub device_id: i64,
    pub track_start_time: DateTime<Utc>,
    pub track_end_time: DateTime<Utc>,
    pub track_duration: String,
    pub track_duration_seconds: i64,
    pub average_speed: f64,
    pub max_speed: f64,
    pub min_speed: f64,
    pub start_latitude: Option<f64>,
    pub start_longitude: Option<f64>,
    pub start_altitude: Option<f64>,
    pub end_latitude: Option<f64>,
    pub end_longitude: Option<f64>,
    pub end_altitude: Option<f64>,
    pub sample_count: usize,
}

impl From<&Track> for TrackRow {
    fn from(t: &Track) -> Self {
        let secs = t.duration_seconds();
        Self {
            track_id: t.track_id.clone(),
            device_id: t.device_id,
            track_start_time: t.start_time,
            track_end_time: t.end_time,
            track_duration: format_hms(secs),
            track_duration_seconds: secs,
            average_speed: t.average_speed,
            max_speed: t.max_speed,
            min_speed: t.min_speed,
            start_latitude: t.start_position.latitude,
            start_longitude: t.start_position.longitude,
            start_altitude: t.start_position.altitude,
            end_latitude: t.end_position.latitude,
            end_longitude: t.end_position.longitude,
            end_altitude: t.end_position.altitude,
            sample_count: t.sample_count,
        }
    }
}

/// One line of the daily summary table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryRow {
    pub device_id: i64,
    pub date: NaiveDate,
    pub total_active_duration: String,
    pub average_speed: f64,
    pub max_speed: f64,
    pub activity_window_start: DateTime<Utc>,
    pub activity_window_end: DateTime<Utc>,
}

impl From<&DailySummary> for SummaryRow {
    fn from(d: &DailySummary) -> Self {
        Self {
            device_id: d.device_id,
            date: d.date,
            total_active_duration: format_hms(d.total_active_seconds),
            average_speed: d.average_speed,
            max_speed: d.max_speed,
            activity_window_start: d.activity_window_start,
            activity_window_end: d.activity_window_end,
        }
    }
}

pub fn track_rows(tracks: &[Track]) -> Vec<TrackRow> {
    tracks.iter().map(TrackRow::from).collect()
}

pub fn summary_rows(days: &[DailySummary]) -> Vec<SummaryRow> {
    days.iter().map(SummaryRow::from).collect()
}

fn write_csv<W: Write, R: Serialize>(out: W, rows: &[R]) -> Result<()> {
    let mut w = csv::Writer::from_writer(out);
    for r in rows {
        w.serialize(r)?;
    }
    w.flush()?;
    Ok(())
}

/// Header is written only when there is at least one row.
pub fn write_tracks_csv<W: Write>(out: W, tracks: &[Track]) -> Result<()> {
    write_csv(out, &track_rows(tracks))
}

pub fn write_summaries_csv<W: Write>(out: W, days: &[DailySummary]) -> Result<()> {
    write_csv(out, &summary_rows(days))
}

pub fn tracks_json(tracks: &[Track]) -> Result<String> {
    Ok(serde_json::to_string_pretty(&track_rows(tracks))?)
}

pub fn summaries_json(days: &[DailySummary]) -> Result<String> {
    Ok(serde_json::to_string_pretty(&summary_rows(days))?)
}
