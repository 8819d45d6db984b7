use std::collections::BTreeMap;

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use log::debug;

use crate::config::ShiftConfig;
use crate::error::Result;
use crate::models::{DailySummary, Track};

/// Calendar date of the track start, seen from `offset`.
pub fn shift_date(track: &Track, offset: &FixedOffset) -> NaiveDate {
    track.start_time.with_timezone(offset).date_naive()
}

#[derive(Debug)]
struct Acc {
    total_secs: i64,
    avg_sum: f64,
    max_speed: f64,
    first_start: DateTime<Utc>,
    last_end: DateTime<Utc>,
    count: usize,
}

impl Acc {
    fn new(t: &Track) -> Self {
        Self {
            total_secs: 0,
            avg_sum: 0.0,
            max_speed: f64::NEG_INFINITY,
            first_start: t.start_time,
            last_end: t.end_time,
            count: 0,
        }
    }

    fn push(&mut self, t: &Track) {
        self.total_secs += t.duration_seconds();
        self.avg_sum += t.average_speed;
        self.max_speed = self.max_speed.max(t.max_speed);
        self.first_start = self.first_start.min(t.start_time);
        self.last_end = self.last_end.max(t.end_time);
        self.count += 1;
    }
}

/// Rolls tracks into one row per `(device_id, date)` that has at least one track.
///
/// `average_speed` is the mean of the per-track averages: every track weighs
/// the same regardless of its length. Rows come out ordered by device then date.
pub fn summarize_days(tracks: &[Track], cfg: &ShiftConfig) -> Result<Vec<DailySummary>> {
    let offset = cfg.day_offset()?;
    let mut groups: BTreeMap<(i64, NaiveDate), Acc> = BTreeMap::new();

    for t in tracks {
        groups
            .entry((t.device_id, shift_date(t, &offset)))
            .or_insert_with(|| Acc::new(t))
            .push(t);
    }

    let rows: Vec<DailySummary> = groups
        .into_iter()
        .map(|((device_id, date), acc)| DailySummary {
            device_id,
            date,
            total_active_seconds: acc.total_secs,
            average_speed: acc.avg_sum / acc.count as f64,
            max_speed: acc.max_speed,
            activity_window_start: acc.first_start,
            activity_window_end: acc.last_end,
            track_count: acc.count,
        })
        .collect();

    debug!("{} tracks rolled into {} daily rows", tracks.len(), rows.len());
    Ok(rows)
}
