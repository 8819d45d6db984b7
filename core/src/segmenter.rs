//! Track segmentation.
//!
//! Two passes over a `(device_id, timestamp)`-ordered slice:
//! 1. a forward scan with [`BoundaryDetector`] cuts the slice into contiguous
//!    [`Run`]s (index ranges, one per candidate track);
//! 2. each run is summarised, noise runs are dropped and the survivors are
//!    numbered per device.
//!
//! Both passes are linear in the number of samples.

use std::ops::Range;

use chrono::Duration;
use log::debug;
use ordered_float::OrderedFloat;

use crate::config::ShiftConfig;
use crate::error::{Result, TrackError};
use crate::models::{BoundaryReason, Sample, Track};

#[inline]
fn is_moving(speed: Option<f64>, threshold: f64) -> bool {
    matches!(speed, Some(v) if v >= threshold)
}

#[inline]
fn is_idle(speed: Option<f64>, threshold: f64) -> bool {
    matches!(speed, Some(v) if v < threshold)
}

/// Remembers the previous sample and reports where a new track opens.
#[derive(Debug, Clone)]
pub struct BoundaryDetector<'a> {
    cfg: &'a ShiftConfig,
    max_gap: Duration,
    prev: Option<&'a Sample>,
}

impl<'a> BoundaryDetector<'a> {
    pub fn new(cfg: &'a ShiftConfig) -> Result<Self> {
        Ok(Self {
            cfg,
            max_gap: cfg.max_gap()?,
            prev: None,
        })
    }

    /// Boundary rule between two consecutive samples of the same device.
    ///
    /// A null speed is neither moving nor idle, so it never triggers `IdleResume`.
    pub fn boundary(&self, prev: &Sample, curr: &Sample) -> Option<BoundaryReason> {
        let gap = curr.timestamp - prev.timestamp;
        let thr = self.cfg.moving_speed_threshold;

        if gap > self.max_gap {
            Some(BoundaryReason::GapExceeded)
        } else if self.cfg.split_idle_resume_at_gap
            && gap >= self.max_gap
            && is_moving(curr.speed, thr)
            && is_idle(prev.speed, thr)
        {
            Some(BoundaryReason::IdleResume)
        } else {
            None
        }
    }

    /// Feeds the next sample; `Some(reason)` when it starts a new track.
    pub fn observe(&mut self, sample: &'a Sample) -> Option<BoundaryReason> {
        let reason = match self.prev {
            Some(prev) if prev.device_id == sample.device_id => self.boundary(prev, sample),
            _ => Some(BoundaryReason::FirstSample),
        };
        self.prev = Some(sample);
        reason
    }
}

/// A contiguous slice of samples belonging to one candidate track.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Run {
    pub device_id: i64,
    pub range: Range<usize>,
    pub opened_by: BoundaryReason,
}

impl Run {
    pub fn len(&self) -> usize {
        self.range.len()
    }

    pub fn is_empty(&self) -> bool {
        self.range.is_empty()
    }
}

/// Fails on the first sample that breaks `(device_id, timestamp)` order.
pub fn check_order(samples: &[Sample]) -> Result<()> {
    for (i, w) in samples.windows(2).enumerate() {
        if (w[0].device_id, w[0].timestamp) > (w[1].device_id, w[1].timestamp) {
            return Err(TrackError::UnsortedInput {
                device_id: w[1].device_id,
                index: i + 1,
            });
        }
    }
    Ok(())
}

/// First pass: cut the ordered slice into runs. Every sample lands in exactly one run.
pub fn split_runs(samples: &[Sample], cfg: &ShiftConfig) -> Result<Vec<Run>> {
    check_order(samples)?;
    let mut detector = BoundaryDetector::new(cfg)?;
    let mut runs: Vec<Run> = Vec::new();

    for (i, s) in samples.iter().enumerate() {
        if let Some(reason) = detector.observe(s) {
            runs.push(Run {
                device_id: s.device_id,
                range: i..i + 1,
                opened_by: reason,
            });
        } else if let Some(last) = runs.last_mut() {
            last.range.end = i + 1;
        }
    }
    Ok(runs)
}

/// Speed statistics over the non-null speeds of a run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpeedStats {
    pub average: f64,
    pub max: f64,
    pub min: f64,
}

pub fn speed_stats(samples: &[Sample]) -> Option<SpeedStats> {
    let speeds: Vec<f64> = samples.iter().filter_map(|s| s.speed).collect();
    if speeds.is_empty() {
        return None;
    }
    let max = speeds.iter().copied().map(OrderedFloat).max()?.into_inner();
    let min = speeds.iter().copied().map(OrderedFloat).min()?.into_inner();
    let average = speeds.iter().sum::<f64>() / speeds.len() as f64;
    Some(SpeedStats { average, max, min })
}

/// Output of one segmentation pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Segmentation {
    pub tracks: Vec<Track>,
    /// Number of candidate runs before filtering.
    pub candidates: usize,
    /// Runs dropped as noise (`sample_count < 2` or never reaching the threshold).
    pub discarded: usize,
}

fn build_track(samples: &[Sample], run: &Run, track_number: u32, stats: SpeedStats) -> Track {
    let slice = &samples[run.range.clone()];
    let first = &slice[0];
    let last = &slice[slice.len() - 1];
    Track {
        track_id: format!("{}-{}", run.device_id, track_number),
        device_id: run.device_id,
        track_number,
        start_time: first.timestamp,
        end_time: last.timestamp,
        start_position: first.position,
        end_position: last.position,
        average_speed: stats.average,
        max_speed: stats.max,
        min_speed: stats.min,
        sample_count: slice.len(),
        opened_by: run.opened_by,
    }
}

/// Segments ordered samples into numbered tracks.
///
/// Empty input, idle-only devices and single-sample devices all give zero
/// tracks without error. Unordered input fails with `UnsortedInput`.
pub fn segment(samples: &[Sample], cfg: &ShiftConfig) -> Result<Segmentation> {
    cfg.validate()?;
    segment_validated(samples, cfg)
}

/// `segment` for callers that already ran `ShiftConfig::validate`.
pub(crate) fn segment_validated(samples: &[Sample], cfg: &ShiftConfig) -> Result<Segmentation> {
    let runs = split_runs(samples, cfg)?;
    let thr = cfg.moving_speed_threshold;

    let mut out = Segmentation {
        candidates: runs.len(),
        ..Default::default()
    };
    let mut current_device: Option<i64> = None;
    let mut next_number = 1u32;

    for run in &runs {
        if current_device != Some(run.device_id) {
            current_device = Some(run.device_id);
            next_number = 1;
        }
        let stats = speed_stats(&samples[run.range.clone()]);
        match stats {
            Some(stats) if run.len() >= 2 && stats.max >= thr => {
                out.tracks.push(build_track(samples, run, next_number, stats));
                next_number += 1;
            }
            _ => out.discarded += 1,
        }
    }

    debug!(
        "segmented {} samples into {} runs, {} tracks kept",
        samples.len(),
        out.candidates,
        out.tracks.len()
    );
    Ok(out)
}

/// Convenience wrapper returning only the tracks.
pub fn segment_tracks(samples: &[Sample], cfg: &ShiftConfig) -> Result<Vec<Track>> {
    Ok(segment(samples, cfg)?.tracks)
}
