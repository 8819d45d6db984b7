use log::info;
use serde::Serialize;

use crate::config::{ShiftConfig, ShiftQuery};
use crate::error::Result;
use crate::ingest::prepare_validated;
use crate::metrics::Metrics;
use crate::models::{DailySummary, RawRecord, Sample, Track};
use crate::segmenter::segment_validated;
use crate::shifts::summarize_days;
use crate::source::SampleSource;

/// Tracks and their daily rollup for one invocation.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ShiftReport {
    pub tracks: Vec<Track>,
    pub summaries: Vec<DailySummary>,
}

/// Every path below assumes `cfg` already passed `validate`.
fn report_from_samples(
    samples: &[Sample],
    cfg: &ShiftConfig,
    metrics: Option<&Metrics>,
) -> Result<ShiftReport> {
    let seg = segment_validated(samples, cfg)?;
    let summaries = summarize_days(&seg.tracks, cfg)?;

    if let Some(m) = metrics {
        m.samples_total.inc_by(samples.len() as u64);
        m.tracks_total.inc_by(seg.tracks.len() as u64);
        m.tracks_discarded_total.inc_by(seg.discarded as u64);
        m.summaries_total.inc_by(summaries.len() as u64);
        for t in &seg.tracks {
            m.track_duration_seconds.observe(t.duration_seconds() as f64);
        }
    }

    Ok(ShiftReport {
        tracks: seg.tracks,
        summaries,
    })
}

/// Core entry point on samples that are already sorted and unit-converted.
pub fn build_report(samples: &[Sample], cfg: &ShiftConfig) -> Result<ShiftReport> {
    cfg.validate()?;
    report_from_samples(samples, cfg, None)
}

/// Raw rows -> report. `query` of `None` keeps every row that passes the event filter.
pub fn run_records(
    records: &[RawRecord],
    cfg: &ShiftConfig,
    query: Option<&ShiftQuery>,
    metrics: Option<&Metrics>,
) -> Result<ShiftReport> {
    cfg.validate()?;
    records_to_report(records, cfg, query, metrics)
}

fn records_to_report(
    records: &[RawRecord],
    cfg: &ShiftConfig,
    query: Option<&ShiftQuery>,
    metrics: Option<&Metrics>,
) -> Result<ShiftReport> {
    let prepared = prepare_validated(records, cfg, query)?;
    if let Some(m) = metrics {
        m.samples_rejected_total.inc_by(prepared.rejected as u64);
    }
    let report = report_from_samples(&prepared.samples, cfg, metrics)?;
    info!(
        "{} rows -> {} samples -> {} tracks -> {} daily rows",
        records.len(),
        prepared.samples.len(),
        report.tracks.len(),
        report.summaries.len()
    );
    Ok(report)
}

/// Fetches from `source` for `query` and runs the whole pipeline.
pub fn run_shifts(
    source: &dyn SampleSource,
    cfg: &ShiftConfig,
    query: &ShiftQuery,
    metrics: Option<&Metrics>,
) -> Result<ShiftReport> {
    cfg.validate()?;
    let records = source.fetch(query)?;
    records_to_report(&records, cfg, Some(query), metrics)
}
