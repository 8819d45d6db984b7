//! Fleet telemetry core: splits per-device position/speed samples into
//! movement tracks and rolls the tracks into daily per-device shift summaries.
//!
//! Batch and side-effect free: every call takes its samples (or a
//! [`SampleSource`]) explicitly and returns fresh values.
//!
//! ```ignore
//! use fleettrack_core::{build_report, ShiftConfig};
//!
//! let report = build_report(&samples, &ShiftConfig::default())?;
//! for day in &report.summaries {
//!     println!("{} {} {}s", day.device_id, day.date, day.total_active_seconds);
//! }
//! ```

pub mod config;
pub mod error;
pub mod ingest;
pub mod metrics;
pub mod models;
pub mod pipeline;
pub mod report;
pub mod segmenter;
pub mod shifts;
pub mod source;
pub mod storage;

#[cfg(feature = "python")]
mod py;

pub use config::{DateRange, ShiftConfig, ShiftQuery, UnitScale};
pub use error::{Result, TrackError};
pub use metrics::Metrics;
pub use models::{BoundaryReason, DailySummary, Position, RawRecord, Sample, Track};
pub use pipeline::{build_report, run_records, run_shifts, ShiftReport};
pub use segmenter::{segment, segment_tracks};
pub use shifts::summarize_days;
pub use source::{CsvSampleSource, MemorySampleSource, SampleSource};
pub use storage::{load_config, save_config};
