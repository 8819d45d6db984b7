use std::io;

use prometheus::{Encoder, Histogram, HistogramOpts, IntCounter, Registry, TextEncoder};

use crate::error::{Result, TrackError};

const DURATION_BUCKETS: [f64; 8] = [
    60.0, 300.0, 900.0, 1_800.0, 3_600.0, 7_200.0, 14_400.0, 28_800.0,
];

/// Pipeline counters on a private registry. Callers own the instance;
/// nothing is registered globally.
#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    pub samples_total: IntCounter,
    pub samples_rejected_total: IntCounter,
    pub tracks_total: IntCounter,
    pub tracks_discarded_total: IntCounter,
    pub summaries_total: IntCounter,
    pub track_duration_seconds: Histogram,
}

fn counter(registry: &Registry, name: &str, help: &str) -> Result<IntCounter> {
    let c = IntCounter::new(name, help)?;
    registry.register(Box::new(c.clone()))?;
    Ok(c)
}

impl Metrics {
    pub fn new() -> Result<Self> {
        let registry = Registry::new();
        let samples_total = counter(
            &registry,
            "fleettrack_samples_total",
            "Samples fed to segmentation",
        )?;
        let samples_rejected_total = counter(
            &registry,
            "fleettrack_samples_rejected_total",
            "Rows dropped by event, window or device filters",
        )?;
        let tracks_total = counter(&registry, "fleettrack_tracks_total", "Tracks emitted")?;
        let tracks_discarded_total = counter(
            &registry,
            "fleettrack_tracks_discarded_total",
            "Candidate runs dropped as noise",
        )?;
        let summaries_total = counter(
            &registry,
            "fleettrack_summaries_total",
            "Daily summary rows emitted",
        )?;

        let track_duration_seconds = Histogram::with_opts(
            HistogramOpts::new("fleettrack_track_duration_seconds", "Duration of emitted tracks")
                .buckets(DURATION_BUCKETS.to_vec()),
        )?;
        registry.register(Box::new(track_duration_seconds.clone()))?;

        Ok(Self {
            registry,
            samples_total,
            samples_rejected_total,
            tracks_total,
            tracks_discarded_total,
            summaries_total,
            track_duration_seconds,
        })
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Prometheus text exposition of everything in this registry.
    pub fn render(&self) -> Result<String> {
        let mut buf = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buf)?;
        String::from_utf8(buf)
            .map_err(|e| TrackError::Io(io::Error::new(io::ErrorKind::InvalidData, e)))
    }
}
