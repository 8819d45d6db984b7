// Python bindings for the dashboard layer. Inputs and outputs are JSON
// strings so the Python side needs nothing beyond `json`.

use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;
use pyo3::wrap_pyfunction;

use crate::config::ShiftConfig;
use crate::error::from_json_str;
use crate::models::RawRecord;
use crate::pipeline::{run_records, ShiftReport};
use crate::report::{summaries_json, tracks_json};

fn run_from_json(samples_json: &str, cfg_json: Option<&str>) -> Result<ShiftReport, String> {
    let cfg: ShiftConfig = match cfg_json {
        Some(s) if !s.trim().is_empty() => from_json_str(s).map_err(|e| format!("config: {e}"))?,
        _ => ShiftConfig::default(),
    };
    let records: Vec<RawRecord> = from_json_str(samples_json).map_err(|e| format!("samples: {e}"))?;
    run_records(&records, &cfg, None, None).map_err(|e| e.to_string())
}

/// `samples_json`: array of rows with `device_id`, `device_time`, `speed`,
/// `latitude`, `longitude`, `altitude`, `event_id`. Returns the track table as JSON.
#[pyfunction]
#[pyo3(signature = (samples_json, cfg_json = None))]
fn segment_tracks_json(samples_json: &str, cfg_json: Option<&str>) -> PyResult<String> {
    let report = run_from_json(samples_json, cfg_json).map_err(PyValueError::new_err)?;
    tracks_json(&report.tracks).map_err(|e| PyValueError::new_err(e.to_string()))
}

/// Same input as `segment_tracks_json`; returns the daily summary table as JSON.
#[pyfunction]
#[pyo3(signature = (samples_json, cfg_json = None))]
fn shift_summary_json(samples_json: &str, cfg_json: Option<&str>) -> PyResult<String> {
    let report = run_from_json(samples_json, cfg_json).map_err(PyValueError::new_err)?;
    summaries_json(&report.summaries).map_err(|e| PyValueError::new_err(e.to_string()))
}

#[pymodule]
fn fleettrack_core(_py: Python, m: &PyModule) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(segment_tracks_json, m)?)?;
    m.add_function(wrap_pyfunction!(shift_summary_json, m)?)?;
    Ok(())
}
