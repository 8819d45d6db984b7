use std::io::Read;
use std::path::PathBuf;

use log::info;

use crate::config::ShiftQuery;
use crate::error::Result;
use crate::ingest::check_columns;
use crate::models::RawRecord;

/// Where sample rows come from (prod: database export, test: in-memory rows).
///
/// A source may push the query down and return only matching rows, but it
/// does not have to: `ingest::prepare` filters again.
pub trait SampleSource {
    fn fetch(&self, query: &ShiftQuery) -> Result<Vec<RawRecord>>;
}

/// Rows held in memory, returned as-is.
#[derive(Debug, Clone, Default)]
pub struct MemorySampleSource {
    pub records: Vec<RawRecord>,
}

impl MemorySampleSource {
    pub fn new(records: Vec<RawRecord>) -> Self {
        Self { records }
    }
}

impl SampleSource for MemorySampleSource {
    fn fetch(&self, _query: &ShiftQuery) -> Result<Vec<RawRecord>> {
        Ok(self.records.clone())
    }
}

/// Reads rows from CSV with a header naming every required column.
/// Extra columns are ignored; empty cells become nulls.
pub fn read_records<R: Read>(rdr: R) -> Result<Vec<RawRecord>> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(rdr);
    check_columns(rdr.headers()?.iter())?;
    let mut out = Vec::new();
    for row in rdr.deserialize() {
        out.push(row?);
    }
    Ok(out)
}

/// CSV export of the tracking table on disk.
#[derive(Debug, Clone)]
pub struct CsvSampleSource {
    path: PathBuf,
}

impl CsvSampleSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl SampleSource for CsvSampleSource {
    fn fetch(&self, _query: &ShiftQuery) -> Result<Vec<RawRecord>> {
        let file = std::fs::File::open(&self.path)?;
        let records = read_records(file)?;
        info!("read {} rows from {}", records.len(), self.path.display());
        Ok(records)
    }
}
