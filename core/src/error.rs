use thiserror::Error;

/// Everything the core can fail with. Empty results are never errors.
#[derive(Debug, Error)]
pub enum TrackError {
    #[error("missing required column `{column}`")]
    MissingColumn { column: String },

    #[error("row {row}: no value for `{field}` (device {device_id:?})")]
    MissingField {
        row: usize,
        device_id: Option<i64>,
        field: &'static str,
    },

    #[error("row {row}: cannot parse timestamp {value:?}")]
    InvalidTimestamp { row: usize, value: String },

    #[error("row {row}: non-finite `{field}` for device {device_id}")]
    NonFinite {
        row: usize,
        device_id: i64,
        field: &'static str,
    },

    #[error("device {device_id}: samples not in (device_id, timestamp) order at index {index}")]
    UnsortedInput { device_id: i64, index: usize },

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("json decode failed at `{path}`: {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    JsonEncode(#[from] serde_json::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Metrics(#[from] prometheus::Error),
}

impl From<serde_path_to_error::Error<serde_json::Error>> for TrackError {
    fn from(err: serde_path_to_error::Error<serde_json::Error>) -> Self {
        TrackError::Json {
            path: err.path().to_string(),
            source: err.into_inner(),
        }
    }
}

pub type Result<T> = std::result::Result<T, TrackError>;

/// Decode JSON while keeping the path of the offending field.
pub fn from_json_str<T>(s: &str) -> Result<T>
where
    T: serde::de::DeserializeOwned,
{
    let de = &mut serde_json::Deserializer::from_str(s);
    Ok(serde_path_to_error::deserialize(de)?)
}
