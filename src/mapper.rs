use crate::model::{Document, RawPoint, RunMetadata};
use thiserror::Error;

/// Pipeline generation stamped on every document.
pub const DOCUMENT_VERSION: i64 = 0;

#[derive(Debug, Error)]
pub enum MapError {
    /// The source row's timestamp could not be read as a nanosecond epoch.
    /// The orchestrator counts the point as skipped and continues.
    #[error("point in series '{series}' has malformed timestamp {timestamp}")]
    MalformedTimestamp {
        series: String,
        timestamp: serde_json::Value,
    },
}

/// Convert one raw point into a destination document.
///
/// Pure: same inputs always yield the same document. The only failure mode is
/// a timestamp that is not an integer nanosecond epoch (or a string holding
/// one).
pub fn map_point(
    point: &RawPoint,
    series_name: &str,
    meta: &RunMetadata,
) -> Result<Document, MapError> {
    let created_at =
        timestamp_nanos(&point.timestamp).ok_or_else(|| MapError::MalformedTimestamp {
            series: series_name.to_string(),
            timestamp: point.timestamp.clone(),
        })?;

    Ok(Document {
        created_at,
        machine_id: meta.machine_id,
        machine_type: meta.machine_type.clone(),
        value_type: series_name.to_string(),
        values: point.value,
        version: DOCUMENT_VERSION,
    })
}

fn timestamp_nanos(value: &serde_json::Value) -> Option<i64> {
    match value {
        serde_json::Value::Number(n) => n.as_i64(),
        serde_json::Value::String(s) => s.parse().ok(),
        _ => None,
    }
}
