use serde::{Deserialize, Serialize};

/// Identifies one source series discovered by the catalog.
///
/// Descriptors are created at discovery time and discarded once the series
/// has been fully migrated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeriesDescriptor {
    pub name: String,
}

impl SeriesDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// One raw observation as delivered by the source store.
///
/// The timestamp is kept as the undecoded JSON scalar from the wire. Decoding
/// to a nanosecond epoch happens in the mapper, so a malformed row becomes a
/// countable per-record skip instead of failing the whole page.
#[derive(Debug, Clone, PartialEq)]
pub struct RawPoint {
    pub timestamp: serde_json::Value,
    /// Observation value; `None` when the source stored null at this time.
    pub value: Option<f64>,
}

impl RawPoint {
    pub fn new(timestamp_ns: i64, value: Option<f64>) -> Self {
        Self {
            timestamp: serde_json::Value::from(timestamp_ns),
            value,
        }
    }
}

/// Static context applied to every document written during one run.
#[derive(Debug, Clone)]
pub struct RunMetadata {
    pub machine_type: String,
    pub machine_id: i64,
    /// Inclusive lower bound for the range query, nanosecond epoch.
    pub start_timestamp: i64,
}

/// One destination record.
///
/// Field order is part of the contract: the destination collection is shared
/// across many producers and every document must serialize as
/// `createdAt, machineId, machineType, valueType, values, version`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    /// Nanosecond epoch of the source observation.
    pub created_at: i64,
    pub machine_id: i64,
    pub machine_type: String,
    /// Name of the series that produced this point.
    pub value_type: String,
    /// Observation value; serializes as JSON null when absent.
    pub values: Option<f64>,
    pub version: i64,
}
