use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub source: SourceConfig,
    pub destination: DestinationConfig,
    pub run: RunConfig,
    #[serde(default)]
    pub batch: BatchConfig,
}

/// Connection parameters for the source time-series store (InfluxDB v1 HTTP API).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Base URL, e.g. `http://127.0.0.1:8086`
    pub url: String,
    pub database: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    /// Rows fetched per range-query page.
    #[serde(default = "default_page_size")]
    pub page_size: u64,
    #[serde(default = "default_timeout", with = "humantime_serde")]
    pub timeout: Duration,
}

fn default_page_size() -> u64 {
    10_000
}

fn default_timeout() -> Duration {
    Duration::from_secs(30)
}

/// Connection parameters for the destination document store
/// (MongoDB Atlas Data API or a compatible endpoint).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DestinationConfig {
    /// Base URL of the Data API, e.g.
    /// `https://data.mongodb-api.com/app/<app-id>/endpoint/data/v1`
    pub url: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_data_source")]
    pub data_source: String,
    pub database: String,
    #[serde(default = "default_collection")]
    pub collection: String,
    #[serde(default = "default_timeout", with = "humantime_serde")]
    pub timeout: Duration,
}

fn default_data_source() -> String {
    "mongodb-atlas".to_string()
}

fn default_collection() -> String {
    "machineDataCollection".to_string()
}

/// Per-run metadata and series selection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    pub machine_type: String,
    pub machine_id: i64,
    /// Inclusive lower bound for the migration, RFC3339.
    pub start_timestamp: DateTime<Utc>,
    /// Series names skipped entirely (exact match).
    #[serde(default)]
    pub exclude_series: Vec<String>,
}

/// Batch construction and delivery policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchConfig {
    #[serde(default = "default_batch_size")]
    pub size: usize,
    /// Attempts per batch before the series is marked failed.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_initial_backoff", with = "humantime_serde")]
    pub initial_backoff: Duration,
    #[serde(default = "default_max_backoff", with = "humantime_serde")]
    pub max_backoff: Duration,
}

fn default_batch_size() -> usize {
    500
}

fn default_max_retries() -> u32 {
    3
}

fn default_initial_backoff() -> Duration {
    Duration::from_millis(500)
}

fn default_max_backoff() -> Duration {
    Duration::from_secs(30)
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            size: default_batch_size(),
            max_retries: default_max_retries(),
            initial_backoff: default_initial_backoff(),
            max_backoff: default_max_backoff(),
        }
    }
}
