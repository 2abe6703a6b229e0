use serde::Serialize;
use std::time::Duration;
use uuid::Uuid;

/// Structured result of one migration run, suitable for programmatic
/// success/failure checks by the caller.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub run_id: Uuid,
    /// Per-series outcomes in migration order.
    pub series: Vec<SeriesOutcome>,
    pub total_written: u64,
    /// Points dropped for malformed timestamps across all series.
    pub total_skipped: u64,
    #[serde(with = "humantime_serde")]
    pub elapsed: Duration,
}

impl RunSummary {
    pub fn series_attempted(&self) -> usize {
        self.series.len()
    }

    pub fn failed_series(&self) -> usize {
        self.series
            .iter()
            .filter(|s| !matches!(s.status, SeriesStatus::Succeeded))
            .count()
    }

    pub fn fully_succeeded(&self) -> bool {
        self.failed_series() == 0
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SeriesOutcome {
    pub series: String,
    /// Documents durably written for this series.
    pub written: u64,
    /// Points skipped for malformed timestamps.
    pub skipped: u64,
    pub status: SeriesStatus,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum SeriesStatus {
    Succeeded,
    Failed { error: String },
    /// Run shutdown arrived while this series was in flight; buffered
    /// documents were dropped, completed flushes stand.
    Cancelled,
}
