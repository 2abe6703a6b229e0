pub mod catalog;
pub mod influx;
pub mod reader;

use crate::model::RawPoint;
use async_trait::async_trait;
use thiserror::Error;

pub use catalog::{CatalogError, SeriesCatalog};
pub use influx::InfluxSource;
pub use reader::{ReadError, SeriesReader};

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("source returned error status {status}: {message}")]
    Server { status: u16, message: String },

    #[error("query failed: {0}")]
    Query(String),

    #[error("unexpected response shape: {0}")]
    Malformed(String),
}

/// Client-side view of the source time-series store.
///
/// Implementations must return rows ordered ascending by timestamp and treat
/// `start_ns` as an inclusive lower bound.
#[async_trait]
pub trait SeriesStore: Send + Sync {
    /// All series names known to the store, in discovery order.
    async fn list_series(&self) -> Result<Vec<String>, SourceError>;

    /// One page of points for `series` at or after `start_ns`.
    /// `offset` counts rows already consumed by earlier pages of the same
    /// query; a page shorter than `limit` means the series is exhausted.
    async fn fetch_page(
        &self,
        series: &str,
        start_ns: i64,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<RawPoint>, SourceError>;
}
