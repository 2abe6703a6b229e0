use crate::model::{RawPoint, SeriesDescriptor};
use crate::source::{SeriesStore, SourceError};
use std::collections::VecDeque;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReadError {
    #[error("failed to read series '{series}': {source}")]
    Series {
        series: String,
        #[source]
        source: SourceError,
    },
}

/// Streams time-ordered raw points for one series from a start timestamp,
/// fetching bounded pages from the store on demand.
///
/// The sequence is not restartable: a new reader re-issues the query from
/// `start_ns`, never from where a previous consumer stopped.
pub struct SeriesReader {
    store: Arc<dyn SeriesStore>,
    series: SeriesDescriptor,
    start_ns: i64,
    page_size: u64,

    // Internal state
    page: VecDeque<RawPoint>,
    offset: u64,
    exhausted: bool,
}

impl SeriesReader {
    pub fn new(
        store: Arc<dyn SeriesStore>,
        series: SeriesDescriptor,
        start_ns: i64,
        page_size: u64,
    ) -> Self {
        Self {
            store,
            series,
            start_ns,
            page_size,
            page: VecDeque::new(),
            offset: 0,
            exhausted: false,
        }
    }

    pub fn series_name(&self) -> &str {
        &self.series.name
    }

    /// Next point in ascending timestamp order, or `None` once the series is
    /// exhausted. A series with no matching points yields `None` immediately.
    pub async fn next_point(&mut self) -> Result<Option<RawPoint>, ReadError> {
        if self.page.is_empty() && !self.exhausted {
            self.fetch_next_page().await?;
        }
        Ok(self.page.pop_front())
    }

    async fn fetch_next_page(&mut self) -> Result<(), ReadError> {
        let rows = self
            .store
            .fetch_page(&self.series.name, self.start_ns, self.offset, self.page_size)
            .await
            .map_err(|source| ReadError::Series {
                series: self.series.name.clone(),
                source,
            })?;

        // A short page means the range query has no further rows.
        if (rows.len() as u64) < self.page_size {
            self.exhausted = true;
        }

        self.offset += rows.len() as u64;
        self.page = rows.into();

        tracing::trace!(
            series = %self.series.name,
            buffered = self.page.len(),
            offset = self.offset,
            "Fetched source page"
        );

        Ok(())
    }
}
