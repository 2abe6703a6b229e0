use crate::config::types::BatchConfig;
use crate::model::Document;
use crate::sink::{DocumentSink, SinkError};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WriteError {
    #[error(
        "gave up writing batch of {batch_len} documents for series '{series}' \
         after {attempts} attempts: {source}"
    )]
    RetriesExhausted {
        series: String,
        batch_len: usize,
        attempts: u32,
        #[source]
        source: SinkError,
    },
}

/// Retry schedule for a failed batch flush: exponential backoff doubling from
/// `initial_backoff` up to `max_backoff`, at most `max_attempts` tries.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl From<&BatchConfig> for RetryPolicy {
    fn from(config: &BatchConfig) -> Self {
        Self {
            max_attempts: config.max_retries,
            initial_backoff: config.initial_backoff,
            max_backoff: config.max_backoff,
        }
    }
}

/// Buffers mapped documents and flushes bounded batches to the sink.
///
/// Documents are flushed in arrival order. A failed flush retries the whole
/// batch; a subset is never resubmitted on its own.
pub struct BatchWriter {
    sink: Arc<dyn DocumentSink>,
    /// Series context, carried for error reporting only.
    series: String,
    capacity: usize,
    retry: RetryPolicy,
    buffer: Vec<Document>,
    written: u64,
}

impl BatchWriter {
    pub fn new(
        sink: Arc<dyn DocumentSink>,
        series: String,
        capacity: usize,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            sink,
            series,
            capacity,
            retry,
            buffer: Vec::with_capacity(capacity),
            written: 0,
        }
    }

    /// Documents durably written so far.
    pub fn written(&self) -> u64 {
        self.written
    }

    /// Documents buffered but not yet flushed.
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }

    /// Accumulate one document, flushing synchronously once the buffer
    /// reaches capacity.
    pub async fn write(&mut self, doc: Document) -> Result<(), WriteError> {
        self.buffer.push(doc);
        if self.buffer.len() >= self.capacity {
            self.flush().await?;
        }
        Ok(())
    }

    /// Force a write of any partial batch.
    pub async fn flush(&mut self) -> Result<(), WriteError> {
        if self.buffer.is_empty() {
            return Ok(());
        }

        let mut attempts = 0;
        let mut backoff = self.retry.initial_backoff;

        loop {
            match self.sink.insert_batch(&self.buffer).await {
                Ok(()) => {
                    self.written += self.buffer.len() as u64;
                    tracing::debug!(
                        series = %self.series,
                        count = self.buffer.len(),
                        "Flushed batch"
                    );
                    self.buffer.clear();
                    return Ok(());
                }
                Err(e) => {
                    attempts += 1;
                    if attempts >= self.retry.max_attempts {
                        tracing::error!(
                            series = %self.series,
                            attempts = attempts,
                            batch_len = self.buffer.len(),
                            error = %e,
                            "Batch write retries exhausted"
                        );
                        return Err(WriteError::RetriesExhausted {
                            series: self.series.clone(),
                            batch_len: self.buffer.len(),
                            attempts,
                            source: e,
                        });
                    }

                    tracing::warn!(
                        series = %self.series,
                        attempt = attempts,
                        backoff_ms = backoff.as_millis(),
                        error = %e,
                        "Batch write failed, retrying"
                    );

                    tokio::time::sleep(backoff).await;
                    backoff = std::cmp::min(backoff * 2, self.retry.max_backoff);
                }
            }
        }
    }

    /// Flush remaining documents. The sink connection is released when the
    /// writer (and its sink handle) is dropped.
    pub async fn close(&mut self) -> Result<(), WriteError> {
        self.flush().await
    }
}
