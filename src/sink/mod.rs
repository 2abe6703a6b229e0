pub mod mongo;
pub mod writer;

use crate::model::Document;
use async_trait::async_trait;
use thiserror::Error;

pub use mongo::MongoDataApiSink;
pub use writer::{BatchWriter, RetryPolicy, WriteError};

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("destination returned error status {status}: {message}")]
    Server { status: u16, message: String },
}

/// Bulk-insert boundary to the destination document store.
///
/// One call inserts one batch in order. The contract is all-or-nothing from
/// the caller's perspective: an error means the whole batch must be
/// resubmitted, never a subset.
#[async_trait]
pub trait DocumentSink: Send + Sync {
    async fn insert_batch(&self, docs: &[Document]) -> Result<(), SinkError>;
}
