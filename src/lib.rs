pub mod cli;
pub mod config;
pub mod mapper;
pub mod migrate;
pub mod model;
pub mod sink;
pub mod source;

// Re-exports for library consumers
pub use config::{load_config, Config, ConfigError};
pub use migrate::{MigrateError, Migrator, RunSummary, SeriesOutcome, SeriesStatus};
pub use model::{Document, RawPoint, RunMetadata, SeriesDescriptor};
pub use sink::DocumentSink;
pub use source::SeriesStore;
