pub mod orchestrator;
pub mod summary;

pub use orchestrator::{MigrateError, MigrateOptions, Migrator};
pub use summary::{RunSummary, SeriesOutcome, SeriesStatus};
