use crate::config::types::Config;
use crate::mapper::map_point;
use crate::migrate::summary::{RunSummary, SeriesOutcome, SeriesStatus};
use crate::model::{RunMetadata, SeriesDescriptor};
use crate::sink::{BatchWriter, DocumentSink, RetryPolicy};
use crate::source::{CatalogError, SeriesCatalog, SeriesReader, SeriesStore};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tokio::sync::watch;
use tracing::{info, warn};
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum MigrateError {
    /// Fatal: no series list means no work. Surfaced to the caller unmodified.
    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

/// Options distilled from [`Config`] that the orchestrator needs per run.
#[derive(Debug, Clone)]
pub struct MigrateOptions {
    pub meta: RunMetadata,
    pub excluded: HashSet<String>,
    pub page_size: u64,
    pub batch_capacity: usize,
    pub retry: RetryPolicy,
}

impl MigrateOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            meta: RunMetadata {
                machine_type: config.run.machine_type.clone(),
                machine_id: config.run.machine_id,
                // Range validated at config load time
                start_timestamp: config
                    .run
                    .start_timestamp
                    .timestamp_nanos_opt()
                    .unwrap_or(i64::MIN),
            },
            excluded: config.run.exclude_series.iter().cloned().collect(),
            page_size: config.source.page_size,
            batch_capacity: config.batch.size,
            retry: RetryPolicy::from(&config.batch),
        }
    }
}

/// Drives one migration run: discovery, then reader → mapper → writer per
/// series, then a structured summary.
///
/// A single series' failure never aborts the run; only a catalog failure is
/// fatal.
pub struct Migrator {
    store: Arc<dyn SeriesStore>,
    sink: Arc<dyn DocumentSink>,
    options: MigrateOptions,
}

impl Migrator {
    pub fn new(
        store: Arc<dyn SeriesStore>,
        sink: Arc<dyn DocumentSink>,
        options: MigrateOptions,
    ) -> Self {
        Self {
            store,
            sink,
            options,
        }
    }

    pub async fn run(
        &self,
        shutdown: watch::Receiver<bool>,
    ) -> Result<RunSummary, MigrateError> {
        let started = Instant::now();
        let run_id = Uuid::new_v4();

        info!(
            %run_id,
            machine_type = %self.options.meta.machine_type,
            machine_id = self.options.meta.machine_id,
            start_timestamp = self.options.meta.start_timestamp,
            "Starting migration run"
        );

        let catalog = SeriesCatalog::new(self.store.clone());
        let series = catalog.list_series(&self.options.excluded).await?;
        info!(count = series.len(), "Discovered series to migrate");

        let mut outcomes = Vec::with_capacity(series.len());
        for descriptor in series {
            if *shutdown.borrow() {
                info!("Shutdown requested, not starting further series");
                break;
            }

            let outcome = self.migrate_series(&descriptor, &shutdown).await;
            match &outcome.status {
                SeriesStatus::Succeeded => info!(
                    series = %outcome.series,
                    written = outcome.written,
                    skipped = outcome.skipped,
                    "Series migrated"
                ),
                SeriesStatus::Failed { error } => warn!(
                    series = %outcome.series,
                    written = outcome.written,
                    error = %error,
                    "Series failed, continuing with next"
                ),
                SeriesStatus::Cancelled => info!(
                    series = %outcome.series,
                    written = outcome.written,
                    "Series cancelled by shutdown"
                ),
            }
            outcomes.push(outcome);
        }

        let summary = RunSummary {
            run_id,
            total_written: outcomes.iter().map(|o| o.written).sum(),
            total_skipped: outcomes.iter().map(|o| o.skipped).sum(),
            series: outcomes,
            elapsed: started.elapsed(),
        };

        info!(
            series = summary.series_attempted(),
            failed = summary.failed_series(),
            written = summary.total_written,
            elapsed = ?summary.elapsed,
            "Migration run complete"
        );

        Ok(summary)
    }

    /// Migrate one series end to end. Errors are folded into the outcome;
    /// this never propagates.
    async fn migrate_series(
        &self,
        descriptor: &SeriesDescriptor,
        shutdown: &watch::Receiver<bool>,
    ) -> SeriesOutcome {
        let mut reader = SeriesReader::new(
            self.store.clone(),
            descriptor.clone(),
            self.options.meta.start_timestamp,
            self.options.page_size,
        );
        let mut writer = BatchWriter::new(
            self.sink.clone(),
            descriptor.name.clone(),
            self.options.batch_capacity,
            self.options.retry.clone(),
        );

        let mut skipped = 0u64;

        loop {
            // Stop issuing new reads and flushes promptly on shutdown;
            // completed flushes stand, the partial buffer is dropped.
            if *shutdown.borrow() {
                return SeriesOutcome {
                    series: descriptor.name.clone(),
                    written: writer.written(),
                    skipped,
                    status: SeriesStatus::Cancelled,
                };
            }

            match reader.next_point().await {
                Ok(Some(point)) => match map_point(&point, &descriptor.name, &self.options.meta)
                {
                    Ok(doc) => {
                        if let Err(e) = writer.write(doc).await {
                            return SeriesOutcome {
                                series: descriptor.name.clone(),
                                written: writer.written(),
                                skipped,
                                status: SeriesStatus::Failed {
                                    error: e.to_string(),
                                },
                            };
                        }
                    }
                    Err(e) => {
                        warn!(series = %descriptor.name, error = %e, "Skipping malformed point");
                        skipped += 1;
                    }
                },
                Ok(None) => break,
                Err(e) => {
                    return SeriesOutcome {
                        series: descriptor.name.clone(),
                        written: writer.written(),
                        skipped,
                        status: SeriesStatus::Failed {
                            error: e.to_string(),
                        },
                    };
                }
            }
        }

        match writer.close().await {
            Ok(()) => SeriesOutcome {
                series: descriptor.name.clone(),
                written: writer.written(),
                skipped,
                status: SeriesStatus::Succeeded,
            },
            Err(e) => SeriesOutcome {
                series: descriptor.name.clone(),
                written: writer.written(),
                skipped,
                status: SeriesStatus::Failed {
                    error: e.to_string(),
                },
            },
        }
    }
}
