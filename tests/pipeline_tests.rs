use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;
use tsferry::migrate::{MigrateOptions, Migrator, SeriesStatus};
use tsferry::model::{Document, RawPoint, RunMetadata};
use tsferry::sink::{DocumentSink, RetryPolicy, SinkError};
use tsferry::source::{SeriesStore, SourceError};

/// In-memory source store: named series of (ns, value) points, with paging
/// over a start-time filter and per-series failure injection.
struct MemoryStore {
    series: Vec<(String, Vec<RawPoint>)>,
    catalog_fails: bool,
    failing_series: Option<String>,
    fetched_series: Mutex<Vec<String>>,
}

impl MemoryStore {
    fn new(series: Vec<(&str, Vec<RawPoint>)>) -> Self {
        Self {
            series: series
                .into_iter()
                .map(|(name, points)| (name.to_string(), points))
                .collect(),
            catalog_fails: false,
            failing_series: None,
            fetched_series: Mutex::new(Vec::new()),
        }
    }

    fn points(count: i64) -> Vec<RawPoint> {
        (0..count)
            .map(|i| RawPoint::new(i * 1000, Some(i as f64)))
            .collect()
    }
}

#[async_trait]
impl SeriesStore for MemoryStore {
    async fn list_series(&self) -> Result<Vec<String>, SourceError> {
        if self.catalog_fails {
            return Err(SourceError::Query("metadata query refused".to_string()));
        }
        Ok(self.series.iter().map(|(name, _)| name.clone()).collect())
    }

    async fn fetch_page(
        &self,
        series: &str,
        start_ns: i64,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<RawPoint>, SourceError> {
        self.fetched_series.lock().unwrap().push(series.to_string());

        if self.failing_series.as_deref() == Some(series) {
            return Err(SourceError::Query("connection reset".to_string()));
        }

        let points = self
            .series
            .iter()
            .find(|(name, _)| name == series)
            .map(|(_, points)| points.clone())
            .unwrap_or_default();

        // Unparseable timestamps pass the range filter so the mapper sees them
        let matching: Vec<RawPoint> = points
            .into_iter()
            .filter(|p| p.timestamp.as_i64().map(|ts| ts >= start_ns).unwrap_or(true))
            .collect();

        let start = (offset as usize).min(matching.len());
        let end = (start + limit as usize).min(matching.len());
        Ok(matching[start..end].to_vec())
    }
}

/// Recording sink with an optional per-series failure budget.
struct RecordingSink {
    batches: Mutex<Vec<Vec<Document>>>,
    fail_series: Option<String>,
    fail_times: AtomicU32,
}

impl RecordingSink {
    fn reliable() -> Arc<Self> {
        Arc::new(Self {
            batches: Mutex::new(Vec::new()),
            fail_series: None,
            fail_times: AtomicU32::new(0),
        })
    }

    /// Fail the first `times` batches whose documents belong to `series`.
    fn failing_for(series: &str, times: u32) -> Arc<Self> {
        Arc::new(Self {
            batches: Mutex::new(Vec::new()),
            fail_series: Some(series.to_string()),
            fail_times: AtomicU32::new(times),
        })
    }

    fn documents_for(&self, series: &str) -> Vec<Document> {
        self.batches
            .lock()
            .unwrap()
            .iter()
            .flatten()
            .filter(|d| d.value_type == series)
            .cloned()
            .collect()
    }

    fn batch_sizes(&self) -> Vec<usize> {
        self.batches.lock().unwrap().iter().map(|b| b.len()).collect()
    }
}

#[async_trait]
impl DocumentSink for RecordingSink {
    async fn insert_batch(&self, docs: &[Document]) -> Result<(), SinkError> {
        let hits_failing_series = self
            .fail_series
            .as_ref()
            .map(|series| docs.iter().any(|d| &d.value_type == series))
            .unwrap_or(false);

        if hits_failing_series
            && self
                .fail_times
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok()
        {
            return Err(SinkError::Server {
                status: 503,
                message: "unavailable".to_string(),
            });
        }

        self.batches.lock().unwrap().push(docs.to_vec());
        Ok(())
    }
}

fn options(start_ns: i64, batch_capacity: usize) -> MigrateOptions {
    MigrateOptions {
        meta: RunMetadata {
            machine_type: "CI400".to_string(),
            machine_id: 11682,
            start_timestamp: start_ns,
        },
        excluded: HashSet::new(),
        page_size: 100,
        batch_capacity,
        retry: RetryPolicy {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(1),
            max_backoff: Duration::from_millis(4),
        },
    }
}

fn no_shutdown() -> watch::Receiver<bool> {
    // A dropped sender freezes the value at false
    let (_tx, rx) = watch::channel(false);
    rx
}

#[tokio::test]
async fn test_scenario_three_points_map_to_three_documents() {
    let store = Arc::new(MemoryStore::new(vec![(
        "temp_sensor_1",
        vec![
            RawPoint::new(1000, Some(21.5)),
            RawPoint::new(2000, None),
            RawPoint::new(3000, Some(22.0)),
        ],
    )]));
    let sink = RecordingSink::reliable();

    let migrator = Migrator::new(store, sink.clone(), options(0, 500));
    let summary = migrator.run(no_shutdown()).await.unwrap();

    assert!(summary.fully_succeeded());
    assert_eq!(summary.total_written, 3);

    let docs = sink.documents_for("temp_sensor_1");
    assert_eq!(
        docs[0],
        Document {
            created_at: 1000,
            machine_id: 11682,
            machine_type: "CI400".to_string(),
            value_type: "temp_sensor_1".to_string(),
            values: Some(21.5),
            version: 0,
        }
    );
    assert_eq!(docs[1].created_at, 2000);
    assert_eq!(docs[1].values, None);
    assert_eq!(docs[2].created_at, 3000);
    assert_eq!(docs[2].values, Some(22.0));
}

#[tokio::test]
async fn test_documents_arrive_in_timestamp_order() {
    let store = Arc::new(MemoryStore::new(vec![("s", MemoryStore::points(250))]));
    let sink = RecordingSink::reliable();

    let migrator = Migrator::new(store, sink.clone(), options(0, 64));
    let summary = migrator.run(no_shutdown()).await.unwrap();
    assert_eq!(summary.total_written, 250);

    let timestamps: Vec<i64> = sink
        .documents_for("s")
        .iter()
        .map(|d| d.created_at)
        .collect();
    assert!(timestamps.windows(2).all(|w| w[0] <= w[1]));
}

#[tokio::test]
async fn test_batch_size_invariant() {
    let store = Arc::new(MemoryStore::new(vec![("s", MemoryStore::points(11))]));
    let sink = RecordingSink::reliable();

    let migrator = Migrator::new(store, sink.clone(), options(0, 4));
    migrator.run(no_shutdown()).await.unwrap();

    // Every batch is full except the final remainder: 11 = 4 + 4 + 3
    assert_eq!(sink.batch_sizes(), vec![4, 4, 3]);
}

#[tokio::test]
async fn test_start_timestamp_is_inclusive() {
    let store = Arc::new(MemoryStore::new(vec![(
        "s",
        vec![
            RawPoint::new(1000, Some(1.0)),
            RawPoint::new(2000, Some(2.0)),
            RawPoint::new(3000, Some(3.0)),
        ],
    )]));
    let sink = RecordingSink::reliable();

    let migrator = Migrator::new(store, sink.clone(), options(2000, 500));
    let summary = migrator.run(no_shutdown()).await.unwrap();

    assert_eq!(summary.total_written, 2);
    let timestamps: Vec<i64> = sink
        .documents_for("s")
        .iter()
        .map(|d| d.created_at)
        .collect();
    assert_eq!(timestamps, vec![2000, 3000]);
}

#[tokio::test]
async fn test_start_after_all_points_succeeds_with_zero_written() {
    let store = Arc::new(MemoryStore::new(vec![("s", MemoryStore::points(5))]));
    let sink = RecordingSink::reliable();

    let migrator = Migrator::new(store, sink.clone(), options(1_000_000, 500));
    let summary = migrator.run(no_shutdown()).await.unwrap();

    assert!(summary.fully_succeeded());
    assert_eq!(summary.total_written, 0);
    assert!(matches!(summary.series[0].status, SeriesStatus::Succeeded));
    assert!(sink.batch_sizes().is_empty());
}

#[tokio::test]
async fn test_excluded_series_is_never_read_or_written() {
    let store = Arc::new(MemoryStore::new(vec![
        ("keep", MemoryStore::points(3)),
        ("skip", MemoryStore::points(3)),
    ]));
    let sink = RecordingSink::reliable();

    let mut opts = options(0, 500);
    opts.excluded.insert("skip".to_string());

    let migrator = Migrator::new(store.clone(), sink.clone(), opts);
    let summary = migrator.run(no_shutdown()).await.unwrap();

    assert_eq!(summary.series_attempted(), 1);
    assert_eq!(summary.series[0].series, "keep");
    assert!(!store
        .fetched_series
        .lock()
        .unwrap()
        .contains(&"skip".to_string()));
    assert!(sink.documents_for("skip").is_empty());
}

#[tokio::test]
async fn test_transient_sink_failure_delivers_batch_exactly_once() {
    let store = Arc::new(MemoryStore::new(vec![("s", MemoryStore::points(5))]));
    let sink = RecordingSink::failing_for("s", 2);

    let migrator = Migrator::new(store, sink.clone(), options(0, 500));
    let summary = migrator.run(no_shutdown()).await.unwrap();

    assert!(summary.fully_succeeded());
    assert_eq!(summary.total_written, 5);

    // One durable copy: no duplicates, no losses
    let docs = sink.documents_for("s");
    assert_eq!(docs.len(), 5);
    let timestamps: Vec<i64> = docs.iter().map(|d| d.created_at).collect();
    assert_eq!(timestamps, vec![0, 1000, 2000, 3000, 4000]);
}

#[tokio::test]
async fn test_exhausted_sink_retries_fail_series_but_not_run() {
    let store = Arc::new(MemoryStore::new(vec![
        ("a", MemoryStore::points(2)),
        ("b", MemoryStore::points(2)),
        ("c", MemoryStore::points(2)),
    ]));
    let sink = RecordingSink::failing_for("b", u32::MAX);

    let migrator = Migrator::new(store, sink.clone(), options(0, 500));
    let summary = migrator.run(no_shutdown()).await.unwrap();

    assert!(!summary.fully_succeeded());
    assert_eq!(summary.series_attempted(), 3);
    assert_eq!(summary.failed_series(), 1);
    assert!(matches!(summary.series[0].status, SeriesStatus::Succeeded));
    assert!(matches!(
        summary.series[1].status,
        SeriesStatus::Failed { .. }
    ));
    assert!(matches!(summary.series[2].status, SeriesStatus::Succeeded));

    // The failed series blocked nothing downstream
    assert_eq!(sink.documents_for("c").len(), 2);
    assert_eq!(summary.total_written, 4);
}

#[tokio::test]
async fn test_series_read_error_is_recoverable_per_series() {
    let mut store = MemoryStore::new(vec![
        ("broken", MemoryStore::points(2)),
        ("fine", MemoryStore::points(2)),
    ]);
    store.failing_series = Some("broken".to_string());

    let sink = RecordingSink::reliable();
    let migrator = Migrator::new(Arc::new(store), sink.clone(), options(0, 500));
    let summary = migrator.run(no_shutdown()).await.unwrap();

    assert_eq!(summary.failed_series(), 1);
    assert!(matches!(
        summary.series[0].status,
        SeriesStatus::Failed { .. }
    ));
    assert_eq!(sink.documents_for("fine").len(), 2);
}

#[tokio::test]
async fn test_catalog_failure_is_fatal() {
    let mut store = MemoryStore::new(vec![("s", MemoryStore::points(2))]);
    store.catalog_fails = true;

    let sink = RecordingSink::reliable();
    let migrator = Migrator::new(Arc::new(store), sink, options(0, 500));

    assert!(migrator.run(no_shutdown()).await.is_err());
}

#[tokio::test]
async fn test_malformed_timestamp_is_skipped_and_counted() {
    let store = Arc::new(MemoryStore::new(vec![(
        "s",
        vec![
            RawPoint::new(1000, Some(1.0)),
            RawPoint {
                timestamp: serde_json::Value::String("not-a-timestamp".to_string()),
                value: Some(2.0),
            },
            RawPoint::new(3000, Some(3.0)),
        ],
    )]));
    let sink = RecordingSink::reliable();

    let migrator = Migrator::new(store, sink.clone(), options(0, 500));
    let summary = migrator.run(no_shutdown()).await.unwrap();

    assert!(summary.fully_succeeded());
    assert_eq!(summary.total_written, 2);
    assert_eq!(summary.total_skipped, 1);
    assert_eq!(summary.series[0].skipped, 1);

    let timestamps: Vec<i64> = sink
        .documents_for("s")
        .iter()
        .map(|d| d.created_at)
        .collect();
    assert_eq!(timestamps, vec![1000, 3000]);
}

#[tokio::test]
async fn test_shutdown_before_run_starts_no_series() {
    let store = Arc::new(MemoryStore::new(vec![("s", MemoryStore::points(5))]));
    let sink = RecordingSink::reliable();

    let (tx, rx) = watch::channel(true);
    let migrator = Migrator::new(store, sink.clone(), options(0, 500));
    let summary = migrator.run(rx).await.unwrap();
    drop(tx);

    assert_eq!(summary.series_attempted(), 0);
    assert!(sink.batch_sizes().is_empty());
}
