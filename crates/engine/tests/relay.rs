// crates/engine/tests/relay.rs
use adapters::{
    CatalogSource, LocalStore, MemoryStore, ObjectSink, SinkWriter, SourceReader, StaticCatalog,
    TableDescriptor,
};
use async_trait::async_trait;
use common::*;
use engine::{BatchRelayJob, JOB_NAME, JobConfig, JobRun};
use metrics_util::debugging::{DebugValue, DebuggingRecorder, Snapshotter};
use serde_json::json;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Wraps a collaborator and counts calls
struct Counted<T> {
    inner: T,
    calls: AtomicUsize,
}

impl<T> Counted<T> {
    fn new(inner: T) -> Arc<Self> {
        Arc::new(Self {
            inner,
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl<T: SourceReader> SourceReader for Counted<T> {
    async fn read_all(&self, source: &SourceReference) -> Result<Dataset> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.read_all(source).await
    }
}

#[async_trait]
impl<T: SinkWriter> SinkWriter for Counted<T> {
    fn validate(&self, sink: &SinkReference) -> Result<()> {
        self.inner.validate(sink)
    }

    async fn write_all(&self, dataset: &Dataset, sink: &SinkReference) -> Result<WriteReceipt> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.write_all(dataset, sink).await
    }
}

struct Fixture {
    store: Arc<MemoryStore>,
    source: Arc<Counted<CatalogSource>>,
    sink: Arc<Counted<ObjectSink>>,
}

impl Fixture {
    fn new(sink_store: Arc<MemoryStore>) -> Self {
        let store = Arc::new(MemoryStore::new());
        store
            .insert("s3://etl-source/orders.json", "{\"id\":1}\n{\"id\":2}\n")
            .unwrap();

        let catalog = StaticCatalog::new().with_table(
            "etl_db",
            "orders",
            TableDescriptor::json("s3://etl-source/orders.json"),
        );

        Self {
            source: Counted::new(CatalogSource::new(Arc::new(catalog), store.clone())),
            sink: Counted::new(ObjectSink::new(sink_store)),
            store,
        }
    }

    fn job(&self) -> BatchRelayJob<Arc<Counted<CatalogSource>>, Arc<Counted<ObjectSink>>> {
        BatchRelayJob::new(self.source.clone(), self.sink.clone())
    }
}

fn start(name: &str) -> JobRun {
    JobRun::from_options(JobOptions::new().with(JOB_NAME, name)).unwrap()
}

const SINK_URI: &str = "s3://etl-destination/transformed_data.json";

fn block_on<F: Future>(future: F) -> F::Output {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
        .block_on(future)
}

/// Current value of `relay_runs_total{outcome}`
fn runs_total(snapshotter: &Snapshotter, outcome: &str) -> u64 {
    snapshotter
        .snapshot()
        .into_vec()
        .into_iter()
        .filter(|(key, ..)| {
            let key = key.key();
            key.name() == "relay_runs_total"
                && key.labels().any(|l| l.key() == "outcome" && l.value() == outcome)
        })
        .map(|(.., value)| match value {
            DebugValue::Counter(n) => n,
            _ => 0,
        })
        .sum()
}

#[tokio::test]
async fn test_relays_records_unchanged_and_in_order() {
    let sink_store = Arc::new(MemoryStore::new());
    let fixture = Fixture::new(sink_store.clone());
    let mut run = start("orders-relay");

    let summary = fixture
        .job()
        .run(&mut run, &SourceReference::new("etl_db", "orders"), &SinkReference::json(SINK_URI))
        .await
        .unwrap();

    assert_eq!(summary.state, RunState::Committed);
    assert_eq!(summary.records_read, 2);
    assert_eq!(summary.records_written, 2);
    assert_eq!(summary.sink_uri.as_deref(), Some(SINK_URI));

    let written = sink_store.object(SINK_URI).unwrap();
    let records = adapters::codec::decode_json(&written).unwrap();
    assert_eq!(records, vec![json!({"id": 1}), json!({"id": 2})]);
    assert_eq!(sink_store.len(), 1);
}

#[tokio::test]
async fn test_field_order_survives_the_relay() {
    let store = Arc::new(MemoryStore::new());
    let body = "{\"zeta\":1,\"alpha\":{\"y\":2,\"b\":[3,1]}}\n{\"id\":null}\n";
    store.insert("raw/events.json", body).unwrap();
    let catalog = StaticCatalog::new().with_table("logs", "events", TableDescriptor::json("raw/events.json"));

    let job = BatchRelayJob::new(
        CatalogSource::new(Arc::new(catalog), store.clone()),
        ObjectSink::new(store.clone()),
    );
    let mut run = start("events-relay");

    job.run(&mut run, &SourceReference::new("logs", "events"), &SinkReference::json("out/events.json"))
        .await
        .unwrap();

    assert_eq!(store.object("out/events.json").unwrap(), body.as_bytes());
}

#[test]
fn test_missing_job_name_is_a_configuration_error() {
    for args in [vec!["--config", "relay.toml"], vec!["--config", "relay.toml", "--JOB_NAME", " "]] {
        let err = JobRun::from_options(JobOptions::from_args(args)).unwrap_err();

        assert!(matches!(err, Error::Configuration(_)));
        assert!(err.to_string().contains("--JOB_NAME"));
        assert!(!err.to_string().contains("--config"));
    }
}

#[tokio::test]
async fn test_unknown_table_fails_before_any_write() {
    let fixture = Fixture::new(Arc::new(MemoryStore::new()));
    let mut run = start("orders-relay");

    let err = fixture
        .job()
        .run(&mut run, &SourceReference::new("etl_db", "refunds"), &SinkReference::json(SINK_URI))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::SourceUnavailable(_)));
    assert_eq!(fixture.source.calls(), 1);
    assert_eq!(fixture.sink.calls(), 0);
    assert_eq!(run.state(), RunState::Aborted);
}

#[tokio::test]
async fn test_unwritable_sink_is_not_committed() {
    let fixture = Fixture::new(Arc::new(MemoryStore::read_only()));
    let mut run = start("orders-relay");
    let job = fixture.job();

    let err = job
        .run(&mut run, &SourceReference::new("etl_db", "orders"), &SinkReference::json(SINK_URI))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::SinkWrite(_)));
    assert_eq!(run.state(), RunState::Aborted);
    assert!(run.summary().error.is_some());
    assert!(matches!(job.commit(&mut run), Err(Error::Commit(_))));
}

#[tokio::test]
async fn test_unwritable_local_path() {
    let dir = tempfile::tempdir().unwrap();
    let blocker = dir.path().join("blocker");
    std::fs::write(&blocker, "not a directory").unwrap();

    let input = dir.path().join("orders.json");
    std::fs::write(&input, "[{\"id\":1},{\"id\":2}]").unwrap();

    let store = Arc::new(LocalStore::new());
    let catalog = StaticCatalog::new().with_table(
        "etl_db",
        "orders",
        TableDescriptor::json(input.to_string_lossy()),
    );
    let job = BatchRelayJob::new(
        CatalogSource::new(Arc::new(catalog), store.clone()),
        ObjectSink::new(store),
    );
    let mut run = start("orders-relay");

    let target = blocker.join("out.json");
    let err = job
        .run(
            &mut run,
            &SourceReference::new("etl_db", "orders"),
            &SinkReference::json(target.to_string_lossy()),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, Error::SinkWrite(_)));
    assert_eq!(run.state(), RunState::Aborted);
}

#[tokio::test]
async fn test_local_relay_writes_at_the_configured_path() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("in/orders.json");
    std::fs::create_dir_all(input.parent().unwrap()).unwrap();
    std::fs::write(&input, "[{\"id\":1},{\"id\":2}]").unwrap();
    let output = dir.path().join("out/transformed_data.json");

    let config = JobConfig::from_toml_str(&format!(
        r#"
        [source]
        namespace = "etl_db"
        table = "orders"

        [sink]
        uri = "{}"
        format = "json"
        partition_keys = []

        [catalog.etl_db.orders]
        location = "{}"
        "#,
        output.display(),
        input.display()
    ))
    .unwrap();
    assert!(!config.needs_aws());

    let store = Arc::new(LocalStore::new());
    let job = BatchRelayJob::new(
        CatalogSource::new(Arc::new(config.catalog()), store.clone()),
        ObjectSink::new(store),
    );
    let mut run = start("orders-relay");

    job.run(&mut run, &config.source, &config.sink).await.unwrap();

    assert_eq!(std::fs::read_to_string(&output).unwrap(), "{\"id\":1}\n{\"id\":2}\n");
}

#[tokio::test]
async fn test_partitioned_sink_performs_no_io() {
    let fixture = Fixture::new(Arc::new(MemoryStore::new()));
    let mut run = start("orders-relay");
    let mut sink = SinkReference::json(SINK_URI);
    sink.partition_keys = vec!["order_date".to_string()];

    let err = fixture
        .job()
        .run(&mut run, &SourceReference::new("etl_db", "orders"), &sink)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Configuration(_)));
    assert_eq!(fixture.source.calls(), 0);
    assert_eq!(fixture.sink.calls(), 0);
    assert_eq!(fixture.store.len(), 1);
}

#[tokio::test]
async fn test_commit_happens_once() {
    let fixture = Fixture::new(Arc::new(MemoryStore::new()));
    let job = fixture.job();
    let mut run = start("orders-relay");

    let dataset = job.read_all(&mut run, &SourceReference::new("etl_db", "orders")).await.unwrap();
    assert!(matches!(job.commit(&mut run), Err(Error::Commit(_))));
    assert_eq!(run.state(), RunState::Aborted);

    let mut run = start("orders-relay");
    job.read_all(&mut run, &SourceReference::new("etl_db", "orders")).await.unwrap();
    job.write_all(&mut run, &dataset, &SinkReference::json(SINK_URI)).await.unwrap();

    let first = job.commit(&mut run).unwrap();
    let again = job.commit(&mut run).unwrap();
    assert_eq!(first, again);
    assert_eq!(run.state(), RunState::Committed);
}

#[test]
fn test_repeated_commit_is_counted_once() {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();

    metrics::with_local_recorder(&recorder, || {
        block_on(async {
            let fixture = Fixture::new(Arc::new(MemoryStore::new()));
            let job = fixture.job();
            let mut run = start("orders-relay");

            let summary = job
                .run(&mut run, &SourceReference::new("etl_db", "orders"), &SinkReference::json(SINK_URI))
                .await
                .unwrap();
            assert_eq!(runs_total(&snapshotter, "committed"), 1);

            assert_eq!(job.commit(&mut run).unwrap(), summary);
            assert_eq!(job.commit(&mut run).unwrap(), summary);
            assert_eq!(runs_total(&snapshotter, "committed"), 1);
            assert_eq!(runs_total(&snapshotter, "aborted"), 0);
            assert_eq!(fixture.sink.calls(), 1);
        })
    });
}

#[test]
fn test_rerunning_a_finished_run_is_not_counted_again() {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();

    metrics::with_local_recorder(&recorder, || {
        block_on(async {
            let fixture = Fixture::new(Arc::new(MemoryStore::new()));
            let job = fixture.job();
            let source = SourceReference::new("etl_db", "orders");
            let sink = SinkReference::json(SINK_URI);

            let mut committed = start("orders-relay");
            job.run(&mut committed, &source, &sink).await.unwrap();
            let err = job.run(&mut committed, &source, &sink).await.unwrap_err();

            assert!(matches!(err, Error::Configuration(_)));
            assert_eq!(committed.state(), RunState::Committed);
            assert_eq!(runs_total(&snapshotter, "committed"), 1);
            assert_eq!(runs_total(&snapshotter, "aborted"), 0);

            let mut failed = start("orders-relay");
            let missing = SourceReference::new("etl_db", "refunds");
            assert!(job.run(&mut failed, &missing, &sink).await.is_err());
            assert!(job.run(&mut failed, &missing, &sink).await.is_err());

            assert_eq!(failed.state(), RunState::Aborted);
            assert_eq!(runs_total(&snapshotter, "aborted"), 1);
            assert_eq!(fixture.source.calls(), 2);
        })
    });
}
