// crates/engine/src/main.rs
use adapters::{CatalogSource, LocalStore, ObjectSink, ObjectStore, S3Store, StoreRouter};
use anyhow::Context;
use common::*;
use engine::config::{CONFIG_OPTION, DEFAULT_CONFIG_PATH};
use engine::*;
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();

    match run_job().await {
        Ok(summary) => {
            tracing::info!(
                "Relay finished in {} ms ({} records)",
                summary.elapsed_ms,
                summary.records_written
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            let code = e.downcast_ref::<Error>().map(Error::exit_code).unwrap_or(1);
            tracing::error!("Relay failed: {:#}", e);
            ExitCode::from(code)
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var("RELAY_LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(false)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .init();
    }
}

async fn run_job() -> anyhow::Result<RunSummary> {
    let options = JobOptions::from_args(std::env::args().skip(1));
    let mut run = JobRun::from_options(options)?;

    let config_path = run
        .options()
        .non_blank(CONFIG_OPTION)
        .unwrap_or(DEFAULT_CONFIG_PATH)
        .to_string();

    let config = match JobConfig::load(Path::new(&config_path)) {
        Ok(config) => config,
        Err(e) => {
            run.abort(&e);
            return Err(e).with_context(|| format!("loading job config {}", config_path));
        }
    };

    // AWS clients are only built when a location or notification needs them
    let aws_config = if config.needs_aws() {
        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest());
        if let Some(region) = config.aws.region.clone() {
            loader = loader.region(aws_config::Region::new(region));
        }
        Some(loader.load().await)
    } else {
        None
    };

    let s3_client = aws_config.as_ref().map(aws_sdk_s3::Client::new);
    let sns_client = aws_config.as_ref().map(aws_sdk_sns::Client::new);

    let mut router = StoreRouter::new(Arc::new(LocalStore::new()));
    if let Some(client) = s3_client {
        router = router.with_s3(Arc::new(S3Store::new(client)));
    }
    let store: Arc<dyn ObjectStore> = Arc::new(router);

    let job = BatchRelayJob::new(
        CatalogSource::new(Arc::new(config.catalog()), store.clone()),
        ObjectSink::new(store),
    );
    let notifier = RunNotifier::new(sns_client, config.notify.topic_arn.clone());

    tracing::info!(
        job_name = %run.job_name(),
        run_id = %run.run_id(),
        source = %config.source,
        sink = %config.sink.uri,
        "Starting relay"
    );

    let result = job.run(&mut run, &config.source, &config.sink).await;
    notifier.publish(&run.summary()).await;

    Ok(result?)
}
