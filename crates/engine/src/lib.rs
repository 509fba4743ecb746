// crates/engine/src/lib.rs
pub mod config;
pub mod notify;
pub mod run;

use adapters::{SinkWriter, SourceReader};
use common::*;

pub use config::JobConfig;
pub use notify::RunNotifier;
pub use run::{JOB_NAME, JOB_RUN_ID, JobRun};

/// Relays a whole dataset from a source to a sink within one run.
///
/// Stages run strictly in order: read, write, commit. The first failure
/// aborts the run and nothing after it executes.
pub struct BatchRelayJob<R, W> {
    source: R,
    sink: W,
}

impl<R: SourceReader, W: SinkWriter> BatchRelayJob<R, W> {
    pub fn new(source: R, sink: W) -> Self {
        Self { source, sink }
    }

    pub fn source(&self) -> &R {
        &self.source
    }

    pub fn sink(&self) -> &W {
        &self.sink
    }

    /// Read every record of `source`
    pub async fn read_all(&self, run: &mut JobRun, source: &SourceReference) -> Result<Dataset> {
        run.expect_state(RunState::Initialized, "read")?;

        match self.source.read_all(source).await {
            Ok(dataset) => {
                metrics::counter!("relay_records_read_total").increment(dataset.len() as u64);
                tracing::info!(
                    run_id = %run.run_id(),
                    source = %source,
                    records = dataset.len(),
                    "Read stage complete"
                );
                run.record_read(dataset.len());
                Ok(dataset)
            }
            Err(e) => {
                run.abort(&e);
                Err(e)
            }
        }
    }

    /// Write every record of `dataset` to `sink`
    pub async fn write_all(
        &self,
        run: &mut JobRun,
        dataset: &Dataset,
        sink: &SinkReference,
    ) -> Result<WriteReceipt> {
        run.expect_state(RunState::Read, "write")?;

        let receipt = match self.sink.write_all(dataset, sink).await {
            Ok(receipt) => receipt,
            Err(e) => {
                run.abort(&e);
                return Err(e);
            }
        };

        if receipt.records != dataset.len() as u64 {
            let err = Error::SinkWrite(format!(
                "{} accepted {} of {} records",
                receipt.uri,
                receipt.records,
                dataset.len()
            ));
            run.abort(&err);
            return Err(err);
        }

        metrics::counter!("relay_records_written_total").increment(receipt.records);
        metrics::counter!("relay_bytes_written_total").increment(receipt.bytes);
        tracing::info!(
            run_id = %run.run_id(),
            sink = %receipt.uri,
            records = receipt.records,
            bytes = receipt.bytes,
            "Write stage complete"
        );

        run.record_written(&receipt);
        Ok(receipt)
    }

    /// Mark the run committed; see [`JobRun::commit`]
    pub fn commit(&self, run: &mut JobRun) -> Result<RunSummary> {
        let already_committed = run.state() == RunState::Committed;
        let summary = run.commit()?;

        if !already_committed {
            metrics::counter!("relay_runs_total", "outcome" => "committed").increment(1);
            tracing::info!(
                job_name = %summary.job_name,
                run_id = %summary.run_id,
                records = summary.records_written,
                elapsed_ms = summary.elapsed_ms,
                "Job run committed"
            );
        }
        Ok(summary)
    }

    /// Drive `run` through read, write and commit.
    ///
    /// The sink description is checked before anything is read, so a
    /// misconfigured sink performs no I/O at all.
    pub async fn run(
        &self,
        run: &mut JobRun,
        source: &SourceReference,
        sink: &SinkReference,
    ) -> Result<RunSummary> {
        let finished = run.state().is_terminal();
        let result = self.relay(run, source, sink).await;
        if let Err(e) = &result {
            run.abort(e);
            // a run that was already committed or aborted is not counted twice
            if !finished {
                metrics::counter!("relay_runs_total", "outcome" => "aborted").increment(1);
            }
        }
        result
    }

    async fn relay(
        &self,
        run: &mut JobRun,
        source: &SourceReference,
        sink: &SinkReference,
    ) -> Result<RunSummary> {
        self.sink.validate(sink)?;
        let dataset = self.read_all(run, source).await?;
        self.write_all(run, &dataset, sink).await?;
        self.commit(run)
    }
}
