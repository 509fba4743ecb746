// crates/engine/src/run.rs
use chrono::{DateTime, Utc};
use common::*;
use sha2::{Digest, Sha256};
use std::time::Instant;

/// Required option naming the job
pub const JOB_NAME: &str = "JOB_NAME";

/// Optional option pinning the run id
pub const JOB_RUN_ID: &str = "JOB_RUN_ID";

/// One execution of a relay job.
///
/// Created by [`JobRun::initialize`], advanced by the job stages, and ends
/// exactly once in either `Committed` or `Aborted`.
#[derive(Debug)]
pub struct JobRun {
    job_name: String,
    run_id: String,
    options: JobOptions,
    state: RunState,
    started_at: DateTime<Utc>,
    started: Instant,
    records_read: u64,
    records_written: u64,
    bytes_written: u64,
    sink_uri: Option<String>,
    failure: Option<String>,
    committed: Option<RunSummary>,
}

impl JobRun {
    /// Start a run named `job_name` with the given resolved options
    pub fn initialize(job_name: &str, options: JobOptions) -> Result<Self> {
        let job_name = job_name.trim();
        if job_name.is_empty() {
            return Err(Error::Configuration(format!(
                "missing required job option(s): --{}",
                JOB_NAME
            )));
        }

        let started_at = Utc::now();
        let run_id = match options.non_blank(JOB_RUN_ID) {
            Some(id) => id.to_string(),
            None => derive_run_id(job_name, &started_at),
        };

        tracing::info!(job_name, run_id = %run_id, options = options.len(), "Job run initialized");

        Ok(Self {
            job_name: job_name.to_string(),
            run_id,
            options,
            state: RunState::Initialized,
            started_at,
            started: Instant::now(),
            records_read: 0,
            records_written: 0,
            bytes_written: 0,
            sink_uri: None,
            failure: None,
            committed: None,
        })
    }

    /// Start a run from options that must carry `--JOB_NAME`
    pub fn from_options(options: JobOptions) -> Result<Self> {
        options.resolve(&[JOB_NAME])?;
        let job_name = options.non_blank(JOB_NAME).unwrap_or_default().to_string();
        Self::initialize(&job_name, options)
    }

    pub fn job_name(&self) -> &str {
        &self.job_name
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn options(&self) -> &JobOptions {
        &self.options
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Fail unless the run is in `expected`; a misordered stage aborts the run
    pub(crate) fn expect_state(&mut self, expected: RunState, stage: &str) -> Result<()> {
        if self.state == expected {
            return Ok(());
        }
        let err = Error::Configuration(format!(
            "cannot {} run {}: expected state {}, found {}",
            stage, self.run_id, expected, self.state
        ));
        self.abort(&err);
        Err(err)
    }

    pub(crate) fn record_read(&mut self, records: usize) {
        self.records_read = records as u64;
        self.state = RunState::Read;
    }

    pub(crate) fn record_written(&mut self, receipt: &WriteReceipt) {
        self.records_written = receipt.records;
        self.bytes_written = receipt.bytes;
        self.sink_uri = Some(receipt.uri.clone());
        self.state = RunState::Written;
    }

    /// Mark the run successful.
    ///
    /// Only valid after a successful write. Committing an already committed
    /// run returns the original summary without committing again.
    pub fn commit(&mut self) -> Result<RunSummary> {
        match self.state {
            RunState::Written => {
                self.state = RunState::Committed;
                let summary = self.summary();
                self.committed = Some(summary.clone());
                Ok(summary)
            }
            RunState::Committed => self.committed.clone().ok_or_else(|| {
                Error::Internal(format!("run {} committed without a summary", self.run_id))
            }),
            state => {
                let err = Error::Commit(format!(
                    "run {} has no successful write to commit (state {})",
                    self.run_id, state
                ));
                self.abort(&err);
                Err(err)
            }
        }
    }

    /// Move the run to `Aborted` unless it already finished
    pub fn abort(&mut self, error: &Error) {
        if self.state.is_terminal() {
            return;
        }
        tracing::warn!(
            job_name = %self.job_name,
            run_id = %self.run_id,
            stage = %self.state,
            kind = error.kind(),
            "Job run aborted: {}",
            error
        );
        self.state = RunState::Aborted;
        self.failure = Some(error.to_string());
    }

    pub fn summary(&self) -> RunSummary {
        RunSummary {
            job_name: self.job_name.clone(),
            run_id: self.run_id.clone(),
            state: self.state,
            records_read: self.records_read,
            records_written: self.records_written,
            bytes_written: self.bytes_written,
            sink_uri: self.sink_uri.clone(),
            started_at: self.started_at,
            elapsed_ms: self.started.elapsed().as_millis() as u64,
            error: self.failure.clone(),
        }
    }
}

/// `jr_` followed by the SHA-256 of the job name and start time
fn derive_run_id(job_name: &str, started_at: &DateTime<Utc>) -> String {
    let mut hasher = Sha256::new();
    hasher.update(job_name.as_bytes());
    hasher.update(b"|");
    hasher.update(started_at.timestamp_nanos_opt().unwrap_or(0).to_le_bytes());
    format!("jr_{}", hex::encode(hasher.finalize()))
}
