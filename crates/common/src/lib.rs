// crates/common/src/lib.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

pub mod error;
pub mod location;
pub mod options;

pub use error::{Error, Result};
pub use location::Location;
pub use options::JobOptions;

/// A single schema-opaque record
pub type Record = serde_json::Value;

/// Catalog reference to the dataset a job reads
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceReference {
    pub namespace: String,
    pub table: String,
}

impl SourceReference {
    pub fn new(namespace: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            table: table.into(),
        }
    }
}

impl fmt::Display for SourceReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.namespace, self.table)
    }
}

/// What to do when the sink object already exists
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SaveMode {
    #[default]
    Overwrite,
    ErrorIfExists,
}

/// Destination a job writes to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SinkReference {
    pub uri: String,
    pub format: String,
    #[serde(default)]
    pub partition_keys: Vec<String>,
    #[serde(default)]
    pub mode: SaveMode,
}

impl SinkReference {
    /// Unpartitioned JSON output at `uri`
    pub fn json(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            format: DataFormat::Json.tag().to_string(),
            partition_keys: Vec::new(),
            mode: SaveMode::default(),
        }
    }

    pub fn with_mode(mut self, mode: SaveMode) -> Self {
        self.mode = mode;
        self
    }
}

/// Serialization formats understood by sources and sinks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataFormat {
    Json,
}

impl DataFormat {
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag.trim().to_ascii_lowercase().as_str() {
            "json" => Some(DataFormat::Json),
            _ => None,
        }
    }

    pub fn tag(&self) -> &'static str {
        match self {
            DataFormat::Json => "json",
        }
    }
}

/// Ordered records passed from the read stage to the write stage
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    records: Vec<Record>,
}

impl Dataset {
    pub fn new(records: Vec<Record>) -> Self {
        Self { records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Record> {
        self.records.iter()
    }

    pub fn into_records(self) -> Vec<Record> {
        self.records
    }
}

impl From<Vec<Record>> for Dataset {
    fn from(records: Vec<Record>) -> Self {
        Self::new(records)
    }
}

impl<'a> IntoIterator for &'a Dataset {
    type Item = &'a Record;
    type IntoIter = std::slice::Iter<'a, Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

/// Result of a completed write stage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteReceipt {
    pub uri: String,
    pub records: u64,
    pub bytes: u64,
}

/// Lifecycle of a job run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    Initialized,
    Read,
    Written,
    Committed,
    Aborted,
}

impl RunState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunState::Committed | RunState::Aborted)
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RunState::Initialized => "initialized",
            RunState::Read => "read",
            RunState::Written => "written",
            RunState::Committed => "committed",
            RunState::Aborted => "aborted",
        };
        f.write_str(name)
    }
}

/// Snapshot of a run, reported at commit or abort
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub job_name: String,
    pub run_id: String,
    pub state: RunState,
    pub records_read: u64,
    pub records_written: u64,
    pub bytes_written: u64,
    pub sink_uri: Option<String>,
    pub started_at: DateTime<Utc>,
    pub elapsed_ms: u64,
    pub error: Option<String>,
}
