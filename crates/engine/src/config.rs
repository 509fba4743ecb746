// crates/engine/src/config.rs
use adapters::{StaticCatalog, TableDescriptor};
use common::*;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

/// Option naming the job config file
pub const CONFIG_OPTION: &str = "config";

pub const DEFAULT_CONFIG_PATH: &str = "config/relay.toml";

/// Environment overrides look like `RELAY__SINK__URI`
const ENV_PREFIX: &str = "RELAY";
const ENV_SEPARATOR: &str = "__";

#[derive(Debug, Clone, Deserialize)]
pub struct JobConfig {
    pub source: SourceReference,
    pub sink: SinkReference,
    #[serde(default)]
    pub catalog: HashMap<String, HashMap<String, TableDescriptor>>,
    #[serde(default)]
    pub aws: AwsSection,
    #[serde(default)]
    pub notify: NotifySection,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AwsSection {
    #[serde(default)]
    pub enabled: bool,
    pub region: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NotifySection {
    pub topic_arn: Option<String>,
}

impl JobConfig {
    /// Load a TOML config file, then apply `RELAY__*` environment overrides
    pub fn load(path: &Path) -> Result<Self> {
        let settings = ::config::Config::builder()
            .add_source(::config::File::from(path).format(::config::FileFormat::Toml))
            .add_source(
                ::config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator(ENV_SEPARATOR)
                    .separator(ENV_SEPARATOR),
            )
            .build()
            .map_err(|e| Error::Configuration(format!("Failed to read config {}: {}", path.display(), e)))?;

        let config: JobConfig = settings
            .try_deserialize()
            .map_err(|e| Error::Configuration(format!("Failed to parse config {}: {}", path.display(), e)))?;

        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: JobConfig = toml::from_str(raw)
            .map_err(|e| Error::Configuration(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.source.namespace.trim().is_empty() || self.source.table.trim().is_empty() {
            return Err(Error::Configuration(
                "source needs both a namespace and a table".to_string(),
            ));
        }
        if self.sink.uri.trim().is_empty() {
            return Err(Error::Configuration("sink uri is empty".to_string()));
        }
        Ok(())
    }

    pub fn catalog(&self) -> StaticCatalog {
        StaticCatalog::from_entries(&self.catalog)
    }

    /// Whether any configured location or feature needs AWS clients
    pub fn needs_aws(&self) -> bool {
        let is_s3 = |uri: &str| Location::parse(uri).map(|l| l.is_s3()).unwrap_or(false);

        self.aws.enabled
            || is_s3(&self.sink.uri)
            || self
                .catalog
                .values()
                .flat_map(|tables| tables.values())
                .any(|table| is_s3(&table.location))
    }
}
