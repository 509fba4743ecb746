// crates/adapters/src/catalog.rs
use async_trait::async_trait;
use common::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

fn default_format() -> String {
    DataFormat::Json.tag().to_string()
}

/// Physical location and format of a cataloged table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableDescriptor {
    pub location: String,
    #[serde(default = "default_format")]
    pub format: String,
}

impl TableDescriptor {
    pub fn json(location: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            format: default_format(),
        }
    }
}

/// Registry mapping namespace/table names to tables
#[async_trait]
pub trait Catalog: Send + Sync {
    async fn resolve(&self, source: &SourceReference) -> Result<TableDescriptor>;
}

/// Catalog declared up front in job configuration.
///
/// Names are case-insensitive, matching managed catalogs that store them
/// lowercased.
#[derive(Debug, Clone, Default)]
pub struct StaticCatalog {
    tables: HashMap<(String, String), TableDescriptor>,
}

impl StaticCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from `namespace -> table -> descriptor` maps
    pub fn from_entries(entries: &HashMap<String, HashMap<String, TableDescriptor>>) -> Self {
        let mut catalog = Self::new();
        for (namespace, tables) in entries {
            for (table, descriptor) in tables {
                catalog.insert(namespace, table, descriptor.clone());
            }
        }
        catalog
    }

    pub fn with_table(mut self, namespace: &str, table: &str, descriptor: TableDescriptor) -> Self {
        self.insert(namespace, table, descriptor);
        self
    }

    pub fn insert(&mut self, namespace: &str, table: &str, descriptor: TableDescriptor) {
        self.tables.insert(key(namespace, table), descriptor);
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

fn key(namespace: &str, table: &str) -> (String, String) {
    (namespace.trim().to_lowercase(), table.trim().to_lowercase())
}

#[async_trait]
impl Catalog for StaticCatalog {
    async fn resolve(&self, source: &SourceReference) -> Result<TableDescriptor> {
        self.tables
            .get(&key(&source.namespace, &source.table))
            .cloned()
            .ok_or_else(|| Error::SourceUnavailable(format!("table {} not found in catalog", source)))
    }
}
