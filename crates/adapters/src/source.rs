// crates/adapters/src/source.rs
use crate::catalog::Catalog;
use crate::codec;
use crate::store::ObjectStore;
use crate::SourceReader;
use async_trait::async_trait;
use common::*;
use std::sync::Arc;

/// Reads tables by resolving them through a catalog and fetching the
/// backing object
pub struct CatalogSource {
    catalog: Arc<dyn Catalog>,
    store: Arc<dyn ObjectStore>,
}

impl CatalogSource {
    pub fn new(catalog: Arc<dyn Catalog>, store: Arc<dyn ObjectStore>) -> Self {
        Self { catalog, store }
    }
}

#[async_trait]
impl SourceReader for CatalogSource {
    async fn read_all(&self, source: &SourceReference) -> Result<Dataset> {
        let table = self.catalog.resolve(source).await?;

        let format = DataFormat::from_tag(&table.format).ok_or_else(|| {
            Error::SourceUnavailable(format!(
                "table {} has unsupported format '{}'",
                source, table.format
            ))
        })?;

        let location = Location::parse(&table.location).map_err(|e| {
            Error::SourceUnavailable(format!("table {} has an invalid location: {}", source, e))
        })?;

        let body = self.store.get(&location).await.map_err(|e| match e {
            Error::Configuration(_) => e,
            other => Error::SourceUnavailable(format!("table {} at {}: {}", source, location, other)),
        })?;

        let records = match format {
            DataFormat::Json => codec::decode_json(&body),
        }
        .map_err(|e| {
            Error::SourceUnavailable(format!(
                "table {} at {} is not readable as {}: {}",
                source,
                location,
                format.tag(),
                e
            ))
        })?;

        tracing::info!(
            source = %source,
            location = %location,
            records = records.len(),
            bytes = body.len(),
            "Read source table"
        );

        Ok(Dataset::new(records))
    }
}
