// crates/adapters/src/lib.rs
use async_trait::async_trait;
use common::*;
use std::sync::Arc;

pub mod catalog;
pub mod codec;
pub mod local;
pub mod s3;
pub mod sink;
pub mod source;
pub mod store;

pub use catalog::{Catalog, StaticCatalog, TableDescriptor};
pub use local::LocalStore;
pub use s3::S3Store;
pub use sink::ObjectSink;
pub use source::CatalogSource;
pub use store::{MemoryStore, ObjectStore, StoreRouter};

/// Reads a whole dataset for a catalog reference
#[async_trait]
pub trait SourceReader: Send + Sync {
    async fn read_all(&self, source: &SourceReference) -> Result<Dataset>;
}

/// Writes a whole dataset to a sink
#[async_trait]
pub trait SinkWriter: Send + Sync {
    /// Check the sink description without touching storage
    fn validate(&self, _sink: &SinkReference) -> Result<()> {
        Ok(())
    }

    async fn write_all(&self, dataset: &Dataset, sink: &SinkReference) -> Result<WriteReceipt>;
}

#[async_trait]
impl<T: SourceReader + ?Sized> SourceReader for Arc<T> {
    async fn read_all(&self, source: &SourceReference) -> Result<Dataset> {
        (**self).read_all(source).await
    }
}

#[async_trait]
impl<T: SinkWriter + ?Sized> SinkWriter for Arc<T> {
    fn validate(&self, sink: &SinkReference) -> Result<()> {
        (**self).validate(sink)
    }

    async fn write_all(&self, dataset: &Dataset, sink: &SinkReference) -> Result<WriteReceipt> {
        (**self).write_all(dataset, sink).await
    }
}
