// crates/adapters/src/sink.rs
use crate::codec;
use crate::store::ObjectStore;
use crate::SinkWriter;
use async_trait::async_trait;
use common::*;
use std::sync::Arc;

/// Writes a dataset as a single object at the sink URI
pub struct ObjectSink {
    store: Arc<dyn ObjectStore>,
}

impl ObjectSink {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self { store }
    }

    fn plan(&self, sink: &SinkReference) -> Result<(DataFormat, Location)> {
        let format = DataFormat::from_tag(&sink.format).ok_or_else(|| {
            Error::Configuration(format!("unsupported sink format '{}'", sink.format))
        })?;

        if !sink.partition_keys.is_empty() {
            return Err(Error::Configuration(format!(
                "partitioned output is not supported (partition keys: {})",
                sink.partition_keys.join(", ")
            )));
        }

        let location = Location::parse(&sink.uri)?;
        Ok((format, location))
    }

    fn write_error(location: &Location, err: Error) -> Error {
        match err {
            Error::Configuration(_) => err,
            other => Error::SinkWrite(format!("{}: {}", location, other)),
        }
    }
}

#[async_trait]
impl SinkWriter for ObjectSink {
    fn validate(&self, sink: &SinkReference) -> Result<()> {
        self.plan(sink).map(|_| ())
    }

    async fn write_all(&self, dataset: &Dataset, sink: &SinkReference) -> Result<WriteReceipt> {
        let (format, location) = self.plan(sink)?;

        if sink.mode == SaveMode::ErrorIfExists {
            let exists = self
                .store
                .exists(&location)
                .await
                .map_err(|e| Self::write_error(&location, e))?;
            if exists {
                return Err(Error::SinkWrite(format!("path conflict: {} already exists", location)));
            }
        }

        let body = match format {
            DataFormat::Json => codec::encode_json(dataset.records())?,
        };
        let bytes = body.len() as u64;

        self.store
            .put(&location, body)
            .await
            .map_err(|e| Self::write_error(&location, e))?;

        tracing::info!(
            sink = %location,
            format = format.tag(),
            records = dataset.len(),
            bytes,
            "Wrote sink object"
        );

        Ok(WriteReceipt {
            uri: location.to_string(),
            records: dataset.len() as u64,
            bytes,
        })
    }
}
