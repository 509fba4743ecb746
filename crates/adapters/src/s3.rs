// crates/adapters/src/s3.rs
use crate::store::ObjectStore;
use async_trait::async_trait;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::{Client, primitives::ByteStream};
use common::*;

/// S3-backed object store
#[derive(Clone)]
pub struct S3Store {
    client: Client,
}

impl S3Store {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    fn bucket_and_key<'a>(&self, location: &'a Location) -> Result<(&'a str, &'a str)> {
        location
            .as_s3()
            .ok_or_else(|| Error::Storage(format!("{} is not an S3 location", location)))
    }
}

#[async_trait]
impl ObjectStore for S3Store {
    async fn get(&self, location: &Location) -> Result<Vec<u8>> {
        let (bucket, key) = self.bucket_and_key(location)?;
        tracing::debug!("GetObject {}", location);

        let resp = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| Error::Storage(format!("GetObject {}: {}", location, DisplayErrorContext(&e))))?;

        let collected = resp
            .body
            .collect()
            .await
            .map_err(|e| Error::Storage(format!("reading body of {}: {}", location, e)))?;

        Ok(collected.into_bytes().to_vec())
    }

    async fn put(&self, location: &Location, data: Vec<u8>) -> Result<()> {
        let (bucket, key) = self.bucket_and_key(location)?;
        tracing::debug!("PutObject {} ({} bytes)", location, data.len());

        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .content_type("application/json")
            .body(ByteStream::from(data))
            .send()
            .await
            .map_err(|e| Error::Storage(format!("PutObject {}: {}", location, DisplayErrorContext(&e))))?;

        Ok(())
    }

    async fn exists(&self, location: &Location) -> Result<bool> {
        let (bucket, key) = self.bucket_and_key(location)?;

        match self.client.head_object().bucket(bucket).key(key).send().await {
            Ok(_) => Ok(true),
            Err(e) if e.as_service_error().is_some_and(|se| se.is_not_found()) => Ok(false),
            Err(e) => Err(Error::Storage(format!(
                "HeadObject {}: {}",
                location,
                DisplayErrorContext(&e)
            ))),
        }
    }
}
