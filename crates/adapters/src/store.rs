// crates/adapters/src/store.rs
use async_trait::async_trait;
use common::*;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// Whole-object storage backend
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn get(&self, location: &Location) -> Result<Vec<u8>>;

    async fn put(&self, location: &Location, data: Vec<u8>) -> Result<()>;

    async fn exists(&self, location: &Location) -> Result<bool>;
}

/// Dispatches locations to the S3 or local backend by scheme
pub struct StoreRouter {
    s3: Option<Arc<dyn ObjectStore>>,
    local: Arc<dyn ObjectStore>,
}

impl StoreRouter {
    pub fn new(local: Arc<dyn ObjectStore>) -> Self {
        Self { s3: None, local }
    }

    pub fn with_s3(mut self, s3: Arc<dyn ObjectStore>) -> Self {
        self.s3 = Some(s3);
        self
    }

    fn backend(&self, location: &Location) -> Result<&Arc<dyn ObjectStore>> {
        if !location.is_s3() {
            return Ok(&self.local);
        }
        self.s3.as_ref().ok_or_else(|| {
            Error::Configuration(format!(
                "{} is an S3 location but AWS access is not enabled",
                location
            ))
        })
    }
}

#[async_trait]
impl ObjectStore for StoreRouter {
    async fn get(&self, location: &Location) -> Result<Vec<u8>> {
        self.backend(location)?.get(location).await
    }

    async fn put(&self, location: &Location, data: Vec<u8>) -> Result<()> {
        self.backend(location)?.put(location, data).await
    }

    async fn exists(&self, location: &Location) -> Result<bool> {
        self.backend(location)?.exists(location).await
    }
}

/// In-process store keyed by location URI
#[derive(Default)]
pub struct MemoryStore {
    objects: RwLock<HashMap<String, Vec<u8>>>,
    read_only: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that rejects every write
    pub fn read_only() -> Self {
        Self {
            objects: RwLock::new(HashMap::new()),
            read_only: true,
        }
    }

    pub fn insert(&self, uri: &str, data: impl Into<Vec<u8>>) -> Result<()> {
        let location = Location::parse(uri)?;
        self.objects.write().insert(location.to_string(), data.into());
        Ok(())
    }

    pub fn object(&self, uri: &str) -> Option<Vec<u8>> {
        let location = Location::parse(uri).ok()?;
        self.objects.read().get(&location.to_string()).cloned()
    }

    pub fn len(&self) -> usize {
        self.objects.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.read().is_empty()
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn get(&self, location: &Location) -> Result<Vec<u8>> {
        self.objects
            .read()
            .get(&location.to_string())
            .cloned()
            .ok_or_else(|| Error::Storage(format!("no object at {}", location)))
    }

    async fn put(&self, location: &Location, data: Vec<u8>) -> Result<()> {
        if self.read_only {
            return Err(Error::Storage(format!("permission denied writing {}", location)));
        }
        self.objects.write().insert(location.to_string(), data);
        Ok(())
    }

    async fn exists(&self, location: &Location) -> Result<bool> {
        Ok(self.objects.read().contains_key(&location.to_string()))
    }
}
