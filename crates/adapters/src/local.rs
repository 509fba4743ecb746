// crates/adapters/src/local.rs
use crate::store::ObjectStore;
use async_trait::async_trait;
use common::*;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Local filesystem store.
///
/// Writes land in a hidden sibling file first and are renamed into place, so
/// a failed write never leaves a truncated object behind.
#[derive(Debug, Clone, Default)]
pub struct LocalStore;

impl LocalStore {
    pub fn new() -> Self {
        Self
    }

    fn path<'a>(&self, location: &'a Location) -> Result<&'a Path> {
        location.as_path().ok_or_else(|| {
            Error::Storage(format!("{} is not a local path", location))
        })
    }
}

fn staging_path(path: &Path) -> Result<PathBuf> {
    let name = path
        .file_name()
        .ok_or_else(|| Error::Storage(format!("{} does not name a file", path.display())))?;
    let staged = format!(".{}.tmp-{}", name.to_string_lossy(), std::process::id());
    Ok(path.with_file_name(staged))
}

#[async_trait]
impl ObjectStore for LocalStore {
    async fn get(&self, location: &Location) -> Result<Vec<u8>> {
        let path = self.path(location)?;
        tracing::debug!("Reading {}", path.display());
        fs::read(path)
            .await
            .map_err(|e| Error::Storage(format!("read {}: {}", path.display(), e)))
    }

    async fn put(&self, location: &Location, data: Vec<u8>) -> Result<()> {
        let path = self.path(location)?;
        let staged = staging_path(path)?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| Error::Storage(format!("create {}: {}", parent.display(), e)))?;
        }

        tracing::debug!("Writing {} bytes to {}", data.len(), path.display());
        if let Err(e) = fs::write(&staged, &data).await {
            let _ = fs::remove_file(&staged).await;
            return Err(Error::Storage(format!("write {}: {}", staged.display(), e)));
        }

        if let Err(e) = fs::rename(&staged, path).await {
            let _ = fs::remove_file(&staged).await;
            return Err(Error::Storage(format!("rename into {}: {}", path.display(), e)));
        }

        Ok(())
    }

    async fn exists(&self, location: &Location) -> Result<bool> {
        let path = self.path(location)?;
        fs::try_exists(path)
            .await
            .map_err(|e| Error::Storage(format!("stat {}: {}", path.display(), e)))
    }
}
