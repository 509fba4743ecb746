// crates/common/src/location.rs
use crate::{Error, Result};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Where a dataset object lives
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Location {
    S3 { bucket: String, key: String },
    File(PathBuf),
}

impl Location {
    /// Parse `s3://bucket/key`, `s3a://bucket/key`, `file:///path` or a bare path
    pub fn parse(uri: &str) -> Result<Self> {
        let uri = uri.trim();
        if uri.is_empty() {
            return Err(Error::Configuration("empty location URI".to_string()));
        }

        if let Some(rest) = uri.strip_prefix("s3://").or_else(|| uri.strip_prefix("s3a://")) {
            let (bucket, key) = rest.split_once('/').unwrap_or((rest, ""));
            if bucket.is_empty() || key.is_empty() {
                return Err(Error::Configuration(format!(
                    "S3 location '{}' needs both a bucket and an object key",
                    uri
                )));
            }
            return Ok(Location::S3 {
                bucket: bucket.to_string(),
                key: key.to_string(),
            });
        }

        if let Some(path) = uri.strip_prefix("file://") {
            if path.is_empty() {
                return Err(Error::Configuration(format!("file location '{}' has no path", uri)));
            }
            return Ok(Location::File(PathBuf::from(path)));
        }

        if let Some((scheme, _)) = uri.split_once("://") {
            return Err(Error::Configuration(format!(
                "unsupported location scheme '{}' in '{}'",
                scheme, uri
            )));
        }

        Ok(Location::File(PathBuf::from(uri)))
    }

    pub fn is_s3(&self) -> bool {
        matches!(self, Location::S3 { .. })
    }

    pub fn as_s3(&self) -> Option<(&str, &str)> {
        match self {
            Location::S3 { bucket, key } => Some((bucket, key)),
            Location::File(_) => None,
        }
    }

    pub fn as_path(&self) -> Option<&Path> {
        match self {
            Location::File(path) => Some(path),
            Location::S3 { .. } => None,
        }
    }
}

impl FromStr for Location {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Location::parse(s)
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Location::S3 { bucket, key } => write!(f, "s3://{}/{}", bucket, key),
            Location::File(path) => write!(f, "{}", path.display()),
        }
    }
}
