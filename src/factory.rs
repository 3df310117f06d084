//! Adapter construction from configuration.

use async_trait::async_trait;

use crate::{
    AccessMode, AdapterConfig, DirOptions, Encoding, FileStats, FsDir, FsError, FsRead, FsWrite,
    LocalAdapter, ReadStream, S3Adapter, WriteStream,
};

/// Either concrete adapter, chosen at runtime.
///
/// Implements the full [`Fs`](crate::Fs) interface by forwarding to the
/// wrapped adapter, so callers never branch on the backend.
#[derive(Debug, Clone)]
pub enum Adapter {
    /// Local-disk storage.
    Local(LocalAdapter),
    /// S3-compatible object storage.
    S3(S3Adapter),
}

impl Adapter {
    /// `"local"` or `"s3"`.
    pub fn backend(&self) -> &'static str {
        match self {
            Adapter::Local(_) => "local",
            Adapter::S3(_) => "s3",
        }
    }
}

impl From<LocalAdapter> for Adapter {
    fn from(adapter: LocalAdapter) -> Self {
        Adapter::Local(adapter)
    }
}

impl From<S3Adapter> for Adapter {
    fn from(adapter: S3Adapter) -> Self {
        Adapter::S3(adapter)
    }
}

/// Build the adapter a configuration describes.
///
/// Configuration is validated here; the backend itself is not contacted.
///
/// # Errors
///
/// - [`FsError::Validation`] if required fields are missing or invalid
///
/// # Example
///
/// ```rust
/// use anyfs_adapters::{create_adapter, LocalConfig};
///
/// let fs = create_adapter(LocalConfig::new("/srv/files").into()).unwrap();
/// assert_eq!(fs.backend(), "local");
/// ```
pub fn create_adapter(config: AdapterConfig) -> Result<Adapter, FsError> {
    config.validate()?;
    tracing::debug!(backend = config.backend(), "creating storage adapter");
    match config {
        AdapterConfig::Local(local) => LocalAdapter::new(local).map(Adapter::Local),
        AdapterConfig::S3(s3) => S3Adapter::new(s3).map(Adapter::S3),
    }
}

/// Parse a JSON configuration value and build the adapter.
///
/// # Errors
///
/// - [`FsError::Validation`] for an unknown `type`, or missing or malformed
///   fields
pub fn create_adapter_from_json(value: serde_json::Value) -> Result<Adapter, FsError> {
    create_adapter(AdapterConfig::from_json(value)?)
}

macro_rules! dispatch {
    ($self:ident, $adapter:ident => $call:expr) => {
        match $self {
            Adapter::Local($adapter) => $call,
            Adapter::S3($adapter) => $call,
        }
    };
}

#[async_trait]
impl FsRead for Adapter {
    async fn read_file(&self, path: &str) -> Result<Vec<u8>, FsError> {
        dispatch!(self, a => a.read_file(path).await)
    }

    async fn read_to_string(&self, path: &str) -> Result<String, FsError> {
        dispatch!(self, a => a.read_to_string(path).await)
    }

    async fn read_file_encoded(&self, path: &str, encoding: Encoding) -> Result<String, FsError> {
        dispatch!(self, a => a.read_file_encoded(path, encoding).await)
    }

    async fn stat(&self, path: &str) -> Result<FileStats, FsError> {
        dispatch!(self, a => a.stat(path).await)
    }

    async fn lstat(&self, path: &str) -> Result<FileStats, FsError> {
        dispatch!(self, a => a.lstat(path).await)
    }

    async fn access(&self, path: &str, mode: AccessMode) -> Result<(), FsError> {
        dispatch!(self, a => a.access(path, mode).await)
    }

    async fn exists(&self, path: &str) -> Result<bool, FsError> {
        dispatch!(self, a => a.exists(path).await)
    }

    async fn realpath(&self, path: &str) -> Result<String, FsError> {
        dispatch!(self, a => a.realpath(path).await)
    }

    async fn create_read_stream(&self, path: &str) -> Result<ReadStream, FsError> {
        dispatch!(self, a => a.create_read_stream(path).await)
    }
}

#[async_trait]
impl FsWrite for Adapter {
    async fn write_file(&self, path: &str, data: &[u8]) -> Result<(), FsError> {
        dispatch!(self, a => a.write_file(path, data).await)
    }

    async fn append_file(&self, path: &str, data: &[u8]) -> Result<(), FsError> {
        dispatch!(self, a => a.append_file(path, data).await)
    }

    async fn unlink(&self, path: &str) -> Result<(), FsError> {
        dispatch!(self, a => a.unlink(path).await)
    }

    async fn copy_file(&self, from: &str, to: &str) -> Result<(), FsError> {
        dispatch!(self, a => a.copy_file(from, to).await)
    }

    async fn rename(&self, from: &str, to: &str) -> Result<(), FsError> {
        dispatch!(self, a => a.rename(from, to).await)
    }

    async fn create_write_stream(&self, path: &str) -> Result<WriteStream, FsError> {
        dispatch!(self, a => a.create_write_stream(path).await)
    }
}

#[async_trait]
impl FsDir for Adapter {
    async fn readdir(&self, path: &str) -> Result<Vec<String>, FsError> {
        dispatch!(self, a => a.readdir(path).await)
    }

    async fn mkdir(&self, path: &str, options: DirOptions) -> Result<(), FsError> {
        dispatch!(self, a => a.mkdir(path, options).await)
    }

    async fn rmdir(&self, path: &str, options: DirOptions) -> Result<(), FsError> {
        dispatch!(self, a => a.rmdir(path, options).await)
    }
}
