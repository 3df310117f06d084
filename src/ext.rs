//! # Extension Traits
//!
//! Convenience methods for any storage adapter.
//!
//! | Method | Description |
//! |--------|-------------|
//! | [`is_file`](FsExt::is_file) | Check if path is a regular file |
//! | [`is_dir`](FsExt::is_dir) | Check if path is a (simulated) directory |
//! | [`file_size`](FsExt::file_size) | Size in bytes |
//! | [`read_json`](FsExt::read_json) | Read and deserialize a JSON file |
//! | [`write_json`](FsExt::write_json) | Serialize and write a JSON file |

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::{Fs, FsError};

/// Extension methods for any [`Fs`] adapter.
///
/// # Example
///
/// ```rust
/// use anyfs_adapters::{Fs, FsExt, FsError};
///
/// async fn load_settings<B: Fs>(fs: &B) -> Result<serde_json::Value, FsError> {
///     if fs.is_file("settings.json").await? {
///         fs.read_json("settings.json").await
///     } else {
///         Ok(serde_json::json!({}))
///     }
/// }
/// ```
#[async_trait]
pub trait FsExt: Fs {
    /// Check if the path points to a regular file.
    ///
    /// Returns `Ok(false)` if the path doesn't exist.
    async fn is_file(&self, path: &str) -> Result<bool, FsError> {
        match self.stat(path).await {
            Ok(s) => Ok(s.is_file()),
            Err(FsError::NotFound { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Check if the path points to a directory.
    ///
    /// Returns `Ok(false)` if the path doesn't exist.
    async fn is_dir(&self, path: &str) -> Result<bool, FsError> {
        match self.stat(path).await {
            Ok(s) => Ok(s.is_directory()),
            Err(FsError::NotFound { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Get the size of a file in bytes.
    async fn file_size(&self, path: &str) -> Result<u64, FsError> {
        Ok(self.stat(path).await?.size)
    }

    /// Read a file and deserialize it as JSON.
    ///
    /// # Errors
    ///
    /// - [`FsError::NotFound`] if the file doesn't exist
    /// - [`FsError::Validation`] if the contents are not valid JSON for `T`
    async fn read_json<T>(&self, path: &str) -> Result<T, FsError>
    where
        T: DeserializeOwned + Send,
    {
        let data = self.read_file(path).await?;
        serde_json::from_slice(&data)
            .map_err(|e| FsError::validation("read_json", format!("{path}: {e}")))
    }

    /// Serialize a value as pretty-printed JSON and write it.
    async fn write_json<T>(&self, path: &str, value: &T) -> Result<(), FsError>
    where
        T: Serialize + Sync + ?Sized,
    {
        let json = serde_json::to_vec_pretty(value)
            .map_err(|e| FsError::validation("write_json", format!("{path}: {e}")))?;
        self.write_file(path, &json).await
    }
}

impl<B: Fs + ?Sized> FsExt for B {}
