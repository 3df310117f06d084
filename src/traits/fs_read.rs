//! Read operations for storage adapters.

use async_trait::async_trait;

use crate::{AccessMode, Encoding, FileStats, FsError, ReadStream};

/// Read operations for a storage adapter.
///
/// Paths are logical, `/`-separated and relative to the adapter root; a
/// leading `/` is accepted and ignored.
///
/// # Thread Safety
///
/// All implementations must be `Send + Sync`. Methods take `&self` so calls
/// can run concurrently; adapters hold no per-call state.
///
/// # Object Safety
///
/// This trait is object-safe and can be used as `dyn FsRead`.
#[async_trait]
pub trait FsRead: Send + Sync {
    /// Read entire file contents as bytes.
    ///
    /// # Errors
    ///
    /// - [`FsError::NotFound`] if the path does not exist
    /// - [`FsError::PermissionDenied`] if read access is denied or the path
    ///   escapes the root
    async fn read_file(&self, path: &str) -> Result<Vec<u8>, FsError>;

    /// Read file contents as UTF-8 text.
    ///
    /// # Errors
    ///
    /// - Everything [`read_file`](Self::read_file) returns
    /// - [`FsError::Other`] if the contents are not valid UTF-8
    async fn read_to_string(&self, path: &str) -> Result<String, FsError> {
        self.read_file_encoded(path, Encoding::Utf8).await
    }

    /// Read file contents decoded with `encoding`.
    async fn read_file_encoded(&self, path: &str, encoding: Encoding) -> Result<String, FsError> {
        let bytes = self.read_file(path).await?;
        encoding.decode(path, bytes)
    }

    /// Get stats for a path (follows symlinks).
    ///
    /// # Errors
    ///
    /// - [`FsError::NotFound`] if the path does not exist
    async fn stat(&self, path: &str) -> Result<FileStats, FsError>;

    /// Get stats without following a final symlink.
    ///
    /// Identical to [`stat`](Self::stat) on backends without symlinks.
    async fn lstat(&self, path: &str) -> Result<FileStats, FsError>;

    /// Check that the path exists and allows `mode`.
    ///
    /// # Errors
    ///
    /// - [`FsError::NotFound`] if the path does not exist
    /// - [`FsError::PermissionDenied`] if `mode` is not allowed
    async fn access(&self, path: &str, mode: AccessMode) -> Result<(), FsError>;

    /// Check if a path exists.
    ///
    /// A not-found result is `Ok(false)`; every other failure propagates.
    async fn exists(&self, path: &str) -> Result<bool, FsError> {
        match self.stat(path).await {
            Ok(_) => Ok(true),
            Err(FsError::NotFound { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Resolve a path to its canonical form relative to the adapter root.
    ///
    /// The root itself resolves to `""`.
    ///
    /// # Errors
    ///
    /// - [`FsError::NotFound`] if the path does not exist
    /// - [`FsError::PermissionDenied`] if a symlink points outside the root
    async fn realpath(&self, path: &str) -> Result<String, FsError>;

    /// Open a file as an async byte stream.
    ///
    /// # Errors
    ///
    /// - [`FsError::NotFound`] if the path does not exist
    async fn create_read_stream(&self, path: &str) -> Result<ReadStream, FsError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fs_read_is_object_safe() {
        fn _check(_: &dyn FsRead) {}
    }

    #[test]
    fn fs_read_requires_send_sync() {
        fn _assert_send_sync<T: Send + Sync>() {}
        fn _check<T: FsRead>() {
            _assert_send_sync::<T>();
        }
    }
}
