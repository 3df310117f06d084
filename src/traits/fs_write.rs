//! Write operations for storage adapters.

use async_trait::async_trait;

use crate::{FsError, WriteStream};

/// Write operations for a storage adapter.
///
/// When the local adapter is configured with `create_missing_dirs`, every
/// method here creates the destination's parent directories first. Object
/// storage has no parents to create.
///
/// # Thread Safety
///
/// All implementations must be `Send + Sync`. Concurrent writes to the same
/// path are last-writer-wins.
///
/// # Object Safety
///
/// This trait is object-safe and can be used as `dyn FsWrite`.
#[async_trait]
pub trait FsWrite: Send + Sync {
    /// Write data to a file (creates if not exists, truncates if exists).
    ///
    /// # Errors
    ///
    /// - [`FsError::NotFound`] if the parent directory does not exist (local,
    ///   without auto-create)
    /// - [`FsError::PermissionDenied`] if write access is denied
    async fn write_file(&self, path: &str, data: &[u8]) -> Result<(), FsError>;

    /// Append data to a file (creates if not exists).
    ///
    /// On object storage this reads the whole object and uploads it again,
    /// so each call costs the existing size plus the new size.
    async fn append_file(&self, path: &str, data: &[u8]) -> Result<(), FsError>;

    /// Remove a file.
    ///
    /// # Errors
    ///
    /// - [`FsError::NotFound`] if the file does not exist
    async fn unlink(&self, path: &str) -> Result<(), FsError>;

    /// Copy a file.
    ///
    /// # Errors
    ///
    /// - [`FsError::NotFound`] if the source does not exist
    async fn copy_file(&self, from: &str, to: &str) -> Result<(), FsError>;

    /// Rename/move a file.
    ///
    /// Atomic on local disk. On object storage this is copy-then-delete: if
    /// the delete fails the error is returned and the source is left behind.
    ///
    /// # Errors
    ///
    /// - [`FsError::NotFound`] if the source does not exist
    async fn rename(&self, from: &str, to: &str) -> Result<(), FsError>;

    /// Open a file for streaming writes.
    ///
    /// Data is committed when the stream is shut down
    /// ([`AsyncWriteExt::shutdown`](tokio::io::AsyncWriteExt::shutdown)).
    /// Dropping an object-storage stream without shutting it down discards
    /// the buffered data.
    async fn create_write_stream(&self, path: &str) -> Result<WriteStream, FsError>;
}
