//! Directory operations for storage adapters.

use async_trait::async_trait;

use crate::{DirOptions, FsError};

/// Directory operations for a storage adapter.
///
/// On object storage directories are simulated: a directory exists when a
/// zero-length marker object `dir/` exists or when any key starts with
/// `dir/`.
///
/// # Object Safety
///
/// This trait is object-safe and can be used as `dyn FsDir`.
#[async_trait]
pub trait FsDir: Send + Sync {
    /// List the names (not paths) of a directory's immediate children,
    /// sorted.
    ///
    /// # Errors
    ///
    /// - [`FsError::NotFound`] if the directory does not exist
    /// - [`FsError::Other`] if the path is a file
    async fn readdir(&self, path: &str) -> Result<Vec<String>, FsError>;

    /// Create a directory.
    ///
    /// Recursive creation is idempotent. Non-recursive creation fails if the
    /// directory exists or its parent is missing.
    ///
    /// # Errors
    ///
    /// - [`FsError::NotFound`] if the parent does not exist (local)
    /// - [`FsError::Storage`] if the parent marker does not exist (object
    ///   storage)
    async fn mkdir(&self, path: &str, options: DirOptions) -> Result<(), FsError>;

    /// Remove a directory; with `recursive`, everything below it too.
    ///
    /// # Errors
    ///
    /// - [`FsError::NotFound`] if the directory does not exist
    /// - [`FsError::Other`] if it is not empty and `recursive` is unset
    /// - [`FsError::PermissionDenied`] for the adapter root
    async fn rmdir(&self, path: &str, options: DirOptions) -> Result<(), FsError>;
}
