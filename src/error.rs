//! Error types shared by every storage adapter.

use std::error::Error as StdError;
use std::io;

/// Boxed native error kept as the cause of an [`FsError`].
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// Backend-agnostic error categories callers can branch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The path does not exist.
    FileNotFound,
    /// Access was refused, or the path escapes the adapter root.
    Permission,
    /// Backend-level failure (missing bucket, disk full, quota).
    Storage,
    /// Timeouts and connectivity failures.
    Network,
    /// Malformed input or configuration.
    Validation,
    /// Anything the other kinds do not cover.
    Other,
}

/// Storage error with operation and path context.
///
/// Every variant keeps the native backend error (when there is one) as its
/// [`source`](std::error::Error::source), so callers can branch on
/// [`kind`](FsError::kind) and still log the original failure.
///
/// # Examples
///
/// ```rust
/// use anyfs_adapters::{ErrorKind, FsError};
///
/// let err = FsError::NotFound {
///     path: "docs/missing.txt".into(),
///     operation: "read_file",
///     source: None,
/// };
/// assert_eq!(err.kind(), ErrorKind::FileNotFound);
/// assert_eq!(err.to_string(), "read_file: not found: docs/missing.txt");
/// ```
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum FsError {
    /// Path does not exist.
    #[error("{operation}: not found: {path}")]
    NotFound {
        /// The logical path that was not found.
        path: String,
        /// The operation that failed.
        operation: &'static str,
        /// The native error.
        #[source]
        source: Option<BoxError>,
    },

    /// Permission denied, or the path resolves outside the adapter root.
    #[error("{operation}: permission denied: {path}")]
    PermissionDenied {
        /// The logical path where permission was denied.
        path: String,
        /// The operation that was denied.
        operation: &'static str,
        /// The native error.
        #[source]
        source: Option<BoxError>,
    },

    /// Backend-level storage failure.
    #[error("{operation}: storage error: {message} ({path})")]
    Storage {
        /// Description of the failure.
        message: String,
        /// The logical path involved.
        path: String,
        /// The operation that failed.
        operation: &'static str,
        /// The native error.
        #[source]
        source: Option<BoxError>,
    },

    /// Timeout or connectivity failure.
    #[error("{operation}: network error: {message} ({path})")]
    Network {
        /// Description of the failure.
        message: String,
        /// The logical path involved.
        path: String,
        /// The operation that failed.
        operation: &'static str,
        /// The native error.
        #[source]
        source: Option<BoxError>,
    },

    /// Malformed input or configuration.
    #[error("{operation}: invalid input: {message}")]
    Validation {
        /// What was wrong with the input.
        message: String,
        /// The operation that rejected the input.
        operation: &'static str,
    },

    /// Any other failure.
    #[error("{operation} failed for {path}: {message}")]
    Other {
        /// Description of the failure.
        message: String,
        /// The logical path involved.
        path: String,
        /// The operation that failed.
        operation: &'static str,
        /// The native error.
        #[source]
        source: Option<BoxError>,
    },
}

impl FsError {
    /// Build an error of the given kind.
    ///
    /// This is the single constructor both backend mappers go through.
    pub fn from_kind(
        kind: ErrorKind,
        operation: &'static str,
        path: impl Into<String>,
        message: impl Into<String>,
        source: Option<BoxError>,
    ) -> Self {
        let path = path.into();
        match kind {
            ErrorKind::FileNotFound => FsError::NotFound {
                path,
                operation,
                source,
            },
            ErrorKind::Permission => FsError::PermissionDenied {
                path,
                operation,
                source,
            },
            ErrorKind::Storage => FsError::Storage {
                message: message.into(),
                path,
                operation,
                source,
            },
            ErrorKind::Network => FsError::Network {
                message: message.into(),
                path,
                operation,
                source,
            },
            ErrorKind::Validation => FsError::Validation {
                message: message.into(),
                operation,
            },
            ErrorKind::Other => FsError::Other {
                message: message.into(),
                path,
                operation,
                source,
            },
        }
    }

    /// Map a local filesystem error.
    ///
    /// "Not found" becomes [`FsError::NotFound`], "permission denied" becomes
    /// [`FsError::PermissionDenied`], and everything else becomes
    /// [`FsError::Other`] wrapping the native error.
    pub fn from_io(operation: &'static str, path: impl Into<String>, error: io::Error) -> Self {
        let kind = match error.kind() {
            io::ErrorKind::NotFound => ErrorKind::FileNotFound,
            io::ErrorKind::PermissionDenied => ErrorKind::Permission,
            _ => ErrorKind::Other,
        };
        let message = error.to_string();
        FsError::from_kind(kind, operation, path, message, Some(Box::new(error)))
    }

    /// Shorthand for a [`FsError::Validation`] error.
    pub fn validation(operation: &'static str, message: impl Into<String>) -> Self {
        FsError::Validation {
            message: message.into(),
            operation,
        }
    }

    /// The taxonomy kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            FsError::NotFound { .. } => ErrorKind::FileNotFound,
            FsError::PermissionDenied { .. } => ErrorKind::Permission,
            FsError::Storage { .. } => ErrorKind::Storage,
            FsError::Network { .. } => ErrorKind::Network,
            FsError::Validation { .. } => ErrorKind::Validation,
            FsError::Other { .. } => ErrorKind::Other,
        }
    }

    /// The operation that failed.
    pub fn operation(&self) -> &'static str {
        match self {
            FsError::NotFound { operation, .. }
            | FsError::PermissionDenied { operation, .. }
            | FsError::Storage { operation, .. }
            | FsError::Network { operation, .. }
            | FsError::Validation { operation, .. }
            | FsError::Other { operation, .. } => operation,
        }
    }

    /// The logical path involved, when the error has one.
    pub fn path(&self) -> Option<&str> {
        match self {
            FsError::NotFound { path, .. }
            | FsError::PermissionDenied { path, .. }
            | FsError::Storage { path, .. }
            | FsError::Network { path, .. }
            | FsError::Other { path, .. } => Some(path),
            FsError::Validation { .. } => None,
        }
    }

    /// Returns `true` for [`ErrorKind::FileNotFound`].
    #[inline]
    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::FileNotFound
    }
}
