//! # anyfs-adapters
//!
//! Interchangeable storage adapters behind one async filesystem interface:
//! a **local-disk** adapter and an **S3-compatible object-storage** adapter.
//!
//! Application code is written once against [`Fs`] and runs unchanged on
//! either backend. The backend is picked from configuration at runtime.
//!
//! ---
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use anyfs_adapters::{create_adapter_from_json, DirOptions, FsDir, FsRead, FsWrite};
//!
//! # async fn demo() -> Result<(), anyfs_adapters::FsError> {
//! let fs = create_adapter_from_json(serde_json::json!({
//!     "type": "local",
//!     "basePath": "/srv/files",
//!     "createMissingDirs": true,
//! }))?;
//!
//! fs.write_file("reports/2024/q1.csv", b"region,total\n").await?;
//! fs.mkdir("reports/archive", DirOptions::RECURSIVE).await?;
//! for name in fs.readdir("reports").await? {
//!     println!("{name}");
//! }
//! let text = fs.read_to_string("reports/2024/q1.csv").await?;
//! # let _ = text;
//! # Ok(())
//! # }
//! ```
//!
//! ---
//!
//! ## Core Types
//!
//! | Type | Purpose |
//! |------|---------|
//! | [`Fs`] | The full operation interface (`FsRead + FsWrite + FsDir`) |
//! | [`LocalAdapter`] | Files below a base directory on local disk |
//! | [`S3Adapter`] | Objects in a bucket, with simulated directories |
//! | [`Adapter`] | Either of the above, built by [`create_adapter`] |
//! | [`AdapterConfig`] | Tagged configuration (`"type": "local"` or `"s3"`) |
//! | [`FsError`] | Backend-neutral error with operation and path context |
//! | [`FileStats`] | Normalized stat result |
//!
//! ---
//!
//! ## Paths
//!
//! Paths are logical and `/`-separated. Leading `/`, empty segments and `.`
//! are ignored; `..` is resolved lexically. A path that would climb above the
//! adapter root is rejected with [`FsError::PermissionDenied`] before any I/O.
//! See [`path`] for the helpers both adapters share.
//!
//! ---
//!
//! ## Error Handling
//!
//! Every failure is an [`FsError`] whose [`kind`](FsError::kind) is the same
//! for the same condition on both backends:
//!
//! ```rust
//! use anyfs_adapters::{ErrorKind, FsError};
//!
//! let err = FsError::NotFound {
//!     path: "docs/a.txt".into(),
//!     operation: "read_file",
//!     source: None,
//! };
//! assert_eq!(err.kind(), ErrorKind::FileNotFound);
//! assert_eq!(err.to_string(), "read_file: not found: docs/a.txt");
//! ```
//!
//! The native error (an `std::io::Error` or an [`ObjectStoreError`]) is kept
//! as the error's `source()`.
//!
//! ---
//!
//! ## Logging
//!
//! Every call emits a `tracing` debug event with `backend`, `operation` and
//! `path` fields. Setting `debug` and a [`Logger`] in the configuration
//! additionally forwards a one-line message per call to the callback.
//!
//! ---
//!
//! ## Thread Safety
//!
//! All traits require `Send + Sync` and take `&self`. Adapters hold no
//! per-call state, so one instance can serve concurrent tasks through `Arc`.

// Private modules
mod config;
mod error;
mod ext;
mod factory;
mod local;
mod s3;
mod traits;
mod types;

pub mod path;

// Public re-exports - error types
pub use error::{BoxError, ErrorKind, FsError};

// Public re-exports - core types
pub use types::{AccessMode, DirOptions, Encoding, FileStats, FileType, Permissions};

// Public re-exports - traits
pub use ext::FsExt;
pub use traits::{Fs, FsDir, FsRead, FsWrite, ReadStream, WriteStream};

// Public re-exports - configuration
pub use config::{AdapterConfig, LocalConfig, Logger, S3Config};

// Public re-exports - adapters
pub use factory::{Adapter, create_adapter, create_adapter_from_json};
pub use local::LocalAdapter;
pub use s3::{
    ListPage, ListRequest, MemoryObjectClient, ObjectClient, ObjectHead, ObjectStoreError,
    ObjectSummary, S3Adapter, SdkObjectClient, TransportFailure, map_s3_error,
};
