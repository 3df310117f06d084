//! # Storage Traits
//!
//! The operation interface every adapter implements.
//!
//! ## Quick Reference
//!
//! | Trait | Methods |
//! |-------|---------|
//! | [`FsRead`] | `read_file`, `read_to_string`, `read_file_encoded`, `stat`, `lstat`, `access`, `exists`, `realpath`, `create_read_stream` |
//! | [`FsWrite`] | `write_file`, `append_file`, `unlink`, `copy_file`, `rename`, `create_write_stream` |
//! | [`FsDir`] | `readdir`, `mkdir`, `rmdir` |
//! | [`Fs`] | all of the above |
//!
//! ## Blanket Implementation
//!
//! Implement the three component traits and [`Fs`] comes for free.
//!
//! ## Object Safety
//!
//! All traits are object-safe (via `async-trait`) and can be used as trait
//! objects:
//!
//! ```rust
//! use anyfs_adapters::{Fs, FsError};
//!
//! async fn copy_report(fs: &dyn Fs) -> Result<(), FsError> {
//!     let data = fs.read_file("reports/today.csv").await?;
//!     fs.write_file("archive/today.csv", &data).await
//! }
//! ```

use std::pin::Pin;

use tokio::io::{AsyncRead, AsyncWrite};

mod fs_dir;
mod fs_read;
mod fs_write;

pub use fs_dir::FsDir;
pub use fs_read::FsRead;
pub use fs_write::FsWrite;

/// Byte stream returned by [`FsRead::create_read_stream`].
pub type ReadStream = Pin<Box<dyn AsyncRead + Send>>;

/// Byte sink returned by [`FsWrite::create_write_stream`].
pub type WriteStream = Pin<Box<dyn AsyncWrite + Send>>;

/// The full storage operation interface.
///
/// Write code against `Fs` (or `&dyn Fs`) and it runs unchanged on either
/// backend:
///
/// ```rust
/// use anyfs_adapters::{DirOptions, Fs, FsError};
///
/// async fn rotate<B: Fs>(fs: &B) -> Result<(), FsError> {
///     fs.mkdir("logs/old", DirOptions::RECURSIVE).await?;
///     if fs.exists("logs/app.log").await? {
///         fs.rename("logs/app.log", "logs/old/app.log").await?;
///     }
///     fs.write_file("logs/app.log", b"").await
/// }
/// ```
pub trait Fs: FsRead + FsWrite + FsDir {}

impl<T: FsRead + FsWrite + FsDir> Fs for T {}
