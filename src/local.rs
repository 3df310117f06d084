//! Local-disk adapter.
//!
//! Every call resolves its logical path below the configured base directory,
//! optionally creates missing parent directories for write-type calls, and
//! runs the native operation on tokio's blocking pool. No file descriptor is
//! held between calls.
//!
//! Containment is checked twice: lexically (no `..` above the root) and on
//! disk, by canonicalizing the deepest existing ancestor of the target so a
//! symlink inside the base cannot lead a call outside it.

use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::config::{LocalConfig, trace_call};
use crate::path::{absolute_base, normalize, relative_to, resolve_local};
use crate::{
    AccessMode, DirOptions, FileStats, FsDir, FsError, FsRead, FsWrite, ReadStream, WriteStream,
};

/// Storage adapter backed by a directory on local disk.
///
/// # Example
///
/// ```rust,no_run
/// use anyfs_adapters::{FsRead, FsWrite, LocalAdapter, LocalConfig};
///
/// # async fn demo() -> Result<(), anyfs_adapters::FsError> {
/// let fs = LocalAdapter::new(LocalConfig::new("/srv/files").with_create_missing_dirs(true))?;
/// fs.write_file("reports/q1.txt", b"ok").await?;
/// assert_eq!(fs.read_file("reports/q1.txt").await?, b"ok");
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct LocalAdapter {
    base: PathBuf,
    config: LocalConfig,
}

impl LocalAdapter {
    /// Create an adapter rooted at `config.base_path`.
    ///
    /// The base path is made absolute but not touched on disk; a missing
    /// base directory surfaces on the first call (or is created by the first
    /// write when `create_missing_dirs` is set).
    ///
    /// # Errors
    ///
    /// - [`FsError::Validation`] if the base path is empty
    pub fn new(config: LocalConfig) -> Result<Self, FsError> {
        let base = absolute_base(&config.base_path)?;
        Ok(Self { base, config })
    }

    /// The absolute base directory.
    pub fn base_path(&self) -> &Path {
        &self.base
    }

    /// The configuration this adapter was built from.
    pub fn config(&self) -> &LocalConfig {
        &self.config
    }

    fn resolve(&self, operation: &'static str, path: &str) -> Result<PathBuf, FsError> {
        trace_call(
            "local",
            self.config.debug,
            self.config.logger.as_ref(),
            operation,
            path,
        );
        resolve_local(&self.base, path)
    }

    /// Fail if `full` (or, for [`Follow::Parent`], its directory) resolves
    /// through a symlink to somewhere outside the base.
    async fn contain(
        &self,
        operation: &'static str,
        path: &str,
        full: &Path,
        follow: Follow,
    ) -> Result<(), FsError> {
        let base = match fs::canonicalize(&self.base).await {
            Ok(base) => base,
            // Nothing exists below a missing base yet.
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(FsError::from_io(operation, path, e)),
        };
        let mut cursor = match follow {
            Follow::Target => full.to_path_buf(),
            Follow::Parent => full
                .parent()
                .map_or_else(|| full.to_path_buf(), Path::to_path_buf),
        };

        loop {
            if !cursor.starts_with(&self.base) {
                return Ok(());
            }
            match fs::canonicalize(&cursor).await {
                Ok(real) if real.starts_with(&base) => return Ok(()),
                Ok(_) => return Err(escaped(operation, path)),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {
                    // A dangling symlink would be followed on create.
                    if fs::symlink_metadata(&cursor).await.is_ok() {
                        return Err(escaped(operation, path));
                    }
                    if !cursor.pop() {
                        return Ok(());
                    }
                }
                Err(e) => return Err(FsError::from_io(operation, path, e)),
            }
        }
    }

    async fn resolve_contained(
        &self,
        operation: &'static str,
        path: &str,
        follow: Follow,
    ) -> Result<PathBuf, FsError> {
        let full = self.resolve(operation, path)?;
        self.contain(operation, path, &full, follow).await?;
        Ok(full)
    }

    /// Map a two-path failure to whichever side caused it.
    async fn two_path_error(
        operation: &'static str,
        from: &str,
        source: &Path,
        to: &str,
        error: io::Error,
    ) -> FsError {
        let source_present = fs::try_exists(source).await.unwrap_or(false);
        if error.kind() == io::ErrorKind::NotFound && source_present {
            FsError::from_io(operation, to, error)
        } else {
            FsError::from_io(operation, from, error)
        }
    }

    /// Create `target`'s parent directories when auto-create is enabled.
    async fn ensure_parent(
        &self,
        operation: &'static str,
        path: &str,
        target: &Path,
    ) -> Result<(), FsError> {
        if !self.config.create_missing_dirs {
            return Ok(());
        }
        let Some(parent) = target.parent() else {
            return Ok(());
        };
        match fs::create_dir_all(parent).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => Ok(()),
            Err(e) => Err(FsError::from_io(operation, path, e)),
        }
    }

    fn reject_root(&self, operation: &'static str, path: &str) -> Result<(), FsError> {
        if normalize(path)?.is_empty() {
            return Err(FsError::PermissionDenied {
                path: path.to_owned(),
                operation,
                source: None,
            });
        }
        Ok(())
    }
}

/// Which part of a path must stay inside the base.
#[derive(Debug, Clone, Copy)]
enum Follow {
    /// The target itself, following a final symlink.
    Target,
    /// Only the containing directory; the final entry may be a symlink.
    Parent,
}

fn escaped(operation: &'static str, path: &str) -> FsError {
    FsError::PermissionDenied {
        path: path.to_owned(),
        operation,
        source: None,
    }
}

#[async_trait]
impl FsRead for LocalAdapter {
    async fn read_file(&self, path: &str) -> Result<Vec<u8>, FsError> {
        let full = self
            .resolve_contained("read_file", path, Follow::Target)
            .await?;
        fs::read(&full)
            .await
            .map_err(|e| FsError::from_io("read_file", path, e))
    }

    async fn stat(&self, path: &str) -> Result<FileStats, FsError> {
        let full = self
            .resolve_contained("stat", path, Follow::Target)
            .await?;
        let meta = fs::metadata(&full)
            .await
            .map_err(|e| FsError::from_io("stat", path, e))?;
        Ok(meta.into())
    }

    async fn lstat(&self, path: &str) -> Result<FileStats, FsError> {
        let full = self
            .resolve_contained("lstat", path, Follow::Parent)
            .await?;
        let meta = fs::symlink_metadata(&full)
            .await
            .map_err(|e| FsError::from_io("lstat", path, e))?;
        Ok(meta.into())
    }

    async fn access(&self, path: &str, mode: AccessMode) -> Result<(), FsError> {
        let full = self
            .resolve_contained("access", path, Follow::Target)
            .await?;
        let stats: FileStats = fs::metadata(&full)
            .await
            .map_err(|e| FsError::from_io("access", path, e))?
            .into();

        let bits = stats.permissions.mode();
        let denied = (mode.contains(AccessMode::READ) && bits & 0o444 == 0)
            || (mode.contains(AccessMode::WRITE) && stats.permissions.readonly())
            || (cfg!(unix) && mode.contains(AccessMode::EXECUTE) && bits & 0o111 == 0);
        if denied {
            return Err(FsError::PermissionDenied {
                path: path.to_owned(),
                operation: "access",
                source: None,
            });
        }
        Ok(())
    }

    async fn realpath(&self, path: &str) -> Result<String, FsError> {
        let full = self.resolve("realpath", path)?;
        let resolved = fs::canonicalize(&full)
            .await
            .map_err(|e| FsError::from_io("realpath", path, e))?;
        let base = fs::canonicalize(&self.base)
            .await
            .map_err(|e| FsError::from_io("realpath", path, e))?;

        relative_to(&base, &resolved).ok_or_else(|| FsError::PermissionDenied {
            path: path.to_owned(),
            operation: "realpath",
            source: None,
        })
    }

    async fn create_read_stream(&self, path: &str) -> Result<ReadStream, FsError> {
        let full = self
            .resolve_contained("create_read_stream", path, Follow::Target)
            .await?;
        let file = fs::File::open(&full)
            .await
            .map_err(|e| FsError::from_io("create_read_stream", path, e))?;
        Ok(Box::pin(file))
    }
}

#[async_trait]
impl FsWrite for LocalAdapter {
    async fn write_file(&self, path: &str, data: &[u8]) -> Result<(), FsError> {
        let full = self
            .resolve_contained("write_file", path, Follow::Target)
            .await?;
        self.ensure_parent("write_file", path, &full).await?;
        fs::write(&full, data)
            .await
            .map_err(|e| FsError::from_io("write_file", path, e))
    }

    async fn append_file(&self, path: &str, data: &[u8]) -> Result<(), FsError> {
        let full = self
            .resolve_contained("append_file", path, Follow::Target)
            .await?;
        self.ensure_parent("append_file", path, &full).await?;
        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&full)
            .await
            .map_err(|e| FsError::from_io("append_file", path, e))?;
        file.write_all(data)
            .await
            .map_err(|e| FsError::from_io("append_file", path, e))?;
        file.flush()
            .await
            .map_err(|e| FsError::from_io("append_file", path, e))
    }

    async fn unlink(&self, path: &str) -> Result<(), FsError> {
        let full = self
            .resolve_contained("unlink", path, Follow::Parent)
            .await?;
        fs::remove_file(&full)
            .await
            .map_err(|e| FsError::from_io("unlink", path, e))
    }

    async fn copy_file(&self, from: &str, to: &str) -> Result<(), FsError> {
        let source = self
            .resolve_contained("copy_file", from, Follow::Target)
            .await?;
        let target = resolve_local(&self.base, to)?;
        self.contain("copy_file", to, &target, Follow::Target).await?;
        self.ensure_parent("copy_file", to, &target).await?;
        match fs::copy(&source, &target).await {
            Ok(_) => Ok(()),
            Err(e) => Err(Self::two_path_error("copy_file", from, &source, to, e).await),
        }
    }

    async fn rename(&self, from: &str, to: &str) -> Result<(), FsError> {
        let source = self
            .resolve_contained("rename", from, Follow::Parent)
            .await?;
        let target = resolve_local(&self.base, to)?;
        self.contain("rename", to, &target, Follow::Parent).await?;
        self.ensure_parent("rename", to, &target).await?;
        match fs::rename(&source, &target).await {
            Ok(()) => Ok(()),
            Err(e) => Err(Self::two_path_error("rename", from, &source, to, e).await),
        }
    }

    async fn create_write_stream(&self, path: &str) -> Result<WriteStream, FsError> {
        let full = self
            .resolve_contained("create_write_stream", path, Follow::Target)
            .await?;
        self.ensure_parent("create_write_stream", path, &full)
            .await?;
        let file = fs::File::create(&full)
            .await
            .map_err(|e| FsError::from_io("create_write_stream", path, e))?;
        Ok(Box::pin(file))
    }
}

#[async_trait]
impl FsDir for LocalAdapter {
    async fn readdir(&self, path: &str) -> Result<Vec<String>, FsError> {
        let full = self
            .resolve_contained("readdir", path, Follow::Target)
            .await?;
        let mut entries = fs::read_dir(&full)
            .await
            .map_err(|e| FsError::from_io("readdir", path, e))?;

        let mut names = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| FsError::from_io("readdir", path, e))?
        {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
        names.sort();
        Ok(names)
    }

    async fn mkdir(&self, path: &str, options: DirOptions) -> Result<(), FsError> {
        let full = self
            .resolve_contained("mkdir", path, Follow::Target)
            .await?;
        let result = if options.recursive {
            fs::create_dir_all(&full).await
        } else {
            fs::create_dir(&full).await
        };
        result.map_err(|e| FsError::from_io("mkdir", path, e))
    }

    async fn rmdir(&self, path: &str, options: DirOptions) -> Result<(), FsError> {
        let full = self
            .resolve_contained("rmdir", path, Follow::Target)
            .await?;
        self.reject_root("rmdir", path)?;
        let result = if options.recursive {
            fs::remove_dir_all(&full).await
        } else {
            fs::remove_dir(&full).await
        };
        result.map_err(|e| FsError::from_io("rmdir", path, e))
    }
}
