//! S3-compatible object-storage adapter.
//!
//! Object stores are flat key/value maps, so directories are simulated: a
//! directory at key `P` exists if a zero-length marker object `P/` exists or
//! if any object key starts with `P/`. Nothing about the tree is cached; every
//! call asks the bucket.
//!
//! | Call | Requests |
//! |------|----------|
//! | `stat` | `HEAD P`, then `HEAD P/`, then a one-key listing under `P/` |
//! | `readdir` | delimited listing under `P/` (no `Prefix` at the bucket root) |
//! | `mkdir` | `PUT` of a marker per level (recursive) or parent check + one `PUT` |
//! | `rmdir` | listing + `DELETE` per key, paginated when recursive |
//! | `rename` | `CopyObject` + `DeleteObject` (not atomic) |

mod client;
mod errors;
mod memory;
mod sdk;
mod stream;

use std::fmt;
use std::sync::Arc;
use std::time::UNIX_EPOCH;

use async_trait::async_trait;

pub use client::{
    ListPage, ListRequest, ObjectClient, ObjectHead, ObjectStoreError, ObjectSummary,
    TransportFailure,
};
pub use errors::map_s3_error;
pub use memory::MemoryObjectClient;
pub use sdk::SdkObjectClient;

use crate::config::trace_call;
use crate::path::{dir_prefix, normalize, parent, to_object_key};
use crate::{
    AccessMode, DirOptions, FileStats, FsDir, FsError, FsRead, FsWrite, ReadStream, S3Config,
    WriteStream,
};
use stream::ObjectWriteStream;

/// A logical path resolved to its object key.
struct Located {
    relative: String,
    key: String,
}

impl Located {
    fn is_root(&self) -> bool {
        self.relative.is_empty()
    }

    fn marker(&self) -> String {
        format!("{}/", self.key)
    }
}

/// Storage adapter backed by an S3-compatible bucket.
///
/// # Example
///
/// ```rust,no_run
/// use anyfs_adapters::{DirOptions, FsDir, FsWrite, S3Adapter, S3Config};
///
/// # async fn demo() -> Result<(), anyfs_adapters::FsError> {
/// let config = S3Config::new("assets", "us-east-1")
///     .with_endpoint("http://localhost:9000", true)
///     .with_prefix("tenant-a");
/// let fs = S3Adapter::new(config)?;
/// fs.mkdir("reports", DirOptions::RECURSIVE).await?;
/// fs.write_file("reports/q1.txt", b"ok").await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct S3Adapter {
    client: Arc<dyn ObjectClient>,
    config: S3Config,
}

impl fmt::Debug for S3Adapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("S3Adapter")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl S3Adapter {
    /// Create an adapter using the AWS SDK client.
    ///
    /// Construction performs no network calls.
    ///
    /// # Errors
    ///
    /// - [`FsError::Validation`] if the configuration is invalid
    pub fn new(config: S3Config) -> Result<Self, FsError> {
        let client = SdkObjectClient::new(&config)?;
        Ok(Self {
            client: Arc::new(client),
            config,
        })
    }

    /// Create an adapter over a caller-supplied [`ObjectClient`].
    ///
    /// # Errors
    ///
    /// - [`FsError::Validation`] if the configuration is invalid
    pub fn with_client(config: S3Config, client: Arc<dyn ObjectClient>) -> Result<Self, FsError> {
        config.validate()?;
        Ok(Self { client, config })
    }

    /// The configuration this adapter was built from.
    pub fn config(&self) -> &S3Config {
        &self.config
    }

    fn locate(&self, operation: &'static str, path: &str) -> Result<Located, FsError> {
        trace_call(
            "s3",
            self.config.debug,
            self.config.logger.as_ref(),
            operation,
            path,
        );
        self.locate_quiet(path)
    }

    fn locate_quiet(&self, path: &str) -> Result<Located, FsError> {
        let relative = normalize(path)?;
        let key = to_object_key(self.config.prefix.as_deref(), &relative)?;
        Ok(Located { relative, key })
    }

    /// Reject the root as the target of a file operation.
    fn file_at(operation: &'static str, path: &str, at: Located) -> Result<Located, FsError> {
        if at.is_root() {
            Err(Self::other(operation, path, "is a directory"))
        } else {
            Ok(at)
        }
    }

    fn not_found(operation: &'static str, path: &str) -> FsError {
        FsError::NotFound {
            path: path.to_owned(),
            operation,
            source: None,
        }
    }

    fn other(operation: &'static str, path: &str, message: &str) -> FsError {
        FsError::Other {
            message: message.to_owned(),
            path: path.to_owned(),
            operation,
            source: None,
        }
    }

    /// `HEAD` a key; `Ok(None)` when it does not exist.
    async fn head(
        &self,
        operation: &'static str,
        path: &str,
        key: &str,
    ) -> Result<Option<ObjectHead>, FsError> {
        match self.client.head_object(key).await {
            Ok(head) => Ok(Some(head)),
            Err(e) => {
                let err = map_s3_error(operation, path, e);
                if err.is_not_found() {
                    Ok(None)
                } else {
                    Err(err)
                }
            }
        }
    }

    async fn stat_located(
        &self,
        operation: &'static str,
        path: &str,
        at: &Located,
    ) -> Result<FileStats, FsError> {
        if at.is_root() {
            return Ok(FileStats::directory(UNIX_EPOCH));
        }
        if let Some(head) = self.head(operation, path, &at.key).await? {
            return Ok(FileStats::file(
                head.size,
                head.last_modified.unwrap_or(UNIX_EPOCH),
            ));
        }
        if let Some(head) = self.head(operation, path, &at.marker()).await? {
            return Ok(FileStats::directory(
                head.last_modified.unwrap_or(UNIX_EPOCH),
            ));
        }

        // No marker, but descendants can still imply the directory.
        let page = self
            .client
            .list_objects(ListRequest {
                prefix: Some(at.marker()),
                max_keys: Some(1),
                ..ListRequest::default()
            })
            .await
            .map_err(|e| map_s3_error(operation, path, e))?;
        match page.objects.first() {
            Some(object) => Ok(FileStats::directory(
                object.last_modified.unwrap_or(UNIX_EPOCH),
            )),
            None => Err(Self::not_found(operation, path)),
        }
    }

    async fn put_marker(&self, path: &str, key: String) -> Result<(), FsError> {
        self.client
            .put_object(&key, Vec::new())
            .await
            .map_err(|e| map_s3_error("mkdir", path, e))
    }
}

#[async_trait]
impl FsRead for S3Adapter {
    async fn read_file(&self, path: &str) -> Result<Vec<u8>, FsError> {
        let at = self.locate("read_file", path)?;
        self.client
            .get_object(&at.key)
            .await
            .map_err(|e| map_s3_error("read_file", path, e))
    }

    async fn stat(&self, path: &str) -> Result<FileStats, FsError> {
        let at = self.locate("stat", path)?;
        self.stat_located("stat", path, &at).await
    }

    async fn lstat(&self, path: &str) -> Result<FileStats, FsError> {
        let at = self.locate("lstat", path)?;
        self.stat_located("lstat", path, &at).await
    }

    async fn access(&self, path: &str, _mode: AccessMode) -> Result<(), FsError> {
        // Bucket policy is only known per request; existence is what can be checked.
        let at = self.locate("access", path)?;
        self.stat_located("access", path, &at).await.map(|_| ())
    }

    async fn realpath(&self, path: &str) -> Result<String, FsError> {
        let at = self.locate("realpath", path)?;
        self.stat_located("realpath", path, &at).await?;
        Ok(at.relative)
    }

    async fn create_read_stream(&self, path: &str) -> Result<ReadStream, FsError> {
        let at = self.locate("create_read_stream", path)?;
        self.client
            .get_object_stream(&at.key)
            .await
            .map_err(|e| map_s3_error("create_read_stream", path, e))
    }
}

#[async_trait]
impl FsWrite for S3Adapter {
    async fn write_file(&self, path: &str, data: &[u8]) -> Result<(), FsError> {
        let at = Self::file_at("write_file", path, self.locate("write_file", path)?)?;
        self.client
            .put_object(&at.key, data.to_vec())
            .await
            .map_err(|e| map_s3_error("write_file", path, e))
    }

    async fn append_file(&self, path: &str, data: &[u8]) -> Result<(), FsError> {
        let at = Self::file_at("append_file", path, self.locate("append_file", path)?)?;
        let mut contents = match self.client.get_object(&at.key).await {
            Ok(existing) => existing,
            Err(e) => {
                let err = map_s3_error("append_file", path, e);
                if !err.is_not_found() {
                    return Err(err);
                }
                Vec::new()
            }
        };
        tracing::debug!(
            backend = "s3",
            key = %at.key,
            existing = contents.len(),
            appended = data.len(),
            "append rewrites the whole object"
        );
        contents.extend_from_slice(data);
        self.client
            .put_object(&at.key, contents)
            .await
            .map_err(|e| map_s3_error("append_file", path, e))
    }

    async fn unlink(&self, path: &str) -> Result<(), FsError> {
        let at = Self::file_at("unlink", path, self.locate("unlink", path)?)?;
        if self.head("unlink", path, &at.key).await?.is_none() {
            return Err(Self::not_found("unlink", path));
        }
        self.client
            .delete_object(&at.key)
            .await
            .map_err(|e| map_s3_error("unlink", path, e))
    }

    async fn copy_file(&self, from: &str, to: &str) -> Result<(), FsError> {
        let source = Self::file_at("copy_file", from, self.locate("copy_file", from)?)?;
        let target = Self::file_at("copy_file", to, self.locate_quiet(to)?)?;
        self.client
            .copy_object(&source.key, &target.key)
            .await
            .map_err(|e| map_s3_error("copy_file", from, e))
    }

    async fn rename(&self, from: &str, to: &str) -> Result<(), FsError> {
        let source = Self::file_at("rename", from, self.locate("rename", from)?)?;
        let target = Self::file_at("rename", to, self.locate_quiet(to)?)?;
        self.client
            .copy_object(&source.key, &target.key)
            .await
            .map_err(|e| map_s3_error("rename", from, e))?;

        // The copy is not rolled back; both keys exist if this fails.
        self.client.delete_object(&source.key).await.map_err(|e| {
            tracing::warn!(backend = "s3", from = %source.key, to = %target.key, "rename copied but could not delete source");
            map_s3_error("rename", from, e)
        })
    }

    async fn create_write_stream(&self, path: &str) -> Result<WriteStream, FsError> {
        let at = Self::file_at(
            "create_write_stream",
            path,
            self.locate("create_write_stream", path)?,
        )?;
        Ok(Box::pin(ObjectWriteStream::new(
            Arc::clone(&self.client),
            at.key,
            path,
        )))
    }
}

#[async_trait]
impl FsDir for S3Adapter {
    async fn readdir(&self, path: &str) -> Result<Vec<String>, FsError> {
        let at = self.locate("readdir", path)?;
        // `None` only for the bucket root without a key prefix.
        let prefix = dir_prefix(&at.key);
        let strip = prefix.as_deref().unwrap_or("");

        let mut names = Vec::new();
        let mut saw_marker = false;
        let mut token = None;
        loop {
            let page = self
                .client
                .list_objects(ListRequest {
                    prefix: prefix.clone(),
                    delimiter: Some("/".to_owned()),
                    continuation_token: token.take(),
                    max_keys: None,
                })
                .await
                .map_err(|e| map_s3_error("readdir", path, e))?;

            for object in &page.objects {
                match object.key.strip_prefix(strip) {
                    Some("") => saw_marker = true,
                    Some(name) => names.push(name.to_owned()),
                    None => {}
                }
            }
            for common in &page.common_prefixes {
                let name = common
                    .strip_prefix(strip)
                    .map(|n| n.trim_end_matches('/'))
                    .unwrap_or_default();
                if !name.is_empty() {
                    names.push(name.to_owned());
                }
            }

            match page.next_continuation_token {
                Some(next) => token = Some(next),
                None => break,
            }
        }

        if names.is_empty() && !saw_marker && !at.is_root() {
            return match self.head("readdir", path, &at.key).await? {
                Some(_) => Err(Self::other("readdir", path, "not a directory")),
                None => Err(Self::not_found("readdir", path)),
            };
        }

        names.sort();
        names.dedup();
        Ok(names)
    }

    async fn mkdir(&self, path: &str, options: DirOptions) -> Result<(), FsError> {
        let at = self.locate("mkdir", path)?;
        if at.is_root() {
            return if options.recursive {
                Ok(())
            } else {
                Err(Self::other("mkdir", path, "directory already exists"))
            };
        }

        if options.recursive {
            let mut level = String::new();
            for segment in at.relative.split('/') {
                if !level.is_empty() {
                    level.push('/');
                }
                level.push_str(segment);
                let step = self.locate_quiet(&level)?;
                if self.head("mkdir", path, &step.key).await?.is_some() {
                    return Err(Self::other("mkdir", path, "file exists"));
                }
                self.put_marker(path, step.marker()).await?;
            }
            return Ok(());
        }

        let parent_dir = parent(&at.relative);
        if !parent_dir.is_empty() {
            let parent_marker = self.locate_quiet(parent_dir)?.marker();
            if self.head("mkdir", path, &parent_marker).await?.is_none() {
                return Err(FsError::Storage {
                    message: format!("parent directory does not exist: {parent_dir}"),
                    path: path.to_owned(),
                    operation: "mkdir",
                    source: None,
                });
            }
        }
        // A file, a marker or descendants without a marker all count.
        match self.stat_located("mkdir", path, &at).await {
            Ok(_) => return Err(Self::other("mkdir", path, "already exists")),
            Err(e) if e.is_not_found() => {}
            Err(e) => return Err(e),
        }
        self.put_marker(path, at.marker()).await
    }

    async fn rmdir(&self, path: &str, options: DirOptions) -> Result<(), FsError> {
        let at = self.locate("rmdir", path)?;
        if at.is_root() {
            return Err(FsError::PermissionDenied {
                path: path.to_owned(),
                operation: "rmdir",
                source: None,
            });
        }
        let marker = at.marker();

        if !options.recursive {
            let page = self
                .client
                .list_objects(ListRequest {
                    prefix: Some(marker.clone()),
                    max_keys: Some(2),
                    ..ListRequest::default()
                })
                .await
                .map_err(|e| map_s3_error("rmdir", path, e))?;
            if page.objects.iter().any(|o| o.key != marker) {
                return Err(Self::other("rmdir", path, "directory not empty"));
            }
            if page.objects.is_empty() {
                return Err(Self::not_found("rmdir", path));
            }
            return self
                .client
                .delete_object(&marker)
                .await
                .map_err(|e| map_s3_error("rmdir", path, e));
        }

        let mut deleted = 0usize;
        let mut token = None;
        loop {
            let page = self
                .client
                .list_objects(ListRequest {
                    prefix: Some(marker.clone()),
                    continuation_token: token.take(),
                    ..ListRequest::default()
                })
                .await
                .map_err(|e| map_s3_error("rmdir", path, e))?;
            for object in &page.objects {
                self.client
                    .delete_object(&object.key)
                    .await
                    .map_err(|e| map_s3_error("rmdir", path, e))?;
                deleted += 1;
            }
            match page.next_continuation_token {
                Some(next) => token = Some(next),
                None => break,
            }
        }

        tracing::debug!(backend = "s3", prefix = %marker, deleted, "recursive rmdir");
        if deleted == 0 {
            return Err(Self::not_found("rmdir", path));
        }
        Ok(())
    }
}
