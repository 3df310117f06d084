//! The transport seam between [`S3Adapter`](super::S3Adapter) and an
//! S3-compatible service.

use std::time::SystemTime;

use async_trait::async_trait;

use crate::{BoxError, ReadStream};

/// Transport-level failure classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportFailure {
    /// The request or connection timed out.
    Timeout,
    /// The service could not be reached or the connection broke.
    Connectivity,
}

/// Failure reported by an [`ObjectClient`].
#[derive(Debug, thiserror::Error)]
#[error("object store request failed (code: {code:?}, status: {status:?}): {source}")]
pub struct ObjectStoreError {
    /// Provider error code, e.g. `NoSuchKey`.
    pub code: Option<String>,
    /// HTTP status of the response, when one was received.
    pub status: Option<u16>,
    /// Set when the request never produced a response.
    pub transport: Option<TransportFailure>,
    /// The native error.
    #[source]
    pub source: BoxError,
}

impl ObjectStoreError {
    /// A service response carrying an error code.
    pub fn service(code: impl Into<String>, status: u16, source: impl Into<BoxError>) -> Self {
        Self {
            code: Some(code.into()),
            status: Some(status),
            transport: None,
            source: source.into(),
        }
    }

    /// A request that failed before a response arrived.
    pub fn transport(failure: TransportFailure, source: impl Into<BoxError>) -> Self {
        Self {
            code: None,
            status: None,
            transport: Some(failure),
            source: source.into(),
        }
    }
}

/// Result of a metadata-head request.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectHead {
    /// Content length in bytes.
    pub size: u64,
    /// Last modification time reported by the service.
    pub last_modified: Option<SystemTime>,
}

/// One object in a listing page.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectSummary {
    /// Full object key.
    pub key: String,
    /// Size in bytes.
    pub size: u64,
    /// Last modification time reported by the service.
    pub last_modified: Option<SystemTime>,
}

/// A `ListObjectsV2` request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListRequest {
    /// Key prefix. `None` means "omit the parameter", which is not the same
    /// as sending an empty string to every server.
    pub prefix: Option<String>,
    /// Group keys by this delimiter into common prefixes.
    pub delimiter: Option<String>,
    /// Continuation token from the previous page.
    pub continuation_token: Option<String>,
    /// Page size limit.
    pub max_keys: Option<i32>,
}

/// One page of a listing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListPage {
    /// Objects directly matched.
    pub objects: Vec<ObjectSummary>,
    /// Common prefixes (simulated subdirectories), including the delimiter.
    pub common_prefixes: Vec<String>,
    /// Token for the next page, `None` on the last page.
    pub next_continuation_token: Option<String>,
}

/// Minimal S3 operation set bound to a single bucket.
///
/// Keys passed in are full object keys (prefix already applied).
#[async_trait]
pub trait ObjectClient: Send + Sync {
    /// `HeadObject`.
    async fn head_object(&self, key: &str) -> Result<ObjectHead, ObjectStoreError>;

    /// `GetObject`, collected into memory.
    async fn get_object(&self, key: &str) -> Result<Vec<u8>, ObjectStoreError>;

    /// `GetObject`, exposing the response body as a stream.
    async fn get_object_stream(&self, key: &str) -> Result<ReadStream, ObjectStoreError>;

    /// `PutObject`.
    async fn put_object(&self, key: &str, body: Vec<u8>) -> Result<(), ObjectStoreError>;

    /// Server-side `CopyObject` within the bucket.
    async fn copy_object(&self, from: &str, to: &str) -> Result<(), ObjectStoreError>;

    /// `DeleteObject`. Deleting a missing key succeeds.
    async fn delete_object(&self, key: &str) -> Result<(), ObjectStoreError>;

    /// `ListObjectsV2`, one page.
    async fn list_objects(&self, request: ListRequest) -> Result<ListPage, ObjectStoreError>;
}
