//! In-process [`ObjectClient`] with S3 listing semantics.
//!
//! Useful for tests and for running code written against [`S3Adapter`]
//! without a server. It rejects an explicit empty `Prefix` the way some
//! path-style S3-compatible servers do.
//!
//! [`S3Adapter`]: super::S3Adapter

use std::collections::BTreeMap;
use std::sync::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::SystemTime;

use async_trait::async_trait;

use super::client::{
    ListPage, ListRequest, ObjectClient, ObjectHead, ObjectStoreError, ObjectSummary,
};
use crate::ReadStream;

const DEFAULT_PAGE_SIZE: usize = 1000;

#[derive(Debug, Clone)]
struct StoredObject {
    data: Vec<u8>,
    modified: SystemTime,
}

/// Where a listing resumes. Tokens are opaque to callers.
enum Resume {
    AfterKey(String),
    AfterPrefix(String),
}

impl Resume {
    fn parse(token: &str) -> Option<Self> {
        if let Some(key) = token.strip_prefix("k:") {
            Some(Resume::AfterKey(key.to_owned()))
        } else {
            token
                .strip_prefix("p:")
                .map(|p| Resume::AfterPrefix(p.to_owned()))
        }
    }

    fn skips(&self, key: &str) -> bool {
        match self {
            Resume::AfterKey(last) => key <= last.as_str(),
            Resume::AfterPrefix(prefix) => key < prefix.as_str() || key.starts_with(prefix),
        }
    }
}

/// A bucket held in memory.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use anyfs_adapters::{FsDir, FsWrite, MemoryObjectClient, S3Adapter, S3Config};
///
/// # async fn demo() -> Result<(), anyfs_adapters::FsError> {
/// let client = Arc::new(MemoryObjectClient::new().with_page_size(2));
/// let fs = S3Adapter::with_client(S3Config::new("test", "us-east-1"), client)?;
/// fs.write_file("a.txt", b"a").await?;
/// assert_eq!(fs.readdir("/").await?, ["a.txt"]);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct MemoryObjectClient {
    objects: RwLock<BTreeMap<String, StoredObject>>,
    page_size: usize,
    fail_deletes: AtomicBool,
    fail_puts: AtomicBool,
}

impl Default for MemoryObjectClient {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryObjectClient {
    /// An empty bucket.
    pub fn new() -> Self {
        Self {
            objects: RwLock::new(BTreeMap::new()),
            page_size: DEFAULT_PAGE_SIZE,
            fail_deletes: AtomicBool::new(false),
            fail_puts: AtomicBool::new(false),
        }
    }

    /// Cap every listing page at `page_size` entries (minimum 1).
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Make every subsequent delete fail with `AccessDenied`.
    pub fn fail_deletes(&self, fail: bool) {
        self.fail_deletes.store(fail, Ordering::SeqCst);
    }

    /// Make every subsequent put fail with `AccessDenied`.
    pub fn fail_puts(&self, fail: bool) {
        self.fail_puts.store(fail, Ordering::SeqCst);
    }

    /// All keys currently stored, in order.
    pub fn keys(&self) -> Vec<String> {
        self.read().keys().cloned().collect()
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, BTreeMap<String, StoredObject>> {
        self.objects.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, BTreeMap<String, StoredObject>> {
        self.objects.write().unwrap_or_else(|e| e.into_inner())
    }

    fn get(&self, key: &str) -> Result<StoredObject, ObjectStoreError> {
        self.read()
            .get(key)
            .cloned()
            .ok_or_else(|| no_such_key(key))
    }
}

fn no_such_key(key: &str) -> ObjectStoreError {
    ObjectStoreError::service("NoSuchKey", 404, format!("no such key: {key}"))
}

fn denied(action: &str, key: &str) -> ObjectStoreError {
    ObjectStoreError::service("AccessDenied", 403, format!("{action} {key}: access denied"))
}

#[async_trait]
impl ObjectClient for MemoryObjectClient {
    async fn head_object(&self, key: &str) -> Result<ObjectHead, ObjectStoreError> {
        // HEAD responses carry no body, so only the bare status comes back.
        let object = self.read().get(key).cloned().ok_or_else(|| ObjectStoreError {
            code: None,
            status: Some(404),
            transport: None,
            source: format!("head {key}: 404").into(),
        })?;
        Ok(ObjectHead {
            size: object.data.len() as u64,
            last_modified: Some(object.modified),
        })
    }

    async fn get_object(&self, key: &str) -> Result<Vec<u8>, ObjectStoreError> {
        Ok(self.get(key)?.data)
    }

    async fn get_object_stream(&self, key: &str) -> Result<ReadStream, ObjectStoreError> {
        let data = self.get(key)?.data;
        Ok(Box::pin(std::io::Cursor::new(data)))
    }

    async fn put_object(&self, key: &str, body: Vec<u8>) -> Result<(), ObjectStoreError> {
        if self.fail_puts.load(Ordering::SeqCst) {
            return Err(denied("put", key));
        }
        self.write().insert(
            key.to_owned(),
            StoredObject {
                data: body,
                modified: SystemTime::now(),
            },
        );
        Ok(())
    }

    async fn copy_object(&self, from: &str, to: &str) -> Result<(), ObjectStoreError> {
        let mut objects = self.write();
        let mut object = objects.get(from).cloned().ok_or_else(|| no_such_key(from))?;
        object.modified = SystemTime::now();
        objects.insert(to.to_owned(), object);
        Ok(())
    }

    async fn delete_object(&self, key: &str) -> Result<(), ObjectStoreError> {
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(denied("delete", key));
        }
        self.write().remove(key);
        Ok(())
    }

    async fn list_objects(&self, request: ListRequest) -> Result<ListPage, ObjectStoreError> {
        let prefix = match request.prefix {
            Some(p) if p.is_empty() => {
                return Err(ObjectStoreError::service(
                    "InvalidArgument",
                    400,
                    "empty Prefix parameter is not accepted",
                ));
            }
            Some(p) => p,
            None => String::new(),
        };
        let resume = request.continuation_token.as_deref().and_then(Resume::parse);
        let limit = request
            .max_keys
            .and_then(|n| usize::try_from(n).ok())
            .map_or(self.page_size, |n| n.clamp(1, self.page_size));
        let delimiter = request.delimiter.filter(|d| !d.is_empty());

        let objects = self.read();
        let mut page = ListPage::default();
        let mut last: Option<Resume> = None;
        let mut taken = 0;

        for (key, object) in objects.range(prefix.clone()..) {
            if !key.starts_with(&prefix) {
                break;
            }
            if resume.as_ref().is_some_and(|r| r.skips(key)) {
                continue;
            }
            if let Some(Resume::AfterPrefix(common)) = &last {
                if key.starts_with(common.as_str()) {
                    continue;
                }
            }

            let rest = &key[prefix.len()..];
            let entry = match delimiter.as_deref().and_then(|d| rest.find(d).map(|i| i + d.len())) {
                Some(end) => Resume::AfterPrefix(format!("{prefix}{}", &rest[..end])),
                None => Resume::AfterKey(key.clone()),
            };

            if taken == limit {
                page.next_continuation_token = last.map(|r| match r {
                    Resume::AfterKey(k) => format!("k:{k}"),
                    Resume::AfterPrefix(p) => format!("p:{p}"),
                });
                break;
            }

            match &entry {
                Resume::AfterKey(k) => page.objects.push(ObjectSummary {
                    key: k.clone(),
                    size: object.data.len() as u64,
                    last_modified: Some(object.modified),
                }),
                Resume::AfterPrefix(p) => page.common_prefixes.push(p.clone()),
            }
            last = Some(entry);
            taken += 1;
        }

        Ok(page)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn seeded(keys: &[&str]) -> MemoryObjectClient {
        let client = MemoryObjectClient::new();
        for key in keys {
            client.put_object(key, key.as_bytes().to_vec()).await.unwrap();
        }
        client
    }

    fn delimited(prefix: Option<&str>) -> ListRequest {
        ListRequest {
            prefix: prefix.map(str::to_owned),
            delimiter: Some("/".to_owned()),
            ..ListRequest::default()
        }
    }

    #[tokio::test]
    async fn explicit_empty_prefix_is_rejected() {
        let client = MemoryObjectClient::new();
        let err = client.list_objects(delimited(Some(""))).await.unwrap_err();
        assert_eq!(err.code.as_deref(), Some("InvalidArgument"));
        assert!(client.list_objects(delimited(None)).await.is_ok());
    }

    #[tokio::test]
    async fn delimiter_groups_common_prefixes() {
        let client = seeded(&["a.txt", "d/", "d/x", "d/y/z", "e/f"]).await;

        let root = client.list_objects(delimited(None)).await.unwrap();
        let keys: Vec<_> = root.objects.iter().map(|o| o.key.as_str()).collect();
        assert_eq!(keys, ["a.txt"]);
        assert_eq!(root.common_prefixes, ["d/", "e/"]);

        let dir = client.list_objects(delimited(Some("d/"))).await.unwrap();
        let keys: Vec<_> = dir.objects.iter().map(|o| o.key.as_str()).collect();
        assert_eq!(keys, ["d/", "d/x"]);
        assert_eq!(dir.common_prefixes, ["d/y/"]);
    }

    #[tokio::test]
    async fn pagination_visits_every_key_once() {
        let client = seeded(&["p/1", "p/2", "p/3", "p/4", "p/5"])
            .await
            .with_page_size(2);

        let mut seen = Vec::new();
        let mut token = None;
        loop {
            let page = client
                .list_objects(ListRequest {
                    prefix: Some("p/".to_owned()),
                    continuation_token: token.take(),
                    ..ListRequest::default()
                })
                .await
                .unwrap();
            assert!(page.objects.len() <= 2);
            seen.extend(page.objects.into_iter().map(|o| o.key));
            match page.next_continuation_token {
                Some(t) => token = Some(t),
                None => break,
            }
        }
        assert_eq!(seen, ["p/1", "p/2", "p/3", "p/4", "p/5"]);
    }

    #[tokio::test]
    async fn paginated_common_prefixes_are_not_repeated() {
        let client = seeded(&["a/1", "a/2", "b/1", "c"]).await.with_page_size(1);

        let mut entries = Vec::new();
        let mut token = None;
        loop {
            let mut request = delimited(None);
            request.continuation_token = token.take();
            let page = client.list_objects(request).await.unwrap();
            entries.extend(page.common_prefixes);
            entries.extend(page.objects.into_iter().map(|o| o.key));
            match page.next_continuation_token {
                Some(t) => token = Some(t),
                None => break,
            }
        }
        assert_eq!(entries, ["a/", "b/", "c"]);
    }

    #[tokio::test]
    async fn missing_keys_report_not_found() {
        let client = MemoryObjectClient::new();
        assert_eq!(client.head_object("x").await.unwrap_err().status, Some(404));
        let err = client.get_object("x").await.unwrap_err();
        assert_eq!(err.code.as_deref(), Some("NoSuchKey"));
        let err = client.copy_object("x", "y").await.unwrap_err();
        assert_eq!(err.code.as_deref(), Some("NoSuchKey"));
        client.delete_object("x").await.unwrap();
    }

    #[tokio::test]
    async fn injected_delete_failures() {
        let client = seeded(&["k"]).await;
        client.fail_deletes(true);
        let err = client.delete_object("k").await.unwrap_err();
        assert_eq!(err.code.as_deref(), Some("AccessDenied"));
        assert_eq!(client.keys(), ["k"]);
    }

    #[tokio::test]
    async fn injected_put_failures() {
        let client = seeded(&["k"]).await;
        client.fail_puts(true);
        let err = client.put_object("j", b"j".to_vec()).await.unwrap_err();
        assert_eq!(err.status, Some(403));
        assert_eq!(client.keys(), ["k"]);
    }
}
