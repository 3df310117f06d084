//! Adapter configuration.
//!
//! [`AdapterConfig`] is the tagged union the factory consumes. It deserializes
//! from the same JSON shape the host configuration layer produces:
//!
//! ```rust
//! use anyfs_adapters::AdapterConfig;
//!
//! let config = AdapterConfig::from_json(serde_json::json!({
//!     "type": "s3",
//!     "bucket": "assets",
//!     "region": "eu-central-1",
//!     "forcePathStyle": true,
//! }))
//! .unwrap();
//! assert_eq!(config.backend(), "s3");
//! ```

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::FsError;

/// Callback receiving one-line debug messages when `debug` is enabled.
#[derive(Clone)]
pub struct Logger(Arc<dyn Fn(&str) + Send + Sync>);

impl Logger {
    /// Wrap a callback.
    pub fn new(callback: impl Fn(&str) + Send + Sync + 'static) -> Self {
        Self(Arc::new(callback))
    }

    /// Pass a message to the callback.
    pub fn log(&self, message: &str) {
        (self.0)(message)
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Logger(..)")
    }
}

/// Configuration for either backend, discriminated by `type`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum AdapterConfig {
    /// Local-disk adapter.
    Local(LocalConfig),
    /// S3-compatible object-storage adapter.
    S3(S3Config),
}

impl AdapterConfig {
    /// Parse a configuration value.
    ///
    /// # Errors
    ///
    /// - [`FsError::Validation`] for an unknown `type`, missing required
    ///   fields, or fields of the wrong type
    pub fn from_json(value: serde_json::Value) -> Result<Self, FsError> {
        let config: AdapterConfig = serde_json::from_value(value)
            .map_err(|e| FsError::validation("create_adapter", e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check required fields.
    pub fn validate(&self) -> Result<(), FsError> {
        match self {
            AdapterConfig::Local(config) => config.validate(),
            AdapterConfig::S3(config) => config.validate(),
        }
    }

    /// The discriminant: `"local"` or `"s3"`.
    pub fn backend(&self) -> &'static str {
        match self {
            AdapterConfig::Local(_) => "local",
            AdapterConfig::S3(_) => "s3",
        }
    }
}

impl From<LocalConfig> for AdapterConfig {
    fn from(config: LocalConfig) -> Self {
        AdapterConfig::Local(config)
    }
}

impl From<S3Config> for AdapterConfig {
    fn from(config: S3Config) -> Self {
        AdapterConfig::S3(config)
    }
}

/// Local-disk adapter settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalConfig {
    /// Root directory; every resolved path stays below it.
    pub base_path: PathBuf,
    /// Create missing parent directories before write-type calls.
    #[serde(default)]
    pub create_missing_dirs: bool,
    /// Per-call timeout in milliseconds.
    #[serde(default)]
    pub timeout: Option<u64>,
    /// Retry budget.
    #[serde(default)]
    pub max_retries: Option<u32>,
    /// Forward call traces to `logger`.
    #[serde(default)]
    pub debug: bool,
    /// Debug message sink.
    #[serde(skip)]
    pub logger: Option<Logger>,
}

impl LocalConfig {
    /// Settings rooted at `base_path`.
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
            ..Default::default()
        }
    }

    /// Enable or disable parent directory auto-creation.
    pub fn with_create_missing_dirs(mut self, enabled: bool) -> Self {
        self.create_missing_dirs = enabled;
        self
    }

    /// Enable debug traces through `logger`.
    pub fn with_logger(mut self, logger: Logger) -> Self {
        self.debug = true;
        self.logger = Some(logger);
        self
    }

    /// Check that a base path is set.
    pub fn validate(&self) -> Result<(), FsError> {
        if self.base_path.as_os_str().is_empty() {
            return Err(FsError::validation("create_adapter", "basePath is required"));
        }
        Ok(())
    }
}

/// S3-compatible adapter settings.
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct S3Config {
    /// Bucket name.
    pub bucket: String,
    /// Region, also used to sign requests against custom endpoints.
    pub region: String,
    /// Access key id. Without it the ambient credential chain is used.
    #[serde(default)]
    pub access_key_id: Option<String>,
    /// Secret access key, required together with `access_key_id`.
    #[serde(default)]
    pub secret_access_key: Option<String>,
    /// Custom endpoint for S3-compatible services.
    #[serde(default)]
    pub endpoint: Option<String>,
    /// Use path-style (`endpoint/bucket/key`) addressing.
    #[serde(default)]
    pub force_path_style: bool,
    /// Namespace prepended to every key.
    #[serde(default)]
    pub prefix: Option<String>,
    /// Per-call timeout in milliseconds.
    #[serde(default)]
    pub timeout: Option<u64>,
    /// Retries after the first attempt.
    #[serde(default)]
    pub max_retries: Option<u32>,
    /// Forward call traces to `logger`.
    #[serde(default)]
    pub debug: bool,
    /// Debug message sink.
    #[serde(skip)]
    pub logger: Option<Logger>,
}

impl S3Config {
    /// Settings for `bucket` in `region`.
    pub fn new(bucket: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            region: region.into(),
            ..Default::default()
        }
    }

    /// Use static credentials.
    pub fn with_credentials(
        mut self,
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
    ) -> Self {
        self.access_key_id = Some(access_key_id.into());
        self.secret_access_key = Some(secret_access_key.into());
        self
    }

    /// Use a custom endpoint (MinIO, R2, ...).
    pub fn with_endpoint(mut self, endpoint: impl Into<String>, force_path_style: bool) -> Self {
        self.endpoint = Some(endpoint.into());
        self.force_path_style = force_path_style;
        self
    }

    /// Namespace keys under `prefix`.
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    /// Enable debug traces through `logger`.
    pub fn with_logger(mut self, logger: Logger) -> Self {
        self.debug = true;
        self.logger = Some(logger);
        self
    }

    /// Check required fields, credential pairing and the key prefix.
    pub fn validate(&self) -> Result<(), FsError> {
        if self.bucket.trim().is_empty() {
            return Err(FsError::validation("create_adapter", "bucket is required"));
        }
        if self.region.trim().is_empty() {
            return Err(FsError::validation("create_adapter", "region is required"));
        }
        match (&self.access_key_id, &self.secret_access_key) {
            (Some(_), None) | (None, Some(_)) => {
                return Err(FsError::validation(
                    "create_adapter",
                    "accessKeyId and secretAccessKey must be given together",
                ));
            }
            _ => {}
        }
        if let Some(prefix) = &self.prefix {
            crate::path::normalize(prefix).map_err(|_| {
                FsError::validation("create_adapter", format!("invalid key prefix: {prefix}"))
            })?;
        }
        Ok(())
    }
}

impl fmt::Debug for S3Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("S3Config")
            .field("bucket", &self.bucket)
            .field("region", &self.region)
            .field("access_key_id", &self.access_key_id)
            .field(
                "secret_access_key",
                &self.secret_access_key.as_ref().map(|_| "[REDACTED]"),
            )
            .field("endpoint", &self.endpoint)
            .field("force_path_style", &self.force_path_style)
            .field("prefix", &self.prefix)
            .field("timeout", &self.timeout)
            .field("max_retries", &self.max_retries)
            .field("debug", &self.debug)
            .field("logger", &self.logger)
            .finish()
    }
}

/// Emit the per-call debug trace shared by both adapters.
pub(crate) fn trace_call(
    backend: &'static str,
    debug: bool,
    logger: Option<&Logger>,
    operation: &'static str,
    path: &str,
) {
    tracing::debug!(backend, operation, path, "storage call");
    if debug {
        if let Some(logger) = logger {
            logger.log(&format!("[{backend}] {operation} {path}"));
        }
    }
}
