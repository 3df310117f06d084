//! [`ObjectClient`] backed by the AWS SDK.

use std::time::{Duration, SystemTime};

use async_trait::async_trait;
use aws_config::default_provider::credentials::DefaultCredentialsChain;
use aws_config::retry::RetryConfig;
use aws_config::timeout::TimeoutConfig;
use aws_config::{BehaviorVersion, Region};
use aws_credential_types::Credentials;
use aws_credential_types::provider::{ProvideCredentials, future};
use aws_sdk_s3::Client as S3Client;
use aws_sdk_s3::config::http::HttpResponse;
use aws_sdk_s3::error::{ProvideErrorMetadata, SdkError};
use aws_sdk_s3::primitives::{ByteStream, DateTime};
use tokio::sync::OnceCell;

use super::client::{
    ListPage, ListRequest, ObjectClient, ObjectHead, ObjectStoreError, ObjectSummary,
    TransportFailure,
};
use crate::{FsError, ReadStream, S3Config};

/// Production client talking to S3 or an S3-compatible server.
#[derive(Debug, Clone)]
pub struct SdkObjectClient {
    client: S3Client,
    bucket: String,
}

impl SdkObjectClient {
    /// Build a client from adapter configuration.
    ///
    /// No network traffic happens here. When no static credentials are
    /// configured, the default provider chain (environment, profile files,
    /// instance metadata) is resolved on the first request.
    ///
    /// # Errors
    ///
    /// - [`FsError::Validation`] if the configuration is invalid
    pub fn new(config: &S3Config) -> Result<Self, FsError> {
        config.validate()?;

        let mut builder = aws_sdk_s3::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .force_path_style(config.force_path_style);

        builder = match (&config.access_key_id, &config.secret_access_key) {
            (Some(id), Some(secret)) => builder.credentials_provider(Credentials::new(
                id.clone(),
                secret.clone(),
                None,
                None,
                "anyfs-static",
            )),
            _ => builder.credentials_provider(AmbientCredentials::new(&config.region)),
        };

        if let Some(endpoint) = &config.endpoint {
            builder = builder.endpoint_url(endpoint);
        }
        if let Some(retries) = config.max_retries {
            builder = builder
                .retry_config(RetryConfig::standard().with_max_attempts(retries.saturating_add(1)));
        }
        if let Some(timeout) = config.timeout {
            builder = builder.timeout_config(
                TimeoutConfig::builder()
                    .operation_timeout(Duration::from_millis(timeout))
                    .build(),
            );
        }

        Ok(Self {
            client: S3Client::from_conf(builder.build()),
            bucket: config.bucket.clone(),
        })
    }

    /// The bucket all requests go to.
    pub fn bucket(&self) -> &str {
        &self.bucket
    }
}

/// Default credential chain, built on first use so construction stays
/// synchronous.
#[derive(Debug)]
struct AmbientCredentials {
    region: String,
    chain: OnceCell<DefaultCredentialsChain>,
}

impl AmbientCredentials {
    fn new(region: &str) -> Self {
        Self {
            region: region.to_owned(),
            chain: OnceCell::new(),
        }
    }
}

impl ProvideCredentials for AmbientCredentials {
    fn provide_credentials<'a>(&'a self) -> future::ProvideCredentials<'a>
    where
        Self: 'a,
    {
        future::ProvideCredentials::new(async move {
            let chain = self
                .chain
                .get_or_init(|| async {
                    DefaultCredentialsChain::builder()
                        .region(Region::new(self.region.clone()))
                        .build()
                        .await
                })
                .await;
            chain.provide_credentials().await
        })
    }
}

fn from_sdk<E>(err: SdkError<E, HttpResponse>) -> ObjectStoreError
where
    E: ProvideErrorMetadata + std::error::Error + Send + Sync + 'static,
{
    let failure = match &err {
        SdkError::TimeoutError(_) => Some(TransportFailure::Timeout),
        SdkError::DispatchFailure(dispatch) if dispatch.is_timeout() => {
            Some(TransportFailure::Timeout)
        }
        SdkError::DispatchFailure(_) => Some(TransportFailure::Connectivity),
        _ => None,
    };
    if let Some(failure) = failure {
        return ObjectStoreError::transport(failure, err);
    }

    let code = err.code().map(str::to_owned);
    let status = err.raw_response().map(|r| r.status().as_u16());
    ObjectStoreError {
        code,
        status,
        transport: None,
        source: Box::new(err),
    }
}

fn to_system_time(time: Option<&DateTime>) -> Option<SystemTime> {
    time.and_then(|t| SystemTime::try_from(*t).ok())
}

fn to_size(length: Option<i64>) -> u64 {
    length.and_then(|n| u64::try_from(n).ok()).unwrap_or(0)
}

#[async_trait]
impl ObjectClient for SdkObjectClient {
    async fn head_object(&self, key: &str) -> Result<ObjectHead, ObjectStoreError> {
        let response = self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(from_sdk)?;
        Ok(ObjectHead {
            size: to_size(response.content_length()),
            last_modified: to_system_time(response.last_modified()),
        })
    }

    async fn get_object(&self, key: &str) -> Result<Vec<u8>, ObjectStoreError> {
        let response = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(from_sdk)?;
        let bytes = response
            .body
            .collect()
            .await
            .map_err(|e| ObjectStoreError::transport(TransportFailure::Connectivity, e))?;
        Ok(bytes.into_bytes().to_vec())
    }

    async fn get_object_stream(&self, key: &str) -> Result<ReadStream, ObjectStoreError> {
        let response = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(from_sdk)?;
        Ok(Box::pin(response.body.into_async_read()))
    }

    async fn put_object(&self, key: &str, body: Vec<u8>) -> Result<(), ObjectStoreError> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(body))
            .send()
            .await
            .map_err(from_sdk)?;
        Ok(())
    }

    async fn copy_object(&self, from: &str, to: &str) -> Result<(), ObjectStoreError> {
        let source = format!(
            "{}/{}",
            self.bucket,
            urlencoding::encode(from).replace("%2F", "/")
        );
        self.client
            .copy_object()
            .bucket(&self.bucket)
            .copy_source(source)
            .key(to)
            .send()
            .await
            .map_err(from_sdk)?;
        Ok(())
    }

    async fn delete_object(&self, key: &str) -> Result<(), ObjectStoreError> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(from_sdk)?;
        Ok(())
    }

    async fn list_objects(&self, request: ListRequest) -> Result<ListPage, ObjectStoreError> {
        // `set_prefix(None)` leaves the query parameter out entirely.
        let response = self
            .client
            .list_objects_v2()
            .bucket(&self.bucket)
            .set_prefix(request.prefix)
            .set_delimiter(request.delimiter)
            .set_continuation_token(request.continuation_token)
            .set_max_keys(request.max_keys)
            .send()
            .await
            .map_err(from_sdk)?;

        let objects = response
            .contents()
            .iter()
            .filter_map(|object| {
                Some(ObjectSummary {
                    key: object.key()?.to_owned(),
                    size: to_size(object.size()),
                    last_modified: to_system_time(object.last_modified()),
                })
            })
            .collect();
        let common_prefixes = response
            .common_prefixes()
            .iter()
            .filter_map(|p| p.prefix().map(str::to_owned))
            .collect();
        let next_continuation_token = if response.is_truncated().unwrap_or(false) {
            response.next_continuation_token().map(str::to_owned)
        } else {
            None
        };

        Ok(ListPage {
            objects,
            common_prefixes,
            next_continuation_token,
        })
    }
}
