use std::time::Duration;

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::config::Region;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::Client;
use reqwest::Url;
use tracing::{debug, info};

use configs::AttachmentsConfig;

use super::AttachmentStore;
use crate::errors::ServiceError;

/// Presigns `PUT` URLs against an S3 (or S3-compatible) bucket.
#[derive(Clone)]
pub struct S3AttachmentStore {
    client: Client,
    bucket: String,
    public_base: Url,
    expires: Duration,
}

impl std::fmt::Debug for S3AttachmentStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("S3AttachmentStore")
            .field("bucket", &self.bucket)
            .field("public_base", &self.public_base.as_str())
            .field("expires", &self.expires)
            .finish_non_exhaustive()
    }
}

impl S3AttachmentStore {
    /// Wrap a pre-built client.
    ///
    /// ```rust,no_run
    /// # async fn example(cfg: configs::AttachmentsConfig) -> Result<(), service::errors::ServiceError> {
    /// let sdk = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
    /// let store = service::attachments::S3AttachmentStore::new(aws_sdk_s3::Client::new(&sdk), &cfg)?;
    /// # Ok(()) }
    /// ```
    pub fn new(client: Client, cfg: &AttachmentsConfig) -> Result<Self, ServiceError> {
        Ok(Self {
            client,
            bucket: cfg.bucket.clone(),
            public_base: public_base(cfg)?,
            expires: Duration::from_secs(cfg.url_expiration_secs),
        })
    }

    /// Build a client from the standard AWS config chain: env, shared
    /// profile, SSO, credential process, web identity or IMDS.
    ///
    /// A custom endpoint switches the client to path-style addressing.
    pub async fn from_env(cfg: &AttachmentsConfig) -> Result<Self, ServiceError> {
        let sdk = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(cfg.region.clone()))
            .load()
            .await;
        let mut builder = aws_sdk_s3::config::Builder::from(&sdk);
        if let Some(endpoint) = &cfg.endpoint {
            builder = builder.endpoint_url(endpoint.trim_end_matches('/')).force_path_style(true);
        }
        let store = Self::new(Client::from_conf(builder.build()), cfg)?;
        info!(bucket = %store.bucket, region = %cfg.region, endpoint = ?cfg.endpoint, "attachment store ready");
        Ok(store)
    }
}

/// Unsigned object URL prefix, ending in `/` so keys append as one segment.
fn public_base(cfg: &AttachmentsConfig) -> Result<Url, ServiceError> {
    let mut url = match cfg.endpoint.as_deref() {
        Some(endpoint) => {
            let mut url = Url::parse(endpoint)
                .map_err(|e| ServiceError::Validation(format!("invalid attachments endpoint: {e}")))?;
            url.path_segments_mut()
                .map_err(|_| ServiceError::Validation("attachments endpoint cannot hold a path".into()))?
                .pop_if_empty()
                .push(&cfg.bucket);
            url
        }
        None if cfg.region == "us-east-1" => Url::parse(&format!("https://{}.s3.amazonaws.com", cfg.bucket))
            .map_err(|e| ServiceError::Validation(format!("invalid bucket name: {e}")))?,
        None => Url::parse(&format!("https://{}.s3.{}.amazonaws.com", cfg.bucket, cfg.region))
            .map_err(|e| ServiceError::Validation(format!("invalid bucket or region: {e}")))?,
    };
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

#[async_trait]
impl AttachmentStore for S3AttachmentStore {
    async fn upload_url(&self, key: &str) -> Result<String, ServiceError> {
        let presigning = PresigningConfig::expires_in(self.expires)
            .map_err(|e| ServiceError::Storage(format!("presigning config: {e}")))?;
        let request = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .presigned(presigning)
            .await
            .map_err(|e| ServiceError::Storage(format!("presign put {key}: {}", DisplayErrorContext(&e))))?;
        debug!(bucket = %self.bucket, key, expires = ?self.expires, "presigned_url");
        Ok(request.uri().to_string())
    }

    fn public_url(&self, key: &str) -> String {
        let mut url = self.public_base.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push(key);
        }
        url.to_string()
    }
}
