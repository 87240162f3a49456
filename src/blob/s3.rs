// src/blob/s3.rs

use async_trait::async_trait;
use aws_config::{BehaviorVersion, SdkConfig};
use aws_credential_types::provider::ProvideCredentials;
use aws_sdk_s3::{
    Client as S3Client, config::Builder as S3ConfigBuilder, error::DisplayErrorContext,
    primitives::ByteStream,
};
use axum::body::Bytes;
use tracing::{debug, info};

use super::{BlobError, BlobStore, public_url};
use crate::config::S3Config;

/// Blob store backed by an S3-compatible object storage bucket.
pub struct S3BlobStore {
    client: S3Client,
    bucket: String,
    public_base_url: String,
}

impl S3BlobStore {
    /// Builds the client from the ambient AWS credential chain
    /// (`AWS_ACCESS_KEY_ID`, profiles, instance roles, ...).
    ///
    /// Fails if no credentials can be resolved.
    pub async fn new(config: &S3Config) -> Result<Self, BlobError> {
        let aws_config = aws_config::defaults(BehaviorVersion::latest())
            .region(aws_config::Region::new(config.region.clone()))
            .load()
            .await;

        Self::from_sdk_config(&aws_config, config).await
    }

    /// Builds the client from an already loaded SDK config.
    pub async fn from_sdk_config(
        aws_config: &SdkConfig,
        config: &S3Config,
    ) -> Result<Self, BlobError> {
        let provider = aws_config.credentials_provider().ok_or_else(|| {
            BlobError::Credentials("no credentials provider configured".to_string())
        })?;
        provider
            .provide_credentials()
            .await
            .map_err(|e| BlobError::Credentials(DisplayErrorContext(&e).to_string()))?;

        let mut builder = S3ConfigBuilder::from(aws_config);

        // MinIO / LocalStack
        if let Some(endpoint_url) = &config.endpoint_url {
            builder = builder.endpoint_url(endpoint_url);
        }
        if config.force_path_style {
            builder = builder.force_path_style(true);
        }

        let client = S3Client::from_conf(builder.build());
        let public_base_url = config.public_base_url();

        info!(
            bucket = %config.bucket,
            region = %config.region,
            public_base_url = %public_base_url,
            "S3 blob store initialized"
        );

        Ok(Self {
            client,
            bucket: config.bucket.clone(),
            public_base_url,
        })
    }
}

#[async_trait]
impl BlobStore for S3BlobStore {
    async fn store(&self, key: &str, bytes: Bytes, content_type: &str) -> Result<String, BlobError> {
        debug!(bucket = %self.bucket, key, size_bytes = bytes.len(), "Uploading object");

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(bytes))
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| BlobError::Remote {
                key: key.to_string(),
                message: DisplayErrorContext(&e).to_string(),
            })?;

        Ok(public_url(&self.public_base_url, key))
    }
}
