use crate::core::client::storage::{StorageClient, StorageError};
use crate::types::params::StorageArgs;
use crate::OrchestratorError;
use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use bytes::Bytes;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

/// AWSS3 is a struct that represents an AWS S3 client.
#[derive(Clone, Debug)]
pub struct AWSS3 {
    pub(crate) client: Arc<Client>,
    bucket_name: String,
}

impl AWSS3 {
    /// Creates a new instance of AWSS3 with the provided client and bucket name.
    /// Path style addressing keeps S3-compatible endpoints such as localstack working.
    pub fn new(aws_config: &SdkConfig, args: &StorageArgs) -> Self {
        let mut s3_config_builder = aws_sdk_s3::config::Builder::from(aws_config);
        s3_config_builder.set_force_path_style(Some(true));
        let client = Client::from_conf(s3_config_builder.build());
        Self { client: Arc::new(client), bucket_name: args.bucket_name.clone() }
    }

    pub fn bucket_name(&self) -> &str {
        &self.bucket_name
    }

    /// Create the artifact bucket unless it already exists
    pub async fn setup_bucket(&self) -> Result<(), OrchestratorError> {
        if self.client.head_bucket().bucket(&self.bucket_name).send().await.is_ok() {
            info!(bucket = %self.bucket_name, "S3 bucket already exists, skipping creation");
            return Ok(());
        }
        self.client.create_bucket().bucket(&self.bucket_name).send().await.map_err(|e| {
            OrchestratorError::ResourceSetupError(format!("Failed to create S3 bucket {}: {}", self.bucket_name, e))
        })?;
        info!(bucket = %self.bucket_name, "S3 bucket created");
        Ok(())
    }
}

fn content_type_for(key: &str) -> &'static str {
    match Path::new(key).extension().and_then(|ext| ext.to_str()) {
        Some("json") => "application/json",
        Some("sol") => "text/plain",
        _ => "application/octet-stream",
    }
}

#[async_trait]
impl StorageClient for AWSS3 {
    async fn get_data(&self, key: &str) -> Result<Bytes, StorageError> {
        let response = self
            .client
            .get_object()
            .bucket(&self.bucket_name)
            .key(key)
            .send()
            .await
            .map_err(|source| StorageError::GetObjectError { key: key.to_string(), source })?;
        let data = response
            .body
            .collect()
            .await
            .map_err(|e| StorageError::ObjectStreamError { key: key.to_string(), message: e.to_string() })?;
        debug!(key = %key, "Fetched object from S3");
        Ok(data.into_bytes())
    }

    async fn put_data(&self, data: Bytes, key: &str) -> Result<(), StorageError> {
        self.client
            .put_object()
            .bucket(&self.bucket_name)
            .key(key)
            .content_type(content_type_for(key))
            .body(ByteStream::from(data))
            .send()
            .await
            .map_err(|source| StorageError::PutObjectError { key: key.to_string(), source })?;
        debug!(key = %key, "Stored object in S3");
        Ok(())
    }

    async fn health_check(&self) -> Result<(), StorageError> {
        self.client
            .head_bucket()
            .bucket(&self.bucket_name)
            .send()
            .await
            .map_err(|source| StorageError::HeadBucketError { bucket: self.bucket_name.clone(), source })?;
        Ok(())
    }
}
