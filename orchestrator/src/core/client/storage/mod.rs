pub mod error;
pub mod s3;

use async_trait::async_trait;
use bytes::Bytes;
pub use error::StorageError;

/// Trait defining object storage operations
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StorageClient: Send + Sync {
    /// Read the object stored under `key`
    async fn get_data(&self, key: &str) -> Result<Bytes, StorageError>;

    /// Write `data` under `key`, replacing any existing object
    async fn put_data(&self, data: Bytes, key: &str) -> Result<(), StorageError>;

    /// Perform a health check on the storage service
    ///
    /// This method verifies that the storage service (e.g., AWS S3) is accessible
    /// and the artifact bucket exists.
    async fn health_check(&self) -> Result<(), StorageError>;
}
