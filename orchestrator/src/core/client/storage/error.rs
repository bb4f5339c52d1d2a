use aws_sdk_s3::error::SdkError;
use aws_sdk_s3::operation::get_object::GetObjectError;
use aws_sdk_s3::operation::head_bucket::HeadBucketError;
use aws_sdk_s3::operation::put_object::PutObjectError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Failed to get object {key}: {source}")]
    GetObjectError { key: String, source: SdkError<GetObjectError> },

    #[error("Failed to put object {key}: {source}")]
    PutObjectError { key: String, source: SdkError<PutObjectError> },

    #[error("Failed to read object body {key}: {message}")]
    ObjectStreamError { key: String, message: String },

    #[error("Bucket {bucket} is not reachable: {source}")]
    HeadBucketError { bucket: String, source: SdkError<HeadBucketError> },
}
