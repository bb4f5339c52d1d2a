use mongodb::bson;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("Mongo error: {0}")]
    MongoError(#[from] mongodb::error::Error),

    #[error("Failed to serialize document: {0}")]
    FailedToSerializeDocument(String),

    #[error("BSON serialization error: {0}")]
    BsonSerError(#[from] bson::ser::Error),

    #[error("BSON deserialization error: {0}")]
    BsonDeError(#[from] bson::de::Error),

    #[error("Item already exists: {0}")]
    ItemAlreadyExists(String),

    #[error("No update found: {0}")]
    NoUpdateFound(String),

    #[error("Invalid database URI: {0}")]
    InvalidUri(String),
}
