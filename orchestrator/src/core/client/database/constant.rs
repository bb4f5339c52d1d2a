pub const CIRCUITS_COLLECTION: &str = "circuits";
pub const PROOF_REQUESTS_COLLECTION: &str = "proof_requests";

/// Mongo server error code raised when a unique index rejects a write
pub const DUPLICATE_KEY_ERROR_CODE: i32 = 11000;
