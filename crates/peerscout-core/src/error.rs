/// Failure to interpret bytes received from a server.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("response id mismatch: expected {expected}, got {actual:?}")]
    IdMismatch { expected: u64, actual: Option<u64> },

    #[error("response carries neither a result nor an error")]
    MissingResult,

    #[error("malformed payload: {0}")]
    MalformedPayload(String),
}

/// Core protocol errors.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("invalid node: {0}")]
    InvalidNode(String),

    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),

    #[error("server error {code}: {message}")]
    Rpc { code: i64, message: String },
}
