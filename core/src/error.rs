use thiserror::Error;

/// Errors raised while building or reading an index directory.
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Index directory {0} is missing required files")]
    MissingIndexFiles(String),

    #[error("Incompatible index format: version {actual}, expected {expected}")]
    IncompatibleVersion { expected: u32, actual: u32 },

    #[error("Corrupt index: {0}")]
    Corrupt(String),
}

pub type Result<T> = std::result::Result<T, Error>;

/// A single malformed token inside an encoded record.
///
/// These are collected by the lenient decoders and skipped, never propagated
/// as an [`Error`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EncodingError {
    #[error("invalid base64 key {0:?}")]
    InvalidBase64(String),

    #[error("key is not valid UTF-8")]
    InvalidUtf8,

    #[error("invalid document id {0:?}")]
    InvalidDocId(String),

    #[error("invalid position {0:?}")]
    InvalidPosition(String),

    #[error("record has no key separator")]
    MissingKeySeparator,
}
