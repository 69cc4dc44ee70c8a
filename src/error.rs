//! Error types for retrieval sessions.

use thiserror::Error;

/// Main error type for ranking and index operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Strategy name is not one of bm25, tfidf, jaccard, embedding
    #[error("unsupported scoring strategy: {0}")]
    UnsupportedStrategy(String),

    /// Embedding strategy requested but no provider is configured
    #[error("embedding strategy requested but no embedding provider is configured")]
    EmbeddingUnavailable,

    /// Embedding provider returned an error or malformed response
    #[error("embedding error: {0}")]
    Embedding(String),

    /// A scorer returned a different number of scores than documents
    #[error("{strategy} returned {actual} scores for {expected} documents")]
    ScoreCount {
        strategy: String,
        expected: usize,
        actual: usize,
    },

    /// Parsed index could not be turned into blocks
    #[error("invalid index: {0}")]
    InvalidIndex(String),

    /// HTTP transport error
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Full-text index error
    #[error("index error: {0}")]
    Index(#[from] tantivy::TantivyError),

    /// I/O error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result alias using [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// True for errors caused by the caller's request rather than the system.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Error::UnsupportedStrategy(_) | Error::EmbeddingUnavailable)
    }
}
