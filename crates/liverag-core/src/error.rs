use thiserror::Error;

use crate::types::SourceKind;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("{0} retrieval failed: {1}")]
    Retrieval(SourceKind, String),

    #[error("Reranking failed: {0}")]
    Reranking(String),

    #[error("Generation failed: {0}")]
    Generation(String),

    #[error("Malformed {0} candidate: {1}")]
    MalformedCandidate(SourceKind, String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Render an `anyhow` chain into a retrieval failure.
    pub fn retrieval(source: SourceKind, err: &anyhow::Error) -> Self {
        Error::Retrieval(source, format!("{err:#}"))
    }

    pub fn reranking(err: &anyhow::Error) -> Self {
        Error::Reranking(format!("{err:#}"))
    }

    pub fn generation(err: &anyhow::Error) -> Self {
        Error::Generation(format!("{err:#}"))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
