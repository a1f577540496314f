//! RAG error types

use std::path::PathBuf;

use thiserror::Error;

use super::chunker::ChunkError;
use super::embedding::EmbeddingError;
use super::generation::GenerationError;
use super::index::IndexError;

/// Errors that can occur while building or querying a resume session
#[derive(Debug, Error)]
pub enum RagError {
    #[error("No content found in resume")]
    EmptyDocument,

    #[error("Embedding provider error: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("Vector index error: {0}")]
    Index(#[from] IndexError),

    #[error("Generation provider error: {0}")]
    Generation(#[from] GenerationError),

    #[error("Failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<ChunkError> for RagError {
    fn from(err: ChunkError) -> Self {
        match err {
            ChunkError::EmptyDocument => RagError::EmptyDocument,
        }
    }
}

/// Result type alias for RAG operations
pub type RagResult<T> = Result<T, RagError>;
