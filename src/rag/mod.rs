//! RAG (Retrieval-Augmented Generation) pipeline for answering questions about a resume.

mod chunker;
pub mod embedding;
mod errors;
pub mod generation;
pub mod index;
mod models;
pub mod prompt;
mod retriever;
mod session;

pub use chunker::{chunk_document, chunk_file, is_heading, load_document, ChunkError};
pub use embedding::{Embedder, EmbeddingError, HttpEmbedder};
pub use errors::{RagError, RagResult};
pub use generation::{generator_from_config, GeminiGenerator, GenerationError, Generator, OpenAiGenerator};
pub use index::{
    IndexError, IndexProvider, MemoryCollection, MemoryIndexProvider, SqliteCollection,
    SqliteIndexProvider, VectorIndex,
};
pub use models::{
    chunk_id, Answer, Chunk, CollectionState, EmbeddingConfig, EntryMetadata,
    GenerationConfig, GenerationProvider, IndexEntry, IndexStats, RetrievalConfig, ScoredEntry,
};
pub use prompt::{build_prompt, respond, GENERATION_FAILED_MESSAGE, NO_CONTEXT_MESSAGE};
pub use retriever::{preview, Retriever, DEFAULT_TOP_K};
pub use session::{
    ingest, ResumeSession, SessionOptions, SessionState, INDEX_UNAVAILABLE_MESSAGE,
    NOT_LOADED_MESSAGE, RETRIEVAL_FAILED_MESSAGE,
};
