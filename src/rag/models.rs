//! Data models for RAG operations.

use serde::{Deserialize, Serialize};

/// A passage of the resume, tagged with the section it was found under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chunk {
    /// Position-derived identifier, `chunk_{index}`
    pub id: String,
    /// Trimmed, non-empty paragraph text
    pub content: String,
    /// Heading this paragraph sits under (empty before the first heading)
    pub section: String,
}

impl Chunk {
    /// Create a chunk whose id is derived from its position in the document.
    pub fn new(index: usize, content: String, section: String) -> Self {
        Self {
            id: chunk_id(index),
            content,
            section,
        }
    }
}

/// Identifier for the chunk at `index` in document order.
pub fn chunk_id(index: usize) -> String {
    format!("chunk_{}", index)
}

/// Metadata stored alongside each indexed chunk.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryMetadata {
    pub section: String,
}

/// A chunk together with its embedding, as stored in a collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexEntry {
    pub id: String,
    pub embedding: Vec<f32>,
    pub document: String,
    pub metadata: EntryMetadata,
}

impl IndexEntry {
    /// Pair a chunk with its embedding.
    pub fn from_chunk(chunk: &Chunk, embedding: Vec<f32>) -> Self {
        Self {
            id: chunk.id.clone(),
            embedding,
            document: chunk.content.clone(),
            metadata: EntryMetadata {
                section: chunk.section.clone(),
            },
        }
    }
}

/// Result from a nearest-neighbour query.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoredEntry {
    pub entry: IndexEntry,
    /// Cosine similarity (higher is more similar)
    pub score: f32,
}

/// A generated answer and the passages it was grounded on.
#[derive(Debug, Clone, Serialize)]
pub struct Answer {
    pub text: String,
    /// Retrieved passages, closest first (empty when retrieval was skipped or failed)
    pub context: Vec<ScoredEntry>,
}

/// Whether `get_or_create` found a collection or had to make one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CollectionState {
    Created,
    Existing,
}

/// Statistics about a collection.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexStats {
    pub collection: String,
    pub entry_count: usize,
    /// Embedding dimension recorded for the collection, if any entry exists
    pub dimensions: Option<usize>,
    /// Distinct section labels in document order of first appearance
    pub sections: Vec<String>,
}

/// Configuration for embedding generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// Provider label: "local", "openai", "ollama" or "lmstudio"
    pub provider: String,
    /// Model identifier (e.g., "all-MiniLM-L6-v2")
    pub model: String,
    /// Dimensions of the embedding vectors
    pub dimensions: usize,
    /// Base URL of the OpenAI-compatible API (without `/embeddings`)
    pub base_url: String,
    /// Optional API key, sent as a bearer token
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: "local".to_string(),
            model: "all-MiniLM-L6-v2".to_string(),
            dimensions: 384,
            base_url: "http://localhost:8080/v1".to_string(),
            api_key: None,
            timeout_secs: 60,
        }
    }
}

/// Which text-generation API to call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum GenerationProvider {
    /// Google Gemini `generateContent`
    #[default]
    Gemini,
    /// OpenAI-compatible `/chat/completions`
    OpenAi,
}

/// Configuration for response generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    pub provider: GenerationProvider,
    /// Model identifier (e.g., "gemini-2.5-flash-lite")
    pub model: String,
    /// Overrides the provider's public endpoint
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_output_tokens: Option<u32>,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            provider: GenerationProvider::Gemini,
            model: "gemini-2.5-flash-lite".to_string(),
            base_url: None,
            api_key: None,
            temperature: None,
            max_output_tokens: Some(300),
            timeout_secs: 60,
        }
    }
}

impl GenerationConfig {
    /// Endpoint root, falling back to the provider's public API.
    pub fn resolved_base_url(&self) -> String {
        let url = match (&self.base_url, self.provider) {
            (Some(url), _) => url.as_str(),
            (None, GenerationProvider::Gemini) => "https://generativelanguage.googleapis.com/v1beta",
            (None, GenerationProvider::OpenAi) => "https://api.openai.com/v1",
        };
        url.trim_end_matches('/').to_string()
    }
}

/// Retrieval and ingestion tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Chunks retrieved per question
    pub top_k: usize,
    /// Entries written per index batch
    pub batch_size: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: 3,
            batch_size: 10,
        }
    }
}
