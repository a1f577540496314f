//! Top-k retrieval of resume passages.

use super::embedding::Embedder;
use super::errors::RagResult;
use super::index::VectorIndex;
use super::models::ScoredEntry;

/// Default number of passages handed to the prompt.
pub const DEFAULT_TOP_K: usize = 3;

/// Embeds questions and looks them up in a collection.
pub struct Retriever<'a> {
    embedder: &'a dyn Embedder,
    index: &'a dyn VectorIndex,
}

impl<'a> Retriever<'a> {
    pub fn new(embedder: &'a dyn Embedder, index: &'a dyn VectorIndex) -> Self {
        Self { embedder, index }
    }

    /// The `k` closest entries with their scores, closest first.
    ///
    /// An empty collection (or `k == 0`) returns nothing without embedding the query.
    pub fn retrieve_scored(&self, query: &str, k: usize) -> RagResult<Vec<ScoredEntry>> {
        log::info!("Searching for: '{}'", query);

        let k = k.min(self.index.count()?);
        if k == 0 {
            return Ok(Vec::new());
        }

        let query_embedding = self.embedder.embed_one(query)?;
        let hits = self.index.query(&query_embedding, k)?;

        for (i, hit) in hits.iter().take(2).enumerate() {
            log::debug!(
                "Chunk {} ({:.3}) preview: {}",
                i + 1,
                hit.score,
                preview(&hit.entry.document, 100)
            );
        }

        Ok(hits)
    }

    /// The text of the `k` closest passages, closest first.
    pub fn retrieve(&self, query: &str, k: usize) -> RagResult<Vec<String>> {
        Ok(self
            .retrieve_scored(query, k)?
            .into_iter()
            .map(|hit| hit.entry.document)
            .collect())
    }
}

/// First `max_chars` characters of `text`, on a char boundary.
pub fn preview(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((end, _)) => format!("{}...", &text[..end]),
        None => text.to_string(),
    }
}
