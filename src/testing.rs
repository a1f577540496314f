//! Deterministic stand-ins for the external providers, for unit tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::rag::embedding::{self, Embedder, EmbeddingError};
use crate::rag::generation::{self, GenerationError, Generator};

/// Bag-of-words embedder: each lower-cased word is hashed into a bucket.
///
/// Texts sharing words get a positive cosine similarity, which is enough to
/// make retrieval results predictable. Clones share the call counter.
#[derive(Clone)]
pub struct KeywordEmbedder {
    dimensions: usize,
    calls: Arc<AtomicUsize>,
}

impl Default for KeywordEmbedder {
    fn default() -> Self {
        Self {
            dimensions: 384,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }
}

impl KeywordEmbedder {
    /// Number of `embed` calls made so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn vector(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimensions];
        for word in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
        {
            let bucket = fnv1a(&word.to_lowercase()) % self.dimensions as u64;
            vector[bucket as usize] += 1.0;
        }
        vector
    }
}

fn fnv1a(word: &str) -> u64 {
    word.bytes().fold(0xcbf29ce484222325, |hash, byte| {
        (hash ^ byte as u64).wrapping_mul(0x100000001b3)
    })
}

impl Embedder for KeywordEmbedder {
    fn embed(&self, texts: &[&str]) -> embedding::Result<Vec<Vec<f32>>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(texts.iter().map(|text| self.vector(text)).collect())
    }
}

/// Embedder whose provider is always down.
pub struct FailingEmbedder;

impl Embedder for FailingEmbedder {
    fn embed(&self, _texts: &[&str]) -> embedding::Result<Vec<Vec<f32>>> {
        Err(EmbeddingError::Provider {
            status: 503,
            message: "embedding service unavailable".to_string(),
        })
    }
}

/// Generator that returns a canned answer and keeps every prompt it saw.
#[derive(Clone)]
pub struct RecordingGenerator {
    response: String,
    prompts: Arc<Mutex<Vec<String>>>,
}

impl RecordingGenerator {
    pub fn new(response: &str) -> Self {
        Self {
            response: response.to_string(),
            prompts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

impl Generator for RecordingGenerator {
    fn model(&self) -> &str {
        "recording"
    }

    fn generate_text(&self, prompt: &str) -> generation::Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        Ok(self.response.clone())
    }
}

/// Generator that always fails as if the response were unparsable.
pub struct FailingGenerator;

impl Generator for FailingGenerator {
    fn model(&self) -> &str {
        "failing"
    }

    fn generate_text(&self, _prompt: &str) -> generation::Result<String> {
        Err(GenerationError::MalformedResponse("no candidates returned".to_string()))
    }
}
