//! The resume chat session.
//!
//! A [`ResumeSession`] is built once per run. Construction guarantees the
//! collection is populated (ingesting the resume when the collection is new or
//! empty), so any caller holding a session can query it. [`ResumeSession::chat`]
//! never fails: every error on the query path resolves to a user-facing string.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use crate::config::RagConfig;

use super::chunker::chunk_file;
use super::embedding::{Embedder, EmbeddingError, HttpEmbedder};
use super::errors::{RagError, RagResult};
use super::generation::{generator_from_config, Generator};
use super::index::{IndexError, IndexProvider, SqliteCollection, SqliteIndexProvider, VectorIndex};
use super::models::{Answer, CollectionState, IndexEntry, IndexStats, ScoredEntry};
use super::prompt::respond;
use super::retriever::{Retriever, DEFAULT_TOP_K};

/// Returned by `chat` when the collection holds no entries.
pub const NOT_LOADED_MESSAGE: &str =
    "The resume data hasn't been loaded yet. Please initialize the system first.";

/// Returned by `chat` when the index cannot be read.
pub const INDEX_UNAVAILABLE_MESSAGE: &str =
    "Sorry, the resume database can't be reached right now. Please try again in a moment.";

/// Returned by `chat` when the question could not be embedded.
pub const RETRIEVAL_FAILED_MESSAGE: &str =
    "Sorry, I couldn't search the resume right now. Please try again in a moment.";

/// Whether the session has anything to answer from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Ready { entries: usize },
    Uninitialized,
}

/// Per-session settings that do not belong to a provider.
#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// Person the assistant speaks about
    pub subject: String,
    /// Passages retrieved per question
    pub top_k: usize,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            subject: "the candidate".to_string(),
            top_k: DEFAULT_TOP_K,
        }
    }
}

/// Question answering over one resume.
pub struct ResumeSession<C: VectorIndex> {
    document_path: PathBuf,
    collection: Mutex<C>,
    embedder: Box<dyn Embedder>,
    generator: Box<dyn Generator>,
    options: SessionOptions,
}

impl ResumeSession<SqliteCollection> {
    /// Open the persistent store from the configuration and build a session on it.
    pub fn from_config(config: &RagConfig) -> RagResult<Self> {
        let provider = SqliteIndexProvider::new(&config.store_dir, config.retrieval.batch_size)?;
        Self::with_provider(config, &provider)
    }
}

impl<C: VectorIndex> ResumeSession<C> {
    /// Build a session on any store, with HTTP providers from the configuration.
    pub fn with_provider<P>(config: &RagConfig, provider: &P) -> RagResult<Self>
    where
        P: IndexProvider<Collection = C>,
    {
        config
            .validate()
            .and_then(|_| config.validate_generation())
            .map_err(|e| RagError::Config(e.to_string()))?;

        let embedder = HttpEmbedder::new(&config.embedding)?;
        let generator = generator_from_config(&config.generation)?;

        Self::new(
            &config.document,
            &config.collection,
            provider,
            Box::new(embedder),
            generator,
            SessionOptions {
                subject: config.subject.clone(),
                top_k: config.retrieval.top_k,
            },
        )
    }

    /// Open (or create) `collection_name` and make sure it holds the resume.
    ///
    /// Ingestion runs only when the collection is new or empty. An existing,
    /// populated collection is reused as-is and the document is not read.
    pub fn new<P>(
        document_path: impl Into<PathBuf>,
        collection_name: &str,
        provider: &P,
        embedder: Box<dyn Embedder>,
        generator: Box<dyn Generator>,
        options: SessionOptions,
    ) -> RagResult<Self>
    where
        P: IndexProvider<Collection = C>,
    {
        let document_path = document_path.into();
        log::info!("Initializing resume session for '{}'", collection_name);

        let (mut collection, state) = provider.get_or_create(collection_name)?;

        if state == CollectionState::Created || collection.count()? == 0 {
            ingest(&document_path, embedder.as_ref(), &mut collection)?;
        } else {
            log::info!(
                "Reusing {} entries in collection '{}'",
                collection.count()?,
                collection_name
            );
        }

        Ok(Self {
            document_path,
            collection: Mutex::new(collection),
            embedder,
            generator,
            options,
        })
    }

    fn lock(&self) -> RagResult<MutexGuard<'_, C>> {
        self.collection
            .lock()
            .map_err(|e| RagError::Index(IndexError::Poisoned(e.to_string())))
    }

    /// Whether the collection currently has entries.
    pub fn state(&self) -> RagResult<SessionState> {
        Ok(session_state(&*self.lock()?)?)
    }

    /// Answer a question about the resume.
    ///
    /// Read-only with respect to the index and stateless across calls.
    pub fn chat(&self, query: &str) -> String {
        self.ask(query).text
    }

    /// Answer a question and return the passages the answer was grounded on.
    ///
    /// Never fails. When retrieval fails the context is empty and the text is
    /// one of the fixed messages.
    pub fn ask(&self, query: &str) -> Answer {
        log::info!("Processing query: '{}'", query);

        let context = match self.retrieve_context(query) {
            Ok(context) => context,
            Err(message) => {
                return Answer {
                    text: message.to_string(),
                    context: Vec::new(),
                }
            }
        };

        let passages: Vec<String> = context.iter().map(|hit| hit.entry.document.clone()).collect();
        let text = respond(
            self.generator.as_ref(),
            &self.options.subject,
            query,
            &passages,
        );

        Answer { text, context }
    }

    /// Scored passages for `query`, or the message to show instead.
    fn retrieve_context(&self, query: &str) -> Result<Vec<ScoredEntry>, &'static str> {
        let collection = self.lock().map_err(|e| {
            log::error!("Error accessing resume database: {}", e);
            INDEX_UNAVAILABLE_MESSAGE
        })?;

        match session_state(&*collection) {
            Ok(SessionState::Ready { entries }) => {
                log::debug!("Database has {} chunks available", entries);
            }
            Ok(SessionState::Uninitialized) => return Err(NOT_LOADED_MESSAGE),
            Err(e) => {
                log::error!("Error accessing resume database: {}", e);
                return Err(INDEX_UNAVAILABLE_MESSAGE);
            }
        }

        let retriever = Retriever::new(self.embedder.as_ref(), &*collection);
        match retriever.retrieve_scored(query, self.options.top_k) {
            Ok(context) => Ok(context),
            Err(RagError::Index(e)) => {
                log::error!("Index query failed: {}", e);
                Err(INDEX_UNAVAILABLE_MESSAGE)
            }
            Err(e) => {
                log::warn!("Retrieval failed: {}", e);
                Err(RETRIEVAL_FAILED_MESSAGE)
            }
        }
    }

    /// The `k` best passages for `query`, with scores.
    pub fn retrieve(&self, query: &str, k: usize) -> RagResult<Vec<ScoredEntry>> {
        let collection = self.lock()?;
        Retriever::new(self.embedder.as_ref(), &*collection).retrieve_scored(query, k)
    }

    /// Rebuild the collection from the document.
    ///
    /// Returns the number of chunks written. On failure the previous entries
    /// are kept.
    pub fn reindex(&self) -> RagResult<usize> {
        let mut collection = self.lock()?;
        ingest(&self.document_path, self.embedder.as_ref(), &mut *collection)
    }

    pub fn stats(&self) -> RagResult<IndexStats> {
        Ok(self.lock()?.stats()?)
    }

    pub fn options(&self) -> &SessionOptions {
        &self.options
    }
}

fn session_state(collection: &dyn VectorIndex) -> Result<SessionState, IndexError> {
    Ok(match collection.count()? {
        0 => SessionState::Uninitialized,
        entries => SessionState::Ready { entries },
    })
}

/// Chunk, embed and store the whole document, replacing any previous entries.
pub fn ingest(
    document_path: &Path,
    embedder: &dyn Embedder,
    index: &mut dyn VectorIndex,
) -> RagResult<usize> {
    let chunks = chunk_file(document_path)?;

    log::info!("Converting {} chunks to vectors", chunks.len());
    let texts: Vec<&str> = chunks.iter().map(|c| c.content.as_str()).collect();
    let embeddings = embedder.embed(&texts)?;
    if embeddings.len() != chunks.len() {
        return Err(EmbeddingError::CountMismatch {
            expected: chunks.len(),
            actual: embeddings.len(),
        }
        .into());
    }

    let entries: Vec<IndexEntry> = chunks
        .iter()
        .zip(embeddings)
        .map(|(chunk, embedding)| IndexEntry::from_chunk(chunk, embedding))
        .collect();

    index.replace_all(&entries)?;

    log::info!("Added {} chunks to collection '{}'", entries.len(), index.name());
    Ok(entries.len())
}
