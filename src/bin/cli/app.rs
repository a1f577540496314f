use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use resume_rag::rag::{HttpEmbedder, IndexProvider, ResumeSession, SqliteIndexProvider};
use resume_rag::RagConfig;

/// Shared application state for CLI commands
pub struct App {
    pub config: RagConfig,
}

impl App {
    /// Load the config file and apply command-line overrides
    pub fn new(
        config_path: Option<&Path>,
        document: Option<PathBuf>,
        collection: Option<String>,
    ) -> Result<Self> {
        let mut config = RagConfig::load(config_path).context("Failed to load configuration")?;

        if let Some(document) = document {
            config.document = document;
        }
        if let Some(collection) = collection {
            config.collection = collection;
        }

        config.validate().context("Invalid configuration")?;
        log::debug!(
            "Using document {:?}, collection '{}'",
            config.document,
            config.collection
        );

        Ok(Self { config })
    }

    /// Open the persistent index under the configured store directory
    pub fn open_store(&self) -> Result<SqliteIndexProvider> {
        SqliteIndexProvider::new(&self.config.store_dir, self.config.retrieval.batch_size)
            .with_context(|| format!("Failed to open index at {:?}", self.config.store_dir))
    }

    /// Build a chat session, ingesting the document if the collection is empty
    pub fn open_session<P: IndexProvider>(
        &self,
        provider: &P,
    ) -> Result<ResumeSession<P::Collection>> {
        self.config.validate_generation()?;
        ResumeSession::with_provider(&self.config, provider).context("Error initializing system")
    }

    /// Embedding client for commands that never generate
    pub fn embedder(&self) -> Result<HttpEmbedder> {
        HttpEmbedder::new(&self.config.embedding).context("Failed to create embedding client")
    }
}
