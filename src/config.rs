//! Configuration loading.
//!
//! Settings come from a TOML file (every field optional) with a few
//! environment overrides for secrets and endpoints:
//!
//! ```toml
//! document = "data/resume.txt"
//! subject = "Jane Doe"
//!
//! [embedding]
//! base_url = "http://localhost:11434/v1"
//! model = "all-minilm"
//!
//! [generation]
//! provider = "gemini"
//! model = "gemini-2.5-flash-lite"
//!
//! [retrieval]
//! top_k = 3
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::rag::{EmbeddingConfig, GenerationConfig, GenerationProvider, RetrievalConfig};

pub const GEMINI_API_KEY_VAR: &str = "GEMINI_API_KEY";
pub const OPENAI_API_KEY_VAR: &str = "OPENAI_API_KEY";
pub const EMBEDDING_URL_VAR: &str = "RESUME_RAG_EMBEDDING_URL";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid setting: {0}")]
    Invalid(String),

    #[error("{provider} API key not found. Set {env_var} or add api_key to the [generation] section")]
    MissingApiKey {
        provider: &'static str,
        env_var: &'static str,
    },
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Complete settings for a resume session.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RagConfig {
    /// Plain-text resume to index
    pub document: PathBuf,
    /// Name of the collection holding the resume chunks
    pub collection: String,
    /// Person the assistant speaks about
    pub subject: String,
    /// Directory of the persistent vector index
    pub store_dir: PathBuf,
    pub embedding: EmbeddingConfig,
    pub generation: GenerationConfig,
    pub retrieval: RetrievalConfig,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            document: PathBuf::from("data/resume.txt"),
            collection: "resume_collection".to_string(),
            subject: "the candidate".to_string(),
            store_dir: default_data_dir().join("index"),
            embedding: EmbeddingConfig::default(),
            generation: GenerationConfig::default(),
            retrieval: RetrievalConfig::default(),
        }
    }
}

/// Per-user data directory, falling back to a local directory.
pub fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .map(|dir| dir.join("resume-rag"))
        .unwrap_or_else(|| PathBuf::from(".resume-rag"))
}

/// Default location of the config file.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("resume-rag").join("config.toml"))
}

impl RagConfig {
    /// Load settings and apply environment overrides.
    ///
    /// An explicit `path` must exist. Without one, the default location is
    /// used if present and built-in defaults otherwise.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => match default_config_path().filter(|p| p.exists()) {
                Some(path) => Self::from_file(&path)?,
                None => Self::default(),
            },
        };

        config.apply_env(|name| std::env::var(name).ok());
        Ok(config)
    }

    /// Parse a TOML config file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        log::debug!("Loaded config from {:?}", path);
        Self::from_toml(&text)
    }

    pub fn from_toml(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Fill secrets and endpoints from the environment.
    ///
    /// Keys already present in the file win over the environment.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if self.generation.api_key.is_none() {
            let var = match self.generation.provider {
                GenerationProvider::Gemini => GEMINI_API_KEY_VAR,
                GenerationProvider::OpenAi => OPENAI_API_KEY_VAR,
            };
            self.generation.api_key = lookup(var).filter(|v| !v.trim().is_empty());
        }

        if self.embedding.api_key.is_none() && self.embedding.provider == "openai" {
            self.embedding.api_key = lookup(OPENAI_API_KEY_VAR).filter(|v| !v.trim().is_empty());
        }

        if let Some(url) = lookup(EMBEDDING_URL_VAR).filter(|v| !v.trim().is_empty()) {
            self.embedding.base_url = url;
        }
    }

    /// Check retrieval and embedding settings.
    pub fn validate(&self) -> Result<()> {
        if self.collection.trim().is_empty() {
            return Err(ConfigError::Invalid("collection name is empty".to_string()));
        }
        if self.retrieval.top_k == 0 {
            return Err(ConfigError::Invalid("retrieval.top_k must be at least 1".to_string()));
        }
        if self.retrieval.batch_size == 0 {
            return Err(ConfigError::Invalid(
                "retrieval.batch_size must be at least 1".to_string(),
            ));
        }
        if self.embedding.dimensions == 0 {
            return Err(ConfigError::Invalid(
                "embedding.dimensions must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Check that the generation provider can be reached.
    pub fn validate_generation(&self) -> Result<()> {
        if self.generation.provider == GenerationProvider::Gemini
            && self
                .generation
                .api_key
                .as_deref()
                .map_or(true, |k| k.trim().is_empty())
        {
            return Err(ConfigError::MissingApiKey {
                provider: "Gemini",
                env_var: GEMINI_API_KEY_VAR,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = RagConfig::default();
        assert_eq!(config.collection, "resume_collection");
        assert_eq!(config.embedding.dimensions, 384);
        assert_eq!(config.retrieval.top_k, 3);
        assert_eq!(config.retrieval.batch_size, 10);
        assert_eq!(config.generation.provider, GenerationProvider::Gemini);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = RagConfig::from_toml(
            r#"
            subject = "Jane Doe"

            [generation]
            provider = "openai"
            model = "gpt-4o-mini"

            [retrieval]
            top_k = 5
            "#,
        )
        .unwrap();

        assert_eq!(config.subject, "Jane Doe");
        assert_eq!(config.generation.provider, GenerationProvider::OpenAi);
        assert_eq!(config.generation.model, "gpt-4o-mini");
        assert_eq!(config.retrieval.top_k, 5);
        assert_eq!(config.retrieval.batch_size, 10);
        assert_eq!(config.embedding.model, "all-MiniLM-L6-v2");
    }

    #[test]
    fn test_bad_toml() {
        assert!(matches!(
            RagConfig::from_toml("retrieval = 3"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_explicit_missing_file_fails() {
        let dir = TempDir::new().unwrap();
        let err = RagConfig::load(Some(&dir.path().join("nope.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn test_from_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "collection = \"cv\"\n").unwrap();
        assert_eq!(RagConfig::from_file(&path).unwrap().collection, "cv");
    }

    #[test]
    fn test_env_overrides() {
        let mut config = RagConfig::default();
        config.apply_env(env(&[
            ("GEMINI_API_KEY", "secret"),
            ("RESUME_RAG_EMBEDDING_URL", "http://embed:9000/v1"),
        ]));
        assert_eq!(config.generation.api_key.as_deref(), Some("secret"));
        assert_eq!(config.embedding.base_url, "http://embed:9000/v1");

        // File values win
        let mut config = RagConfig::default();
        config.generation.api_key = Some("from-file".to_string());
        config.apply_env(env(&[("GEMINI_API_KEY", "secret")]));
        assert_eq!(config.generation.api_key.as_deref(), Some("from-file"));
    }

    #[test]
    fn test_validate() {
        let mut config = RagConfig::default();
        assert!(config.validate().is_ok());

        config.retrieval.top_k = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        config.retrieval.top_k = 3;
        config.retrieval.batch_size = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        config.retrieval.batch_size = 10;
        config.embedding.dimensions = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_validate_generation() {
        let mut config = RagConfig::default();
        assert!(matches!(
            config.validate_generation(),
            Err(ConfigError::MissingApiKey { env_var: "GEMINI_API_KEY", .. })
        ));

        config.generation.api_key = Some("key".to_string());
        assert!(config.validate_generation().is_ok());

        // OpenAI-compatible servers may not need a key
        let mut config = RagConfig::default();
        config.generation.provider = GenerationProvider::OpenAi;
        assert!(config.validate_generation().is_ok());
    }
}
