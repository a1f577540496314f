//! Text generation providers.

use std::time::Duration;

use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;

use super::models::{GenerationConfig, GenerationProvider};

#[derive(Error, Debug)]
pub enum GenerationError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Provider returned {status}: {message}")]
    Provider { status: u16, message: String },

    #[error("Malformed generation response: {0}")]
    MalformedResponse(String),

    #[error("Generation not configured: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, GenerationError>;

/// Single-turn text completion.
pub trait Generator: Send + Sync {
    /// Model identifier, for logging.
    fn model(&self) -> &str;

    /// Complete `prompt` and return the generated text.
    fn generate_text(&self, prompt: &str) -> Result<String>;
}

/// Build the generator selected by the configuration.
pub fn generator_from_config(config: &GenerationConfig) -> Result<Box<dyn Generator>> {
    Ok(match config.provider {
        GenerationProvider::Gemini => Box::new(GeminiGenerator::new(config)?),
        GenerationProvider::OpenAi => Box::new(OpenAiGenerator::new(config)?),
    })
}

fn build_client(config: &GenerationConfig) -> Result<Client> {
    Ok(Client::builder()
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()?)
}

/// Turn a non-success response into a provider error.
fn check_status(response: reqwest::blocking::Response) -> Result<reqwest::blocking::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    Err(GenerationError::Provider {
        status: status.as_u16(),
        message: response.text().unwrap_or_default(),
    })
}

// ============================================================================
// Gemini
// ============================================================================

/// Google Gemini `generateContent` client.
pub struct GeminiGenerator {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    temperature: Option<f32>,
    max_output_tokens: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiContent>,
}

#[derive(Debug, Deserialize)]
struct GeminiContent {
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Deserialize)]
struct GeminiPart {
    text: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiGenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
}

impl GeminiGenerator {
    pub fn new(config: &GenerationConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .ok_or_else(|| GenerationError::Config("missing Gemini API key".to_string()))?
            .to_string();

        Ok(Self {
            client: build_client(config)?,
            api_key,
            base_url: config.resolved_base_url(),
            model: config.model.clone(),
            temperature: config.temperature,
            max_output_tokens: config.max_output_tokens,
        })
    }

    fn request_body(&self, prompt: &str) -> Value {
        json!({
            "contents": [{ "parts": [{ "text": prompt }] }],
            "generationConfig": GeminiGenerationConfig {
                temperature: self.temperature,
                max_output_tokens: self.max_output_tokens,
            }
        })
    }
}

/// Concatenate the text parts of the first candidate.
fn gemini_text(body: &str) -> Result<String> {
    let parsed: GeminiResponse =
        serde_json::from_str(body).map_err(|e| GenerationError::MalformedResponse(e.to_string()))?;

    let candidate = parsed
        .candidates
        .into_iter()
        .next()
        .ok_or_else(|| GenerationError::MalformedResponse("no candidates returned".to_string()))?;

    let text = candidate
        .content
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter_map(|part| part.text)
                .collect::<Vec<_>>()
                .join("")
        })
        .unwrap_or_default();

    if text.trim().is_empty() {
        return Err(GenerationError::MalformedResponse("candidate has no text".to_string()));
    }
    Ok(text)
}

impl Generator for GeminiGenerator {
    fn model(&self) -> &str {
        &self.model
    }

    fn generate_text(&self, prompt: &str) -> Result<String> {
        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);

        let response = self
            .client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .header("Content-Type", "application/json")
            .json(&self.request_body(prompt))
            .send()?;

        let body = check_status(response)?.text()?;
        gemini_text(&body)
    }
}

// ============================================================================
// OpenAI-compatible
// ============================================================================

/// OpenAI-compatible `/chat/completions` client.
pub struct OpenAiGenerator {
    client: Client,
    api_key: Option<String>,
    endpoint: String,
    model: String,
    temperature: Option<f32>,
    max_output_tokens: Option<u32>,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: AssistantMessage,
}

#[derive(Debug, Deserialize)]
struct AssistantMessage {
    content: Option<String>,
}

impl OpenAiGenerator {
    pub fn new(config: &GenerationConfig) -> Result<Self> {
        Ok(Self {
            client: build_client(config)?,
            api_key: config
                .api_key
                .as_deref()
                .map(str::trim)
                .filter(|k| !k.is_empty())
                .map(str::to_string),
            endpoint: format!("{}/chat/completions", config.resolved_base_url()),
            model: config.model.clone(),
            temperature: config.temperature,
            max_output_tokens: config.max_output_tokens,
        })
    }
}

fn chat_text(body: &str) -> Result<String> {
    let parsed: ChatResponse =
        serde_json::from_str(body).map_err(|e| GenerationError::MalformedResponse(e.to_string()))?;

    parsed
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .filter(|text| !text.trim().is_empty())
        .ok_or_else(|| GenerationError::MalformedResponse("no message content returned".to_string()))
}

impl Generator for OpenAiGenerator {
    fn model(&self) -> &str {
        &self.model
    }

    fn generate_text(&self, prompt: &str) -> Result<String> {
        let body = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: self.temperature,
            max_tokens: self.max_output_tokens,
        };

        let mut request = self.client.post(&self.endpoint).json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let text = check_status(request.send()?)?.text()?;
        chat_text(&text)
    }
}
