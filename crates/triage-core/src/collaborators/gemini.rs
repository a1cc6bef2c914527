//! Live collaborators over the Gemini REST API.
//!
//! [`GeminiBreakdown`] asks a generative model for steps and a difficulty;
//! [`GeminiEmbedder`] feeds the anchor estimator with text embeddings.
//! Both read the API key from an environment variable named in config.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use url::Url;

use super::anchors::Embedder;
use super::traits::{Breakdown, BreakdownGenerator};
use crate::error::CollaboratorError;
use crate::scoring::round_to;
use crate::storage::config::{BreakdownConfig, EstimatorConfig};

const SERVICE: &str = "gemini";
const API_KEY_HEADER: &str = "x-goog-api-key";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(20);

fn http_error(e: impl std::fmt::Display) -> CollaboratorError {
    CollaboratorError::Http {
        service: SERVICE,
        message: e.to_string(),
    }
}

fn malformed(message: impl Into<String>) -> CollaboratorError {
    CollaboratorError::Malformed {
        service: SERVICE,
        message: message.into(),
    }
}

fn api_key_from_env(env_var: &str) -> Result<String, CollaboratorError> {
    std::env::var(env_var)
        .ok()
        .filter(|k| !k.trim().is_empty())
        .ok_or_else(|| CollaboratorError::MissingApiKey {
            service: SERVICE,
            env_var: env_var.to_string(),
        })
}

/// `{endpoint}/v1beta/models/{model}:{method}`
fn model_url(endpoint: &str, model: &str, method: &str) -> Result<Url, CollaboratorError> {
    let mut base = Url::parse(endpoint).map_err(|e| malformed(format!("endpoint {endpoint}: {e}")))?;
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    base.join(&format!("v1beta/models/{model}:{method}"))
        .map_err(|e| malformed(format!("model url: {e}")))
}

fn client() -> Result<Client, CollaboratorError> {
    Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .build()
        .map_err(http_error)
}

// ── Breakdown ─────────────────────────────────────────────────────

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: String,
}

fn breakdown_prompt(description: &str) -> String {
    format!(
        "You coach people with ADHD who feel stuck on a task.\n\
         Task: \"{description}\"\n\n\
         Split it into 3 to 5 concrete sub-goals.\n\
         - Skip trivial mechanics such as opening a laptop or a browser.\n\
         - Each step should be a meaningful chunk of thinking or work.\n\
         - The first step is the smallest piece of progress that gets them moving.\n\
         - Keep every step short and plain.\n\
         Also rate how hard the whole task is from 1 to 10, or 0 if you cannot tell.\n\n\
         Reply with raw JSON only, no markdown, shaped exactly like:\n\
         {{\"breakdown\": [\"step one\", \"step two\"], \"difficulty\": 4}}"
    )
}

/// Strip Markdown code fences a model may wrap its JSON in.
fn strip_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let trimmed = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .unwrap_or(trimmed);
    trimmed.strip_suffix("```").unwrap_or(trimmed).trim()
}

/// Pull the breakdown out of a model reply.
fn parse_breakdown(reply: &str) -> Result<Breakdown, CollaboratorError> {
    #[derive(Deserialize)]
    struct Raw {
        #[serde(default)]
        breakdown: Vec<String>,
        #[serde(default)]
        difficulty: f64,
    }

    let raw: Raw = serde_json::from_str(strip_fences(reply)).map_err(|e| malformed(e.to_string()))?;
    let difficulty = if raw.difficulty.is_finite() {
        round_to(raw.difficulty.clamp(0.0, 10.0), 0) as u8
    } else {
        0
    };
    Ok(Breakdown::new(raw.breakdown, difficulty).sanitized())
}

/// Breakdown generator backed by a Gemini text model.
pub struct GeminiBreakdown {
    client: Client,
    url: Url,
    model: String,
    api_key: String,
}

impl GeminiBreakdown {
    pub fn new(endpoint: &str, model: &str, api_key: impl Into<String>) -> Result<Self, CollaboratorError> {
        Ok(Self {
            client: client()?,
            url: model_url(endpoint, model, "generateContent")?,
            model: model.to_string(),
            api_key: api_key.into(),
        })
    }

    pub fn from_config(config: &BreakdownConfig) -> Result<Self, CollaboratorError> {
        if !config.enabled {
            return Err(CollaboratorError::Disabled("breakdown generator"));
        }
        let key = api_key_from_env(&config.api_key_env)?;
        Self::new(&config.endpoint, &config.model, key)
    }
}

#[async_trait]
impl BreakdownGenerator for GeminiBreakdown {
    fn name(&self) -> &str {
        &self.model
    }

    async fn breakdown(&self, description: &str) -> Result<Breakdown, CollaboratorError> {
        let prompt = breakdown_prompt(description);
        let body = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part { text: &prompt }],
            }],
        };

        let resp = self
            .client
            .post(self.url.clone())
            .header(API_KEY_HEADER, &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(http_error)?
            .error_for_status()
            .map_err(http_error)?;

        let reply: GenerateResponse = resp.json().await.map_err(|e| malformed(e.to_string()))?;
        let text: String = reply
            .candidates
            .into_iter()
            .next()
            .map(|c| c.content.parts.into_iter().map(|p| p.text).collect())
            .ok_or_else(|| malformed("no candidates in reply"))?;

        let breakdown = parse_breakdown(&text)?;
        tracing::debug!(steps = breakdown.steps.len(), difficulty = breakdown.difficulty, "breakdown received");
        Ok(breakdown)
    }
}

// ── Embeddings ────────────────────────────────────────────────────

#[derive(Serialize)]
struct EmbedRequest<'a> {
    content: Content<'a>,
}

#[derive(Deserialize)]
struct EmbedResponse {
    embedding: EmbeddingValues,
}

#[derive(Deserialize)]
struct EmbeddingValues {
    values: Vec<f32>,
}

/// Text embeddings from a Gemini embedding model.
pub struct GeminiEmbedder {
    client: Client,
    url: Url,
    model: String,
    api_key: String,
}

impl GeminiEmbedder {
    pub fn new(endpoint: &str, model: &str, api_key: impl Into<String>) -> Result<Self, CollaboratorError> {
        Ok(Self {
            client: client()?,
            url: model_url(endpoint, model, "embedContent")?,
            model: model.to_string(),
            api_key: api_key.into(),
        })
    }

    pub fn from_config(config: &EstimatorConfig) -> Result<Self, CollaboratorError> {
        if !config.enabled {
            return Err(CollaboratorError::Disabled("urgency estimator"));
        }
        let key = api_key_from_env(&config.api_key_env)?;
        Self::new(&config.endpoint, &config.embedding_model, key)
    }
}

#[async_trait]
impl Embedder for GeminiEmbedder {
    fn model(&self) -> &str {
        &self.model
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, CollaboratorError> {
        let body = EmbedRequest {
            content: Content {
                parts: vec![Part { text }],
            },
        };
        let resp = self
            .client
            .post(self.url.clone())
            .header(API_KEY_HEADER, &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(http_error)?
            .error_for_status()
            .map_err(http_error)?;

        let reply: EmbedResponse = resp.json().await.map_err(|e| malformed(e.to_string()))?;
        if reply.embedding.values.is_empty() {
            return Err(malformed("empty embedding"));
        }
        Ok(reply.embedding.values)
    }
}
