//! Gemini Discovery Provider
//!
//! Implements [`DiscoveryService`] on top of the Generative Language API
//! (`models/{model}:generateContent`). Every prompt asks for JSON output
//! constrained by a response schema; the first candidate's first text part
//! is parsed as the answer.
//!
//! ## Usage
//!
//! ```ignore
//! use core_metadata::providers::gemini::{GeminiConfig, GeminiDiscovery};
//!
//! let config = GeminiConfig::from_env().expect("GEMINI_API_KEY not set");
//! let discovery = GeminiDiscovery::new(http_client, config);
//! let candidates = discovery.search("rainy night jazz").await?;
//! ```

use crate::discovery::{DiscoveryService, FileAnalysis, TrackCandidate};
use crate::error::{MetadataError, Result};
use async_trait::async_trait;
use bridge_traits::http::{HttpClient, HttpMethod, HttpRequest};
use core_library::models::Track;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// Default model used for every prompt.
pub const DEFAULT_MODEL: &str = "gemini-3-flash-preview";

/// Default API base URL.
pub const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Number of songs requested per discovery search.
const SEARCH_RESULT_COUNT: usize = 8;

/// Configuration for [`GeminiDiscovery`]
#[derive(Clone)]
pub struct GeminiConfig {
    pub api_key: String,
    pub model: String,
    pub endpoint: String,
    pub timeout: Duration,
}

impl std::fmt::Debug for GeminiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiConfig")
            .field("api_key", &"[REDACTED]")
            .field("model", &self.model)
            .field("endpoint", &self.endpoint)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl GeminiConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            timeout: Duration::from_secs(30),
        }
    }

    /// Reads the key from `GEMINI_API_KEY`, then `API_KEY`.
    pub fn from_env() -> Option<Self> {
        ["GEMINI_API_KEY", "API_KEY"]
            .iter()
            .filter_map(|name| std::env::var(name).ok())
            .find(|value| !value.trim().is_empty())
            .map(Self::new)
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn generate_url(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.endpoint.trim_end_matches('/'),
            self.model
        )
    }
}

/// Discovery service backed by Gemini.
pub struct GeminiDiscovery {
    http_client: Arc<dyn HttpClient>,
    config: GeminiConfig,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<GenerateCandidate>,
}

#[derive(Debug, Deserialize)]
struct GenerateCandidate {
    content: Option<GenerateContent>,
}

#[derive(Debug, Deserialize)]
struct GenerateContent {
    #[serde(default)]
    parts: Vec<GeneratePart>,
}

#[derive(Debug, Deserialize)]
struct GeneratePart {
    text: Option<String>,
}

/// Loosely typed search item; entries missing required fields are dropped.
#[derive(Debug, Deserialize)]
struct RawCandidate {
    title: Option<String>,
    artist: Option<String>,
    uri: Option<String>,
    genre: Option<String>,
    mood: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AlternativeAnswer {
    search_query: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnalysisAnswer {
    title: Option<String>,
    artist: Option<String>,
    genre: Option<String>,
    cover_seed: Option<Value>,
}

impl GeminiDiscovery {
    pub fn new(http_client: Arc<dyn HttpClient>, config: GeminiConfig) -> Self {
        Self {
            http_client,
            config,
        }
    }

    /// Sends `prompt` with a JSON response schema and returns the raw text
    /// answer.
    async fn generate(&self, prompt: String, schema: Value) -> Result<String> {
        let body = json!({
            "contents": [{ "parts": [{ "text": prompt }] }],
            "generationConfig": {
                "responseMimeType": "application/json",
                "responseSchema": schema,
            },
        });

        let request = HttpRequest::new(HttpMethod::Post, self.config.generate_url())
            .header("x-goog-api-key", &self.config.api_key)
            .json(&body)?
            .timeout(self.config.timeout);

        let response = self.http_client.execute(request).await?;
        if !response.is_success() {
            let message = response.text().unwrap_or_default();
            warn!(status = response.status, "Discovery request rejected");
            return Err(MetadataError::Http {
                status: response.status,
                message,
            });
        }

        let parsed: GenerateResponse = response
            .json()
            .map_err(|e| MetadataError::MalformedResponse(e.to_string()))?;

        parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .and_then(|c| c.parts.into_iter().next())
            .and_then(|p| p.text)
            .ok_or_else(|| MetadataError::MalformedResponse("response has no text part".into()))
    }

    fn parse_candidates(text: &str) -> Result<Vec<TrackCandidate>> {
        let raw: Vec<RawCandidate> = serde_json::from_str(text)
            .map_err(|e| MetadataError::MalformedResponse(format!("candidate list: {}", e)))?;

        Ok(raw
            .into_iter()
            .filter_map(|item| {
                let title = item.title.filter(|s| !s.trim().is_empty())?;
                let uri = item.uri.filter(|s| !s.trim().is_empty())?;
                Some(TrackCandidate {
                    title,
                    artist: item.artist.unwrap_or_default(),
                    uri: uri.trim().to_string(),
                    genre: item.genre,
                    mood: item.mood,
                })
            })
            .collect())
    }

    fn parse_alternative(text: &str) -> Result<Option<String>> {
        let answer: AlternativeAnswer = serde_json::from_str(text)
            .map_err(|e| MetadataError::MalformedResponse(format!("alternative: {}", e)))?;
        Ok(answer.search_query.filter(|q| !q.trim().is_empty()))
    }

    fn parse_analysis(text: &str, filename: &str) -> Result<FileAnalysis> {
        let answer: AnalysisAnswer = serde_json::from_str(text)
            .map_err(|e| MetadataError::MalformedResponse(format!("analysis: {}", e)))?;

        let fallback = FileAnalysis::fallback(filename);
        let cover_seed = match answer.cover_seed {
            Some(Value::Number(n)) => Some(n.to_string()),
            Some(Value::String(s)) if !s.trim().is_empty() => Some(s),
            _ => None,
        };

        Ok(FileAnalysis {
            title: answer.title.unwrap_or_else(|| filename.to_string()),
            artist: answer.artist.unwrap_or(fallback.artist),
            genre: answer.genre,
            cover_seed,
        })
    }
}

#[async_trait]
impl DiscoveryService for GeminiDiscovery {
    #[instrument(skip(self))]
    async fn search(&self, query: &str) -> Result<Vec<TrackCandidate>> {
        let prompt = format!(
            "Search for music based on this mood/query: \"{query}\". \
             Return a list of {SEARCH_RESULT_COUNT} real songs. Prioritize official audio uploads or topic channels. \
             For \"uri\", provide the 11-character video ID if you are highly confident, otherwise provide a search query."
        );
        let schema = json!({
            "type": "ARRAY",
            "items": {
                "type": "OBJECT",
                "properties": {
                    "title": { "type": "STRING" },
                    "artist": { "type": "STRING" },
                    "uri": { "type": "STRING", "description": "Video ID (11 chars) or a specific search query" },
                    "genre": { "type": "STRING" },
                    "mood": { "type": "STRING" }
                },
                "required": ["title", "artist", "uri"]
            }
        });

        let text = self.generate(prompt, schema).await?;
        let candidates = Self::parse_candidates(&text)?;
        debug!(count = candidates.len(), "Discovery search answered");
        Ok(candidates)
    }

    #[instrument(skip(self, track), fields(track_id = %track.id))]
    async fn alternative_query(&self, track: &Track) -> Result<Option<String>> {
        let prompt = format!(
            "The streamed track \"{} by {}\" is restricted or blocked. \
             Find an alternative official audio or topic channel version. \
             Return a JSON object with a single field \"searchQuery\".",
            track.title, track.artist
        );
        let schema = json!({
            "type": "OBJECT",
            "properties": { "searchQuery": { "type": "STRING" } }
        });

        let text = self.generate(prompt, schema).await?;
        Self::parse_alternative(&text)
    }

    #[instrument(skip(self))]
    async fn analyze_filename(&self, filename: &str) -> Result<FileAnalysis> {
        let prompt = format!(
            "Analyze this filename: \"{filename}\". \
             Extract artist, song title, and suggest a genre. \
             Also provide a numeric seed for a cover image (1-1000)."
        );
        let schema = json!({
            "type": "OBJECT",
            "properties": {
                "title": { "type": "STRING" },
                "artist": { "type": "STRING" },
                "genre": { "type": "STRING" },
                "coverSeed": { "type": "NUMBER" }
            },
            "required": ["title", "artist"]
        });

        let text = self.generate(prompt, schema).await?;
        Self::parse_analysis(&text, filename)
    }
}
