//! Image generation service abstraction.
//!
//! The driver talks to the service through [`ImageGenerator`]; the only
//! production implementation is [`OpenAIImageGenerator`], which calls
//! `POST {api_base}/images/generations` for one base64 image per prompt.
//!
//! # Error classes
//!
//! - HTTP 429, or an error body whose `type`/`code` names a rate limit →
//!   [`GenerateError::RateLimited`]; the driver cools down and retries.
//! - Any other non-2xx status → [`GenerateError::Api`].
//! - Network failures → [`GenerateError::Transport`].
//! - A 2xx body without image data → [`GenerateError::Payload`].

use anyhow::Result;
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

use crate::config::GenerationConfig;
use crate::error::FatalError;

/// One generated image as returned by the service.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedImage {
    /// Base64-encoded image bytes.
    pub b64_json: String,
    /// The service's rewrite of the prompt, when it reports one.
    pub revised_prompt: Option<String>,
}

#[derive(Error, Debug)]
pub enum GenerateError {
    #[error("Rate limited: {0}")]
    RateLimited(String),

    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    Payload(String),
}

impl GenerateError {
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, GenerateError::RateLimited(_))
    }
}

/// A hosted text-to-image service.
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    /// Model identifier, for reporting.
    fn model_name(&self) -> &str;

    /// Generate exactly one image for `prompt`.
    async fn generate(&self, prompt: &str) -> Result<GeneratedImage, GenerateError>;
}

/// OpenAI Images API client.
pub struct OpenAIImageGenerator {
    client: reqwest::Client,
    api_key: String,
    endpoint: String,
    model: String,
    size: String,
    quality: String,
    style: String,
}

impl OpenAIImageGenerator {
    /// Build a client from configuration.
    ///
    /// # Errors
    ///
    /// [`FatalError::MissingCredential`] when the key variable named by
    /// `api_key_env` is unset or empty.
    pub fn new(config: &GenerationConfig) -> Result<Self> {
        let api_key = std::env::var(&config.api_key_env)
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| FatalError::MissingCredential {
                var: config.api_key_env.clone(),
            })?;
        Self::with_key(config, api_key)
    }

    /// Build a client with an explicit key.
    pub fn with_key(config: &GenerationConfig, api_key: String) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            api_key,
            endpoint: format!("{}/images/generations", config.api_base.trim_end_matches('/')),
            model: config.model.clone(),
            size: config.size.clone(),
            quality: config.quality.clone(),
            style: config.style.clone(),
        })
    }
}

#[async_trait]
impl ImageGenerator for OpenAIImageGenerator {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn generate(&self, prompt: &str) -> Result<GeneratedImage, GenerateError> {
        let body = serde_json::json!({
            "model": self.model,
            "prompt": prompt,
            "n": 1,
            "size": self.size,
            "quality": self.quality,
            "style": self.style,
            "response_format": "b64_json",
        });

        let response = self
            .client
            .post(&self.endpoint)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            let parsed: ImagesResponse = response
                .json()
                .await
                .map_err(|e| GenerateError::Payload(e.to_string()))?;
            return parse_images_response(parsed);
        }

        let body_text = response.text().await.unwrap_or_default();
        Err(classify_error(status.as_u16(), &body_text))
    }
}

#[derive(Debug, Deserialize)]
struct ImagesResponse {
    #[serde(default)]
    data: Vec<ImageData>,
}

#[derive(Debug, Deserialize)]
struct ImageData {
    #[serde(default)]
    b64_json: Option<String>,
    #[serde(default)]
    revised_prompt: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default, rename = "type")]
    kind: Option<String>,
    #[serde(default)]
    code: Option<String>,
}

fn parse_images_response(parsed: ImagesResponse) -> Result<GeneratedImage, GenerateError> {
    let first = parsed
        .data
        .into_iter()
        .next()
        .ok_or_else(|| GenerateError::Payload("missing data array".to_string()))?;
    let b64_json = first
        .b64_json
        .filter(|s| !s.is_empty())
        .ok_or_else(|| GenerateError::Payload("missing b64_json".to_string()))?;

    Ok(GeneratedImage {
        b64_json,
        revised_prompt: first.revised_prompt,
    })
}

/// Map a failed response to an error class using the status and, when the
/// body is the usual `{"error": {...}}` envelope, its `type` and `code`.
fn classify_error(status: u16, body: &str) -> GenerateError {
    let envelope = serde_json::from_str::<ErrorEnvelope>(body).ok();

    let rate_limit_tag = envelope.as_ref().is_some_and(|e| {
        [e.error.kind.as_deref(), e.error.code.as_deref()]
            .into_iter()
            .flatten()
            .any(|tag| tag.contains("rate_limit"))
    });

    let message = envelope
        .map(|e| e.error.message)
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| body.to_string());

    if status == 429 || rate_limit_tag {
        GenerateError::RateLimited(message)
    } else {
        GenerateError::Api { status, message }
    }
}
