//! Client for an OpenAI-compatible `/chat/completions` endpoint.
//!
//! One request per user turn, blocking, no streaming. The defaults point
//! at Groq's OpenAI-compatible API but any compatible host works.

use std::time::Duration;

use anyhow::{bail, Context, Result};
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use tracing::debug;

use biblio_core::config::Config;
use biblio_core::traits::CompletionClient;

const DEFAULT_BASE_URL: &str = "https://api.groq.com/openai/v1";
const DEFAULT_MODEL: &str = "openai/gpt-oss-120b";
const DEFAULT_TEMPERATURE: f32 = 0.2;
const DEFAULT_MAX_TOKENS: u32 = 1024;

/// Connection settings for the completion service.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub base_url: String,
    pub model: String,
    pub api_key: Option<String>,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl LlmConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            base_url: config
                .get("llm.base_url")
                .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string()),
            model: config
                .get("llm.model")
                .unwrap_or_else(|_| DEFAULT_MODEL.to_string()),
            api_key: config.get("llm.api_key").ok(),
            temperature: config.get("llm.temperature").unwrap_or(DEFAULT_TEMPERATURE),
            max_tokens: config.get("llm.max_tokens").unwrap_or(DEFAULT_MAX_TOKENS),
        }
    }
}

/// Blocking chat-completion client. Constructed explicitly and passed in
/// wherever answers are generated, so callers can swap in a fake.
pub struct ChatCompletionClient {
    client: Client,
    endpoint: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
}

impl ChatCompletionClient {
    pub fn new(settings: LlmConfig) -> Result<Self> {
        let api_key = settings.api_key.as_deref().unwrap_or_default();
        anyhow::ensure!(
            !api_key.trim().is_empty(),
            "llm.api_key is not set; add it to config.toml or export APP_LLM__API_KEY"
        );

        let mut headers = HeaderMap::new();
        let auth = format!("Bearer {}", api_key.trim());
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&auth).context("invalid completion API key")?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .default_headers(headers)
            .build()
            .context("failed to build completion HTTP client")?;
        let endpoint = format!(
            "{}/chat/completions",
            settings.base_url.trim_end_matches('/')
        );
        Ok(Self {
            client,
            endpoint,
            model: settings.model,
            temperature: settings.temperature,
            max_tokens: settings.max_tokens,
        })
    }
}

impl CompletionClient for ChatCompletionClient {
    fn complete(&self, prompt: &str) -> Result<String> {
        let body = ChatRequest {
            model: &self.model,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            messages: vec![ChatMessage { role: "user", content: prompt }],
        };
        debug!(model = %self.model, prompt_chars = prompt.len(), "requesting completion");
        let response = self
            .client
            .post(&self.endpoint)
            .json(&body)
            .send()
            .context("failed to reach the completion service")?;
        let status = response.status();
        if !status.is_success() {
            let text = response
                .text()
                .unwrap_or_else(|_| "<body unavailable>".to_string());
            bail!("completion request failed ({status}): {text}");
        }
        let parsed: ChatResponse = response
            .json()
            .context("failed to parse completion response")?;
        match parsed.choices.into_iter().next() {
            Some(choice) => Ok(choice.message.content),
            None => bail!("completion response contained no choices"),
        }
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f32,
    max_tokens: u32,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: AssistantMessage,
}

#[derive(Debug, Deserialize)]
struct AssistantMessage {
    content: String,
}
