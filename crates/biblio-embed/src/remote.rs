//! Client for an OpenAI-compatible `/embeddings` endpoint.

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use tracing::debug;

use biblio_core::config::Config;
use biblio_core::traits::Embedder;

use crate::DEFAULT_DIM;

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_MODEL: &str = "text-embedding-3-small";

// Inputs per request; larger corpora are sent in consecutive requests.
const REQUEST_BATCH_SIZE: usize = 64;

/// Connection settings for the remote embedding service.
#[derive(Debug, Clone)]
pub struct EmbeddingConfig {
    pub base_url: String,
    pub model: String,
    pub api_key: Option<String>,
    pub dim: usize,
}

impl EmbeddingConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            base_url: config
                .get("embedding.base_url")
                .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string()),
            model: config
                .get("embedding.model")
                .unwrap_or_else(|_| DEFAULT_MODEL.to_string()),
            api_key: config.get("embedding.api_key").ok(),
            dim: config.get("embedding.dim").unwrap_or(DEFAULT_DIM),
        }
    }
}

/// Blocking embeddings client for OpenAI-compatible endpoints.
///
/// The `dimensions` request field pins the service to the configured
/// width, so persisted indexes stay compatible across runs.
pub struct RemoteEmbedder {
    client: Client,
    endpoint: String,
    model: String,
    dim: usize,
}

impl RemoteEmbedder {
    pub fn new(settings: EmbeddingConfig) -> Result<Self> {
        let api_key = settings.api_key.as_deref().unwrap_or_default();
        anyhow::ensure!(!api_key.trim().is_empty(), "embedding.api_key is not set");
        anyhow::ensure!(settings.dim > 0, "embedding.dim must be positive");

        let mut headers = HeaderMap::new();
        let auth = format!("Bearer {}", api_key.trim());
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&auth).context("invalid embedding API key")?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .default_headers(headers)
            .build()
            .context("failed to build embedding HTTP client")?;
        let endpoint = format!("{}/embeddings", settings.base_url.trim_end_matches('/'));
        Ok(Self { client, endpoint, model: settings.model, dim: settings.dim })
    }

    fn request_batch(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>> {
        let request = EmbeddingRequest {
            model: &self.model,
            input: inputs,
            dimensions: Some(self.dim),
        };
        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .context("failed to reach the embedding service")?;
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .unwrap_or_else(|_| "<body unavailable>".to_string());
            anyhow::bail!("embedding request failed ({status}): {body}");
        }
        let parsed: EmbeddingResponse = response
            .json()
            .context("failed to parse embedding response")?;
        let vectors = vectors_from(parsed, inputs.len())?;
        for v in &vectors {
            anyhow::ensure!(
                v.len() == self.dim,
                "service returned {}-dim vectors, expected {} (check embedding.dim)",
                v.len(),
                self.dim
            );
        }
        Ok(vectors)
    }
}

impl Embedder for RemoteEmbedder {
    fn dim(&self) -> usize {
        self.dim
    }

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut all = Vec::with_capacity(texts.len());
        for batch in texts.chunks(REQUEST_BATCH_SIZE) {
            debug!(batch = batch.len(), "requesting embeddings");
            all.extend(self.request_batch(batch)?);
        }
        Ok(all)
    }
}

/// Order response rows by their `index` field (services may answer out
/// of order) and require exactly one row per input.
fn vectors_from(mut response: EmbeddingResponse, expected: usize) -> Result<Vec<Vec<f32>>> {
    response.data.sort_by_key(|row| row.index);
    anyhow::ensure!(
        response.data.len() == expected,
        "service returned {} embeddings for {} inputs",
        response.data.len(),
        expected
    );
    Ok(response.data.into_iter().map(|row| row.embedding).collect())
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
    #[serde(skip_serializing_if = "Option::is_none")]
    dimensions: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingRow>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingRow {
    embedding: Vec<f32>,
    index: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn response_rows_are_reordered_by_index() {
        let response: EmbeddingResponse = serde_json::from_str(
            r#"{"data":[
                {"embedding":[2.0],"index":1},
                {"embedding":[1.0],"index":0},
                {"embedding":[3.0],"index":2}
            ]}"#,
        )
        .unwrap();

        let vectors = vectors_from(response, 3).unwrap();
        assert_eq!(vectors, vec![vec![1.0], vec![2.0], vec![3.0]]);
    }

    #[test]
    fn row_count_mismatch_is_an_error() {
        let response: EmbeddingResponse =
            serde_json::from_str(r#"{"data":[{"embedding":[1.0],"index":0}]}"#).unwrap();

        let err = vectors_from(response, 2).unwrap_err();
        assert!(err.to_string().contains("1 embeddings for 2 inputs"));
    }

    #[test]
    fn request_serializes_to_the_wire_shape() {
        let request = EmbeddingRequest {
            model: "text-embedding-3-small",
            input: &["hello".to_string()],
            dimensions: Some(384),
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["model"], "text-embedding-3-small");
        assert_eq!(json["input"][0], "hello");
        assert_eq!(json["dimensions"], 384);
    }

    #[test]
    fn absent_dimensions_are_omitted_from_the_request() {
        let request = EmbeddingRequest {
            model: "m",
            input: &[],
            dimensions: None,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert!(json.get("dimensions").is_none());
    }
}
