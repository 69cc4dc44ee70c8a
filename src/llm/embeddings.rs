use async_trait::async_trait;
use futures_util::stream::{self, StreamExt, TryStreamExt};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::LlmConfig;
use crate::error::{Error, Result};

/// Maximum characters to send per text to the embedding API.
/// nomic-embed-text has an 8 192-token context; dense code can reach
/// ~2.3 tokens/char, so 3 000 chars stays under the limit.
const MAX_EMBED_CHARS: usize = 3_000;

/// Keep the first `MAX_EMBED_CHARS` characters (Unicode scalar values) of `text`.
fn truncate_for_embedding(text: &str) -> &str {
    match text.char_indices().nth(MAX_EMBED_CHARS) {
        Some((end, _)) => &text[..end],
        None => text,
    }
}

/// Source of fixed-dimension embedding vectors.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// One vector per input text, in input order. Any failure fails the whole call.
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;
}

/// Embedding provider speaking the Ollama or OpenAI-compatible HTTP API.
///
/// With `batch_size == 1` every text is its own request; larger batches
/// group texts per request. Up to `concurrency` requests run at once and
/// results are reassembled in input order.
pub struct HttpEmbeddingProvider {
    client: reqwest::Client,
    config: LlmConfig,
}

impl HttpEmbeddingProvider {
    pub fn new(client: reqwest::Client, config: LlmConfig) -> Self {
        Self { client, config }
    }

    async fn embed_request(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let embeddings = match self.config.provider.as_str() {
            "ollama" => self.embed_ollama(texts).await?,
            "openai" => self.embed_openai(texts).await?,
            "" | "none" => return Err(Error::EmbeddingUnavailable),
            other => {
                return Err(Error::Embedding(format!(
                    "unknown embedding provider: {other}"
                )))
            }
        };

        if embeddings.len() != texts.len() {
            return Err(Error::Embedding(format!(
                "provider returned {} vectors for {} inputs",
                embeddings.len(),
                texts.len()
            )));
        }
        Ok(embeddings)
    }

    fn timeout(&self) -> Duration {
        Duration::from_secs(self.config.timeout_secs)
    }

    // ─── Ollama ──────────────────────────────────────────────

    async fn embed_ollama(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let url = format!("{}/api/embed", self.config.base_url.trim_end_matches('/'));
        let req = OllamaEmbedRequest {
            model: self.config.embedding_model.clone(),
            input: texts.to_vec(),
            truncate: true,
        };

        let resp = self
            .client
            .post(&url)
            .timeout(self.timeout())
            .json(&req)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Embedding(format!(
                "Ollama embed API returned {status}: {body}"
            )));
        }

        let body: OllamaEmbedResponse = resp.json().await?;
        Ok(body.embeddings)
    }

    // ─── OpenAI-compatible ───────────────────────────────────

    async fn embed_openai(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let url = format!("{}/v1/embeddings", self.config.base_url.trim_end_matches('/'));
        let api_key = self.config.api_key.as_deref().unwrap_or_default();
        let req = OpenAiEmbedRequest {
            model: self.config.embedding_model.clone(),
            input: texts.to_vec(),
        };

        let resp = self
            .client
            .post(&url)
            .timeout(self.timeout())
            .header("Authorization", format!("Bearer {api_key}"))
            .json(&req)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Embedding(format!(
                "OpenAI embed API returned {status}: {body}"
            )));
        }

        let body: OpenAiEmbedResponse = resp.json().await?;
        let mut data = body.data;
        // The API may return entries out of order
        data.sort_by_key(|d| d.index);
        Ok(data.into_iter().map(|d| d.embedding).collect())
    }
}

#[async_trait]
impl EmbeddingProvider for HttpEmbeddingProvider {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let truncated: Vec<String> = texts
            .iter()
            .map(|t| truncate_for_embedding(t).to_string())
            .collect();

        let batch_size = self.config.batch_size.max(1);
        let concurrency = self.config.concurrency.max(1);
        tracing::debug!(
            "Embedding {} texts via {} (batch {batch_size}, concurrency {concurrency})",
            texts.len(),
            self.config.provider
        );

        let requests: Vec<_> = truncated
            .chunks(batch_size)
            .map(|chunk| self.embed_request(chunk))
            .collect();
        let batches: Vec<Vec<Vec<f32>>> = stream::iter(requests)
            .buffered(concurrency)
            .try_collect()
            .await?;

        Ok(batches.into_iter().flatten().collect())
    }
}

#[derive(Serialize)]
struct OllamaEmbedRequest {
    model: String,
    input: Vec<String>,
    /// Ask Ollama to truncate inputs that exceed the model's context length.
    truncate: bool,
}

#[derive(Deserialize)]
struct OllamaEmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

#[derive(Serialize)]
struct OpenAiEmbedRequest {
    model: String,
    input: Vec<String>,
}

#[derive(Deserialize)]
struct OpenAiEmbedResponse {
    data: Vec<OpenAiEmbedData>,
}

#[derive(Deserialize)]
struct OpenAiEmbedData {
    #[serde(default)]
    index: usize,
    embedding: Vec<f32>,
}
