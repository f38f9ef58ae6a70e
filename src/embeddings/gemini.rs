// src/embeddings/gemini.rs
// Gemini embeddings API client

use crate::error::{EngramError, Result};
use crate::embeddings::EmbeddingProvider;
use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_MODEL: &str = "gemini-embedding-001";

/// Max characters to embed (truncate longer text)
const MAX_TEXT_CHARS: usize = 8000;

/// Max batch size for batch embedding
const MAX_BATCH_SIZE: usize = 50;

/// HTTP timeout
const TIMEOUT_SECS: u64 = 30;

/// Retry attempts for transient failures
const RETRY_ATTEMPTS: usize = 2;

const RETRY_DELAY: Duration = Duration::from_millis(500);

/// Gemini task types: retrieval-tuned models encode queries and passages
/// differently.
#[derive(Debug, Clone, Copy)]
enum TaskType {
    Query,
    Document,
}

impl TaskType {
    fn as_str(&self) -> &'static str {
        match self {
            TaskType::Query => "RETRIEVAL_QUERY",
            TaskType::Document => "RETRIEVAL_DOCUMENT",
        }
    }
}

/// Gemini embeddings client
pub struct GeminiEmbeddings {
    api_key: String,
    model: String,
    dim: usize,
    http_client: reqwest::Client,
}

impl GeminiEmbeddings {
    pub fn new(api_key: String, model: String, dim: usize) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(TIMEOUT_SECS))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            api_key,
            model,
            dim,
            http_client,
        }
    }

    fn truncated(text: &str) -> &str {
        if text.len() > MAX_TEXT_CHARS {
            debug!("Truncating text from {} to {} chars", text.len(), MAX_TEXT_CHARS);
            let mut end = MAX_TEXT_CHARS;
            while !text.is_char_boundary(end) {
                end -= 1;
            }
            &text[..end]
        } else {
            text
        }
    }

    fn content_request(&self, text: &str, task: TaskType) -> serde_json::Value {
        serde_json::json!({
            "model": format!("models/{}", self.model),
            "content": {
                "parts": [{"text": Self::truncated(text)}]
            },
            "taskType": task.as_str(),
            "outputDimensionality": self.dim
        })
    }

    fn parse_embedding(&self, value: &serde_json::Value) -> Result<Vec<f32>> {
        let embedding: Vec<f32> = value["values"]
            .as_array()
            .ok_or_else(|| EngramError::Provider("invalid embedding response".into()))?
            .iter()
            .filter_map(|v| v.as_f64().map(|f| f as f32))
            .collect();

        if embedding.len() != self.dim {
            return Err(EngramError::Provider(format!(
                "model returned {} dimensions, expected {}",
                embedding.len(),
                self.dim
            )));
        }
        Ok(embedding)
    }

    /// Embed a single text with the given task type, retrying transient failures.
    async fn embed_one(&self, text: &str, task: TaskType) -> Result<Vec<f32>> {
        if text.trim().is_empty() {
            return Err(EngramError::Provider("cannot embed empty text".into()));
        }

        let url = format!(
            "https://generativelanguage.googleapis.com/v1beta/models/{}:embedContent?key={}",
            self.model, self.api_key
        );
        let body = self.content_request(text, task);

        let mut last_error = None;
        for attempt in 0..=RETRY_ATTEMPTS {
            if attempt > 0 {
                tokio::time::sleep(RETRY_DELAY).await;
            }

            match self.http_client.post(&url).json(&body).send().await {
                Ok(response) => {
                    if response.status().is_success() {
                        let json: serde_json::Value = response
                            .json()
                            .await
                            .map_err(|e| EngramError::Provider(e.to_string()))?;
                        return self.parse_embedding(&json["embedding"]);
                    }
                    let status = response.status();
                    let text = response.text().await.unwrap_or_default();
                    // Auth and quota failures will not recover on retry.
                    if status.as_u16() == 401 || status.as_u16() == 403 || status.as_u16() == 429 {
                        return Err(EngramError::Provider(format!("API error {}: {}", status, text)));
                    }
                    last_error = Some(EngramError::Provider(format!(
                        "API error {}: {}",
                        status, text
                    )));
                }
                Err(e) => {
                    last_error = Some(EngramError::Provider(e.to_string()));
                }
            }
        }

        Err(last_error.unwrap_or_else(|| EngramError::Provider("embedding failed".into())))
    }

    /// Batch embed one chunk via batchEmbedContents. Response order matches
    /// request order.
    async fn embed_chunk(&self, texts: &[String], task: TaskType) -> Result<Vec<Vec<f32>>> {
        let url = format!(
            "https://generativelanguage.googleapis.com/v1beta/models/{}:batchEmbedContents?key={}",
            self.model, self.api_key
        );

        let requests: Vec<_> = texts
            .iter()
            .map(|text| self.content_request(text, task))
            .collect();
        let body = serde_json::json!({ "requests": requests });

        let mut last_error = None;
        for attempt in 0..=RETRY_ATTEMPTS {
            if attempt > 0 {
                tokio::time::sleep(RETRY_DELAY).await;
            }

            match self.http_client.post(&url).json(&body).send().await {
                Ok(response) => {
                    if response.status().is_success() {
                        let json: serde_json::Value = response
                            .json()
                            .await
                            .map_err(|e| EngramError::Provider(e.to_string()))?;
                        let embeddings = json["embeddings"]
                            .as_array()
                            .ok_or_else(|| EngramError::Provider("invalid batch response".into()))?;
                        if embeddings.len() != texts.len() {
                            return Err(EngramError::Provider(format!(
                                "batch returned {} embeddings for {} inputs",
                                embeddings.len(),
                                texts.len()
                            )));
                        }
                        return embeddings.iter().map(|e| self.parse_embedding(e)).collect();
                    }
                    let status = response.status();
                    let text = response.text().await.unwrap_or_default();
                    if status.as_u16() == 401 || status.as_u16() == 403 || status.as_u16() == 429 {
                        return Err(EngramError::Provider(format!("API error {}: {}", status, text)));
                    }
                    last_error = Some(EngramError::Provider(format!(
                        "API error {}: {}",
                        status, text
                    )));
                }
                Err(e) => {
                    last_error = Some(EngramError::Provider(e.to_string()));
                }
            }
        }

        Err(last_error.unwrap_or_else(|| EngramError::Provider("batch embedding failed".into())))
    }
}

#[async_trait]
impl EmbeddingProvider for GeminiEmbeddings {
    async fn embed_query(&self, text: &str) -> Result<Vec<f32>> {
        self.embed_one(text, TaskType::Query).await
    }

    async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(vec![]);
        }
        if let Some(empty) = texts.iter().position(|t| t.trim().is_empty()) {
            return Err(EngramError::Provider(format!(
                "cannot embed empty text (batch index {})",
                empty
            )));
        }

        // Small batches: sequential single calls
        if texts.len() <= 2 {
            let mut results = Vec::with_capacity(texts.len());
            for text in texts {
                results.push(self.embed_one(text, TaskType::Document).await?);
            }
            return Ok(results);
        }

        // Large batches: chunk through the batch API, preserving order
        let mut all_results = Vec::with_capacity(texts.len());
        for chunk in texts.chunks(MAX_BATCH_SIZE) {
            let chunk_results = self.embed_chunk(chunk, TaskType::Document).await?;
            all_results.extend(chunk_results);
        }
        Ok(all_results)
    }

    fn dimension(&self) -> usize {
        self.dim
    }

    fn model_id(&self) -> &str {
        &self.model
    }
}
