// src/embeddings/openai.rs
// OpenAI embeddings provider using the /v1/embeddings endpoint

use crate::embeddings::EmbeddingProvider;
use crate::error::{EngramError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_MODEL: &str = "text-embedding-3-large";

const TIMEOUT_SECS: u64 = 30;

/// Native output dimensions for the known OpenAI embedding models.
pub fn native_dimensions(model: &str) -> Option<usize> {
    match model {
        "text-embedding-3-large" => Some(3072),
        "text-embedding-3-small" => Some(1536),
        "text-embedding-ada-002" => Some(1536),
        _ => None,
    }
}

#[derive(Serialize)]
struct EmbeddingRequest {
    input: Vec<String>,
    model: String,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
    index: usize,
}

/// OpenAI embeddings client. Queries and documents share one encoding.
pub struct OpenAIEmbeddings {
    client: reqwest::Client,
    api_key: String,
    model: String,
    dim: usize,
    base_url: String,
}

impl OpenAIEmbeddings {
    pub fn new(api_key: String, model: String, dim: usize) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(TIMEOUT_SECS))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            api_key,
            model,
            dim,
            base_url: "https://api.openai.com/v1".to_string(),
        }
    }

    fn api_url(&self) -> String {
        format!("{}/embeddings", self.base_url)
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if let Some(empty) = texts.iter().position(|t| t.trim().is_empty()) {
            return Err(EngramError::Provider(format!(
                "cannot embed empty text (batch index {})",
                empty
            )));
        }

        debug!("Generating OpenAI embeddings for {} text(s)", texts.len());

        let request = EmbeddingRequest {
            input: texts.to_vec(),
            model: self.model.clone(),
        };

        let response = self
            .client
            .post(self.api_url())
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| EngramError::Provider(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(EngramError::Provider(format!(
                "API error {}: {}",
                status, body
            )));
        }

        let parsed: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| EngramError::Provider(e.to_string()))?;

        if parsed.data.len() != texts.len() {
            return Err(EngramError::Provider(format!(
                "batch returned {} embeddings for {} inputs",
                parsed.data.len(),
                texts.len()
            )));
        }

        // The API tags each embedding with its input index; restore input order.
        let mut data = parsed.data;
        data.sort_by_key(|d| d.index);

        let mut results = Vec::with_capacity(data.len());
        for item in data {
            if item.embedding.len() != self.dim {
                return Err(EngramError::Provider(format!(
                    "model returned {} dimensions, expected {}",
                    item.embedding.len(),
                    self.dim
                )));
            }
            results.push(item.embedding);
        }
        Ok(results)
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAIEmbeddings {
    async fn embed_query(&self, text: &str) -> Result<Vec<f32>> {
        if text.trim().is_empty() {
            return Err(EngramError::Provider("cannot embed empty text".into()));
        }
        let input = [text.to_string()];
        let mut vectors = self.embed_batch(&input).await?;
        vectors
            .pop()
            .ok_or_else(|| EngramError::Provider("empty embedding response".into()))
    }

    async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(vec![]);
        }
        self.embed_batch(texts).await
    }

    fn dimension(&self) -> usize {
        self.dim
    }

    fn model_id(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_native_dimensions() {
        assert_eq!(native_dimensions("text-embedding-3-large"), Some(3072));
        assert_eq!(native_dimensions("text-embedding-3-small"), Some(1536));
        assert_eq!(native_dimensions("some-future-model"), None);
    }

    #[tokio::test]
    async fn test_empty_query_is_a_provider_error() {
        let provider = OpenAIEmbeddings::new("key".into(), DEFAULT_MODEL.into(), 3072);
        let err = provider.embed_query("").await.unwrap_err();
        assert!(matches!(err, EngramError::Provider(_)));
    }
}
