// src/embeddings/mod.rs
// Embedding provider abstraction and selection.

pub mod gemini;
pub mod openai;

use crate::config::EngramConfig;
use crate::error::{EngramError, Result};
use async_trait::async_trait;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

pub use gemini::GeminiEmbeddings;
pub use openai::OpenAIEmbeddings;

/// Capability interface every embedding backend satisfies. Query and
/// document embedding are separate operations because retrieval-tuned models
/// encode them differently; providers without that asymmetry just route both
/// through the same call.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embed a single piece of text for search purposes.
    async fn embed_query(&self, text: &str) -> Result<Vec<f32>>;

    /// Batch embedding for storage. Output order and size match the input.
    async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Stable for the lifetime of a configured provider instance.
    fn dimension(&self) -> usize;

    /// Model identifier, for collection compatibility checks and logging.
    fn model_id(&self) -> &str;
}

/// Which embedding backend to use, selected from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    Gemini,
    OpenAI,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Gemini => "gemini",
            ProviderKind::OpenAI => "openai",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "gemini" => Ok(ProviderKind::Gemini),
            "openai" => Ok(ProviderKind::OpenAI),
            other => Err(format!("unknown embedding provider: {}", other)),
        }
    }
}

/// Build the configured embedding provider.
pub fn create_embedding_provider(config: &EngramConfig) -> Result<Arc<dyn EmbeddingProvider>> {
    let kind: ProviderKind = config
        .embedding_provider
        .parse()
        .map_err(EngramError::Config)?;

    match kind {
        ProviderKind::Gemini => {
            let api_key = config.gemini_api_key.clone().ok_or_else(|| {
                EngramError::Config("GEMINI_API_KEY is required for the gemini provider".into())
            })?;
            let model = config
                .embedding_model
                .clone()
                .unwrap_or_else(|| gemini::DEFAULT_MODEL.to_string());
            Ok(Arc::new(GeminiEmbeddings::new(
                api_key,
                model,
                config.embedding_dim,
            )))
        }
        ProviderKind::OpenAI => {
            let api_key = config.openai_api_key.clone().ok_or_else(|| {
                EngramError::Config("OPENAI_API_KEY is required for the openai provider".into())
            })?;
            let model = config
                .embedding_model
                .clone()
                .unwrap_or_else(|| openai::DEFAULT_MODEL.to_string());
            let dim = openai::native_dimensions(&model).unwrap_or(config.embedding_dim);
            Ok(Arc::new(OpenAIEmbeddings::new(api_key, model, dim)))
        }
    }
}
