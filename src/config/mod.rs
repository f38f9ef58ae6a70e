// src/config/mod.rs
// All values come from the environment (with .env resolution); the rest of
// the crate only ever sees the resolved struct.

use serde::Deserialize;
use std::str::FromStr;

use crate::memory::types::DistanceMetric;

#[derive(Debug, Clone, Deserialize)]
pub struct EngramConfig {
    // ── Qdrant Configuration
    pub qdrant_url: String,
    pub qdrant_api_key: Option<String>,
    pub default_collection: Option<String>,

    // ── Embedding Provider Configuration
    pub embedding_provider: String,
    pub embedding_model: Option<String>,
    pub embedding_dim: usize,
    pub gemini_api_key: Option<String>,
    pub openai_api_key: Option<String>,

    // ── Search Configuration
    pub search_limit: usize,
    pub score_threshold: Option<f32>,
    pub distance_metric: DistanceMetric,

    // ── Server Configuration
    pub http_port: u16,
    pub log_level: String,
}

// Handles values with trailing inline comments and extra whitespace.
fn env_var_or<T>(key: &str, default: T) -> T
where
    T: FromStr,
{
    match std::env::var(key) {
        Ok(val) => {
            let clean_val = val.split('#').next().unwrap_or("").trim();
            match clean_val.parse::<T>() {
                Ok(parsed) => parsed,
                Err(_) => {
                    eprintln!("Config: {} = '{}' (parse failed, using default)", key, val);
                    default
                }
            }
        }
        Err(_) => default,
    }
}

fn env_var_opt(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl EngramConfig {
    pub fn from_env() -> Self {
        // Load from .env file first if it exists; missing file is fine.
        let _ = dotenvy::dotenv();

        Self {
            qdrant_url: env_var_or("QDRANT_URL", "http://localhost:6334".to_string()),
            qdrant_api_key: env_var_opt("QDRANT_API_KEY"),
            default_collection: env_var_opt("COLLECTION_NAME"),
            embedding_provider: env_var_or("EMBEDDING_PROVIDER", "gemini".to_string()),
            embedding_model: env_var_opt("EMBEDDING_MODEL"),
            embedding_dim: env_var_or("EMBEDDING_DIM", 3072),
            gemini_api_key: env_var_opt("GEMINI_API_KEY").or_else(|| env_var_opt("GOOGLE_API_KEY")),
            openai_api_key: env_var_opt("OPENAI_API_KEY"),
            search_limit: env_var_or("ENGRAM_SEARCH_LIMIT", 10),
            score_threshold: env_var_opt("ENGRAM_SCORE_THRESHOLD").and_then(|v| v.parse().ok()),
            distance_metric: env_var_or("ENGRAM_DISTANCE", DistanceMetric::Cosine),
            http_port: env_var_or("ENGRAM_HTTP_PORT", 8000),
            log_level: env_var_or("ENGRAM_LOG_LEVEL", "info".to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_var_or_strips_inline_comments() {
        unsafe { std::env::set_var("ENGRAM_TEST_LIMIT", "25 # raise me later") };
        let parsed: usize = env_var_or("ENGRAM_TEST_LIMIT", 10);
        assert_eq!(parsed, 25);
        unsafe { std::env::remove_var("ENGRAM_TEST_LIMIT") };
    }

    #[test]
    fn test_env_var_or_falls_back_on_garbage() {
        unsafe { std::env::set_var("ENGRAM_TEST_PORT", "not-a-port") };
        let parsed: u16 = env_var_or("ENGRAM_TEST_PORT", 8000);
        assert_eq!(parsed, 8000);
        unsafe { std::env::remove_var("ENGRAM_TEST_PORT") };
    }

    #[test]
    fn test_env_var_opt_treats_empty_as_unset() {
        unsafe { std::env::set_var("ENGRAM_TEST_EMPTY", "   ") };
        assert_eq!(env_var_opt("ENGRAM_TEST_EMPTY"), None);
        unsafe { std::env::remove_var("ENGRAM_TEST_EMPTY") };
    }
}
