// src/memory/types.rs
// Core data types shared by the memory bridge and its storage backends.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Arbitrary caller-supplied metadata attached to an entry.
pub type Metadata = serde_json::Map<String, serde_json::Value>;

/// Payload keys written by the bridge itself; metadata may not shadow them.
pub const PAYLOAD_CONTENT_KEY: &str = "content";
pub const PAYLOAD_STORED_AT_KEY: &str = "stored_at";

/// A unit of memory as supplied by the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entry {
    pub content: String,
    pub metadata: Option<Metadata>,
}

impl Entry {
    pub fn new(content: impl Into<String>, metadata: Option<Metadata>) -> Self {
        Self {
            content: content.into(),
            metadata,
        }
    }
}

/// The persisted unit: identifier + vector + original entry fields.
#[derive(Debug, Clone)]
pub struct StoredPoint {
    pub id: String,
    pub vector: Vec<f32>,
    pub content: String,
    pub metadata: Option<Metadata>,
    /// RFC 3339 UTC timestamp recorded at store time.
    pub stored_at: String,
}

/// One search hit, ordered by descending similarity.
#[derive(Debug, Clone, Serialize)]
pub struct SearchResult {
    pub content: String,
    pub metadata: Metadata,
    pub score: f32,
}

/// Distance metric a collection is provisioned with. Fixed per process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DistanceMetric {
    Cosine,
    Dot,
    Euclid,
}

impl DistanceMetric {
    pub fn as_str(&self) -> &'static str {
        match self {
            DistanceMetric::Cosine => "cosine",
            DistanceMetric::Dot => "dot",
            DistanceMetric::Euclid => "euclid",
        }
    }
}

impl Default for DistanceMetric {
    fn default() -> Self {
        DistanceMetric::Cosine
    }
}

impl fmt::Display for DistanceMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for DistanceMetric {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "cosine" => Ok(DistanceMetric::Cosine),
            "dot" => Ok(DistanceMetric::Dot),
            "euclid" | "euclidean" => Ok(DistanceMetric::Euclid),
            other => Err(format!("unknown distance metric: {}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distance_metric_round_trip() {
        for metric in [DistanceMetric::Cosine, DistanceMetric::Dot, DistanceMetric::Euclid] {
            assert_eq!(metric.as_str().parse::<DistanceMetric>().unwrap(), metric);
        }
    }

    #[test]
    fn test_distance_metric_accepts_euclidean_alias() {
        assert_eq!(
            "Euclidean".parse::<DistanceMetric>().unwrap(),
            DistanceMetric::Euclid
        );
    }

    #[test]
    fn test_distance_metric_rejects_unknown() {
        assert!("manhattan".parse::<DistanceMetric>().is_err());
    }
}
