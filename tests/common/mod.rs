// tests/common/mod.rs
// Shared test doubles: a deterministic embedder and an in-memory vector
// store with real similarity scoring and filter evaluation.

#![allow(dead_code)]

use async_trait::async_trait;
use engram::embeddings::EmbeddingProvider;
use engram::error::{EngramError, Result};
use engram::memory::filter::{FilterExpr, Predicate, RangeBounds, ScalarValue};
use engram::memory::traits::VectorStore;
use engram::memory::types::{DistanceMetric, Metadata, SearchResult, StoredPoint};
use std::collections::HashMap;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::Mutex;

/// Deterministic bag-of-words embedder: texts sharing words get similar
/// vectors, disjoint texts get orthogonal ones.
pub struct HashEmbedder {
    dim: usize,
    model: String,
}

impl HashEmbedder {
    pub fn new(dim: usize) -> Self {
        Self {
            dim,
            model: format!("hash-embedder-{}", dim),
        }
    }

    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        if text.trim().is_empty() {
            return Err(EngramError::Provider("cannot embed empty text".into()));
        }
        let mut vector = vec![0.0f32; self.dim];
        for word in text
            .to_lowercase()
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
        {
            let mut hasher = DefaultHasher::new();
            word.hash(&mut hasher);
            let bucket = (hasher.finish() as usize) % self.dim;
            vector[bucket] += 1.0;
        }
        let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for value in vector.iter_mut() {
                *value /= norm;
            }
        }
        Ok(vector)
    }
}

#[async_trait]
impl EmbeddingProvider for HashEmbedder {
    async fn embed_query(&self, text: &str) -> Result<Vec<f32>> {
        self.embed(text)
    }

    async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        texts.iter().map(|t| self.embed(t)).collect()
    }

    fn dimension(&self) -> usize {
        self.dim
    }

    fn model_id(&self) -> &str {
        &self.model
    }
}

struct StoredCollection {
    dim: usize,
    metric: DistanceMetric,
    points: Vec<StoredPoint>,
}

/// In-memory VectorStore with cosine scoring, metadata filter evaluation,
/// and knobs for provisioning-failure and race-window tests.
pub struct MemoryVectorStore {
    collections: Mutex<HashMap<String, StoredCollection>>,
    pub create_calls: AtomicUsize,
    pub fail_creates: AtomicBool,
    create_delay: Option<Duration>,
}

impl MemoryVectorStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            collections: Mutex::new(HashMap::new()),
            create_calls: AtomicUsize::new(0),
            fail_creates: AtomicBool::new(false),
            create_delay: None,
        })
    }

    /// Variant whose create call yields for a while, to widen the window
    /// concurrent provisioners could race through.
    pub fn with_create_delay(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            collections: Mutex::new(HashMap::new()),
            create_calls: AtomicUsize::new(0),
            fail_creates: AtomicBool::new(false),
            create_delay: Some(delay),
        })
    }

    pub async fn point_count(&self, name: &str) -> usize {
        self.collections
            .lock()
            .await
            .get(name)
            .map(|c| c.points.len())
            .unwrap_or(0)
    }

    pub async fn collection_dim(&self, name: &str) -> Option<usize> {
        self.collections.lock().await.get(name).map(|c| c.dim)
    }
}

#[async_trait]
impl VectorStore for MemoryVectorStore {
    async fn collection_exists(&self, name: &str) -> Result<bool> {
        Ok(self.collections.lock().await.contains_key(name))
    }

    async fn create_collection(
        &self,
        name: &str,
        dim: usize,
        metric: DistanceMetric,
    ) -> Result<()> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.create_delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_creates.load(Ordering::SeqCst) {
            return Err(EngramError::StoreUnavailable("injected create failure".into()));
        }

        let mut collections = self.collections.lock().await;
        if let Some(existing) = collections.get(name) {
            if existing.dim != dim || existing.metric != metric {
                return Err(EngramError::schema_conflict(
                    name,
                    format!("dimension {} != required {}", existing.dim, dim),
                ));
            }
            return Ok(());
        }
        collections.insert(
            name.to_string(),
            StoredCollection {
                dim,
                metric,
                points: Vec::new(),
            },
        );
        Ok(())
    }

    async fn upsert(&self, name: &str, points: Vec<StoredPoint>) -> Result<()> {
        let mut collections = self.collections.lock().await;
        let collection = collections
            .get_mut(name)
            .ok_or_else(|| EngramError::StoreUnavailable(format!("no collection '{}'", name)))?;
        for point in &points {
            if point.vector.len() != collection.dim {
                return Err(EngramError::schema_conflict(
                    name,
                    format!(
                        "vector dimension {} != collection dimension {}",
                        point.vector.len(),
                        collection.dim
                    ),
                ));
            }
        }
        collection.points.extend(points);
        Ok(())
    }

    async fn search(
        &self,
        name: &str,
        vector: Vec<f32>,
        filter: Option<&FilterExpr>,
        limit: usize,
        score_threshold: Option<f32>,
    ) -> Result<Vec<SearchResult>> {
        let collections = self.collections.lock().await;
        let collection = match collections.get(name) {
            Some(c) => c,
            None => return Ok(Vec::new()),
        };

        let mut hits: Vec<SearchResult> = collection
            .points
            .iter()
            .filter(|point| match filter {
                Some(expr) => filter_matches(expr, point),
                None => true,
            })
            .map(|point| {
                let mut metadata = point.metadata.clone().unwrap_or_default();
                metadata.insert(
                    "stored_at".to_string(),
                    serde_json::Value::String(point.stored_at.clone()),
                );
                SearchResult {
                    content: point.content.clone(),
                    metadata,
                    score: cosine_similarity(&vector, &point.vector),
                }
            })
            .filter(|hit| score_threshold.map(|t| hit.score >= t).unwrap_or(true))
            .collect();

        hits.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        hits.truncate(limit);
        Ok(hits)
    }

    async fn list_collections(&self) -> Result<Vec<String>> {
        Ok(self.collections.lock().await.keys().cloned().collect())
    }
}

pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

fn filter_matches(expr: &FilterExpr, point: &StoredPoint) -> bool {
    let empty = Metadata::new();
    let metadata = point.metadata.as_ref().unwrap_or(&empty);
    expr.conditions.iter().all(|cond| {
        let Some(value) = metadata.get(&cond.field) else {
            return false;
        };
        match &cond.predicate {
            Predicate::Equals(scalar) => value_matches(value, scalar),
            Predicate::AnyOf(scalars) => scalars.iter().any(|s| value_matches(value, s)),
            Predicate::Range(bounds) => value.as_f64().map(|n| in_range(n, bounds)).unwrap_or(false),
        }
    })
}

fn value_matches(value: &serde_json::Value, scalar: &ScalarValue) -> bool {
    // An array field matches when any element matches (Qdrant semantics).
    if let Some(items) = value.as_array() {
        return items.iter().any(|item| value_matches(item, scalar));
    }
    match scalar {
        ScalarValue::Text(s) => value.as_str() == Some(s.as_str()),
        ScalarValue::Integer(i) => value.as_i64() == Some(*i),
        ScalarValue::Bool(b) => value.as_bool() == Some(*b),
    }
}

fn in_range(n: f64, bounds: &RangeBounds) -> bool {
    bounds.gt.map(|b| n > b).unwrap_or(true)
        && bounds.gte.map(|b| n >= b).unwrap_or(true)
        && bounds.lt.map(|b| n < b).unwrap_or(true)
        && bounds.lte.map(|b| n <= b).unwrap_or(true)
}
