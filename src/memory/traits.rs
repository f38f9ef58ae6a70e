// src/memory/traits.rs
// Storage backend capability interface for the memory bridge.

use crate::error::Result;
use crate::memory::filter::FilterExpr;
use crate::memory::types::{DistanceMetric, SearchResult, StoredPoint};
use async_trait::async_trait;

/// What the memory bridge needs from a vector store backend. Filter
/// translation into the backend's native representation happens inside each
/// implementation, so callers only ever speak the grammar in
/// [`crate::memory::filter`].
#[async_trait]
pub trait VectorStore: Send + Sync {
    async fn collection_exists(&self, name: &str) -> Result<bool>;

    /// Idempotent: succeeds as a no-op when the collection already exists
    /// with matching dimension/metric, fails with a schema conflict when it
    /// exists with a different one. Never migrates or drops data.
    async fn create_collection(&self, name: &str, dim: usize, metric: DistanceMetric)
        -> Result<()>;

    async fn upsert(&self, name: &str, points: Vec<StoredPoint>) -> Result<()>;

    /// Ordered by descending similarity. An empty collection yields an empty
    /// result, not an error.
    async fn search(
        &self,
        name: &str,
        vector: Vec<f32>,
        filter: Option<&FilterExpr>,
        limit: usize,
        score_threshold: Option<f32>,
    ) -> Result<Vec<SearchResult>>;

    async fn list_collections(&self) -> Result<Vec<String>>;
}
