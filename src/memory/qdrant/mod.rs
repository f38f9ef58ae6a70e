// src/memory/qdrant/mod.rs
//! Qdrant-backed vector store connector. The only module aware of the Qdrant
//! wire protocol; everything above it speaks the `VectorStore` trait.

pub mod mapping;
pub mod search;
pub mod store;

use crate::error::{EngramError, Result};
use crate::memory::filter::FilterExpr;
use crate::memory::traits::VectorStore;
use crate::memory::types::{DistanceMetric, SearchResult, StoredPoint};
use async_trait::async_trait;
use qdrant_client::Qdrant;
use qdrant_client::qdrant::Distance;
use tracing::info;

pub struct QdrantConnector {
    client: Qdrant,
}

impl QdrantConnector {
    /// Connect to a Qdrant instance. This only builds the channel; the first
    /// RPC is what actually talks to the server.
    pub fn new(url: &str, api_key: Option<String>) -> Result<Self> {
        let client = Qdrant::from_url(url)
            .api_key(api_key)
            .skip_compatibility_check()
            .build()
            .map_err(|e| EngramError::StoreUnavailable(e.to_string()))?;

        info!("Connected to Qdrant at {}", url);
        Ok(Self { client })
    }

    pub(crate) fn client(&self) -> &Qdrant {
        &self.client
    }
}

/// Translate a configured metric into the Qdrant distance enum.
pub(crate) fn to_distance(metric: DistanceMetric) -> Distance {
    match metric {
        DistanceMetric::Cosine => Distance::Cosine,
        DistanceMetric::Dot => Distance::Dot,
        DistanceMetric::Euclid => Distance::Euclid,
    }
}

/// Transport/server failures become StoreUnavailable; schema conflicts are
/// detected separately where Qdrant reports them.
pub(crate) fn map_store_err(err: qdrant_client::QdrantError) -> EngramError {
    EngramError::StoreUnavailable(err.to_string())
}

#[async_trait]
impl VectorStore for QdrantConnector {
    async fn collection_exists(&self, name: &str) -> Result<bool> {
        self.client
            .collection_exists(name)
            .await
            .map_err(map_store_err)
    }

    async fn create_collection(
        &self,
        name: &str,
        dim: usize,
        metric: DistanceMetric,
    ) -> Result<()> {
        self.create_collection_impl(name, dim, metric).await
    }

    async fn upsert(&self, name: &str, points: Vec<StoredPoint>) -> Result<()> {
        self.upsert_impl(name, points).await
    }

    async fn search(
        &self,
        name: &str,
        vector: Vec<f32>,
        filter: Option<&FilterExpr>,
        limit: usize,
        score_threshold: Option<f32>,
    ) -> Result<Vec<SearchResult>> {
        self.search_impl(name, vector, filter, limit, score_threshold)
            .await
    }

    async fn list_collections(&self) -> Result<Vec<String>> {
        let response = self
            .client
            .list_collections()
            .await
            .map_err(map_store_err)?;
        Ok(response.collections.into_iter().map(|c| c.name).collect())
    }
}
