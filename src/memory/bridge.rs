// src/memory/bridge.rs
// The semantic memory bridge: store/find orchestration over an embedding
// provider and a vector store.

use crate::embeddings::EmbeddingProvider;
use crate::error::{EngramError, Result};
use crate::memory::collections::CollectionManager;
use crate::memory::filter::FilterExpr;
use crate::memory::traits::VectorStore;
use crate::memory::types::{
    DistanceMetric, Entry, Metadata, PAYLOAD_CONTENT_KEY, PAYLOAD_STORED_AT_KEY, SearchResult,
    StoredPoint,
};
use chrono::Utc;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

/// Bridge-level knobs resolved from configuration at startup.
#[derive(Debug, Clone)]
pub struct BridgeOptions {
    pub default_limit: usize,
    pub score_threshold: Option<f32>,
    pub metric: DistanceMetric,
}

pub struct MemoryBridge {
    provider: Arc<dyn EmbeddingProvider>,
    store: Arc<dyn VectorStore>,
    collections: CollectionManager,
    options: BridgeOptions,
}

impl MemoryBridge {
    pub fn new(
        provider: Arc<dyn EmbeddingProvider>,
        store: Arc<dyn VectorStore>,
        options: BridgeOptions,
    ) -> Self {
        let collections = CollectionManager::new(store.clone());
        Self {
            provider,
            store,
            collections,
            options,
        }
    }

    pub fn model_id(&self) -> &str {
        self.provider.model_id()
    }

    pub fn default_limit(&self) -> usize {
        self.options.default_limit
    }

    /// Store one entry, provisioning the collection on first use. Returns
    /// the generated point identifier.
    pub async fn store(&self, collection: &str, entry: Entry) -> Result<String> {
        if entry.content.trim().is_empty() {
            return Err(EngramError::Validation("content must not be empty".into()));
        }
        if let Some(metadata) = &entry.metadata {
            check_reserved_keys(metadata)?;
        }

        self.collections
            .ensure_ready(collection, self.provider.dimension(), self.options.metric)
            .await?;

        let mut vectors = self
            .provider
            .embed_documents(std::slice::from_ref(&entry.content))
            .await?;
        let vector = vectors
            .pop()
            .ok_or_else(|| EngramError::Provider("provider returned no embedding".into()))?;

        let id = Uuid::new_v4().to_string();
        let point = StoredPoint {
            id: id.clone(),
            vector,
            content: entry.content,
            metadata: entry.metadata,
            stored_at: Utc::now().to_rfc3339(),
        };

        self.store.upsert(collection, vec![point]).await?;
        debug!(
            "Stored entry {} in '{}' (model {})",
            id,
            collection,
            self.provider.model_id()
        );
        Ok(id)
    }

    /// Similarity search. A collection that was never stored to has nothing
    /// to find: that is an empty result, not an error.
    pub async fn find(
        &self,
        collection: &str,
        query: &str,
        filter: Option<&FilterExpr>,
        limit: Option<usize>,
    ) -> Result<Vec<SearchResult>> {
        if !self.store.collection_exists(collection).await? {
            debug!("Collection '{}' does not exist; returning no results", collection);
            return Ok(Vec::new());
        }

        let vector = self.provider.embed_query(query).await?;
        let limit = limit.unwrap_or(self.options.default_limit).max(1);

        self.store
            .search(
                collection,
                vector,
                filter,
                limit,
                self.options.score_threshold,
            )
            .await
    }
}

fn check_reserved_keys(metadata: &Metadata) -> Result<()> {
    for reserved in [PAYLOAD_CONTENT_KEY, PAYLOAD_STORED_AT_KEY] {
        if metadata.contains_key(reserved) {
            return Err(EngramError::Validation(format!(
                "metadata key '{}' is reserved",
                reserved
            )));
        }
    }
    Ok(())
}
