// src/memory/collections.rs
// Tracks which collections have been provisioned, and with what schema.

use crate::error::{EngramError, Result};
use crate::memory::traits::VectorStore;
use crate::memory::types::DistanceMetric;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq)]
struct CollectionSpec {
    dim: usize,
    metric: DistanceMetric,
}

/// Single source of truth for collection provisioning state, consulted
/// before every write. Provisioning is serialized per collection name: one
/// in-flight attempt at a time, concurrent callers wait on the same outcome
/// instead of racing duplicate creates against the store.
pub struct CollectionManager {
    store: Arc<dyn VectorStore>,
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
    ready: RwLock<HashMap<String, CollectionSpec>>,
}

impl CollectionManager {
    pub fn new(store: Arc<dyn VectorStore>) -> Self {
        Self {
            store,
            locks: Mutex::new(HashMap::new()),
            ready: RwLock::new(HashMap::new()),
        }
    }

    /// Make sure `name` exists with a schema compatible with (`dim`,
    /// `metric`): created if absent, validated if present. Readiness is
    /// recorded only after the remote call succeeds, so a cancelled or
    /// failed attempt leaves the name un-ready and a later call retries.
    pub async fn ensure_ready(
        &self,
        name: &str,
        dim: usize,
        metric: DistanceMetric,
    ) -> Result<()> {
        let requested = CollectionSpec { dim, metric };

        if let Some(known) = self.ready.read().await.get(name) {
            return check_spec(name, *known, requested);
        }

        let name_lock = self.lock_for(name).await;
        let _guard = name_lock.lock().await;

        // Another caller may have finished provisioning while we waited.
        if let Some(known) = self.ready.read().await.get(name) {
            return check_spec(name, *known, requested);
        }

        self.store.create_collection(name, dim, metric).await?;
        self.ready
            .write()
            .await
            .insert(name.to_string(), requested);
        debug!("Collection '{}' ready (dim={}, metric={})", name, dim, metric);
        Ok(())
    }

    async fn lock_for(&self, name: &str) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().await;
        locks
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}

fn check_spec(name: &str, known: CollectionSpec, requested: CollectionSpec) -> Result<()> {
    if known == requested {
        Ok(())
    } else {
        Err(EngramError::schema_conflict(
            name,
            format!(
                "provisioned with dim={} metric={}, requested dim={} metric={}",
                known.dim, known.metric, requested.dim, requested.metric
            ),
        ))
    }
}
