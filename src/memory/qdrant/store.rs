// src/memory/qdrant/store.rs
// Collection provisioning and point upserts against Qdrant.

use super::{QdrantConnector, map_store_err, mapping, to_distance};
use crate::error::{EngramError, Result};
use crate::memory::types::{
    DistanceMetric, PAYLOAD_CONTENT_KEY, PAYLOAD_STORED_AT_KEY, StoredPoint,
};
use qdrant_client::qdrant::{
    CreateCollectionBuilder, PointStruct, UpsertPointsBuilder, Value, VectorParamsBuilder,
    vectors_config,
};
use std::collections::HashMap;
use tracing::{debug, info};

impl QdrantConnector {
    /// Idempotent create: no-op when the collection already matches, schema
    /// conflict when it exists with a different dimension/metric. Existing
    /// data is never migrated or dropped.
    pub(crate) async fn create_collection_impl(
        &self,
        name: &str,
        dim: usize,
        metric: DistanceMetric,
    ) -> Result<()> {
        let exists = self
            .client()
            .collection_exists(name)
            .await
            .map_err(map_store_err)?;

        if exists {
            return self.validate_collection(name, dim, metric).await;
        }

        info!("Creating Qdrant collection: {} (dim={}, metric={})", name, dim, metric);
        let request = CreateCollectionBuilder::new(name)
            .vectors_config(VectorParamsBuilder::new(dim as u64, to_distance(metric)));

        match self.client().create_collection(request).await {
            Ok(_) => Ok(()),
            // Lost a create race against another process; the winner's schema
            // still has to match ours.
            Err(e) if e.to_string().contains("already exists") => {
                self.validate_collection(name, dim, metric).await
            }
            Err(e) => Err(map_store_err(e)),
        }
    }

    /// Compare an existing collection's vector config against what the active
    /// provider needs.
    async fn validate_collection(
        &self,
        name: &str,
        dim: usize,
        metric: DistanceMetric,
    ) -> Result<()> {
        let info = self
            .client()
            .collection_info(name)
            .await
            .map_err(map_store_err)?;

        let config = info
            .result
            .and_then(|r| r.config)
            .and_then(|c| c.params)
            .and_then(|p| p.vectors_config)
            .and_then(|v| v.config);

        match config {
            Some(vectors_config::Config::Params(params)) => {
                if params.size != dim as u64 {
                    return Err(EngramError::schema_conflict(
                        name,
                        format!("dimension {} != required {}", params.size, dim),
                    ));
                }
                let expected = to_distance(metric);
                if params.distance() != expected {
                    return Err(EngramError::schema_conflict(
                        name,
                        format!(
                            "distance {:?} != required {:?}",
                            params.distance(),
                            expected
                        ),
                    ));
                }
                Ok(())
            }
            Some(vectors_config::Config::ParamsMap(_)) => Err(EngramError::schema_conflict(
                name,
                "collection uses named vectors".to_string(),
            )),
            None => Err(EngramError::StoreUnavailable(format!(
                "could not read vector config for collection '{}'",
                name
            ))),
        }
    }

    pub(crate) async fn upsert_impl(&self, name: &str, points: Vec<StoredPoint>) -> Result<()> {
        let points: Vec<PointStruct> = points.into_iter().map(to_point_struct).collect();
        let count = points.len();

        self.client()
            .upsert_points(UpsertPointsBuilder::new(name, points).wait(true))
            .await
            .map_err(|e| {
                let msg = e.to_string();
                // Qdrant reports vector size mismatches as plain error text.
                if msg.to_lowercase().contains("dimension") {
                    EngramError::schema_conflict(name, msg)
                } else {
                    map_store_err(e)
                }
            })?;

        debug!("Upserted {} point(s) into {}", count, name);
        Ok(())
    }
}

/// Payload layout: entry content and store timestamp under reserved keys,
/// user metadata flattened to top-level fields so filters address them
/// directly.
fn to_point_struct(point: StoredPoint) -> PointStruct {
    let mut payload: HashMap<String, Value> = HashMap::new();
    payload.insert(PAYLOAD_CONTENT_KEY.to_string(), point.content.into());
    payload.insert(PAYLOAD_STORED_AT_KEY.to_string(), point.stored_at.into());

    if let Some(metadata) = point.metadata {
        for (key, value) in &metadata {
            payload.insert(key.clone(), mapping::json_to_payload_value(value));
        }
    }

    PointStruct::new(point.id, point.vector, payload)
}
