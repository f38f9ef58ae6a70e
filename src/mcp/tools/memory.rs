// src/mcp/tools/memory.rs
// Memory tools - store and find over the semantic memory bridge

use crate::mcp::{EngramServer, FindRequest, StoreRequest};
use crate::memory::{Entry, FilterExpr};
use serde_json::json;

/// Store a piece of information in the vector store
pub async fn store(server: &EngramServer, req: StoreRequest) -> Result<String, String> {
    let collection = resolve_collection(server, req.collection)?;

    let entry = Entry::new(req.content, req.metadata);
    let id = server
        .bridge
        .store(&collection, entry)
        .await
        .map_err(|e| e.to_user_string())?;

    let reply = json!({
        "status": "stored",
        "id": id,
        "collection": collection,
        "model": server.bridge.model_id(),
    });
    serde_json::to_string_pretty(&reply).map_err(|e| e.to_string())
}

/// Search memories by semantic similarity
pub async fn find(server: &EngramServer, req: FindRequest) -> Result<String, String> {
    let collection = resolve_collection(server, req.collection)?;

    let filter = match &req.filter {
        Some(raw) => Some(FilterExpr::parse(raw).map_err(|e| e.to_user_string())?),
        None => None,
    };

    let results = server
        .bridge
        .find(&collection, &req.query, filter.as_ref(), req.limit)
        .await
        .map_err(|e| e.to_user_string())?;

    serde_json::to_string_pretty(&results).map_err(|e| e.to_string())
}

fn resolve_collection(
    server: &EngramServer,
    explicit: Option<String>,
) -> Result<String, String> {
    explicit
        .filter(|name| !name.trim().is_empty())
        .or_else(|| server.default_collection.clone())
        .ok_or_else(|| {
            "invalid input: no collection given and no default collection configured".to_string()
        })
}
