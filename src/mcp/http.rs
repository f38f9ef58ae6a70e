// src/mcp/http.rs
// MCP over HTTP (Streamable HTTP transport)

use std::sync::Arc;
use std::time::Duration;

use rmcp::transport::streamable_http_server::{
    StreamableHttpServerConfig, StreamableHttpService, session::local::LocalSessionManager,
};

use crate::mcp::EngramServer;
use crate::memory::MemoryBridge;

/// Create the MCP HTTP service
pub fn create_mcp_service(
    bridge: Arc<MemoryBridge>,
    default_collection: Option<String>,
) -> StreamableHttpService<EngramServer, LocalSessionManager> {
    // Service factory - creates a new EngramServer for each session
    let service_factory = move || Ok(EngramServer::new(bridge.clone(), default_collection.clone()));

    // Session manager for managing MCP sessions
    let session_manager = Arc::new(LocalSessionManager::default());

    // Config for the HTTP transport
    let config = StreamableHttpServerConfig {
        sse_keep_alive: Some(Duration::from_secs(15)),
        stateful_mode: true,
        ..Default::default()
    };

    StreamableHttpService::new(service_factory, session_manager, config)
}
