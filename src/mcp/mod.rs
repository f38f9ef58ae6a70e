// src/mcp/mod.rs
// MCP Server implementation

pub mod http;
pub mod tools;

use crate::memory::MemoryBridge;
use rmcp::{
    ErrorData, ServerHandler,
    handler::server::{
        router::tool::ToolRouter, tool::ToolCallContext, wrapper::Parameters,
    },
    model::{
        CallToolRequestParam, CallToolResult, ListToolsResult, PaginatedRequestParam,
        ServerCapabilities, ServerInfo,
    },
    schemars,
    service::{RequestContext, RoleServer},
    tool, tool_router,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::debug;

/// MCP Server state
#[derive(Clone)]
pub struct EngramServer {
    pub bridge: Arc<MemoryBridge>,
    pub default_collection: Option<String>,
    tool_router: ToolRouter<Self>,
}

impl EngramServer {
    pub fn new(bridge: Arc<MemoryBridge>, default_collection: Option<String>) -> Self {
        Self {
            bridge,
            default_collection,
            tool_router: Self::tool_router(),
        }
    }
}

// Request types for tools with parameters
#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct StoreRequest {
    #[schemars(description = "Text to remember")]
    pub content: String,
    #[schemars(description = "Collection to store into; the configured default is used if omitted")]
    pub collection: Option<String>,
    #[schemars(description = "JSON metadata to attach to the entry")]
    pub metadata: Option<serde_json::Map<String, serde_json::Value>>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct FindRequest {
    #[schemars(description = "Free-text search query")]
    pub query: String,
    #[schemars(description = "Collection to search; the configured default is used if omitted")]
    pub collection: Option<String>,
    #[schemars(
        description = "Metadata filter object: scalar values match for equality, {\"any\": [..]} for membership, gt/gte/lt/lte for numeric ranges"
    )]
    pub filter: Option<serde_json::Map<String, serde_json::Value>>,
    #[schemars(description = "Max results")]
    pub limit: Option<usize>,
}

#[tool_router]
impl EngramServer {
    #[tool(
        description = "Store a piece of information in semantic memory for later retrieval. Attach metadata to make it filterable."
    )]
    async fn store(&self, Parameters(req): Parameters<StoreRequest>) -> Result<String, String> {
        tools::memory::store(self, req).await
    }

    #[tool(
        description = "Find stored memories semantically similar to a query, optionally restricted by a metadata filter. Returns content, metadata and similarity score per hit."
    )]
    async fn find(&self, Parameters(req): Parameters<FindRequest>) -> Result<String, String> {
        tools::memory::find(self, req).await
    }
}

impl ServerHandler for EngramServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: Default::default(),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: rmcp::model::Implementation {
                name: "engram".into(),
                title: Some("Engram - Semantic Memory for MCP Clients".into()),
                version: env!("CARGO_PKG_VERSION").into(),
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "Engram stores free text as semantic memory in Qdrant and retrieves it by similarity. Use store to remember, find to recall.".into(),
            ),
        }
    }

    fn list_tools(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> impl std::future::Future<Output = Result<ListToolsResult, ErrorData>> + Send + '_ {
        std::future::ready(Ok(ListToolsResult {
            tools: self.tool_router.list_all(),
            next_cursor: None,
            meta: None,
        }))
    }

    fn call_tool(
        &self,
        request: CallToolRequestParam,
        context: RequestContext<RoleServer>,
    ) -> impl std::future::Future<Output = Result<CallToolResult, ErrorData>> + Send + '_ {
        async move {
            let tool_name = request.name.to_string();
            let start = std::time::Instant::now();

            let ctx = ToolCallContext::new(self, request, context);
            let result = self.tool_router.call(ctx).await;

            debug!(
                "Tool '{}' finished in {}ms (ok={})",
                tool_name,
                start.elapsed().as_millis(),
                result.is_ok()
            );
            result
        }
    }
}
