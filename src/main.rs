// src/main.rs
// Engram - Semantic memory layer for MCP clients

use anyhow::Result;
use clap::{Parser, ValueEnum};
use engram::config::EngramConfig;
use engram::embeddings::create_embedding_provider;
use engram::mcp::{EngramServer, http::create_mcp_service};
use engram::memory::{BridgeOptions, MemoryBridge, QdrantConnector};
use std::sync::Arc;
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "engram")]
#[command(about = "Semantic memory layer for MCP clients, backed by Qdrant")]
#[command(version)]
struct Cli {
    /// Transport protocol for the MCP server
    #[arg(long, value_enum, default_value_t = Transport::Stdio)]
    transport: Transport,

    /// Port for the streamable-http transport (overrides ENGRAM_HTTP_PORT)
    #[arg(long)]
    port: Option<u16>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Transport {
    /// Serve MCP over stdin/stdout (for local clients)
    Stdio,
    /// Serve MCP over streamable HTTP
    StreamableHttp,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = EngramConfig::from_env();

    // stdout belongs to the stdio transport; all logging goes to stderr
    let level = config.log_level.parse::<Level>().unwrap_or(Level::INFO);
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let provider = create_embedding_provider(&config)?;
    info!(
        "Embedding provider ready: {} ({} dimensions)",
        provider.model_id(),
        provider.dimension()
    );

    let connector = Arc::new(QdrantConnector::new(
        &config.qdrant_url,
        config.qdrant_api_key.clone(),
    )?);

    let bridge = Arc::new(MemoryBridge::new(
        provider,
        connector,
        BridgeOptions {
            default_limit: config.search_limit,
            score_threshold: config.score_threshold,
            metric: config.distance_metric,
        },
    ));

    match cli.transport {
        Transport::Stdio => run_stdio(bridge, &config).await,
        Transport::StreamableHttp => run_http(bridge, &config, cli.port).await,
    }
}

async fn run_stdio(bridge: Arc<MemoryBridge>, config: &EngramConfig) -> Result<()> {
    let server = EngramServer::new(bridge, config.default_collection.clone());

    let transport = rmcp::transport::io::stdio();
    let service = rmcp::serve_server(server, transport).await?;
    service.waiting().await?;

    Ok(())
}

async fn run_http(
    bridge: Arc<MemoryBridge>,
    config: &EngramConfig,
    port_override: Option<u16>,
) -> Result<()> {
    let port = port_override.unwrap_or(config.http_port);
    let service = create_mcp_service(bridge, config.default_collection.clone());

    let app = axum::Router::new().nest_service("/mcp", service);
    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!("MCP server listening on http://{}/mcp", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
