use rmcp::ServiceExt;
use rmcp::transport::sse_server::SseServer;
use rmcp::transport::stdio;
use tracing_subscriber::{self, layer::SubscriberExt, util::SubscriberInitExt};

use crate::mcp::DocsService;

/// Logs to stdout, filtered by `RUST_LOG` (default `info`).
pub fn init_sse_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".to_string().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Logs to stderr without colours; stdout carries the protocol.
pub fn init_stdio_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".to_string().into()),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();
}

// start sse server
pub async fn start_sse_server(addr: &str, service: DocsService) -> anyhow::Result<()> {
    tracing::info!("Starting SSE server on {}", addr);
    let ct = SseServer::serve(addr.parse()?)
        .await?
        .with_service(move || service.clone());

    tokio::signal::ctrl_c().await?;
    ct.cancel();
    Ok(())
}

// start stdio server
pub async fn start_stdio_server(service: DocsService) -> anyhow::Result<()> {
    tracing::info!("Starting MCP server");

    let service = service.serve(stdio()).await.inspect_err(|e| {
        tracing::error!("serving error: {:?}", e);
    })?;

    service.waiting().await?;
    Ok(())
}
