use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Result, bail};
use clap::{Parser, ValueEnum};

use opta_docs_mcp::config::{self, DocsConfig};
use opta_docs_mcp::docs_parser::{Credentials, DocsClient};
use opta_docs_mcp::mcp::DocsService;
use opta_docs_mcp::server;

#[derive(Parser, Debug)]
#[command(version, about = "OPTA API Documentation MCP Server")]
struct Cli {
    /// Type of server to run
    #[arg(short, long, value_enum, default_value_t = ServerType::Stdio)]
    server_type: ServerType,

    /// Address for the SSE server
    #[arg(short, long, env = "OPTA_MCP_ADDRESS", default_value = "127.0.0.1:8080")]
    address: String,

    /// Origin of the documentation site
    #[arg(long, env = "OPTA_DOCS_BASE_URL", default_value = config::DEFAULT_BASE_URL)]
    base_url: String,

    #[arg(long, env = "OPTA_USERNAME", default_value = "")]
    username: String,

    #[arg(long, env = "OPTA_PASSWORD", default_value = "", hide_env_values = true)]
    password: String,

    /// Directory holding cached documentation pages
    #[arg(long, env = "OPTA_CACHE_DIR", default_value = config::DEFAULT_CACHE_DIR)]
    cache_dir: PathBuf,

    /// Lifetime of both the catalog and cached pages
    #[arg(
        long,
        env = "OPTA_CACHE_TTL_HOURS",
        default_value_t = config::DEFAULT_CACHE_TTL_HOURS,
        value_parser = clap::value_parser!(u64).range(1..=config::MAX_CACHE_TTL_HOURS)
    )]
    cache_ttl_hours: u64,

    /// Pages fetched concurrently per batch
    #[arg(long, env = "OPTA_BATCH_SIZE", default_value_t = config::DEFAULT_BATCH_SIZE)]
    batch_size: usize,

    /// Pause between batches
    #[arg(long, env = "OPTA_BATCH_DELAY_MS", default_value_t = config::DEFAULT_BATCH_DELAY_MS)]
    batch_delay_ms: u64,

    /// Per-request timeout
    #[arg(long, env = "OPTA_FETCH_TIMEOUT_SECS", default_value_t = config::DEFAULT_FETCH_TIMEOUT_SECS)]
    fetch_timeout_secs: u64,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum ServerType {
    /// Start an SSE server
    Sse,
    /// Start a stdio server
    Stdio,
}

impl Cli {
    fn docs_config(&self) -> DocsConfig {
        DocsConfig {
            base_url: self.base_url.clone(),
            cache_dir: self.cache_dir.clone(),
            cache_ttl: Duration::from_secs(self.cache_ttl_hours.saturating_mul(60 * 60)),
            batch_size: self.batch_size,
            batch_delay: Duration::from_millis(self.batch_delay_ms),
            fetch_timeout: Duration::from_secs(self.fetch_timeout_secs),
            ..DocsConfig::default()
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.server_type {
        ServerType::Sse => server::init_sse_tracing(),
        ServerType::Stdio => server::init_stdio_tracing(),
    }

    let credentials = Credentials::new(cli.username.clone(), cli.password.clone());
    if !credentials.is_complete() {
        bail!("OPTA_USERNAME and OPTA_PASSWORD must be set");
    }

    let config = cli.docs_config();
    let client = DocsClient::new(&config, credentials)?;

    match client.authenticate().await {
        Ok(()) => tracing::info!("Authenticated against {}", client.base_url()),
        Err(e) if e.is_auth_failure() => bail!("Authentication failed: {}", e),
        Err(e) => tracing::warn!("Could not verify credentials, continuing: {}", e),
    }

    let service = DocsService::live(&config, Arc::new(client));

    match cli.server_type {
        ServerType::Sse => server::start_sse_server(&cli.address, service).await?,
        ServerType::Stdio => server::start_stdio_server(service).await?,
    }

    Ok(())
}
