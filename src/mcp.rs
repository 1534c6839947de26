//! OPTA documentation MCP implementation.
//!
//! Exposes the documentation catalog as MCP tools: relevance search, lookups by URL,
//! category and code, cache maintenance, and question answering over one endpoint's
//! page.
//!
//! # Main Components
//!
//! - [`DocsService`]: the tool box; cheap to clone, all state is shared
//! - [`CatalogCache`]: the in-memory catalog it queries
//! - [`ContentCache`]: the on-disk page cache behind the fetch pipeline
//!
//! # Example
//! ```no_run
//! use std::sync::Arc;
//! use opta_docs_mcp::config::DocsConfig;
//! use opta_docs_mcp::docs_parser::{Credentials, DocsClient};
//! use opta_docs_mcp::mcp::DocsService;
//!
//! fn example() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = DocsConfig::default();
//!     let client = DocsClient::new(&config, Credentials::new("user", "secret"))?;
//!     let service = DocsService::live(&config, Arc::new(client));
//!     Ok(())
//! }
//! ```

use rmcp::model::{Content, Implementation, IntoContents, ListPromptsResult, PaginatedRequestParam, ProtocolVersion, ServerCapabilities};
use rmcp::service::RequestContext;
use rmcp::{Error as McpError, RoleServer, ServerHandler, model::ServerInfo, tool};
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;

use crate::answer::answer_question;
use crate::cache::{ContentCache, ContentCacheStatus, FsStore, KvStore};
use crate::catalog::{CatalogCache, CatalogStatus, LiveCatalogBuilder};
use crate::clock::{Clock, SystemClock};
use crate::config::{DocsConfig, SearchWeights};
use crate::discovery::Discovery;
use crate::discovery::normalize::normalize_url;
use crate::docs_parser::{DocContent, DocsFetchError, PageFetcher};
use crate::endpoint::EndpointDescriptor;
use crate::fetch::FetchPipeline;
use crate::search::search;

#[derive(Debug, Error)]
pub enum DocsToolError {
    #[error("Error fetching documentation: {0}")]
    Fetch(#[from] DocsFetchError),

    #[error("Error serializing response: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl IntoContents for DocsToolError {
    fn into_contents(self) -> Vec<Content> {
        vec![Content::text(format!("Error: {}", self))]
    }
}

/// Listing view of an endpoint, without its page content.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EndpointSummary<'a> {
    name: &'a str,
    url: &'a str,
    category: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    code: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,
}

impl<'a> From<&'a EndpointDescriptor> for EndpointSummary<'a> {
    fn from(endpoint: &'a EndpointDescriptor) -> Self {
        Self {
            name: &endpoint.name,
            url: &endpoint.url,
            category: &endpoint.category,
            code: endpoint.code.as_deref(),
            description: endpoint.description.as_deref(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SearchHit<'a> {
    #[serde(flatten)]
    endpoint: EndpointSummary<'a>,
    relevance: u32,
    matched_terms: &'a [String],
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CacheStatusReport {
    catalog: CatalogStatus,
    content_cache: ContentCacheStatus,
}

fn json<T: Serialize>(value: &T) -> Result<DocContent, DocsToolError> {
    Ok(DocContent {
        content: serde_json::to_string_pretty(value)?,
    })
}

fn text(content: impl Into<String>) -> Result<DocContent, DocsToolError> {
    Ok(DocContent {
        content: content.into(),
    })
}

/// The MCP tool box over the documentation catalog.
#[derive(Clone)]
pub struct DocsService {
    catalog: Arc<CatalogCache>,
    content_cache: Arc<ContentCache>,
    pipeline: Arc<FetchPipeline>,
    weights: SearchWeights,
    base_url: String,
    doc_root: String,
}

#[tool(tool_box)]
impl DocsService {
    pub fn new(
        config: &DocsConfig,
        catalog: Arc<CatalogCache>,
        content_cache: Arc<ContentCache>,
        pipeline: Arc<FetchPipeline>,
    ) -> Self {
        Self {
            catalog,
            content_cache,
            pipeline,
            weights: config.weights,
            base_url: config.base_url.clone(),
            doc_root: config.doc_root.clone(),
        }
    }

    /// Wires discovery, fetching and both caches against the given fetcher, storing
    /// pages under `config.cache_dir`.
    pub fn live(config: &DocsConfig, fetcher: Arc<dyn PageFetcher>) -> Self {
        let store = Arc::new(FsStore::new(config.cache_dir.clone()));
        Self::live_with(config, fetcher, store, Arc::new(SystemClock))
    }

    pub fn live_with(
        config: &DocsConfig,
        fetcher: Arc<dyn PageFetcher>,
        store: Arc<dyn KvStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let content_cache = Arc::new(ContentCache::new(store, clock.clone(), config.ttl()));
        let pipeline = Arc::new(FetchPipeline::new(config, fetcher.clone(), content_cache.clone()));
        let builder = LiveCatalogBuilder::new(Discovery::live(config, fetcher), pipeline.clone());
        let catalog = Arc::new(CatalogCache::new(Arc::new(builder), clock, config.ttl()));
        Self::new(config, catalog, content_cache, pipeline)
    }

    pub fn catalog(&self) -> &Arc<CatalogCache> {
        &self.catalog
    }

    #[tool(description = "Search the OPTA API documentation. Results are ranked by relevance across endpoint name, description, category and page content.")]
    async fn search_documentation(
        &self,
        #[tool(param)]
        #[schemars(description = "Free-text query, e.g. 'soccer possession events'. Words of two letters or fewer are ignored.")]
        query: String,

        #[tool(param)]
        #[schemars(description = "Maximum number of results to return. All matches are returned if not specified.")]
        limit: Option<usize>,
    ) -> Result<DocContent, DocsToolError> {
        let snapshot = self.catalog.get_snapshot().await;
        let results = search(&query, &snapshot.endpoints, &self.weights);
        tracing::info!("Search '{}' matched {} endpoints", query, results.len());

        let hits: Vec<SearchHit<'_>> = results
            .iter()
            .take(limit.unwrap_or(usize::MAX))
            .map(|result| SearchHit {
                endpoint: EndpointSummary::from(&result.endpoint),
                relevance: result.relevance,
                matched_terms: &result.matched_terms,
            })
            .collect();
        json(&hits)
    }

    #[tool(description = "Get one documentation endpoint, including its page text, by URL")]
    async fn get_endpoint_by_url(
        &self,
        #[tool(param)]
        #[schemars(description = "Server-relative URL of the endpoint page, e.g. '/docs/rh/sdapi/Topics/soccer/opta-sdapi-soccer-api-match-events.htm'. Absolute URLs on the documentation host are accepted.")]
        url: String,
    ) -> Result<DocContent, DocsToolError> {
        let snapshot = self.catalog.get_snapshot().await;
        let url = normalize_url(&url, &self.base_url, &self.doc_root);
        match snapshot.find_by_url(&url) {
            Some(endpoint) => json(endpoint),
            None => text(format!("No endpoint found for URL {}", url)),
        }
    }

    #[tool(description = "List the documentation endpoints of one category (case-insensitive)")]
    async fn get_endpoints_by_category(
        &self,
        #[tool(param)]
        #[schemars(description = "Category name, e.g. 'soccer'")]
        category: String,
    ) -> Result<DocContent, DocsToolError> {
        let snapshot = self.catalog.get_snapshot().await;
        let endpoints: Vec<EndpointSummary<'_>> = snapshot
            .find_by_category(&category)
            .into_iter()
            .map(EndpointSummary::from)
            .collect();
        json(&endpoints)
    }

    #[tool(description = "List every documentation endpoint in the catalog")]
    async fn list_all_endpoints(&self) -> Result<DocContent, DocsToolError> {
        let snapshot = self.catalog.get_snapshot().await;
        let endpoints: Vec<EndpointSummary<'_>> =
            snapshot.endpoints.iter().map(EndpointSummary::from).collect();
        json(&endpoints)
    }

    #[tool(description = "List the endpoint categories with the number of endpoints in each")]
    async fn list_categories(&self) -> Result<DocContent, DocsToolError> {
        let snapshot = self.catalog.get_snapshot().await;
        json(&snapshot.categories())
    }

    #[tool(description = "Discard the cached catalog and rediscover and refetch all endpoints")]
    async fn refresh_cache(&self) -> Result<DocContent, DocsToolError> {
        let snapshot = self.catalog.refresh().await;
        text(format!(
            "Catalog refreshed: {} endpoints at {}",
            snapshot.endpoints.len(),
            snapshot.last_updated.to_rfc3339()
        ))
    }

    #[tool(description = "Report the state of the catalog cache and the page content cache")]
    async fn get_cache_status(&self) -> Result<DocContent, DocsToolError> {
        json(&CacheStatusReport {
            catalog: self.catalog.status().await,
            content_cache: self.content_cache.status().await,
        })
    }

    #[tool(description = "Delete every cached documentation page so the next fetch goes to the server")]
    async fn clear_content_cache(&self) -> Result<DocContent, DocsToolError> {
        self.content_cache.clear().await;
        text("Content cache cleared")
    }

    #[tool(description = "Get the documentation for a specific OPTA endpoint and answer a question about it")]
    async fn get_endpoint_documentation(
        &self,
        #[tool(param)]
        #[schemars(description = "The endpoint code (e.g., MA13, MA1, PE2)")]
        endpoint_code: String,

        #[tool(param)]
        #[schemars(description = "Question about the endpoint documentation (e.g., 'What is the overview?', 'What are the parameters?')")]
        question: String,
    ) -> Result<DocContent, DocsToolError> {
        let snapshot = self.catalog.get_snapshot().await;
        let Some(endpoint) = snapshot.find_by_code(&endpoint_code) else {
            return text(format!(
                "Endpoint {} not found. Available endpoints: {}",
                endpoint_code,
                snapshot.codes().join(", ")
            ));
        };

        tracing::info!("Answering '{}' for endpoint {}", question, endpoint_code);
        let html = self.pipeline.raw_content(endpoint).await?;
        let code = endpoint.code.as_deref().unwrap_or(&endpoint_code);
        text(answer_question(&endpoint.name, code, &question, &html))
    }
}

#[tool(tool_box)]
impl ServerHandler for DocsService {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::default(),
            capabilities: ServerCapabilities::builder()
                .enable_tools()
                .build(),
            server_info: Implementation::from_build_env(),
            instructions: Some(
                "This server provides access to the OPTA API documentation. \
                Use 'search_documentation' to find endpoints by topic, the 'get_*' and 'list_*' \
                tools to browse the catalog, and 'get_endpoint_documentation' to ask about one \
                endpoint by its code. The catalog and fetched pages are cached.".to_string()
            ),
        }
    }

    async fn list_prompts(
        &self,
        _request: PaginatedRequestParam,
        _: RequestContext<RoleServer>,
    ) -> Result<ListPromptsResult, McpError> {
        Ok(ListPromptsResult {
            next_cursor: None,
            prompts: vec![],
        })
    }
}
