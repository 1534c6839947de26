//! Endpoint discovery.
//!
//! Each [`DiscoverySource`] produces a best-effort list of endpoints from one signal.
//! [`Discovery`] runs the dynamic sources in their configured order, records each
//! outcome as a [`SourceReport`], and merges the reports with [`aggregate`]. When every
//! dynamic source comes back empty the static fallback list is used instead.

pub mod fallback;
pub mod index_page;
pub mod normalize;
pub mod sitemap;

use async_trait::async_trait;
use futures::future::join_all;
use std::collections::HashMap;
use std::sync::Arc;

use crate::config::DocsConfig;
use crate::docs_parser::{DocsFetchError, PageFetcher};
use crate::endpoint::EndpointDescriptor;

pub use fallback::StaticSource;
pub use index_page::IndexPageSource;
pub use sitemap::SitemapSource;

#[async_trait]
pub trait DiscoverySource: Send + Sync {
    fn name(&self) -> &str;
    async fn discover(&self) -> Result<Vec<EndpointDescriptor>, DocsFetchError>;
}

/// Outcome of running one source. A failed source has no endpoints and an error.
#[derive(Debug, Clone)]
pub struct SourceReport {
    pub source: String,
    pub endpoints: Vec<EndpointDescriptor>,
    pub error: Option<String>,
}

impl SourceReport {
    pub fn failed(&self) -> bool {
        self.error.is_some()
    }
}

async fn run_source(source: &dyn DiscoverySource) -> SourceReport {
    match source.discover().await {
        Ok(endpoints) => {
            tracing::info!("Source '{}' found {} endpoints", source.name(), endpoints.len());
            SourceReport {
                source: source.name().to_string(),
                endpoints,
                error: None,
            }
        }
        Err(e) => {
            if e.is_auth_failure() {
                tracing::error!("Source '{}' was refused: {}", source.name(), e);
            } else {
                tracing::warn!("Error discovering endpoints from '{}': {}", source.name(), e);
            }
            SourceReport {
                source: source.name().to_string(),
                endpoints: Vec::new(),
                error: Some(e.to_string()),
            }
        }
    }
}

/// True when no dynamic source produced anything.
pub fn needs_fallback(reports: &[SourceReport]) -> bool {
    reports.iter().all(|report| report.endpoints.is_empty())
}

/// Concatenates reports in order, re-normalises every URL and keeps one descriptor per
/// URL. The first descriptor seen wins; later duplicates only fill in what it lacks
/// (code, description, an empty name).
pub fn aggregate(reports: &[SourceReport], base_url: &str, doc_root: &str) -> Vec<EndpointDescriptor> {
    let mut positions: HashMap<String, usize> = HashMap::new();
    let mut merged: Vec<EndpointDescriptor> = Vec::new();
    for endpoint in reports.iter().flat_map(|report| report.endpoints.iter()) {
        let url = normalize::normalize_url(&endpoint.url, base_url, doc_root);
        match positions.get(&url) {
            Some(&index) => fill_missing(&mut merged[index], endpoint),
            None => {
                positions.insert(url.clone(), merged.len());
                let mut endpoint = endpoint.clone();
                endpoint.url = url;
                merged.push(endpoint);
            }
        }
    }
    merged
}

fn fill_missing(kept: &mut EndpointDescriptor, duplicate: &EndpointDescriptor) {
    if kept.code.as_deref().is_none_or(str::is_empty) {
        if let Some(code) = duplicate.code.as_deref().filter(|c| !c.is_empty()) {
            kept.code = Some(code.to_string());
        }
    }
    if kept.description.is_none() {
        kept.description = duplicate.description.clone();
    }
    if kept.name.is_empty() {
        kept.name = duplicate.name.clone();
    }
}

pub struct Discovery {
    /// Queried concurrently, merged in this order: earlier sources win duplicates.
    sources: Vec<Arc<dyn DiscoverySource>>,
    fallback: Arc<dyn DiscoverySource>,
    base_url: String,
    doc_root: String,
}

impl Discovery {
    pub fn new(
        config: &DocsConfig,
        sources: Vec<Arc<dyn DiscoverySource>>,
        fallback: Arc<dyn DiscoverySource>,
    ) -> Self {
        Self {
            sources,
            fallback,
            base_url: config.base_url.clone(),
            doc_root: config.doc_root.clone(),
        }
    }

    /// Sitemap first, then the index page, with the static list as fallback.
    pub fn live(config: &DocsConfig, fetcher: Arc<dyn PageFetcher>) -> Self {
        let sources: Vec<Arc<dyn DiscoverySource>> = vec![
            Arc::new(SitemapSource::new(config, fetcher.clone())),
            Arc::new(IndexPageSource::new(config, fetcher)),
        ];
        Self::new(config, sources, Arc::new(StaticSource))
    }

    pub async fn run_sources(&self) -> Vec<SourceReport> {
        join_all(self.sources.iter().map(|source| run_source(source.as_ref()))).await
    }

    pub async fn discover(&self) -> Vec<EndpointDescriptor> {
        tracing::info!("Discovering endpoints...");
        let reports = self.run_sources().await;

        let failed = reports.iter().filter(|r| r.failed()).count();
        if failed > 0 {
            tracing::warn!("{} of {} discovery sources failed", failed, reports.len());
        }

        let endpoints = if needs_fallback(&reports) {
            tracing::warn!("No endpoints discovered, using known endpoints");
            let report = run_source(self.fallback.as_ref()).await;
            aggregate(&[report], &self.base_url, &self.doc_root)
        } else {
            aggregate(&reports, &self.base_url, &self.doc_root)
        };

        tracing::info!("Discovered {} unique endpoints", endpoints.len());
        endpoints
    }
}
