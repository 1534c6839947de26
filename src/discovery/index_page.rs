//! Discovery by crawling the documentation index page for links.

use async_trait::async_trait;
use std::sync::Arc;

use super::DiscoverySource;
use super::normalize::{
    code_from_text, discovered, is_documentation_url, name_from_url, normalize_url, strip_code,
};
use crate::config::DocsConfig;
use crate::docs_parser::{DocsFetchError, Link, PageFetcher, extract_links};
use crate::endpoint::EndpointDescriptor;

pub struct IndexPageSource {
    fetcher: Arc<dyn PageFetcher>,
    index_path: String,
    base_url: String,
    doc_root: String,
    category_tokens: Vec<String>,
}

impl IndexPageSource {
    pub fn new(config: &DocsConfig, fetcher: Arc<dyn PageFetcher>) -> Self {
        Self {
            fetcher,
            index_path: config.doc_root.clone(),
            base_url: config.base_url.clone(),
            doc_root: config.doc_root.clone(),
            category_tokens: config.category_tokens.clone(),
        }
    }

    fn endpoint_from_link(&self, link: Link) -> Option<EndpointDescriptor> {
        if link.text.is_empty() && link.title.is_none() {
            return None;
        }
        let url = normalize_url(&link.href, &self.base_url, &self.doc_root);
        if !is_documentation_url(&url, &self.doc_root) {
            return None;
        }
        let code = code_from_text(&link.text)
            .or_else(|| link.title.as_deref().and_then(code_from_text));
        let name = match strip_code(&link.text) {
            name if name.is_empty() => name_from_url(&url),
            name => name,
        };
        Some(discovered(name, url, &self.category_tokens, code))
    }
}

#[async_trait]
impl DiscoverySource for IndexPageSource {
    fn name(&self) -> &str {
        "index-page"
    }

    async fn discover(&self) -> Result<Vec<EndpointDescriptor>, DocsFetchError> {
        let html = self.fetcher.fetch_page(&self.index_path).await?;
        let endpoints = extract_links(&html)
            .into_iter()
            .filter_map(|link| self.endpoint_from_link(link))
            .collect();
        Ok(endpoints)
    }
}
