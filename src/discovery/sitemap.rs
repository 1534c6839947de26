//! Discovery from the server's `sitemap.xml`.

use async_trait::async_trait;
use quick_xml::Reader;
use quick_xml::events::Event;
use std::sync::Arc;

use super::DiscoverySource;
use super::normalize::{discovered, is_documentation_url, name_from_url, normalize_url};
use crate::config::DocsConfig;
use crate::docs_parser::{DocsFetchError, PageFetcher};
use crate::endpoint::EndpointDescriptor;

pub struct SitemapSource {
    fetcher: Arc<dyn PageFetcher>,
    sitemap_path: String,
    base_url: String,
    doc_root: String,
    category_tokens: Vec<String>,
}

impl SitemapSource {
    pub fn new(config: &DocsConfig, fetcher: Arc<dyn PageFetcher>) -> Self {
        Self {
            fetcher,
            sitemap_path: config.sitemap_path.clone(),
            base_url: config.base_url.clone(),
            doc_root: config.doc_root.clone(),
            category_tokens: config.category_tokens.clone(),
        }
    }

    fn endpoints_from_locations(&self, locations: Vec<String>) -> Vec<EndpointDescriptor> {
        locations
            .into_iter()
            .map(|loc| normalize_url(&loc, &self.base_url, &self.doc_root))
            .filter(|url| is_documentation_url(url, &self.doc_root))
            .map(|url| {
                let name = name_from_url(&url);
                discovered(name, url, &self.category_tokens, None)
            })
            .collect()
    }
}

#[async_trait]
impl DiscoverySource for SitemapSource {
    fn name(&self) -> &str {
        "sitemap"
    }

    async fn discover(&self) -> Result<Vec<EndpointDescriptor>, DocsFetchError> {
        let xml = self.fetcher.fetch_page(&self.sitemap_path).await?;
        let locations = parse_locations(&xml)?;
        tracing::debug!("Sitemap lists {} locations", locations.len());
        Ok(self.endpoints_from_locations(locations))
    }
}

/// Every `<url><loc>` value, in document order.
pub fn parse_locations(xml: &str) -> Result<Vec<String>, DocsFetchError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut locations = Vec::new();
    let mut buf = Vec::new();
    let mut in_url = false;
    let mut in_loc = false;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"url" => in_url = true,
                b"loc" if in_url => in_loc = true,
                _ => {}
            },
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"url" => in_url = false,
                b"loc" => in_loc = false,
                _ => {}
            },
            Ok(Event::Text(e)) if in_loc => {
                let text = e
                    .unescape()
                    .map_err(|e| DocsFetchError::ParseError(e.to_string()))?;
                let text = text.trim();
                if !text.is_empty() {
                    locations.push(text.to_string());
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(DocsFetchError::ParseError(format!("XML parse error: {e}")));
            }
            _ => {}
        }
        buf.clear();
    }

    Ok(locations)
}
