//! Shared data model: endpoint descriptors, catalog snapshots and search results.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One documentation page describing a remote API operation.
///
/// `url` is the natural key: two descriptors with the same `url` are the same endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EndpointDescriptor {
    pub name: String,
    /// Server-relative canonical path, e.g. `/docs/rh/sdapi/Topics/soccer/opta-sdapi-soccer-api-match-events.htm`.
    pub url: String,
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Short feed identifier such as `MA13`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    /// Filled in by the fetch pipeline.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

impl EndpointDescriptor {
    pub fn new(
        name: impl Into<String>,
        url: impl Into<String>,
        category: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            category: category.into(),
            description: None,
            code: None,
            content: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_code(mut self, code: Option<String>) -> Self {
        self.code = code;
        self
    }

    /// Key under which this endpoint's raw page is stored in the content cache.
    ///
    /// The endpoint code when known, otherwise the URL reduced to a file-name safe form.
    pub fn cache_key(&self) -> String {
        match &self.code {
            Some(code) if !code.is_empty() => sanitize_key(code),
            _ => sanitize_key(self.url.trim_start_matches('/')),
        }
    }
}

/// Replaces every character that is not ASCII alphanumeric, `-` or `_` with `_`.
pub fn sanitize_key(raw: &str) -> String {
    raw.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// The full discovered and content-enriched catalog at one point in time.
///
/// Never mutated after construction; a refresh builds a new snapshot.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CatalogSnapshot {
    pub endpoints: Vec<EndpointDescriptor>,
    pub last_updated: DateTime<Utc>,
}

impl CatalogSnapshot {
    pub fn new(endpoints: Vec<EndpointDescriptor>, last_updated: DateTime<Utc>) -> Self {
        Self {
            endpoints,
            last_updated,
        }
    }

    pub fn find_by_url(&self, url: &str) -> Option<&EndpointDescriptor> {
        self.endpoints.iter().find(|endpoint| endpoint.url == url)
    }

    pub fn find_by_category(&self, category: &str) -> Vec<&EndpointDescriptor> {
        self.endpoints
            .iter()
            .filter(|endpoint| endpoint.category.eq_ignore_ascii_case(category))
            .collect()
    }

    pub fn find_by_code(&self, code: &str) -> Option<&EndpointDescriptor> {
        self.endpoints.iter().find(|endpoint| {
            endpoint
                .code
                .as_deref()
                .is_some_and(|c| c.eq_ignore_ascii_case(code))
        })
    }

    /// Category name to number of endpoints in it, alphabetically ordered.
    pub fn categories(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for endpoint in &self.endpoints {
            *counts.entry(endpoint.category.clone()).or_insert(0) += 1;
        }
        counts
    }

    pub fn codes(&self) -> Vec<&str> {
        self.endpoints
            .iter()
            .filter_map(|endpoint| endpoint.code.as_deref())
            .collect()
    }
}

/// A ranked match. Only ever built for a relevance of at least 1.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    pub endpoint: EndpointDescriptor,
    pub relevance: u32,
    /// Query terms that matched any field, unique, in query order.
    pub matched_terms: Vec<String>,
}
