use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use rmcp::model::{Content, IntoContents};
use scraper::{Html, Selector};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use url::Url;

use crate::config::DocsConfig;

#[derive(Debug, Error)]
pub enum DocsFetchError {
    #[error("Request error: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    UrlError(#[from] url::ParseError),

    #[error("Credentials rejected by documentation server (HTTP {0})")]
    Unauthorized(u16),

    #[error("Documentation server answered HTTP {0}")]
    Status(u16),

    #[error("Failed to parse documentation: {0}")]
    ParseError(String),
}

impl DocsFetchError {
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, DocsFetchError::Unauthorized(_))
    }
}

#[derive(Clone, Serialize, Deserialize, Default)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    pub fn is_complete(&self) -> bool {
        !self.username.is_empty() && !self.password.is_empty()
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

/// Text returned by a documentation tool.
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
pub struct DocContent {
    pub content: String,
}

impl IntoContents for DocContent {
    fn into_contents(self) -> Vec<Content> {
        vec![Content::text(self.content)]
    }
}

/// Authenticated GET of one documentation resource, returning the response body.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// `path` is either relative to the configured base URL or absolute.
    async fn fetch_page(&self, path: &str) -> Result<String, DocsFetchError>;
}

pub struct DocsClient {
    client: Client,
    base_url: Url,
    credentials: Credentials,
    probe_path: String,
}

impl DocsClient {
    pub fn new(config: &DocsConfig, credentials: Credentials) -> Result<Self, DocsFetchError> {
        let client = Client::builder()
            .timeout(config.fetch_timeout)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            base_url: Url::parse(config.base_url.trim_end_matches('/'))?,
            credentials,
            probe_path: config.probe_path.clone(),
        })
    }

    pub fn new_with_base_url(base_url: &str, credentials: Credentials) -> Result<Self, DocsFetchError> {
        let config = DocsConfig {
            base_url: base_url.to_string(),
            fetch_timeout: Duration::from_secs(5),
            ..DocsConfig::default()
        };
        Self::new(&config, credentials)
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Absolute URLs pass through; anything else is appended to the base URL, keeping
    /// any path the base carries.
    pub fn resolve(&self, path: &str) -> Result<Url, DocsFetchError> {
        if path.starts_with("http://") || path.starts_with("https://") {
            return Ok(Url::parse(path)?);
        }
        let base = self.base_url.as_str().trim_end_matches('/');
        Ok(Url::parse(&format!("{}/{}", base, path.trim_start_matches('/')))?)
    }

    /// Verifies the credentials by requesting a known protected page.
    pub async fn authenticate(&self) -> Result<(), DocsFetchError> {
        self.fetch_page(&self.probe_path).await.map(|_| ())
    }
}

#[async_trait]
impl PageFetcher for DocsClient {
    async fn fetch_page(&self, path: &str) -> Result<String, DocsFetchError> {
        let url = self.resolve(path)?;
        tracing::debug!("Fetching documentation from: {}", url);

        let response = self
            .client
            .get(url)
            .basic_auth(&self.credentials.username, Some(&self.credentials.password))
            .header("Accept", "text/html,application/xml")
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(DocsFetchError::Unauthorized(status.as_u16()));
        }
        if !status.is_success() {
            return Err(DocsFetchError::Status(status.as_u16()));
        }

        Ok(response.text().await?)
    }
}

/// Collapses every run of whitespace into a single space.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Whitespace-normalised text of the page body (whole document if there is no body).
pub fn extract_body_text(html: &str) -> String {
    let document = Html::parse_document(html);
    let text = match Selector::parse("body")
        .ok()
        .and_then(|selector| document.select(&selector).next())
    {
        Some(body) => body.text().collect::<Vec<_>>().join(" "),
        None => document.root_element().text().collect::<Vec<_>>().join(" "),
    };
    collapse_whitespace(&text)
}

/// An anchor found on a page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    pub href: String,
    pub text: String,
    pub title: Option<String>,
}

pub fn extract_links(html: &str) -> Vec<Link> {
    let document = Html::parse_document(html);
    let Ok(selector) = Selector::parse("a[href]") else {
        return Vec::new();
    };
    document
        .select(&selector)
        .filter_map(|anchor| {
            let href = anchor.value().attr("href")?.trim().to_string();
            let text = collapse_whitespace(&anchor.text().collect::<Vec<_>>().join(" "));
            let title = anchor
                .value()
                .attr("title")
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty());
            Some(Link { href, text, title })
        })
        .collect()
}
