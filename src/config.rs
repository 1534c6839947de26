//! Tunables for discovery, fetching, caching and ranking.
//!
//! The binary fills these from CLI flags and environment variables; the defaults here
//! are the documented ones.

use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://docs.performgroup.com";
pub const DEFAULT_DOC_ROOT: &str = "/docs/rh/sdapi/";
pub const DEFAULT_CACHE_DIR: &str = ".cache/html";
pub const DEFAULT_CACHE_TTL_HOURS: u64 = 24;
/// Roughly a century; keeps timestamp arithmetic well inside chrono's range.
pub const MAX_CACHE_TTL_HOURS: u64 = 24 * 365 * 100;
pub const DEFAULT_BATCH_SIZE: usize = 5;
pub const DEFAULT_BATCH_DELAY_MS: u64 = 1000;
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 30;

/// Page used to verify credentials at startup.
pub const DEFAULT_PROBE_PATH: &str = "/Topics/soccer/opta-sdapi-soccer-api-possession-events.htm";

#[derive(Debug, Clone)]
pub struct DocsConfig {
    pub base_url: String,
    /// Path prefix every documentation page lives under.
    pub doc_root: String,
    pub sitemap_path: String,
    pub probe_path: String,
    pub cache_dir: PathBuf,
    pub cache_ttl: Duration,
    pub batch_size: usize,
    pub batch_delay: Duration,
    pub fetch_timeout: Duration,
    /// Path segments recognised as a category, checked in order.
    pub category_tokens: Vec<String>,
    pub weights: SearchWeights,
}

impl Default for DocsConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            doc_root: DEFAULT_DOC_ROOT.to_string(),
            sitemap_path: "/sitemap.xml".to_string(),
            probe_path: DEFAULT_PROBE_PATH.to_string(),
            cache_dir: PathBuf::from(DEFAULT_CACHE_DIR),
            cache_ttl: Duration::from_secs(DEFAULT_CACHE_TTL_HOURS * 60 * 60),
            batch_size: DEFAULT_BATCH_SIZE,
            batch_delay: Duration::from_millis(DEFAULT_BATCH_DELAY_MS),
            fetch_timeout: Duration::from_secs(DEFAULT_FETCH_TIMEOUT_SECS),
            category_tokens: ["soccer", "football", "basketball", "tennis", "cricket"]
                .into_iter()
                .map(String::from)
                .collect(),
            weights: SearchWeights::default(),
        }
    }
}

impl DocsConfig {
    /// Cache TTL as a calendar duration for timestamp arithmetic.
    pub fn ttl(&self) -> chrono::Duration {
        chrono::Duration::from_std(self.cache_ttl).unwrap_or(chrono::Duration::MAX)
    }
}

/// Per-field weights added to a result's relevance when a query term matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchWeights {
    pub name: u32,
    pub description: u32,
    pub category: u32,
    pub content: u32,
    /// Query terms shorter than this many characters are ignored.
    pub min_term_len: usize,
}

impl Default for SearchWeights {
    fn default() -> Self {
        Self {
            name: 10,
            description: 5,
            category: 3,
            content: 1,
            min_term_len: 3,
        }
    }
}
