//! Batched, rate-limited retrieval of endpoint content.
//!
//! Descriptors are fetched in fixed-size batches. Fetches inside a batch run
//! concurrently; consecutive batches are separated by a fixed delay. Every fetch goes
//! through the content cache first. A failed fetch drops its descriptor from the output.

use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;

use crate::cache::ContentCache;
use crate::config::DocsConfig;
use crate::docs_parser::{DocsFetchError, PageFetcher, extract_body_text};
use crate::endpoint::EndpointDescriptor;

pub struct FetchPipeline {
    fetcher: Arc<dyn PageFetcher>,
    cache: Arc<ContentCache>,
    batch_size: usize,
    batch_delay: Duration,
}

impl FetchPipeline {
    pub fn new(config: &DocsConfig, fetcher: Arc<dyn PageFetcher>, cache: Arc<ContentCache>) -> Self {
        Self {
            fetcher,
            cache,
            batch_size: config.batch_size.max(1),
            batch_delay: config.batch_delay,
        }
    }

    pub async fn fetch_all(&self, descriptors: Vec<EndpointDescriptor>) -> Vec<EndpointDescriptor> {
        let total = descriptors.len();
        tracing::info!("Processing {} endpoints...", total);

        let mut enriched = Vec::with_capacity(total);
        for (index, batch) in descriptors.chunks(self.batch_size).enumerate() {
            if index > 0 {
                tokio::time::sleep(self.batch_delay).await;
            }
            tracing::debug!("Fetching batch {} ({} endpoints)", index + 1, batch.len());
            let results = join_all(batch.iter().cloned().map(|d| self.fetch_one(d))).await;
            enriched.extend(results.into_iter().flatten());
        }

        if enriched.len() < total {
            tracing::warn!("{} of {} endpoints could not be fetched", total - enriched.len(), total);
        }
        enriched
    }

    async fn fetch_one(&self, mut descriptor: EndpointDescriptor) -> Option<EndpointDescriptor> {
        match self.raw_content(&descriptor).await {
            Ok(raw) => {
                descriptor.content = Some(extract_body_text(&raw));
                Some(descriptor)
            }
            Err(e) => {
                tracing::warn!("Failed to fetch {}: {}", descriptor.url, e);
                None
            }
        }
    }

    /// Raw page body for one endpoint, from the content cache when fresh.
    pub async fn raw_content(&self, descriptor: &EndpointDescriptor) -> Result<String, DocsFetchError> {
        let key = descriptor.cache_key();
        if let Some(hit) = self.cache.get(&key).await {
            return Ok(hit);
        }
        let body = self.fetcher.fetch_page(&descriptor.url).await?;
        self.cache.put(&key, &descriptor.url, &body).await;
        Ok(body)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::cache::KvStore;
    use crate::clock::ManualClock;
    use async_trait::async_trait;
    use chrono::Utc;
    use std::collections::HashMap;
    use std::io;
    use std::sync::Mutex;
    use tokio::time::Instant;

    #[derive(Default)]
    pub(crate) struct MemoryStore {
        entries: Mutex<HashMap<String, Vec<u8>>>,
    }

    #[async_trait]
    impl KvStore for MemoryStore {
        async fn read(&self, key: &str) -> Result<Option<Vec<u8>>, io::Error> {
            Ok(self.entries.lock().unwrap().get(key).cloned())
        }
        async fn write(&self, key: &str, value: &[u8]) -> Result<(), io::Error> {
            self.entries.lock().unwrap().insert(key.to_string(), value.to_vec());
            Ok(())
        }
        async fn delete(&self, key: &str) -> Result<(), io::Error> {
            self.entries.lock().unwrap().remove(key);
            Ok(())
        }
        async fn list(&self) -> Result<Vec<String>, io::Error> {
            Ok(self.entries.lock().unwrap().keys().cloned().collect())
        }
    }

    /// Serves canned pages and records when each request started.
    #[derive(Default)]
    pub(crate) struct FakeFetcher {
        pages: HashMap<String, String>,
        pub(crate) calls: Mutex<Vec<(String, Instant)>>,
    }

    impl FakeFetcher {
        pub(crate) fn with_pages<'a>(pages: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
            Self {
                pages: pages
                    .into_iter()
                    .map(|(url, body)| (url.to_string(), body.to_string()))
                    .collect(),
                calls: Mutex::new(Vec::new()),
            }
        }

        pub(crate) fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl PageFetcher for FakeFetcher {
        async fn fetch_page(&self, path: &str) -> Result<String, DocsFetchError> {
            self.calls.lock().unwrap().push((path.to_string(), Instant::now()));
            self.pages
                .get(path)
                .cloned()
                .ok_or(DocsFetchError::Status(404))
        }
    }

    fn content_cache() -> Arc<ContentCache> {
        Arc::new(ContentCache::new(
            Arc::new(MemoryStore::default()),
            Arc::new(ManualClock::new(Utc::now())),
            chrono::Duration::hours(24),
        ))
    }

    fn endpoint(i: usize) -> EndpointDescriptor {
        EndpointDescriptor::new(format!("Endpoint {i}"), format!("/docs/e{i}.htm"), "soccer")
    }

    #[tokio::test(start_paused = true)]
    async fn test_batches_are_spaced_by_delay() {
        let urls: Vec<String> = (0..12).map(|i| format!("/docs/e{i}.htm")).collect();
        let fetcher = Arc::new(FakeFetcher::with_pages(
            urls.iter().map(|u| (u.as_str(), "<body>page</body>")),
        ));
        let pipeline = FetchPipeline::new(&DocsConfig::default(), fetcher.clone(), content_cache());

        let enriched = pipeline.fetch_all((0..12).map(endpoint).collect()).await;
        assert_eq!(enriched.len(), 12);

        let calls = fetcher.calls.lock().unwrap();
        let mut starts: Vec<Instant> = calls.iter().map(|(_, at)| *at).collect();
        starts.dedup();
        assert_eq!(starts.len(), 3, "expected exactly three batches");
        assert!(starts[1] - starts[0] >= Duration::from_secs(1));
        assert!(starts[2] - starts[1] >= Duration::from_secs(1));

        let per_batch: Vec<usize> = starts
            .iter()
            .map(|s| calls.iter().filter(|(_, at)| at == s).count())
            .collect();
        assert_eq!(per_batch, vec![5, 5, 2]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_single_batch_does_not_wait() {
        let fetcher = Arc::new(FakeFetcher::with_pages([("/docs/e0.htm", "<body>x</body>")]));
        let pipeline = FetchPipeline::new(&DocsConfig::default(), fetcher, content_cache());

        let start = Instant::now();
        pipeline.fetch_all(vec![endpoint(0)]).await;
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_failed_fetch_is_dropped() {
        let fetcher = Arc::new(FakeFetcher::with_pages([
            ("/docs/y.htm", "<html><body><p>Y   page</p></body></html>"),
            ("/docs/z.htm", "<html><body><p>Z page</p></body></html>"),
        ]));
        let pipeline = FetchPipeline::new(&DocsConfig::default(), fetcher, content_cache());

        let input = vec![
            EndpointDescriptor::new("X", "/docs/x.htm", "soccer"),
            EndpointDescriptor::new("Y", "/docs/y.htm", "soccer"),
            EndpointDescriptor::new("Z", "/docs/z.htm", "soccer"),
        ];
        let enriched = pipeline.fetch_all(input).await;

        let names: Vec<_> = enriched.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["Y", "Z"]);
        assert_eq!(enriched[0].content.as_deref(), Some("Y page"));
        assert_eq!(enriched[1].content.as_deref(), Some("Z page"));
    }

    #[tokio::test]
    async fn test_cache_hit_skips_network_and_miss_populates_cache() {
        let fetcher = Arc::new(FakeFetcher::with_pages([("/docs/e1.htm", "<body>fresh</body>")]));
        let cache = content_cache();
        let cached = endpoint(0);
        cache.put(&cached.cache_key(), &cached.url, "<body>cached</body>").await;

        let pipeline = FetchPipeline::new(&DocsConfig::default(), fetcher.clone(), cache.clone());
        let enriched = pipeline.fetch_all(vec![endpoint(0), endpoint(1)]).await;

        assert_eq!(enriched[0].content.as_deref(), Some("cached"));
        assert_eq!(enriched[1].content.as_deref(), Some("fresh"));
        assert_eq!(fetcher.call_count(), 1);
        assert_eq!(
            cache.get(&endpoint(1).cache_key()).await.as_deref(),
            Some("<body>fresh</body>")
        );
    }
}
