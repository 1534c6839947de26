//! In-memory catalog cache.
//!
//! Holds the current [`CatalogSnapshot`] behind a lock. Readers clone the `Arc`, so a
//! rebuild swaps in a whole new snapshot and nobody ever sees a half-built catalog.
//! Concurrent misses may each rebuild; the last one to finish wins.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::clock::Clock;
use crate::discovery::Discovery;
use crate::endpoint::{CatalogSnapshot, EndpointDescriptor};
use crate::fetch::FetchPipeline;

/// Produces the full list of content-enriched endpoints.
#[async_trait]
pub trait CatalogBuilder: Send + Sync {
    async fn build(&self) -> Vec<EndpointDescriptor>;
}

/// Discovery followed by the fetch pipeline.
pub struct LiveCatalogBuilder {
    discovery: Discovery,
    pipeline: Arc<FetchPipeline>,
}

impl LiveCatalogBuilder {
    pub fn new(discovery: Discovery, pipeline: Arc<FetchPipeline>) -> Self {
        Self {
            discovery,
            pipeline,
        }
    }
}

#[async_trait]
impl CatalogBuilder for LiveCatalogBuilder {
    async fn build(&self) -> Vec<EndpointDescriptor> {
        let discovered = self.discovery.discover().await;
        self.pipeline.fetch_all(discovered).await
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CatalogStatus {
    pub has_cache: bool,
    pub is_expired: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<DateTime<Utc>>,
}

pub struct CatalogCache {
    builder: Arc<dyn CatalogBuilder>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
    current: RwLock<Option<Arc<CatalogSnapshot>>>,
}

impl CatalogCache {
    pub fn new(builder: Arc<dyn CatalogBuilder>, clock: Arc<dyn Clock>, ttl: Duration) -> Self {
        Self {
            builder,
            clock,
            ttl,
            current: RwLock::new(None),
        }
    }

    /// `None` when the TTL reaches past the representable calendar.
    fn expiry(&self, snapshot: &CatalogSnapshot) -> Option<DateTime<Utc>> {
        snapshot.last_updated.checked_add_signed(self.ttl)
    }

    fn is_valid(&self, snapshot: &CatalogSnapshot) -> bool {
        self.expiry(snapshot).is_none_or(|expiry| self.clock.now() < expiry)
    }

    /// The cached snapshot while it is valid, otherwise a freshly built one.
    pub async fn get_snapshot(&self) -> Arc<CatalogSnapshot> {
        if let Some(snapshot) = self.current.read().await.as_ref() {
            if self.is_valid(snapshot) {
                return snapshot.clone();
            }
        }
        self.rebuild().await
    }

    /// Drops the current snapshot and builds a new one.
    pub async fn refresh(&self) -> Arc<CatalogSnapshot> {
        *self.current.write().await = None;
        self.rebuild().await
    }

    pub async fn status(&self) -> CatalogStatus {
        let current = self.current.read().await;
        CatalogStatus {
            has_cache: current.is_some(),
            is_expired: !current.as_deref().is_some_and(|s| self.is_valid(s)),
            last_updated: current.as_ref().map(|s| s.last_updated),
        }
    }

    async fn rebuild(&self) -> Arc<CatalogSnapshot> {
        tracing::info!("Updating documentation cache...");
        let endpoints = self.builder.build().await;
        let snapshot = Arc::new(CatalogSnapshot::new(endpoints, self.clock.now()));
        match self.expiry(&snapshot) {
            Some(expiry) => tracing::info!(
                "Catalog rebuilt with {} endpoints, valid until {}",
                snapshot.endpoints.len(),
                expiry
            ),
            None => tracing::info!("Catalog rebuilt with {} endpoints", snapshot.endpoints.len()),
        }
        *self.current.write().await = Some(snapshot.clone());
        snapshot
    }
}
