//! Hard-coded endpoints used when every dynamic source comes back empty.

use async_trait::async_trait;

use super::DiscoverySource;
use crate::docs_parser::DocsFetchError;
use crate::endpoint::EndpointDescriptor;

const KNOWN_ENDPOINTS: &[(&str, &str, &str)] = &[
    (
        "Soccer API Possession Events",
        "/Topics/soccer/opta-sdapi-soccer-api-possession-events.htm",
        "API for football possession events",
    ),
    (
        "Soccer API Match Events",
        "/Topics/soccer/opta-sdapi-soccer-api-match-events.htm",
        "API for football match events",
    ),
    (
        "Soccer API Player Statistics",
        "/Topics/soccer/opta-sdapi-soccer-api-player-statistics.htm",
        "API for player statistics",
    ),
    (
        "Soccer API Team Statistics",
        "/Topics/soccer/opta-sdapi-soccer-api-team-statistics.htm",
        "API for team statistics",
    ),
];

#[derive(Debug, Default, Clone)]
pub struct StaticSource;

pub fn known_endpoints() -> Vec<EndpointDescriptor> {
    KNOWN_ENDPOINTS
        .iter()
        .map(|(name, url, description)| {
            EndpointDescriptor::new(*name, *url, "soccer").with_description(*description)
        })
        .collect()
}

#[async_trait]
impl DiscoverySource for StaticSource {
    fn name(&self) -> &str {
        "static"
    }

    async fn discover(&self) -> Result<Vec<EndpointDescriptor>, DocsFetchError> {
        Ok(known_endpoints())
    }
}
