use std::sync::Arc;
use std::time::Duration;

use mockito::{Mock, Server, ServerGuard};
use opta_docs_mcp::config::{DocsConfig, SearchWeights};
use opta_docs_mcp::docs_parser::{Credentials, DocsClient, DocsFetchError};
use opta_docs_mcp::mcp::DocsService;
use opta_docs_mcp::search::search;

const AUTH: &str = "Basic dXNlcjpwYXNz";

const POSSESSION: &str = "/docs/rh/sdapi/Topics/soccer/opta-sdapi-soccer-api-possession-events.htm";
const MATCH_EVENTS: &str = "/docs/rh/sdapi/Topics/soccer/opta-sdapi-soccer-api-match-events.htm";
const TEAM_STATS: &str = "/docs/rh/sdapi/Topics/soccer/opta-sdapi-soccer-team-stats.htm";
const BROKEN: &str = "/docs/rh/sdapi/Topics/tennis/opta-sdapi-tennis-results.htm";

fn sitemap(origin: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
  <url><loc>{origin}{POSSESSION}</loc></url>
  <url><loc>{origin}{MATCH_EVENTS}</loc></url>
  <url><loc>{origin}/docs/rh/sdapi/downloads/feeds.pdf</loc></url>
</urlset>"#
    )
}

const INDEX: &str = r#"<html><body><ul>
    <li><a href="../../Topics/soccer/opta-sdapi-soccer-api-possession-events.htm">Possession Events (PE2)</a></li>
    <li><a href="../../Topics/soccer/opta-sdapiamp-soccer-team-stats.htm">Team Stats (TM1)</a></li>
    <li><a href="../../Topics/tennis/opta-sdapi-tennis-results.htm">Tennis Results (TN1)</a></li>
    <li><a href="https://elsewhere.example/docs/rh/sdapi/x.htm">External</a></li>
</ul></body></html>"#;

fn page(title: &str, text: &str) -> String {
    format!("<html><head><title>{title}</title></head><body><h1>{title}</h1><p>{text}</p></body></html>")
}

async fn mock_page(server: &mut ServerGuard, path: &str, body: String, hits: usize) -> Mock {
    server
        .mock("GET", path)
        .match_header("authorization", AUTH)
        .with_status(200)
        .with_header("content-type", "text/html")
        .with_body(body)
        .expect(hits)
        .create_async()
        .await
}

fn config(server: &ServerGuard, cache_dir: &std::path::Path) -> DocsConfig {
    DocsConfig {
        base_url: server.url(),
        cache_dir: cache_dir.to_path_buf(),
        batch_delay: Duration::from_millis(10),
        fetch_timeout: Duration::from_secs(5),
        ..DocsConfig::default()
    }
}

fn service(config: &DocsConfig) -> DocsService {
    let client = DocsClient::new(config, Credentials::new("user", "pass")).unwrap();
    DocsService::live(config, Arc::new(client))
}

#[tokio::test]
async fn test_catalog_built_end_to_end() {
    let mut server = Server::new_async().await;
    let cache_dir = tempfile::tempdir().unwrap();

    let origin = server.url();
    let sitemap_mock = mock_page(&mut server, "/sitemap.xml", sitemap(&origin), 2).await;
    let index_mock = mock_page(&mut server, "/docs/rh/sdapi/", INDEX.to_string(), 2).await;
    // pages are fetched once; the second service reads them from disk
    let pages = [
        mock_page(&mut server, POSSESSION, page("Possession Events", "Possession chains per match"), 1).await,
        mock_page(&mut server, MATCH_EVENTS, page("Match Events", "Every on-ball event"), 1).await,
        mock_page(&mut server, TEAM_STATS, page("Team Stats", "Season aggregates per team"), 1).await,
    ];
    let broken = server
        .mock("GET", BROKEN)
        .with_status(500)
        .expect(2)
        .create_async()
        .await;

    let config = config(&server, cache_dir.path());
    let snapshot = service(&config).catalog().get_snapshot().await;

    let urls: Vec<&str> = snapshot.endpoints.iter().map(|e| e.url.as_str()).collect();
    assert_eq!(urls, vec![POSSESSION, MATCH_EVENTS, TEAM_STATS]);

    // the sitemap entry keeps its name, the index duplicate contributes its code
    let possession = snapshot.find_by_code("PE2").unwrap();
    assert_eq!(possession.url, POSSESSION);
    assert_eq!(possession.name, "Soccer Api Possession Events");

    let team_stats = snapshot.find_by_code("tm1").unwrap();
    assert_eq!(team_stats.name, "Team Stats");
    assert_eq!(team_stats.category, "soccer");
    assert_eq!(
        team_stats.content.as_deref(),
        Some("Team Stats Season aggregates per team")
    );

    let results = search("possession chains", &snapshot.endpoints, &SearchWeights::default());
    assert_eq!(results[0].endpoint.url, POSSESSION);

    let mut cached: Vec<String> = std::fs::read_dir(cache_dir.path())
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    cached.sort();
    assert_eq!(
        cached,
        vec![
            "PE2.json",
            "TM1.json",
            "docs_rh_sdapi_Topics_soccer_opta-sdapi-soccer-api-match-events_htm.json",
        ]
    );

    // a fresh process rediscovers but serves page content from the disk cache
    let second = service(&config).catalog().get_snapshot().await;
    assert_eq!(second.endpoints.len(), 3);
    assert_eq!(second.endpoints, snapshot.endpoints);

    sitemap_mock.assert_async().await;
    index_mock.assert_async().await;
    for mock in &pages {
        mock.assert_async().await;
    }
    broken.assert_async().await;
}

#[tokio::test]
async fn test_base_url_with_path() {
    let mut server = Server::new_async().await;
    let cache_dir = tempfile::tempdir().unwrap();
    let base = format!("{}/docs/rh/sdapi", server.url());

    let sitemap = format!(
        r#"<urlset><url><loc>{base}/Topics/soccer/opta-sdapi-soccer-api-match-events.htm</loc></url></urlset>"#
    );
    let sitemap_mock = mock_page(&mut server, "/docs/rh/sdapi/sitemap.xml", sitemap, 1).await;
    let page_mock = mock_page(
        &mut server,
        "/docs/rh/sdapi/Topics/soccer/opta-sdapi-soccer-api-match-events.htm",
        page("Match Events", "Every on-ball event"),
        1,
    )
    .await;

    // with the site root in the base URL, page paths are relative to it
    let config = DocsConfig {
        base_url: base.clone(),
        doc_root: "/Topics/".to_string(),
        ..config(&server, cache_dir.path())
    };
    let snapshot = service(&config).catalog().get_snapshot().await;

    let urls: Vec<&str> = snapshot.endpoints.iter().map(|e| e.url.as_str()).collect();
    assert_eq!(urls, vec!["/Topics/soccer/opta-sdapi-soccer-api-match-events.htm"]);
    sitemap_mock.assert_async().await;
    page_mock.assert_async().await;
}

#[tokio::test]
async fn test_fallback_when_discovery_finds_nothing() {
    let mut server = Server::new_async().await;
    let cache_dir = tempfile::tempdir().unwrap();

    let _sitemap = server.mock("GET", "/sitemap.xml").with_status(404).create_async().await;
    let _index = server.mock("GET", "/docs/rh/sdapi/").with_status(503).create_async().await;
    let _possession = mock_page(
        &mut server,
        "/Topics/soccer/opta-sdapi-soccer-api-possession-events.htm",
        page("Possession Events", "Possession chains per match"),
        1,
    )
    .await;

    let config = config(&server, cache_dir.path());
    let snapshot = service(&config).catalog().get_snapshot().await;

    // only the known endpoint with a live page survives the fetch
    assert_eq!(snapshot.endpoints.len(), 1);
    assert_eq!(snapshot.endpoints[0].name, "Soccer API Possession Events");
}

#[tokio::test]
async fn test_authentication_probe() {
    let mut server = Server::new_async().await;
    let probe = DocsConfig::default().probe_path;

    let _ok = mock_page(&mut server, &probe, page("Probe", "ok"), 1).await;
    let _denied = server
        .mock("GET", probe.as_str())
        .match_header("authorization", "Basic dXNlcjpub3Bl")
        .with_status(401)
        .create_async()
        .await;

    let client = DocsClient::new_with_base_url(&server.url(), Credentials::new("user", "pass")).unwrap();
    assert!(client.authenticate().await.is_ok());

    let wrong = DocsClient::new_with_base_url(&server.url(), Credentials::new("user", "nope")).unwrap();
    let err = wrong.authenticate().await.unwrap_err();
    assert!(matches!(err, DocsFetchError::Unauthorized(401)));
    assert!(err.is_auth_failure());
}
