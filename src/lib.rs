//! OPTA API Documentation MCP Service
//!
//! This crate discovers the pages of the authenticated OPTA API documentation site,
//! fetches and caches them, and serves relevance search and lookups over the resulting
//! catalog through an MCP server.
//!
//! # Features
//!
//! - Endpoint discovery from the sitemap and the documentation index, with a built-in
//!   fallback list
//! - Batched, rate-limited page fetching
//! - On-disk page cache and in-memory catalog cache, both with a TTL
//! - Weighted relevance search and per-endpoint question answering
//!
//! # Modules
//!
//! - [`discovery`]: discovery sources and aggregation
//! - [`fetch`]: the batched fetch pipeline
//! - [`cache`]: persisted page cache
//! - [`catalog`]: in-memory catalog cache
//! - [`search`]: relevance ranking
//! - [`mcp`]: MCP tool surface

pub mod answer;
pub mod cache;
pub mod catalog;
pub mod clock;
pub mod config;
pub mod discovery;
pub mod docs_parser;
pub mod endpoint;
pub mod fetch;
pub mod mcp;
pub mod search;
pub mod server;
