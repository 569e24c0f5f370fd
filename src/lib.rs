//! # FAQ Harness
//!
//! A keyword knowledge base builder for call-center FAQ widgets.
//!
//! FAQ Harness pulls CSV tables from remote directory listings and local
//! upload folders, normalizes them into typed keyword entries, merges them
//! with durable admin edits, and answers exact, substring, and fuzzy
//! lookups through a CLI and an HTTP JSON API.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   ┌────────────┐   ┌──────────────┐
//! │   Fetchers   │──▶│ Normalize  │──▶│    Merge     │◀── admin edits
//! │ remote/local │   │ CSV→entry  │   │ dedup rules  │
//! └──────────────┘   └────────────┘   └──────┬───────┘
//!                                            ▼
//!                                     ┌──────────────┐
//!                                     │KnowledgeBase │
//!                                     └──────┬───────┘
//!                      ┌─────────────────────┤
//!                      ▼                     ▼
//!                 ┌──────────┐         ┌──────────┐
//!                 │   CLI    │         │   HTTP   │
//!                 │  (faq)   │         │  (axum)  │
//!                 └──────────┘         └──────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! faq sources                   # show configured sources
//! faq rebuild                   # fetch, merge, and report
//! faq lookup "học phí"          # exact lookup
//! faq search học                # substring search
//! faq serve                     # start HTTP server
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Core data types |
//! | [`error`] | Error taxonomy |
//! | [`traits`] | `SourceFetcher` trait and registry |
//! | [`connector_remote`] | Remote directory-listing fetcher |
//! | [`connector_fs`] | Local folder fetcher |
//! | [`cache`] | TTL cache for remote bodies |
//! | [`normalize`] | CSV schema normalization |
//! | [`merge`] | Deduplication policies |
//! | [`ingest`] | Rebuild pipeline |
//! | [`lookup`] | Knowledge base queries |
//! | [`admin`] | Admin edit store |
//! | [`pins`] | Per-user pinned keywords |
//! | [`prefs`] | Per-user theme preference |
//! | [`state`] | Session selection state |
//! | [`search`] | CLI query commands |
//! | [`sources`] | Source status listing |
//! | [`export`] | JSON export |
//! | [`server`] | HTTP JSON API |

pub mod admin;
pub mod cache;
pub mod config;
pub mod connector_fs;
pub mod connector_remote;
pub mod error;
pub mod export;
pub mod ingest;
pub mod lookup;
pub mod merge;
pub mod models;
pub mod normalize;
pub mod pins;
pub mod prefs;
pub mod search;
pub mod server;
pub mod sources;
pub mod state;
mod store_io;
pub mod traits;
