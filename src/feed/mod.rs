//! Feed retrieval and parsing.
//!
//! This module turns feed URLs into structured items:
//!
//! - **Extraction**: Pull one element's text out of RSS markup (CDATA-aware)
//! - **Parsing**: Convert an RSS 2.0 document into a [`Feed`] of [`FeedItem`]s
//! - **Fetching**: Concurrent HTTP retrieval that tolerates per-feed failure
//!
//! # Architecture
//!
//! - [`extract`] - Regex-based single-element extraction, no XML tree
//! - [`parser`] - Channel/item parsing with per-field defaults
//! - [`fetcher`] - HTTP fetching and batch gathering
//!
//! # Example
//!
//! ```ignore
//! use rss_digest::feed::{build_client, collect_items, fetch_all, FeedParser};
//!
//! let client = build_client(&config.fetch)?;
//! let parser = FeedParser::new()?;
//! let results = fetch_all(&client, &parser, &urls).await;
//! let items = collect_items(results);
//! ```

pub mod extract;
pub mod fetcher;
pub mod parser;
mod types;

pub use extract::{extract_tag, TagPattern};
pub use fetcher::{build_client, collect_items, fetch_all, fetch_feed, FetchError, FetchResult};
pub use parser::{parse_feed, FeedParser, ParseError};
pub use types::{Feed, FeedItem, NO_TITLE, UNKNOWN_FEED};
