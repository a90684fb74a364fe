//! Daily RSS digest generation.
//!
//! Fetches the feeds configured for a topic, merges their items newest first, keeps
//! the recent ones and renders them into a self-contained HTML email.
//!
//! - [`feed`] - fetching and lightweight RSS parsing
//! - [`aggregate`] - merging, ordering and recency filtering
//! - [`digest`] - HTML rendering
//! - [`delivery`] - email provider seam
//! - [`pipeline`] - one end-to-end run
//! - [`config`] - TOML configuration

pub mod aggregate;
pub mod config;
pub mod delivery;
pub mod digest;
pub mod feed;
pub mod pipeline;
pub mod util;
