//! Utility functions for common operations.
//!
//! This module provides reusable utilities for:
//!
//! - **Text processing**: entity decoding, markup stripping and truncation of feed text
//! - **Dates**: tolerant parsing of `pubDate` values
//! - **URL validation**: scheme/host checks for feed and API URLs
//!
//! # Examples
//!
//! ```
//! use rss_digest::util::{clean_html, decode_entities, take_chars};
//!
//! assert_eq!(decode_entities("Q&amp;A"), "Q&A");
//! assert_eq!(clean_html("<p>Hi&nbsp;there</p>"), "Hi there");
//! assert_eq!(take_chars("Long article title", 4), "Long");
//! ```

mod date;
mod text;
mod url_validator;

pub use date::parse_pub_date;
pub use text::{clean_html, decode_entities, take_chars, ELLIPSIS};
pub use url_validator::{is_localhost, validate_url, UrlValidationError};
