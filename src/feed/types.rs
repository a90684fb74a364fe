use serde::{Deserialize, Serialize};

/// Title used for items without a `<title>` element.
pub const NO_TITLE: &str = "No Title";
/// Title used for channels without a `<title>` element.
pub const UNKNOWN_FEED: &str = "Unknown Feed";

/// One news entry parsed from an RSS `<item>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedItem {
    /// Item title, [`NO_TITLE`] when the source has none
    pub title: String,
    /// Article link, empty when absent
    pub link: String,
    /// Plain-text description with markup removed
    pub description: String,
    /// `pubDate` exactly as it appeared in the source (not normalized).
    /// Parse with [`crate::util::parse_pub_date`]; the value may be unparsable.
    pub pub_date: String,
    /// Sanitized `content:encoded` body
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    /// First `<category>` of the item
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

/// One parsed RSS document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Feed {
    pub title: String,
    pub description: String,
    pub link: String,
    /// Items in source order
    pub items: Vec<FeedItem>,
}
