//! One digest run: fetch → merge → select → render → deliver.
//!
//! Everything is built per run from the [`Config`] handed in and dropped afterwards.
//! Nothing is remembered between runs, so the recency window is the only thing that
//! keeps yesterday's stories out of today's digest.

use chrono::{DateTime, Utc};
use std::borrow::Cow;
use thiserror::Error;

use crate::aggregate::{filter_by_category, filter_recent_news_at, latest_news, merge_feeds};
use crate::config::{Config, SelectionConfig};
use crate::delivery::{DeliveryError, DigestSender};
use crate::digest::{Digest, DigestRenderer};
use crate::feed::{build_client, fetch_all, FeedItem, FeedParser, FetchError, ParseError};

/// Failures that abort a whole run.
///
/// Individual feed failures are not in here: they are logged and skipped.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Unknown topic: {0}")]
    UnknownTopic(String),
    #[error("Topic '{0}' has no feeds configured")]
    NoFeeds(String),
    #[error("All {0} feeds failed to fetch")]
    AllFeedsFailed(usize),
    #[error("Failed to prepare feed parser: {0}")]
    Parser(#[from] ParseError),
    #[error("Failed to build HTTP client: {0}")]
    Client(#[from] FetchError),
    #[error("Delivery failed: {0}")]
    Delivery(#[from] DeliveryError),
}

/// Outcome of a delivered run.
#[derive(Debug, Clone)]
pub struct RunReport {
    /// Provider identifier of the delivery
    pub delivery_id: String,
    /// Number of items in the digest
    pub items: usize,
    pub subject: String,
}

/// A configured digest pipeline.
pub struct Pipeline {
    config: Config,
    client: reqwest::Client,
    parser: FeedParser,
    renderer: DigestRenderer,
}

impl Pipeline {
    pub fn new(config: Config) -> Result<Self, PipelineError> {
        let client = build_client(&config.fetch)?;
        let parser = FeedParser::new()?;
        let renderer = DigestRenderer::new(config.digest.clone());
        Ok(Self {
            config,
            client,
            parser,
            renderer,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Fetches every feed of `topic` and returns all items, newest first.
    ///
    /// # Errors
    ///
    /// Fails when the topic is unknown or empty, or when every feed failed.
    /// Partial failure is not an error.
    pub async fn fetch_topic(&self, topic: &str) -> Result<Vec<FeedItem>, PipelineError> {
        let urls = self
            .config
            .topic_urls(topic)
            .ok_or_else(|| PipelineError::UnknownTopic(topic.to_string()))?;
        if urls.is_empty() {
            return Err(PipelineError::NoFeeds(topic.to_string()));
        }

        let results = fetch_all(&self.client, &self.parser, urls).await;
        let feeds: Vec<_> = results.into_iter().filter_map(|r| r.result.ok()).collect();
        if feeds.is_empty() {
            return Err(PipelineError::AllFeedsFailed(urls.len()));
        }

        let items = merge_feeds(feeds);
        tracing::info!(topic = %topic, items = items.len(), "Merged feed items");
        Ok(items)
    }

    /// Builds today's digest for `topic`.
    pub async fn build_digest(&self, topic: &str) -> Result<Digest, PipelineError> {
        self.build_digest_at(topic, Utc::now()).await
    }

    /// Builds the digest for `topic` as of `now`.
    pub async fn build_digest_at(
        &self,
        topic: &str,
        now: DateTime<Utc>,
    ) -> Result<Digest, PipelineError> {
        let candidates = self.fetch_topic(topic).await?;
        let selected = select_items(&candidates, &self.config.selection, now);
        tracing::info!(
            topic = %topic,
            candidates = candidates.len(),
            selected = selected.len(),
            "Selected digest items"
        );
        Ok(self.renderer.build(selected, now))
    }

    /// Builds the digest for `topic` and hands it to `sender`.
    pub async fn run(
        &self,
        topic: &str,
        sender: &dyn DigestSender,
    ) -> Result<RunReport, PipelineError> {
        let digest = self.build_digest(topic).await?;
        let delivery_id = sender.send(&digest).await?;
        Ok(RunReport {
            delivery_id,
            items: digest.items.len(),
            subject: digest.subject,
        })
    }
}

/// Picks the items for one digest from `candidates` (already sorted newest first).
///
/// Applies the optional keyword filter, then the recency window. If fewer than
/// `min_items` survive, the window is widened to `fallback_window_hours` over the same
/// candidates. At most `max_items` are returned, order unchanged.
pub fn select_items(
    candidates: &[FeedItem],
    selection: &SelectionConfig,
    now: DateTime<Utc>,
) -> Vec<FeedItem> {
    let candidates: Cow<'_, [FeedItem]> = match selection.keyword.as_deref() {
        Some(keyword) if !keyword.trim().is_empty() => {
            Cow::Owned(filter_by_category(candidates, keyword.trim()))
        }
        _ => Cow::Borrowed(candidates),
    };

    let mut recent = filter_recent_news_at(&candidates, selection.window_hours, now);

    if recent.len() < selection.min_items
        && selection.fallback_window_hours > selection.window_hours
    {
        tracing::info!(
            found = recent.len(),
            min_items = selection.min_items,
            window_hours = selection.fallback_window_hours,
            "Too few recent items, widening window"
        );
        recent = filter_recent_news_at(&candidates, selection.fallback_window_hours, now);
    }

    latest_news(&recent, selection.max_items).to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use pretty_assertions::assert_eq;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 19, 9, 0, 0).unwrap()
    }

    fn aged(title: &str, hours: i64) -> FeedItem {
        FeedItem {
            title: title.to_string(),
            link: String::new(),
            description: String::new(),
            pub_date: (now() - Duration::hours(hours)).to_rfc2822(),
            content: None,
            category: None,
        }
    }

    fn titles(items: &[FeedItem]) -> Vec<&str> {
        items.iter().map(|i| i.title.as_str()).collect()
    }

    #[test]
    fn test_enough_items_no_widening() {
        let items: Vec<_> = (0..6)
            .map(|h| aged(&format!("h{}", h), h))
            .chain([aged("old", 30)])
            .collect();
        let selected = select_items(&items, &SelectionConfig::default(), now());
        assert_eq!(titles(&selected), vec!["h0", "h1", "h2", "h3", "h4", "h5"]);
    }

    #[test]
    fn test_widening_pulls_in_older_items() {
        let items = vec![aged("a", 1), aged("b", 2), aged("c", 30), aged("d", 40)];
        let selected = select_items(&items, &SelectionConfig::default(), now());
        assert_eq!(titles(&selected), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_widening_disabled_when_windows_equal() {
        let selection = SelectionConfig {
            fallback_window_hours: 24,
            ..SelectionConfig::default()
        };
        let items = vec![aged("a", 1), aged("c", 30)];
        let selected = select_items(&items, &selection, now());
        assert_eq!(titles(&selected), vec!["a"]);
    }

    #[test]
    fn test_max_items_cap() {
        let items: Vec<_> = (0..15).map(|h| aged(&format!("h{}", h), h)).collect();
        let selected = select_items(&items, &SelectionConfig::default(), now());
        assert_eq!(selected.len(), 10);
        assert_eq!(selected[0].title, "h0");
        assert_eq!(selected[9].title, "h9");
    }

    #[test]
    fn test_keyword_applied_before_window() {
        let mut rust = aged("Rust 2.0 released", 2);
        rust.category = Some("Programming".to_string());
        let items = vec![aged("Weather", 1), rust];
        let selection = SelectionConfig {
            keyword: Some("rust".to_string()),
            ..SelectionConfig::default()
        };
        let selected = select_items(&items, &selection, now());
        assert_eq!(titles(&selected), vec!["Rust 2.0 released"]);
    }

    #[test]
    fn test_blank_keyword_ignored() {
        let selection = SelectionConfig {
            keyword: Some("  ".to_string()),
            ..SelectionConfig::default()
        };
        let selected = select_items(&[aged("a", 1)], &selection, now());
        assert_eq!(selected.len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_topic() {
        let pipeline = Pipeline::new(Config::default()).unwrap();
        let result = pipeline.fetch_topic("gardening").await;
        assert!(matches!(result, Err(PipelineError::UnknownTopic(t)) if t == "gardening"));
    }

    #[tokio::test]
    async fn test_empty_topic() {
        let mut config = Config::default();
        config.topics.insert("empty".to_string(), Vec::new());
        let pipeline = Pipeline::new(config).unwrap();
        let result = pipeline.fetch_topic("empty").await;
        assert!(matches!(result, Err(PipelineError::NoFeeds(_))));
    }
}
