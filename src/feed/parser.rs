use chrono::{DateTime, SecondsFormat, Utc};
use thiserror::Error;

use crate::feed::extract::TagPattern;
use crate::feed::types::{Feed, FeedItem, NO_TITLE, UNKNOWN_FEED};
use crate::util::clean_html;

/// Errors that can occur while preparing the feed parser.
///
/// Parsing a document never fails: missing or malformed fields fall back to defaults.
#[derive(Debug, Error)]
pub enum ParseError {
    /// One of the element patterns failed to compile
    #[error("Invalid tag pattern: {0}")]
    Pattern(#[from] regex::Error),
}

/// RSS 2.0 parser built on [`TagPattern`] extraction.
///
/// Holds the compiled patterns for every element it reads, so one instance should be
/// shared across all documents of a run.
#[derive(Debug, Clone)]
pub struct FeedParser {
    channel: TagPattern,
    item: TagPattern,
    title: TagPattern,
    link: TagPattern,
    description: TagPattern,
    pub_date: TagPattern,
    content: TagPattern,
    category: TagPattern,
}

impl FeedParser {
    pub fn new() -> Result<Self, ParseError> {
        Ok(Self {
            channel: TagPattern::new("channel")?,
            item: TagPattern::new("item")?,
            title: TagPattern::new("title")?,
            link: TagPattern::new("link")?,
            description: TagPattern::new("description")?,
            pub_date: TagPattern::new("pubDate")?,
            content: TagPattern::new("content:encoded")?,
            category: TagPattern::new("category")?,
        })
    }

    /// Parses one RSS document, stamping undated items with the current time.
    pub fn parse(&self, xml: &str) -> Feed {
        self.parse_at(xml, Utc::now())
    }

    /// Parses one RSS document, stamping undated items with `now`.
    ///
    /// - The `<channel>` body is used when present, otherwise the whole document
    /// - Every `<item>` block in the channel becomes a [`FeedItem`], in document order
    /// - Channel metadata is read with the item blocks removed, so an item's title
    ///   never stands in for a missing channel title
    pub fn parse_at(&self, xml: &str, now: DateTime<Utc>) -> Feed {
        let channel = self
            .channel
            .find_blocks(xml)
            .into_iter()
            .next()
            .unwrap_or(xml);

        let metadata = self.item.strip_blocks(channel);
        let fallback_date = now.to_rfc3339_opts(SecondsFormat::Millis, true);

        let items: Vec<FeedItem> = self
            .item
            .find_blocks(channel)
            .into_iter()
            .map(|block| self.parse_item(block, &fallback_date))
            .collect();

        tracing::debug!(items = items.len(), "Parsed feed document");

        Feed {
            title: self
                .title
                .extract(&metadata)
                .unwrap_or_else(|| UNKNOWN_FEED.to_string()),
            description: self.description.extract(&metadata).unwrap_or_default(),
            link: self.link.extract(&metadata).unwrap_or_default(),
            items,
        }
    }

    fn parse_item(&self, block: &str, fallback_date: &str) -> FeedItem {
        let content = self
            .content
            .extract(block)
            .map(|html| clean_html(&html))
            .filter(|text| !text.is_empty());

        FeedItem {
            title: self
                .title
                .extract(block)
                .unwrap_or_else(|| NO_TITLE.to_string()),
            link: self.link.extract(block).unwrap_or_default(),
            description: self
                .description
                .extract(block)
                .map(|html| clean_html(&html))
                .unwrap_or_default(),
            pub_date: self
                .pub_date
                .extract(block)
                .unwrap_or_else(|| fallback_date.to_string()),
            content,
            category: self.category.extract(block),
        }
    }
}

/// Parses one RSS document with a freshly built [`FeedParser`].
pub fn parse_feed(xml: &str) -> Result<Feed, ParseError> {
    Ok(FeedParser::new()?.parse(xml))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    const SAMPLE_RSS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0" xmlns:content="http://purl.org/rss/1.0/modules/content/">
<channel>
    <title>Example News</title>
    <link>https://news.example.com/</link>
    <description>All the news &amp; more</description>
    <item>
        <title>First story</title>
        <link>https://news.example.com/1</link>
        <description><![CDATA[<p>Hello&nbsp;<b>world</b></p>]]></description>
        <pubDate>Mon, 19 Oct 2026 08:00:00 +0000</pubDate>
        <category>AI</category>
        <category>Chips</category>
        <content:encoded><![CDATA[<div>Full   body</div>]]></content:encoded>
    </item>
    <item>
        <title>Second &amp; last</title>
        <description>&lt;i&gt;escaped&lt;/i&gt; markup</description>
        <pubDate>2026-10-18T20:00:00Z</pubDate>
    </item>
</channel>
</rss>"#;

    fn parser() -> FeedParser {
        FeedParser::new().unwrap()
    }

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 19, 9, 0, 0).unwrap()
    }

    #[test]
    fn test_channel_metadata() {
        let feed = parser().parse_at(SAMPLE_RSS, fixed_now());
        assert_eq!(feed.title, "Example News");
        assert_eq!(feed.link, "https://news.example.com/");
        assert_eq!(feed.description, "All the news & more");
    }

    #[test]
    fn test_items_in_document_order() {
        let feed = parser().parse_at(SAMPLE_RSS, fixed_now());
        assert_eq!(feed.items.len(), 2);

        let first = &feed.items[0];
        assert_eq!(
            first,
            &FeedItem {
                title: "First story".to_string(),
                link: "https://news.example.com/1".to_string(),
                description: "Hello world".to_string(),
                pub_date: "Mon, 19 Oct 2026 08:00:00 +0000".to_string(),
                content: Some("Full body".to_string()),
                category: Some("AI".to_string()),
            }
        );

        let second = &feed.items[1];
        assert_eq!(second.title, "Second & last");
        assert_eq!(second.link, "");
        // Decoded entities become markup, which is then stripped
        assert_eq!(second.description, "escaped markup");
        assert_eq!(second.pub_date, "2026-10-18T20:00:00Z");
        assert_eq!(second.content, None);
        assert_eq!(second.category, None);
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let xml = "<rss><channel><item><guid>1</guid></item></channel></rss>";
        let feed = parser().parse_at(xml, fixed_now());

        assert_eq!(feed.title, UNKNOWN_FEED);
        assert_eq!(feed.description, "");
        assert_eq!(feed.link, "");

        let item = &feed.items[0];
        assert_eq!(item.title, NO_TITLE);
        assert_eq!(item.link, "");
        assert_eq!(item.description, "");
        assert_eq!(item.pub_date, "2026-10-19T09:00:00.000Z");
        assert_eq!(item.content, None);
        assert_eq!(item.category, None);
    }

    #[test]
    fn test_channel_title_not_taken_from_item() {
        let xml = "<rss><channel><item><title>Item title</title></item></channel></rss>";
        let feed = parser().parse_at(xml, fixed_now());
        assert_eq!(feed.title, UNKNOWN_FEED);
        assert_eq!(feed.items[0].title, "Item title");
    }

    #[test]
    fn test_without_channel_uses_whole_document() {
        let xml = "<title>Loose</title><item><title>A</title></item><item><title>B</title></item>";
        let feed = parser().parse_at(xml, fixed_now());
        assert_eq!(feed.title, "Loose");
        let titles: Vec<_> = feed.items.iter().map(|i| i.title.as_str()).collect();
        assert_eq!(titles, vec!["A", "B"]);
    }

    #[test]
    fn test_items_outside_channel_ignored() {
        let xml = "<channel><item><title>In</title></item></channel><item><title>Out</title></item>";
        let feed = parser().parse_at(xml, fixed_now());
        assert_eq!(feed.items.len(), 1);
        assert_eq!(feed.items[0].title, "In");
    }

    #[test]
    fn test_unterminated_item_is_dropped_not_fatal() {
        let xml = "<channel><title>T</title><item><title>Ok</title></item><item><title>Broken</title></channel>";
        let feed = parser().parse_at(xml, fixed_now());
        assert_eq!(feed.items.len(), 1);
        assert_eq!(feed.items[0].title, "Ok");
    }

    #[test]
    fn test_title_is_not_html_stripped() {
        let xml = "<channel><item><title><![CDATA[Use <code>fn</code>]]></title></item></channel>";
        let feed = parser().parse_at(xml, fixed_now());
        assert_eq!(feed.items[0].title, "Use <code>fn</code>");
    }

    #[test]
    fn test_empty_content_encoded_is_absent() {
        let xml = "<channel><item><content:encoded><![CDATA[<p> </p>]]></content:encoded></item></channel>";
        let feed = parser().parse_at(xml, fixed_now());
        assert_eq!(feed.items[0].content, None);
    }

    #[test]
    fn test_garbage_input() {
        let feed = parse_feed("<not valid xml").unwrap();
        assert_eq!(feed.title, UNKNOWN_FEED);
        assert!(feed.items.is_empty());
    }
}
