//! Merging, ordering and selection of items across feeds.
//!
//! Items from every feed of a run are merged into one list ordered newest first.
//! Ordering and recency checks parse `pub_date` on the fly; an item whose date cannot
//! be parsed sorts after every dated item and is never considered recent.

use chrono::{DateTime, Utc};
use std::cmp::Reverse;

use crate::feed::{Feed, FeedItem};
use crate::util::parse_pub_date;

const MILLIS_PER_HOUR: i64 = 60 * 60 * 1000;

/// Publication time of an item in Unix milliseconds, if its date parses.
pub fn item_timestamp(item: &FeedItem) -> Option<i64> {
    parse_pub_date(&item.pub_date).map(|date| date.timestamp_millis())
}

/// Concatenates the items of every feed and sorts them newest first.
///
/// The result always holds exactly as many items as the inputs combined.
pub fn merge_feeds<I>(feeds: I) -> Vec<FeedItem>
where
    I: IntoIterator<Item = Feed>,
{
    let mut items: Vec<FeedItem> = feeds.into_iter().flat_map(|feed| feed.items).collect();
    sort_by_recency(&mut items);
    items
}

/// Sorts items by publication time, newest first.
///
/// Items with unparsable dates go to the end. Ties keep no particular order.
pub fn sort_by_recency(items: &mut [FeedItem]) {
    items.sort_by_cached_key(|item| Reverse(item_timestamp(item)));
}

/// Keeps items published within the last `hours` hours.
pub fn filter_recent_news(items: &[FeedItem], hours: u32) -> Vec<FeedItem> {
    filter_recent_news_at(items, hours, Utc::now())
}

/// Keeps items whose age relative to `now` lies in `[0, hours]`, both ends inclusive.
///
/// Future-dated items and items whose date does not parse are dropped. Input order
/// is preserved.
pub fn filter_recent_news_at(
    items: &[FeedItem],
    hours: u32,
    now: DateTime<Utc>,
) -> Vec<FeedItem> {
    let now_ms = now.timestamp_millis();
    let window_ms = i64::from(hours) * MILLIS_PER_HOUR;

    items
        .iter()
        .filter(|item| match item_timestamp(item) {
            Some(published) => {
                let age = now_ms - published;
                (0..=window_ms).contains(&age)
            }
            None => {
                tracing::debug!(
                    title = %item.title,
                    pub_date = %item.pub_date,
                    "Skipping item with unparsable date"
                );
                false
            }
        })
        .cloned()
        .collect()
}

/// The first `count` items (or all of them, if there are fewer).
pub fn latest_news(items: &[FeedItem], count: usize) -> &[FeedItem] {
    &items[..count.min(items.len())]
}

/// Keeps items mentioning `keyword` in their category, title or description.
///
/// Matching is a case-insensitive substring test. Input order is preserved.
pub fn filter_by_category(items: &[FeedItem], keyword: &str) -> Vec<FeedItem> {
    let needle = keyword.to_lowercase();
    items
        .iter()
        .filter(|item| {
            item.category
                .as_deref()
                .is_some_and(|c| c.to_lowercase().contains(&needle))
                || item.title.to_lowercase().contains(&needle)
                || item.description.to_lowercase().contains(&needle)
        })
        .cloned()
        .collect()
}
