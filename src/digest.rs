//! HTML digest rendering.
//!
//! The digest is a single self-contained document meant for email clients: every style
//! is inline and nothing is loaded from elsewhere. Rendering never reorders or filters
//! items; callers pass exactly what should appear.

use chrono::{DateTime, Datelike, Utc};
use maud::{html, Markup, DOCTYPE};

use crate::config::DigestConfig;
use crate::feed::FeedItem;
use crate::util::{parse_pub_date, take_chars, ELLIPSIS};

/// Maximum description length (in characters) shown per item.
pub const DESCRIPTION_LIMIT: usize = 200;
const NO_SUMMARY: &str = "(No summary)";

const BODY_STYLE: &str = "font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, 'Helvetica Neue', Arial, sans-serif; background-color: #f9fafb; padding: 0; margin: 0;";
const CARD_STYLE: &str = "max-width: 600px; margin: 0 auto; background-color: #ffffff; border-radius: 8px; box-shadow: 0 2px 8px rgba(0, 0, 0, 0.1); overflow: hidden;";
const HEADER_STYLE: &str = "background: linear-gradient(135deg, #3b82f6 0%, #2563eb 100%); padding: 32px 24px; text-align: center;";
const ITEM_STYLE: &str = "border-left: 4px solid #3b82f6; padding-left: 16px; margin-bottom: 24px; padding-bottom: 24px; border-bottom: 1px solid #e5e7eb;";
const FOOTER_STYLE: &str = "background-color: #f3f4f6; border-top: 1px solid #e5e7eb; padding: 24px; text-align: center;";

/// A rendered digest ready for delivery.
#[derive(Debug, Clone)]
pub struct Digest {
    /// Email subject, including the date
    pub subject: String,
    /// Complete HTML document
    pub html: String,
    /// The items shown in the document, in display order
    pub items: Vec<FeedItem>,
}

/// Renders item lists into [`Digest`]s.
#[derive(Debug, Clone)]
pub struct DigestRenderer {
    config: DigestConfig,
}

impl DigestRenderer {
    pub fn new(config: DigestConfig) -> Self {
        Self { config }
    }

    /// Renders `items` and wraps them with a dated subject line.
    pub fn build(&self, items: Vec<FeedItem>, now: DateTime<Utc>) -> Digest {
        Digest {
            subject: self.subject(now),
            html: self.render(&items, now),
            items,
        }
    }

    /// Subject line for a digest generated at `now`.
    pub fn subject(&self, now: DateTime<Utc>) -> String {
        format!("{} - {}", self.config.subject, now.format("%Y-%m-%d"))
    }

    /// Renders the full HTML document for `items`, in the order given.
    pub fn render(&self, items: &[FeedItem], now: DateTime<Utc>) -> String {
        let markup = html! {
            (DOCTYPE)
            html {
                head {
                    meta charset="UTF-8";
                    meta name="viewport" content="width=device-width, initial-scale=1.0";
                    title { (self.config.heading) }
                }
                body style=(BODY_STYLE) {
                    div style=(CARD_STYLE) {
                        div style=(HEADER_STYLE) {
                            h1 style="margin: 0; font-size: 28px; color: #ffffff; font-weight: bold;" {
                                (self.config.heading)
                            }
                            p style="margin: 12px 0 0 0; color: rgba(255, 255, 255, 0.9); font-size: 14px;" {
                                (now.format("%B %-d, %Y").to_string())
                            }
                        }
                        div style="padding: 32px 24px;" {
                            p style="margin: 0 0 24px 0; color: #6b7280; font-size: 14px;" {
                                (items.len()) " stories selected for you today"
                            }
                            div {
                                @for (index, item) in items.iter().enumerate() {
                                    (item_block(index + 1, item))
                                }
                            }
                        }
                        div style=(FOOTER_STYLE) {
                            p style="margin: 8px 0 0 0; color: #9ca3af; font-size: 11px;" {
                                "© " (now.year()) " " (self.config.footer)
                            }
                        }
                    }
                }
            }
        };
        markup.into_string()
    }
}

fn item_block(ordinal: usize, item: &FeedItem) -> Markup {
    // The marker follows every summary, shortened or not
    let description = if item.description.is_empty() {
        NO_SUMMARY
    } else {
        take_chars(&item.description, DESCRIPTION_LIMIT)
    };

    html! {
        div class="digest-item" style=(ITEM_STYLE) {
            h3 style="margin: 0 0 8px 0; font-size: 18px; color: #1f2937;" {
                span style="color: #3b82f6; font-weight: bold;" { (ordinal) "." }
                " " (item.title)
            }
            p style="margin: 8px 0 12px 0; color: #6b7280; font-size: 13px;" {
                (display_date(&item.pub_date))
                @if let Some(category) = &item.category {
                    " | " (category)
                }
            }
            p style="margin: 12px 0; color: #374151; line-height: 1.6; font-size: 14px;" {
                (description) (ELLIPSIS)
            }
            @if !item.link.is_empty() {
                div {
                    a href=(item.link) style="color: #2563eb; text-decoration: none;" { "Read more →" }
                }
            }
        }
    }
}

/// Short UTC date for an item, or the raw text when it does not parse.
fn display_date(pub_date: &str) -> String {
    match parse_pub_date(pub_date) {
        Some(date) => date.with_timezone(&Utc).format("%Y-%m-%d").to_string(),
        None => pub_date.to_string(),
    }
}
