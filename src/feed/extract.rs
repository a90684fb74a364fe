//! Single-element text extraction from RSS markup.
//!
//! This is deliberately not an XML parser: it finds the first `<tag ...>...</tag>`
//! pair in a fragment with a regular expression and returns its text. That is enough
//! for the well-formed RSS 2.0 published by mainstream sites, and it keeps working on
//! documents a strict parser would reject.

use regex::Regex;

use crate::util::decode_entities;

const CDATA_OPEN: &str = "<![CDATA[";
const CDATA_CLOSE: &str = "]]>";

/// A compiled matcher for one element name.
///
/// Build once per tag and reuse across fragments; [`extract_tag`] is the one-shot form.
#[derive(Debug, Clone)]
pub struct TagPattern {
    name: String,
    regex: Regex,
}

impl TagPattern {
    /// Compiles the matcher for `name`.
    ///
    /// Matching is case-insensitive and the opening tag may carry attributes.
    /// Self-closing elements (`<link href="..."/>`) never match.
    pub fn new(name: &str) -> Result<Self, regex::Error> {
        let escaped = regex::escape(name);
        let regex = Regex::new(&format!(
            r"(?is)<{escaped}(?:\s(?:[^>]*[^/>])?)?\s*>(.*?)</{escaped}\s*>"
        ))?;
        Ok(Self {
            name: name.to_string(),
            regex,
        })
    }

    /// Element name this pattern matches.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the text of the first matching element in `fragment`.
    ///
    /// - CDATA sections are copied verbatim (no entity decoding, no tag stripping)
    /// - text outside CDATA is entity-decoded
    /// - surrounding whitespace is trimmed
    ///
    /// Returns `None` when there is no match or the element is empty.
    /// Later occurrences of the same element are ignored.
    pub fn extract(&self, fragment: &str) -> Option<String> {
        let inner = self.regex.captures(fragment)?.get(1)?.as_str().trim();
        let text = decode_element_text(inner);
        let text = text.trim();
        if text.is_empty() {
            None
        } else {
            Some(text.to_string())
        }
    }

    /// Raw inner text of every non-overlapping match, in document order.
    pub(crate) fn find_blocks<'a>(&self, fragment: &'a str) -> Vec<&'a str> {
        self.regex
            .captures_iter(fragment)
            .filter_map(|caps| caps.get(1).map(|m| m.as_str()))
            .collect()
    }

    /// `fragment` with every matching element (tags included) removed.
    pub(crate) fn strip_blocks(&self, fragment: &str) -> String {
        self.regex.replace_all(fragment, "").into_owned()
    }
}

/// One-shot form of [`TagPattern::extract`].
///
/// # Examples
///
/// ```
/// use rss_digest::feed::extract_tag;
///
/// assert_eq!(
///     extract_tag("<title>Hello &amp; World</title>", "title").as_deref(),
///     Some("Hello & World")
/// );
/// assert_eq!(
///     extract_tag("<title><![CDATA[Raw <b>text</b>]]></title>", "title").as_deref(),
///     Some("Raw <b>text</b>")
/// );
/// assert_eq!(extract_tag("<link>x</link>", "title"), None);
/// ```
pub fn extract_tag(fragment: &str, tag: &str) -> Option<String> {
    match TagPattern::new(tag) {
        Ok(pattern) => pattern.extract(fragment),
        Err(e) => {
            tracing::warn!(tag = %tag, error = %e, "Could not build tag pattern");
            None
        }
    }
}

/// Decodes element text, keeping CDATA sections literal.
fn decode_element_text(inner: &str) -> String {
    if !inner.contains(CDATA_OPEN) {
        return decode_entities(inner).into_owned();
    }

    let mut out = String::with_capacity(inner.len());
    let mut rest = inner;

    while let Some(start) = rest.find(CDATA_OPEN) {
        out.push_str(&decode_entities(&rest[..start]));
        let body = &rest[start + CDATA_OPEN.len()..];
        match body.find(CDATA_CLOSE) {
            Some(end) => {
                out.push_str(&body[..end]);
                rest = &body[end + CDATA_CLOSE.len()..];
            }
            None => {
                // Unterminated section: keep what follows as-is
                out.push_str(body);
                rest = "";
            }
        }
    }
    out.push_str(&decode_entities(rest));

    out
}
