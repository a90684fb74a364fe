use std::borrow::Cow;

/// Entities recognized by [`decode_entities`]. Anything else is left untouched.
const ENTITIES: &[(&str, &str)] = &[
    ("&amp;", "&"),
    ("&lt;", "<"),
    ("&gt;", ">"),
    ("&quot;", "\""),
    ("&#39;", "'"),
    ("&apos;", "'"),
];

/// Marker written after a shortened summary
pub const ELLIPSIS: &str = "...";

/// Decodes the small fixed set of markup entities found in feed text.
///
/// Every `&name;` / `&#num;` form is looked up in a fixed table; forms that are not in
/// the table are copied through unchanged. Decoding is a single pass, so `&amp;lt;`
/// becomes `&lt;` and not `<`.
///
/// Returns `Cow::Borrowed` when the input contains no `&`.
///
/// # Examples
///
/// ```
/// use rss_digest::util::decode_entities;
///
/// assert_eq!(decode_entities("Hello &amp; World"), "Hello & World");
/// assert_eq!(decode_entities("&copy; 2026"), "&copy; 2026");
/// ```
pub fn decode_entities(text: &str) -> Cow<'_, str> {
    if !text.contains('&') {
        return Cow::Borrowed(text);
    }

    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let candidate = &rest[amp..];

        match entity_len(candidate) {
            Some(len) => {
                let entity = &candidate[..len];
                let replacement = ENTITIES
                    .iter()
                    .find(|(name, _)| *name == entity)
                    .map_or(entity, |(_, literal)| *literal);
                out.push_str(replacement);
                rest = &candidate[len..];
            }
            None => {
                out.push('&');
                rest = &candidate[1..];
            }
        }
    }
    out.push_str(rest);

    Cow::Owned(out)
}

/// Byte length of an `&[#\w]+;` entity at the start of `s`, if there is one.
fn entity_len(s: &str) -> Option<usize> {
    let body = s.strip_prefix('&')?;
    let name_len = body
        .char_indices()
        .find(|(_, c)| !(c.is_alphanumeric() || *c == '_' || *c == '#'))
        .map_or(body.len(), |(idx, _)| idx);

    if name_len == 0 || !body[name_len..].starts_with(';') {
        return None;
    }
    // '&' + name + ';'
    Some(1 + name_len + 1)
}

/// Strips markup from a feed description and normalizes its whitespace.
///
/// - `<...>` tags are removed by plain bracket matching (no nesting, an unmatched `<`
///   is kept as text)
/// - `&nbsp;` becomes a plain space
/// - runs of whitespace collapse to a single space and the result is trimmed
///
/// # Examples
///
/// ```
/// use rss_digest::util::clean_html;
///
/// assert_eq!(clean_html("<p>Hi&nbsp;there</p>"), "Hi there");
/// ```
pub fn clean_html(html: &str) -> String {
    let without_tags = strip_tags(html);
    let spaced = without_tags.replace("&nbsp;", " ");
    spaced.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn strip_tags(html: &str) -> Cow<'_, str> {
    if !html.contains('<') {
        return Cow::Borrowed(html);
    }

    let mut out = String::with_capacity(html.len());
    let mut rest = html;

    while let Some(open) = rest.find('<') {
        out.push_str(&rest[..open]);
        let after_open = &rest[open + 1..];

        // A tag needs at least one character between the brackets
        match after_open.find('>') {
            Some(close) if close > 0 => {
                rest = &after_open[close + 1..];
            }
            _ => {
                out.push('<');
                rest = after_open;
            }
        }
    }
    out.push_str(rest);

    Cow::Owned(out)
}

/// Returns the first `max_chars` characters of `s`.
///
/// Counts `char`s rather than bytes, so multi-byte text is never split mid-codepoint.
/// No marker is added; callers append [`ELLIPSIS`] where they want one.
///
/// # Examples
///
/// ```
/// use rss_digest::util::take_chars;
///
/// assert_eq!(take_chars("Short", 10), "Short");
/// assert_eq!(take_chars("Hello World", 5), "Hello");
/// ```
pub fn take_chars(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((cut, _)) => &s[..cut],
        None => s,
    }
}
