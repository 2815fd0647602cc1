//! Case-insensitive literal search over document text

use regex::RegexBuilder;
use serde::Serialize;

/// Characters of context kept on each side of a match offset
pub const SNIPPET_RADIUS: usize = 30;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchHit {
    /// Byte offset of the match in the searched text
    pub offset: usize,
    /// Byte length of the matched text
    pub len: usize,
    /// Text around the offset, clipped at the text bounds
    pub snippet: String,
}

/// Every non-overlapping, case-insensitive occurrence of `query` in `text`,
/// left to right. An empty query matches nothing.
pub fn search(text: &str, query: &str) -> Vec<SearchHit> {
    if query.is_empty() {
        return Vec::new();
    }

    let spans: Vec<(usize, usize)> = match RegexBuilder::new(&regex::escape(query))
        .case_insensitive(true)
        .build()
    {
        Ok(re) => re.find_iter(text).map(|m| (m.start(), m.end())).collect(),
        Err(e) => {
            tracing::debug!(
                "Query of {} bytes too large for regex ({}), scanning",
                query.len(),
                e
            );
            lowercase_matches(text, query)
        }
    };

    spans
        .into_iter()
        .map(|(start, end)| SearchHit {
            offset: start,
            len: end - start,
            snippet: snippet(text, start),
        })
        .collect()
}

/// Literal search over lowercased copies of both strings, mapped back to
/// byte spans of the original text
fn lowercase_matches(text: &str, query: &str) -> Vec<(usize, usize)> {
    let needle = query.to_lowercase();
    let mut haystack = String::with_capacity(text.len());
    // origin[i] is the offset in `text` of the char that produced byte i
    let mut origin = Vec::with_capacity(text.len());

    for (i, c) in text.char_indices() {
        for lower in c.to_lowercase() {
            haystack.push(lower);
            origin.extend(std::iter::repeat(i).take(lower.len_utf8()));
        }
    }

    haystack
        .match_indices(needle.as_str())
        .map(|(at, found)| {
            let start = origin[at];
            let last = origin[at + found.len() - 1];
            let end = last + text[last..].chars().next().map_or(0, char::len_utf8);
            (start, end)
        })
        .collect()
}

/// Up to [`SNIPPET_RADIUS`] characters on each side of `offset`
fn snippet(text: &str, offset: usize) -> String {
    let from = text[..offset]
        .char_indices()
        .rev()
        .take(SNIPPET_RADIUS)
        .last()
        .map_or(offset, |(i, _)| i);

    let to = text[offset..]
        .char_indices()
        .nth(SNIPPET_RADIUS)
        .map_or(text.len(), |(i, _)| offset + i);

    text[from..to].to_string()
}
