//! URL ⇄ query-param list codec.
//!
//! Data-element tokens (`{{name}}`) are substituted by the platform at rule
//! execution time, so they pass through both directions untouched while the text
//! around them is percent-encoded like `encodeURIComponent` and form-decoded.

use std::ops::Range;
use std::sync::LazyLock;

use connector_core::kv::{self, KvRow};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, percent_decode_str, utf8_percent_encode};
use regex::Regex;

/// Characters left unescaped by `encodeURIComponent`.
const URI_COMPONENT_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

static TOKEN_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{[^}]+\}\}").expect("token pattern is valid"));

/// Whether `value` contains a data-element token.
pub fn contains_token(value: &str) -> bool {
    TOKEN_PATTERN.is_match(value)
}

/// Replace every data-element token in `value` with `with`.
pub fn replace_tokens(value: &str, with: &str) -> String {
    TOKEN_PATTERN.replace_all(value, with).into_owned()
}

/// The URL up to (not including) the first `?`.
pub fn base_url(url: &str) -> &str {
    url.split_once('?').map_or(url, |(base, _)| base)
}

/// Percent-encode a URI component, keeping data-element tokens verbatim.
pub fn encode_component(value: &str) -> String {
    let mut result = String::with_capacity(value.len());
    let mut last = 0;
    for token in TOKEN_PATTERN.find_iter(value) {
        result.extend(utf8_percent_encode(&value[last..token.start()], URI_COMPONENT_SET));
        result.push_str(token.as_str());
        last = token.end();
    }
    result.extend(utf8_percent_encode(&value[last..], URI_COMPONENT_SET));
    result
}

fn token_spans(value: &str) -> Vec<Range<usize>> {
    TOKEN_PATTERN.find_iter(value).map(|m| m.range()).collect()
}

/// Byte offsets of `sep` in `value` that are not inside a token.
fn separators(value: &str, sep: char) -> Vec<usize> {
    let spans = token_spans(value);
    value
        .match_indices(sep)
        .map(|(i, _)| i)
        .filter(|i| !spans.iter().any(|span| span.contains(i)))
        .collect()
}

fn decode_text(text: &str) -> String {
    percent_decode_str(&text.replace('+', " "))
        .decode_utf8_lossy()
        .into_owned()
}

/// Form-decode a query component. Tokens are kept byte for byte, so
/// `{{a+b}}` stays `{{a+b}}`.
pub fn decode_component(value: &str) -> String {
    let mut result = String::with_capacity(value.len());
    let mut last = 0;
    for span in token_spans(value) {
        result.push_str(&decode_text(&value[last..span.start]));
        result.push_str(&value[span.clone()]);
        last = span.end;
    }
    result.push_str(&decode_text(&value[last..]));
    result
}

fn decode_pair(pair: &str) -> KvRow {
    match separators(pair, '=').first() {
        Some(&eq) => KvRow::new(decode_component(&pair[..eq]), decode_component(&pair[eq + 1..])),
        None => KvRow::new(decode_component(pair), ""),
    }
}

/// Parse the query string of `url` into ordered rows.
/// A URL without query params yields one empty placeholder row.
pub fn decode(url: &str) -> Vec<KvRow> {
    let mut rows = Vec::new();
    if let Some((_, query)) = url.split_once('?') {
        let mut start = 0;
        for end in separators(query, '&').into_iter().chain([query.len()]) {
            let pair = &query[start..end];
            if !pair.is_empty() {
                rows.push(decode_pair(pair));
            }
            start = end + 1;
        }
    }
    kv::with_placeholder(rows)
}

/// Rebuild `url` with `params` as its query string.
/// Rows with an empty key are dropped along with their value.
pub fn encode(url: &str, params: &[KvRow]) -> String {
    let base = base_url(url);
    let pairs: Vec<String> = params
        .iter()
        .filter(|p| !p.key.is_empty())
        .map(|p| format!("{}={}", encode_component(&p.key), encode_component(&p.value)))
        .collect();

    if pairs.is_empty() {
        return base.to_string();
    }
    format!("{}?{}", base, pairs.join("&"))
}
