//! Media-type helpers shared by body matching and negotiation.

use mime::Mime;

/// Result of matching a request body's media type against patterns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeMatch {
    /// The request carries no body to type-match.
    NoBody,
    /// A body exists but `Content-Type` is missing or nothing matched.
    Unmatched,
    /// The first pattern that matched, as the caller spelled it.
    Matched(String),
}

/// Expand a type pattern to full `type/subtype` form.
///
/// Accepts full media types (returned lowercased), `+suffix` shorthand
/// (`"+json"` becomes `*/*+json`), and bare extensions looked up in the
/// MIME registry (`"json"` becomes `application/json`). Unknown
/// extensions expand to nothing and can never match.
pub fn expand(pattern: &str) -> Option<String> {
    if pattern.contains('/') {
        return Some(pattern.to_ascii_lowercase());
    }
    if let Some(suffix) = pattern.strip_prefix('+') {
        return Some(format!("*/*+{}", suffix.to_ascii_lowercase()));
    }
    mime_guess::from_ext(pattern)
        .first()
        .map(|m| m.essence_str().to_ascii_lowercase())
}

/// Strip parameters from a `Content-Type` value and normalize it.
pub fn strip_params(value: &str) -> String {
    value
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase()
}

/// The `charset` parameter of a `Content-Type` value, or `""` when the
/// parameter is absent or the value does not parse.
pub fn charset(value: &str) -> String {
    value
        .parse::<Mime>()
        .ok()
        .and_then(|m| {
            m.get_param(mime::CHARSET)
                .map(|c| c.as_str().to_ascii_lowercase())
        })
        .unwrap_or_default()
}

/// Match a raw `Content-Type` value against caller patterns, returning
/// the first pattern that matches. An empty pattern list returns the
/// normalized value itself; an unusable value matches nothing.
pub fn type_is(content_type: &str, patterns: &[&str]) -> Option<String> {
    let normalized = strip_params(content_type);
    if !normalized.contains('/') {
        return None;
    }
    if patterns.is_empty() {
        return Some(normalized);
    }
    for pattern in patterns {
        if let Some(expanded) = expand(pattern) {
            if mime_match(&expanded, &normalized) {
                return Some((*pattern).to_string());
            }
        }
    }
    None
}

/// Match a normalized `type/subtype` value against an expanded pattern.
/// Subtype patterns starting with `*` match by suffix (`*+json`).
fn mime_match(expanded: &str, actual: &str) -> bool {
    let Some((pattern_type, pattern_subtype)) = expanded.split_once('/') else {
        return false;
    };
    let Some((actual_type, actual_subtype)) = actual.split_once('/') else {
        return false;
    };
    if pattern_type != "*" && pattern_type != actual_type {
        return false;
    }
    if pattern_subtype == "*" {
        return true;
    }
    if let Some(rest) = pattern_subtype.strip_prefix('*') {
        return actual_subtype.ends_with(rest);
    }
    pattern_subtype == actual_subtype
}
