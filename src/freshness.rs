//! Cache-freshness evaluation for conditional requests.
//!
//! # Responsibilities
//! - Compare request validators (`If-None-Match`, `If-Modified-Since`)
//!   against response validators (`ETag`, `Last-Modified`)
//! - Give `If-None-Match` precedence when both validators are present
//!
//! # Design Decisions
//! - A request `Cache-Control: no-cache` always reports stale
//! - Unparseable HTTP dates report stale instead of erroring
//! - ETag comparison tolerates a `W/` weak marker on either side

use http::HeaderMap;

/// Returns true when the copy the client holds is still fresh against the
/// response validators.
pub fn fresh(request: &HeaderMap, response: &HeaderMap) -> bool {
    let none_match = header_value(request, "if-none-match");
    let modified_since = header_value(request, "if-modified-since");

    if none_match.is_empty() && modified_since.is_empty() {
        return false;
    }

    // An end-to-end reload skips validator comparison entirely.
    let cache_control = header_value(request, "cache-control");
    if cache_control
        .split(',')
        .any(|token| token.trim().eq_ignore_ascii_case("no-cache"))
    {
        return false;
    }

    if !none_match.is_empty() {
        if none_match.trim() == "*" {
            return true;
        }
        let etag = header_value(response, "etag");
        if etag.is_empty() {
            return false;
        }
        return none_match
            .split(',')
            .map(str::trim)
            .any(|candidate| etag_matches(candidate, &etag));
    }

    let last_modified = header_value(response, "last-modified");
    match (
        httpdate::parse_http_date(&last_modified),
        httpdate::parse_http_date(&modified_since),
    ) {
        (Ok(modified), Ok(since)) => modified <= since,
        _ => false,
    }
}

fn header_value(headers: &HeaderMap, name: &str) -> String {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("")
        .to_string()
}

fn etag_matches(candidate: &str, etag: &str) -> bool {
    candidate == etag
        || candidate.strip_prefix("W/") == Some(etag)
        || etag.strip_prefix("W/") == Some(candidate)
}
