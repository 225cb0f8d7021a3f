//! Quality-weighted negotiation over the `Accept*` request headers.

use http::HeaderMap;

use crate::negotiate::Negotiator;

/// Default [`Negotiator`] implementation, built from a snapshot of the
/// `Accept*` headers.
///
/// The snapshot is taken at construction; mutating the header mapping
/// afterwards does not change an already-built negotiator.
#[derive(Debug, Clone)]
pub struct HeaderNegotiator {
    accept: Option<String>,
    encoding: Option<String>,
    charset: Option<String>,
    language: Option<String>,
}

impl HeaderNegotiator {
    /// Snapshot the negotiation headers out of `headers`.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        Self {
            accept: snapshot(headers, "accept"),
            encoding: snapshot(headers, "accept-encoding"),
            charset: snapshot(headers, "accept-charset"),
            language: snapshot(headers, "accept-language"),
        }
    }
}

impl Negotiator for HeaderNegotiator {
    fn types(&self, candidates: &[&str]) -> Vec<String> {
        negotiate(self.accept.as_deref(), "*/*", candidates, media_match)
    }

    fn encodings(&self, candidates: &[&str]) -> Vec<String> {
        negotiate(self.encoding.as_deref(), "*", candidates, exact_match)
    }

    fn charsets(&self, candidates: &[&str]) -> Vec<String> {
        negotiate(self.charset.as_deref(), "*", candidates, exact_match)
    }

    fn languages(&self, candidates: &[&str]) -> Vec<String> {
        negotiate(self.language.as_deref(), "*", candidates, language_match)
    }
}

/// Repeated fields fold into one comma-separated value, matching what a
/// combined field would have carried.
fn snapshot(headers: &HeaderMap, name: &str) -> Option<String> {
    let values: Vec<&str> = headers
        .get_all(name)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .collect();
    if values.is_empty() {
        None
    } else {
        Some(values.join(", "))
    }
}

/// Parse a header into `(range, quality)` entries, arrival order kept.
fn parse_ranges(header: &str) -> Vec<(String, f32)> {
    header
        .split(',')
        .filter_map(|part| {
            let mut pieces = part.split(';');
            let value = pieces.next()?.trim().to_ascii_lowercase();
            if value.is_empty() {
                return None;
            }
            let mut quality = 1.0f32;
            for param in pieces {
                let mut pair = param.splitn(2, '=');
                let key = pair.next().unwrap_or("").trim();
                if key.eq_ignore_ascii_case("q") {
                    quality = pair.next().unwrap_or("").trim().parse().unwrap_or(0.0);
                }
            }
            Some((value, quality.clamp(0.0, 1.0)))
        })
        .collect()
}

/// Rank `candidates` against the parsed ranges of `header`.
///
/// The matcher returns a specificity (0 = no match); candidates sort by
/// quality, then specificity, then the caller's order. With no
/// candidates, the acceptable ranges themselves are listed.
fn negotiate(
    header: Option<&str>,
    default_range: &str,
    candidates: &[&str],
    matcher: fn(&str, &str) -> u8,
) -> Vec<String> {
    let ranges = match header {
        None => vec![(default_range.to_string(), 1.0)],
        Some(raw) => parse_ranges(raw),
    };

    if candidates.is_empty() {
        let mut listed: Vec<(String, f32)> =
            ranges.into_iter().filter(|(_, q)| *q > 0.0).collect();
        listed.sort_by(|a, b| b.1.total_cmp(&a.1));
        return listed.into_iter().map(|(range, _)| range).collect();
    }

    let mut scored: Vec<(usize, f32, u8)> = Vec::new();
    for (index, candidate) in candidates.iter().enumerate() {
        let mut best: Option<(f32, u8)> = None;
        for (range, quality) in &ranges {
            let specificity = matcher(range, candidate);
            if specificity == 0 || *quality <= 0.0 {
                continue;
            }
            let better = match best {
                None => true,
                Some((bq, bs)) => *quality > bq || (*quality == bq && specificity > bs),
            };
            if better {
                best = Some((*quality, specificity));
            }
        }
        if let Some((quality, specificity)) = best {
            scored.push((index, quality, specificity));
        }
    }

    scored.sort_by(|a, b| {
        b.1.total_cmp(&a.1)
            .then(b.2.cmp(&a.2))
            .then(a.0.cmp(&b.0))
    });
    scored
        .into_iter()
        .map(|(index, _, _)| candidates[index].to_string())
        .collect()
}

fn media_match(range: &str, candidate: &str) -> u8 {
    let Some((range_type, range_subtype)) = range.split_once('/') else {
        return 0;
    };
    let Some((candidate_type, candidate_subtype)) = candidate.split_once('/') else {
        return 0;
    };
    if range_type == "*" && range_subtype == "*" {
        return 1;
    }
    if !range_type.eq_ignore_ascii_case(candidate_type) {
        return 0;
    }
    if range_subtype == "*" {
        return 2;
    }
    if range_subtype.eq_ignore_ascii_case(candidate_subtype) {
        return 3;
    }
    0
}

fn exact_match(range: &str, candidate: &str) -> u8 {
    if range == "*" {
        1
    } else if range.eq_ignore_ascii_case(candidate) {
        2
    } else {
        0
    }
}

fn language_match(range: &str, candidate: &str) -> u8 {
    if range == "*" {
        return 1;
    }
    if range.eq_ignore_ascii_case(candidate) {
        return 3;
    }
    // A bare primary tag accepts its subtags: `en` matches `en-US`.
    let primary = candidate.split('-').next().unwrap_or(candidate);
    if range.eq_ignore_ascii_case(primary) {
        2
    } else {
        0
    }
}
