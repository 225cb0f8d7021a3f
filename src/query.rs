//! Form-encoded query string codec.
//!
//! # Responsibilities
//! - Decode a raw query string into ordered key/value pairs
//! - Encode pairs back into a raw query string
//!
//! # Design Decisions
//! - Pairs keep arrival order and duplicate keys; routing and form
//!   handling both care about order
//! - Decoding follows application/x-www-form-urlencoded rules
//!   (percent sequences and `+` as space)

use url::form_urlencoded;

/// Ordered key/value pairs decoded from a query string.
pub type QueryPairs = Vec<(String, String)>;

/// Decode a raw query string (no leading `?`) into ordered pairs.
/// A key without `=` decodes to an empty value.
pub fn parse(raw: &str) -> QueryPairs {
    form_urlencoded::parse(raw.as_bytes())
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect()
}

/// Encode pairs into a raw query string (no leading `?`).
pub fn stringify(pairs: &[(String, String)]) -> String {
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    for (key, value) in pairs {
        serializer.append_pair(key, value);
    }
    serializer.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn owned(pairs: &[(&str, &str)]) -> QueryPairs {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_parse_preserves_order_and_duplicates() {
        let pairs = parse("b=2&a=1&b=3");
        assert_eq!(pairs, owned(&[("b", "2"), ("a", "1"), ("b", "3")]));
    }

    #[test]
    fn test_parse_decodes_percent_sequences() {
        let pairs = parse("email=user%40example.com&name=a+b");
        assert_eq!(pairs, owned(&[("email", "user@example.com"), ("name", "a b")]));
    }

    #[test]
    fn test_parse_bare_key() {
        assert_eq!(parse("debug"), owned(&[("debug", "")]));
        assert_eq!(parse(""), owned(&[]));
    }

    #[test]
    fn test_stringify_escapes() {
        let raw = stringify(&owned(&[("email", "user@example.com"), ("q", "a b")]));
        assert_eq!(raw, "email=user%40example.com&q=a+b");
    }

    #[test]
    fn test_round_trip() {
        let pairs = owned(&[("a", "1"), ("a", "2"), ("key", "va&ue")]);
        assert_eq!(parse(&stringify(&pairs)), pairs);
    }
}
