//! The request context and its derived views.
//!
//! # Responsibilities
//! - Hold the mutable method/target/headers routing is allowed to rewrite
//! - Derive URL and query components from the current target on every read
//! - Resolve host, protocol, and client ip with proxy trust applied
//! - Delegate content negotiation and freshness to their evaluators
//!
//! # Design Decisions
//! - `query`, `url`, `ip`, and `accept` fill a cell at most once and are
//!   never invalidated by later mutation; `path`/`querystring`/`search`
//!   re-derive on every read
//! - Accessors that fill a cell take `&mut self`; one context serves one
//!   in-flight request, so exclusive access is already the norm
//! - Derivations degrade to empty values instead of returning errors

use std::collections::HashMap;
use std::fmt;
use std::net::IpAddr;
use std::sync::Arc;

use http::{HeaderMap, Method};
use serde_json::{json, Value};
use url::{Host, Url};

use crate::config::AppConfig;
use crate::freshness;
use crate::negotiate::{self, HeaderNegotiator, Negotiator, TypeMatch};
use crate::query::{self, QueryPairs};
use crate::transport::{ResponseHead, TransportRequest};

/// Per-request context over a decoded transport request.
///
/// One instance serves exactly one in-flight request; every derivation is
/// a synchronous computation over already-buffered strings and mappings.
pub struct RequestContext {
    transport: TransportRequest,
    config: Arc<AppConfig>,
    original_target: String,

    // Write-once cells. The outer Option marks "computed"; for the URL
    // the inner Option additionally memoizes a parse failure.
    url_memo: Option<Option<Url>>,
    accept_memo: Option<Box<dyn Negotiator>>,
    ip_memo: Option<String>,
    query_cache: HashMap<String, QueryPairs>,
}

impl RequestContext {
    /// Wrap a transport request, snapshotting the original request-target
    /// before routing gets a chance to rewrite it.
    pub fn new(transport: TransportRequest, config: Arc<AppConfig>) -> Self {
        let original_target = transport.target.clone();
        Self {
            transport,
            config,
            original_target,
            url_memo: None,
            accept_memo: None,
            ip_memo: None,
            query_cache: HashMap::new(),
        }
    }
}

// Header access
impl RequestContext {
    pub fn method(&self) -> &Method {
        &self.transport.method
    }

    pub fn set_method(&mut self, method: Method) {
        self.transport.method = method;
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.transport.headers
    }

    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.transport.headers
    }

    pub fn set_headers(&mut self, headers: HeaderMap) {
        self.transport.headers = headers;
    }

    /// Case-insensitive single-field lookup. `referer` and `referrer`
    /// are interchangeable; repeated fields are joined with `", "`.
    /// Returns `""` when the field is absent.
    pub fn get(&self, name: &str) -> String {
        match name.to_ascii_lowercase().as_str() {
            "referer" | "referrer" => {
                let referrer = self.raw_header("referrer");
                if referrer.is_empty() {
                    self.raw_header("referer")
                } else {
                    referrer
                }
            }
            lower => self.raw_header(lower),
        }
    }

    fn raw_header(&self, name: &str) -> String {
        let values: Vec<&str> = self
            .transport
            .headers
            .get_all(name)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .collect();
        values.join(", ")
    }
}

// URL & query derivation
impl RequestContext {
    /// Current raw request-target. Routing may rewrite it.
    pub fn target(&self) -> &str {
        &self.transport.target
    }

    pub fn set_target(&mut self, target: impl Into<String>) {
        self.transport.target = target.into();
    }

    /// The request-target exactly as received, before any rewriting.
    pub fn original_target(&self) -> &str {
        &self.original_target
    }

    /// Pathname portion of the current target, re-derived on every read.
    pub fn path(&self) -> String {
        let (_, path, _) = split_target(&self.transport.target);
        path.to_string()
    }

    /// Replace the pathname, keeping the query string. No-op when the
    /// pathname is already current.
    pub fn set_path(&mut self, pathname: &str) {
        let (prefix, path, query) = split_target(&self.transport.target);
        if path == pathname {
            return;
        }
        let mut target =
            String::with_capacity(prefix.len() + pathname.len() + query.len() + 1);
        target.push_str(prefix);
        target.push_str(pathname);
        if !query.is_empty() {
            target.push('?');
            target.push_str(query);
        }
        self.transport.target = target;
    }

    /// Query portion of the current target without the leading `?`,
    /// re-derived on every read. `""` when absent.
    pub fn querystring(&self) -> String {
        let (_, _, query) = split_target(&self.transport.target);
        query.to_string()
    }

    /// Rewrite the query portion. No-op when the value already matches.
    pub fn set_querystring(&mut self, querystring: &str) {
        let (prefix, path, query) = split_target(&self.transport.target);
        if query == querystring {
            return;
        }
        let mut target =
            String::with_capacity(prefix.len() + path.len() + querystring.len() + 1);
        target.push_str(prefix);
        target.push_str(path);
        if !querystring.is_empty() {
            target.push('?');
            target.push_str(querystring);
        }
        self.transport.target = target;
    }

    /// `querystring` with the leading `?`; empty maps to empty, not `?`.
    pub fn search(&self) -> String {
        let querystring = self.querystring();
        if querystring.is_empty() {
            String::new()
        } else {
            format!("?{querystring}")
        }
    }

    /// Set the query portion from a search string, leading `?` optional.
    pub fn set_search(&mut self, search: &str) {
        self.set_querystring(search.strip_prefix('?').unwrap_or(search));
    }

    /// Parsed query pairs for the current raw query string. Each distinct
    /// raw string is parsed once and cached for the life of the request;
    /// old entries are kept.
    pub fn query(&mut self) -> &QueryPairs {
        let raw = self.querystring();
        self.query_cache
            .entry(raw)
            .or_insert_with_key(|raw| query::parse(raw))
    }

    /// Serialize pairs into the query portion.
    pub fn set_query(&mut self, pairs: &[(String, String)]) {
        self.set_querystring(&query::stringify(pairs));
    }

    /// `protocol://host` for the current request.
    pub fn origin(&self) -> String {
        format!("{}://{}", self.protocol(), self.host())
    }

    /// Full request URL. An absolute-form request-target is returned as
    /// received; an origin-form target is prefixed with `origin`.
    pub fn href(&self) -> String {
        if has_absolute_scheme(&self.original_target) {
            return self.original_target.clone();
        }
        format!("{}{}", self.origin(), self.original_target)
    }

    /// Standards-parsed URL of `href`, computed on first access and never
    /// recomputed; later changes to the target or headers do not reach
    /// it. `None` when the first parse failed.
    pub fn url(&mut self) -> Option<&Url> {
        if self.url_memo.is_none() {
            let href = self.href();
            let parsed = Url::parse(&href)
                .map_err(|error| {
                    tracing::debug!(%href, %error, "request target failed to parse");
                    error
                })
                .ok();
            self.url_memo = Some(parsed);
        }
        self.url_memo.as_ref().and_then(|memo| memo.as_ref())
    }
}

// Host / protocol / ip / subdomain resolution
impl RequestContext {
    /// `"https"` on an encrypted socket; otherwise the first
    /// `X-Forwarded-Proto` entry when the proxy is trusted, defaulting
    /// to `"http"`.
    pub fn protocol(&self) -> String {
        if self.transport.socket.encrypted {
            return "https".to_string();
        }
        if !self.config.proxy {
            return "http".to_string();
        }
        let forwarded = self.get("x-forwarded-proto");
        let first = forwarded.split(',').next().unwrap_or("").trim();
        if first.is_empty() {
            "http".to_string()
        } else {
            first.to_string()
        }
    }

    /// Shorthand for `protocol() == "https"`.
    pub fn secure(&self) -> bool {
        self.protocol() == "https"
    }

    /// Host (hostname:port) the client addressed: `X-Forwarded-Host`
    /// when the proxy is trusted, then the HTTP/2 authority, then the
    /// `Host` header. `""` when nothing is present.
    pub fn host(&self) -> String {
        let mut host = String::new();
        if self.config.proxy {
            host = self.get("x-forwarded-host");
        }
        if host.is_empty() && self.transport.version_major() >= 2 {
            host = self.transport.authority.clone().unwrap_or_default();
        }
        if host.is_empty() {
            host = self.get("host");
        }
        host.split(',').next().unwrap_or("").trim().to_string()
    }

    /// Hostname with any port stripped. IPv6 literals defer to the
    /// parsed URL, which strips brackets and port together.
    pub fn hostname(&mut self) -> String {
        let host = self.host();
        if host.is_empty() {
            return String::new();
        }
        if host.starts_with('[') {
            return match self.url().and_then(Url::host) {
                Some(Host::Ipv6(address)) => address.to_string(),
                Some(Host::Ipv4(address)) => address.to_string(),
                Some(Host::Domain(domain)) => domain.to_string(),
                None => String::new(),
            };
        }
        host.split(':').next().unwrap_or("").to_string()
    }

    /// Subdomain labels ordered from the domain root outward, with the
    /// root itself dropped per `subdomain_offset`. Empty for literal IP
    /// hostnames.
    pub fn subdomains(&mut self) -> Vec<String> {
        let hostname = self.hostname();
        if hostname.is_empty() || hostname.parse::<IpAddr>().is_ok() {
            return Vec::new();
        }
        hostname
            .split('.')
            .rev()
            .skip(self.config.subdomain_offset)
            .map(str::to_string)
            .collect()
    }

    /// Forwarded client chain when the proxy is trusted: first entry is
    /// the original client, last the nearest proxy. Empty otherwise.
    pub fn ips(&self) -> Vec<String> {
        if !self.config.proxy {
            return Vec::new();
        }
        let raw = self.get(&self.config.proxy_ip_header);
        if raw.is_empty() {
            return Vec::new();
        }
        let mut ips: Vec<String> = raw.split(',').map(|ip| ip.trim().to_string()).collect();
        if self.config.max_ips_count > 0 && ips.len() > self.config.max_ips_count {
            ips = ips.split_off(ips.len() - self.config.max_ips_count);
        }
        ips
    }

    /// Client ip, memoized on first access: head of the forwarded chain,
    /// else the socket peer address, else `""`. Later header changes do
    /// not reach an already-filled cell.
    pub fn ip(&mut self) -> &str {
        if self.ip_memo.is_none() {
            let ip = self
                .ips()
                .into_iter()
                .next()
                .or_else(|| {
                    self.transport
                        .socket
                        .remote_addr
                        .map(|address| address.to_string())
                })
                .unwrap_or_default();
            self.ip_memo = Some(ip);
        }
        self.ip_memo.as_deref().unwrap_or_default()
    }

    /// Override the memoized client ip.
    pub fn set_ip(&mut self, ip: impl Into<String>) {
        self.ip_memo = Some(ip.into());
    }
}

// Content negotiation
impl RequestContext {
    /// The negotiator bound to this request's headers, built on first
    /// access from a snapshot of the `Accept*` fields.
    pub fn accept(&mut self) -> &dyn Negotiator {
        let headers = &self.transport.headers;
        let memo = self
            .accept_memo
            .get_or_insert_with(|| Box::new(HeaderNegotiator::from_headers(headers)));
        &**memo
    }

    /// Substitute another negotiator.
    pub fn set_accept(&mut self, negotiator: Box<dyn Negotiator>) {
        self.accept_memo = Some(negotiator);
    }

    /// Best of `types` the client accepts, in the caller's spelling
    /// (extension shorthand allowed), or `None` when nothing requested
    /// is acceptable, which most callers answer with a 406.
    pub fn accepts(&mut self, types: &[&str]) -> Option<String> {
        let expanded: Vec<(usize, String)> = types
            .iter()
            .enumerate()
            .filter_map(|(index, pattern)| {
                negotiate::expand(pattern).map(|full| (index, full))
            })
            .collect();
        if expanded.is_empty() {
            return None;
        }
        let candidates: Vec<&str> = expanded.iter().map(|(_, full)| full.as_str()).collect();
        let chosen = self.accept().types(&candidates).into_iter().next()?;
        expanded
            .iter()
            .find(|(_, full)| *full == chosen)
            .map(|(index, _)| types[*index].to_string())
    }

    /// Best of `encodings` per `Accept-Encoding`, or `None`.
    pub fn accepts_encodings(&mut self, encodings: &[&str]) -> Option<String> {
        self.accept().encodings(encodings).into_iter().next()
    }

    /// Best of `charsets` per `Accept-Charset`, or `None`.
    pub fn accepts_charsets(&mut self, charsets: &[&str]) -> Option<String> {
        self.accept().charsets(charsets).into_iter().next()
    }

    /// Best of `languages` per `Accept-Language`, or `None`.
    pub fn accepts_languages(&mut self, languages: &[&str]) -> Option<String> {
        self.accept().languages(languages).into_iter().next()
    }

    /// Match the request body's media type against `types` (exact MIME,
    /// wildcard, `+suffix`, or extension shorthand).
    pub fn is(&self, types: &[&str]) -> TypeMatch {
        if !self.has_body() {
            return TypeMatch::NoBody;
        }
        match negotiate::type_is(&self.get("content-type"), types) {
            Some(matched) => TypeMatch::Matched(matched),
            None => TypeMatch::Unmatched,
        }
    }

    /// Whether the request advertises a body at all.
    fn has_body(&self) -> bool {
        self.transport.headers.contains_key("transfer-encoding")
            || self.transport.headers.contains_key("content-length")
    }

    /// `Content-Type` with parameters stripped; `""` when absent.
    pub fn content_type(&self) -> String {
        negotiate::strip_params(&self.get("content-type"))
    }

    /// The `charset` parameter of `Content-Type`; `""` on absence or
    /// parse failure.
    pub fn charset(&self) -> String {
        negotiate::charset(&self.get("content-type"))
    }

    /// Parsed `Content-Length`. `None` when the header is absent or
    /// empty; an unparseable value reads as 0.
    pub fn length(&self) -> Option<u64> {
        let raw = self.get("content-length");
        if raw.is_empty() {
            return None;
        }
        Some(raw.trim().parse().unwrap_or(0))
    }
}

// Freshness & idempotency
impl RequestContext {
    /// Whether the copy the client holds is still fresh against the
    /// response about to be sent. Only GET/HEAD requests paired with a
    /// 2xx or 304 response can be fresh.
    pub fn fresh(&self, response: &ResponseHead) -> bool {
        if self.transport.method != Method::GET && self.transport.method != Method::HEAD {
            return false;
        }
        let status = response.status.as_u16();
        if !(200..300).contains(&status) && status != 304 {
            return false;
        }
        freshness::fresh(&self.transport.headers, &response.headers)
    }

    /// Negation of [`fresh`](Self::fresh).
    pub fn stale(&self, response: &ResponseHead) -> bool {
        !self.fresh(response)
    }

    /// Whether the method is defined as idempotent.
    pub fn idempotent(&self) -> bool {
        [
            Method::GET,
            Method::HEAD,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
            Method::TRACE,
        ]
        .contains(&self.transport.method)
    }
}

// Diagnostics
impl RequestContext {
    /// Reduced diagnostic view: method, target, and headers only. Cache
    /// state never appears here.
    pub fn to_json(&self) -> Value {
        json!({
            "method": self.transport.method.as_str(),
            "url": self.transport.target,
            "header": headers_to_json(&self.transport.headers),
        })
    }
}

impl fmt::Debug for RequestContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestContext")
            .field("method", &self.transport.method)
            .field("url", &self.transport.target)
            .field("headers", &self.transport.headers)
            .finish()
    }
}

fn headers_to_json(headers: &HeaderMap) -> Value {
    let mut map = serde_json::Map::new();
    for name in headers.keys() {
        let values: Vec<&str> = headers
            .get_all(name)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .collect();
        let entry = if values.len() == 1 {
            Value::String(values[0].to_string())
        } else {
            Value::Array(
                values
                    .into_iter()
                    .map(|value| Value::String(value.to_string()))
                    .collect(),
            )
        };
        map.insert(name.as_str().to_string(), entry);
    }
    Value::Object(map)
}

fn has_absolute_scheme(target: &str) -> bool {
    target
        .get(..7)
        .map_or(false, |prefix| prefix.eq_ignore_ascii_case("http://"))
        || target
            .get(..8)
            .map_or(false, |prefix| prefix.eq_ignore_ascii_case("https://"))
}

/// Split a request-target into (absolute prefix, path, query) slices.
/// The prefix is empty for origin-form targets; fragments are cut off.
fn split_target(target: &str) -> (&str, &str, &str) {
    let authority_start = if has_absolute_scheme(target) {
        target.find("://").map(|index| index + 3).unwrap_or(0)
    } else {
        0
    };
    let path_start = target[authority_start..]
        .find('/')
        .map(|index| authority_start + index)
        .unwrap_or(target.len());
    let prefix = &target[..path_start];
    let rest = &target[path_start..];
    let rest = &rest[..rest.find('#').unwrap_or(rest.len())];
    match rest.find('?') {
        Some(index) => (prefix, &rest[..index], &rest[index + 1..]),
        None => (prefix, rest, ""),
    }
}
