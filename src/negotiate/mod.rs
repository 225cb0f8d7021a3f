//! Content negotiation.
//!
//! # Responsibilities
//! - Quality-weighted matching of `Accept`, `Accept-Encoding`,
//!   `Accept-Charset`, and `Accept-Language`
//! - Media-type pattern matching for request bodies
//!
//! # Design Decisions
//! - Negotiation is a capability trait so callers can substitute their
//!   own ranking rules per request
//! - An absent header means the client accepts everything; a present but
//!   empty one accepts nothing
//! - Malformed ranges are skipped, never surfaced as errors

pub mod header;
pub mod media;

pub use header::HeaderNegotiator;
pub use media::{charset, expand, strip_params, type_is, TypeMatch};

/// Capability interface for content negotiation over one request's
/// `Accept*` headers.
///
/// Every method ranks `candidates` best-first and drops the unacceptable
/// ones. An empty candidate list returns everything the client accepts,
/// in preference order.
pub trait Negotiator {
    /// Acceptable media types among `candidates` (full `type/subtype`
    /// form).
    fn types(&self, candidates: &[&str]) -> Vec<String>;

    /// Acceptable content codings among `candidates`.
    fn encodings(&self, candidates: &[&str]) -> Vec<String>;

    /// Acceptable charsets among `candidates`.
    fn charsets(&self, candidates: &[&str]) -> Vec<String>;

    /// Acceptable languages among `candidates`.
    fn languages(&self, candidates: &[&str]) -> Vec<String>;
}
