//! Per-request context.
//!
//! # Responsibilities
//! - Wrap one transport request for the duration of its handling
//! - Derive URL components, negotiation results, and proxy-aware
//!   host/protocol/ip views on demand
//! - Cache the expensive derivations exactly once per request

pub mod request;

pub use request::RequestContext;
