//! Per-request context layer for HTTP services.
//!
//! Wraps a decoded transport request and exposes derived, selectively
//! cached views: URL components, proxy-aware host/protocol/ip
//! resolution, content negotiation, and cache-freshness validation.

pub mod config;
pub mod context;
pub mod freshness;
pub mod negotiate;
pub mod query;
pub mod transport;

pub use config::AppConfig;
pub use context::RequestContext;
pub use negotiate::{HeaderNegotiator, Negotiator, TypeMatch};
pub use transport::{ResponseHead, SocketInfo, TransportRequest};
