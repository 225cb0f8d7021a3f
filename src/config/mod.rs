//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → semantic validation
//!     → AppConfig (validated, immutable)
//!     → shared via Arc to every request context
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; in-flight requests never observe
//!   changes
//! - All fields have defaults so an empty config file is valid

pub mod loader;
pub mod schema;

pub use loader::{load_config, ConfigError};
pub use schema::AppConfig;
