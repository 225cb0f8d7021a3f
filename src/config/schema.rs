//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Application-level settings request derivations run against.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AppConfig {
    /// Trust `X-Forwarded-*` headers from a fronting reverse proxy.
    pub proxy: bool,

    /// Number of trailing hostname labels that form the domain root
    /// (e.g. 2 for `example.com`, 3 for `example.co.uk`).
    pub subdomain_offset: usize,

    /// Header consulted for the forwarded client chain when `proxy` is on.
    pub proxy_ip_header: String,

    /// Upper bound on forwarded addresses kept, counted from the nearest
    /// proxy; 0 means unlimited.
    pub max_ips_count: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            proxy: false,
            subdomain_offset: 2,
            proxy_ip_header: "X-Forwarded-For".to_string(),
            max_ips_count: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert!(!config.proxy);
        assert_eq!(config.subdomain_offset, 2);
        assert_eq!(config.proxy_ip_header, "X-Forwarded-For");
        assert_eq!(config.max_ips_count, 0);
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: AppConfig = toml::from_str("proxy = true").unwrap();
        assert!(config.proxy);
        assert_eq!(config.subdomain_offset, 2);
    }

    #[test]
    fn test_full_toml() {
        let config: AppConfig = toml::from_str(
            r#"
            proxy = true
            subdomain_offset = 3
            proxy_ip_header = "Forwarded-For"
            max_ips_count = 2
            "#,
        )
        .unwrap();
        assert_eq!(config.subdomain_offset, 3);
        assert_eq!(config.proxy_ip_header, "Forwarded-For");
        assert_eq!(config.max_ips_count, 2);
    }
}
