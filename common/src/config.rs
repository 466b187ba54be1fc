//! Service configuration.
//!
//! Values come from environment variables; anything unset falls back to a
//! default suitable for local development.

use std::str::FromStr;

/// Configuration shared by catalog services.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Service name, used in logs and response metadata.
    pub service_name: String,
    /// Bind address.
    pub host: String,
    /// Bind port.
    pub port: u16,
    /// Externally visible base URL, used to build entity `href`s.
    pub public_url: String,
    /// SQLite URL of the catalog store; in-memory store when unset.
    pub storage_url: Option<String>,
    /// Maximum pooled store connections.
    pub max_connections: u32,
    /// Store connect timeout in seconds.
    pub connect_timeout_secs: u64,
    /// Page size used when a list request gives none.
    pub default_page_size: u32,
    /// Upper bound on the page size a client may request.
    pub max_page_size: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            service_name: "catalog".to_string(),
            host: "0.0.0.0".to_string(),
            port: 8585,
            public_url: "http://localhost:8585".to_string(),
            storage_url: None,
            max_connections: 5,
            connect_timeout_secs: 5,
            default_page_size: 10,
            max_page_size: 1000,
        }
    }
}

impl AppConfig {
    /// Loads configuration for `service_name` from the environment.
    pub fn load_with_service(service_name: &str) -> Self {
        let defaults = Self::default();
        let port = env_or("SERVER_PORT", defaults.port);
        let public_url = std::env::var("PUBLIC_URL")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| format!("http://localhost:{port}"));

        Self {
            service_name: service_name.to_string(),
            host: env_or("SERVER_HOST", defaults.host),
            port,
            public_url: public_url.trim_end_matches('/').to_string(),
            storage_url: std::env::var("CATALOG_STORAGE_URL")
                .ok()
                .filter(|v| !v.trim().is_empty()),
            max_connections: env_or("STORAGE_MAX_CONNECTIONS", defaults.max_connections),
            connect_timeout_secs: env_or(
                "STORAGE_CONNECT_TIMEOUT_SECS",
                defaults.connect_timeout_secs,
            ),
            default_page_size: env_or("DEFAULT_PAGE_SIZE", defaults.default_page_size),
            max_page_size: env_or("MAX_PAGE_SIZE", defaults.max_page_size),
        }
    }

    /// Listen address in `host:port` form.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Parses `key` from the environment, falling back on absence or parse failure.
fn env_or<T: FromStr>(key: &str, default: T) -> T {
    match std::env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!(key, value = %raw, "ignoring unparsable configuration value");
            default
        }),
        Err(_) => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_or_falls_back_when_unset() {
        assert_eq!(env_or("CATALOG_TEST_SURELY_UNSET_KEY", 42u32), 42);
    }

    #[test]
    fn test_bind_address() {
        let config = AppConfig {
            host: "127.0.0.1".into(),
            port: 9000,
            ..AppConfig::default()
        };
        assert_eq!(config.bind_address(), "127.0.0.1:9000");
    }
}
