//! Server configuration loaded from environment variables.
//!
//! Configuration is environment-only: `HOST`, `PORT`, and `WORKER_THREADS`
//! each have a fixed default when unset or unparseable.

use std::env;

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8080;

/// Resolved server configuration, built once in `main` and passed to the
/// server bootstrap.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (e.g., "0.0.0.0" for all interfaces)
    pub host: String,
    /// Listener port
    pub port: u16,
    /// HTTP worker thread count
    pub workers: usize,
}

impl ServerConfig {
    /// Load configuration from the environment, falling back to defaults.
    ///
    /// Worker count defaults to the CPU count, capped at 16 to avoid
    /// excessive context switching, and can be overridden via
    /// `WORKER_THREADS`.
    pub fn from_env() -> Self {
        let host = env::var("HOST").unwrap_or_else(|_| DEFAULT_HOST.to_string());
        let port = parse_port(env::var("PORT").ok());
        let workers = env::var("WORKER_THREADS")
            .ok()
            .and_then(|s| s.parse::<usize>().ok())
            .unwrap_or_else(|| num_cpus::get().min(16).max(1));

        Self { host, port, workers }
    }

    /// Address string suitable for `HttpServer::bind`.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Parse a port override, falling back to the default when unset or not a
/// valid port number.
fn parse_port(value: Option<String>) -> u16 {
    value
        .and_then(|s| s.parse::<u16>().ok())
        .unwrap_or(DEFAULT_PORT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn port_defaults_when_unset() {
        assert_eq!(parse_port(None), DEFAULT_PORT);
    }

    #[test]
    fn port_uses_override_when_valid() {
        assert_eq!(parse_port(Some("9090".to_string())), 9090);
    }

    #[test]
    fn port_defaults_when_unparseable() {
        assert_eq!(parse_port(Some("not-a-port".to_string())), DEFAULT_PORT);
        assert_eq!(parse_port(Some("99999".to_string())), DEFAULT_PORT);
        assert_eq!(parse_port(Some(String::new())), DEFAULT_PORT);
    }

    #[test]
    fn bind_addr_joins_host_and_port() {
        let config = ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 8080,
            workers: 4,
        };
        assert_eq!(config.bind_addr(), "127.0.0.1:8080");
    }
}
