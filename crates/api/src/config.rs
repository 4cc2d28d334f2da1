//! Application configuration loaded from environment variables.

use std::time::Duration;

/// Server configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `HOST` — bind address (default: `"0.0.0.0"`)
/// - `PORT` — listen port (default: `3000`)
/// - `REDIS_URL` — key-value backend; unset runs the in-memory backend
/// - `ALUMNO_SERVICE_URL` — student service base URL
/// - `ESPECIALIDAD_SERVICE_URL` — specialty service base URL
/// - `REQUEST_TIMEOUT` — remote call timeout in seconds (default: 10)
/// - `SAGA_TTL` — saga record retention in seconds (default: 7200)
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub redis_url: Option<String>,
    pub alumno_service_url: String,
    pub especialidad_service_url: String,
    pub request_timeout: Duration,
    pub saga_ttl: Duration,
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self {
            host: std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: std::env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3000),
            redis_url: std::env::var("REDIS_URL").ok(),
            alumno_service_url: std::env::var("ALUMNO_SERVICE_URL")
                .unwrap_or_else(|_| "http://localhost:5001/api/v1".to_string()),
            especialidad_service_url: std::env::var("ESPECIALIDAD_SERVICE_URL")
                .unwrap_or_else(|_| "http://localhost:5002/api/v1".to_string()),
            request_timeout: Duration::from_secs(
                std::env::var("REQUEST_TIMEOUT")
                    .ok()
                    .and_then(|t| t.parse().ok())
                    .unwrap_or(10),
            ),
            saga_ttl: Duration::from_secs(
                std::env::var("SAGA_TTL")
                    .ok()
                    .and_then(|t| t.parse().ok())
                    .unwrap_or(7200),
            ),
        }
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            redis_url: None,
            alumno_service_url: "http://localhost:5001/api/v1".to_string(),
            especialidad_service_url: "http://localhost:5002/api/v1".to_string(),
            request_timeout: Duration::from_secs(10),
            saga_ttl: Duration::from_secs(7200),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_values() {
        let config = Config::default();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 3000);
        assert!(config.redis_url.is_none());
        assert_eq!(config.request_timeout, Duration::from_secs(10));
        assert_eq!(config.saga_ttl, Duration::from_secs(7200));
    }

    #[test]
    fn test_addr_formatting() {
        let config = Config {
            host: "127.0.0.1".to_string(),
            port: 8080,
            ..Config::default()
        };
        assert_eq!(config.addr(), "127.0.0.1:8080");
    }
}
