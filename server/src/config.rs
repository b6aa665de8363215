use std::env;
use thiserror::Error;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
pub const DEFAULT_PUBLIC_BASE_URL: &str = "http://localhost:3000";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(&'static str),
}

/// Server settings read from the environment.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub database_url: String,
    pub bind_addr: String,
    /// Base URL the vision model uses to fetch uploaded images. Must be
    /// reachable from the inference provider in production.
    pub public_base_url: String,
}

impl ServerConfig {
    /// Environment variables:
    /// - `DATABASE_URL` (required)
    /// - `LARDER_BIND_ADDR` (default `0.0.0.0:3000`)
    /// - `LARDER_PUBLIC_BASE_URL` (default `http://localhost:3000`)
    pub fn from_env() -> Result<Self, ConfigError> {
        let database_url =
            env::var("DATABASE_URL").map_err(|_| ConfigError::MissingEnvVar("DATABASE_URL"))?;

        Ok(Self::new(
            database_url,
            env::var("LARDER_BIND_ADDR").ok(),
            env::var("LARDER_PUBLIC_BASE_URL").ok(),
        ))
    }

    fn new(database_url: String, bind_addr: Option<String>, public_base_url: Option<String>) -> Self {
        let bind_addr = bind_addr
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let public_base_url = public_base_url
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_PUBLIC_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        Self {
            database_url,
            bind_addr,
            public_base_url,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ServerConfig::new("postgres://db".to_string(), None, Some(String::new()));
        assert_eq!(config.bind_addr, DEFAULT_BIND_ADDR);
        assert_eq!(config.public_base_url, DEFAULT_PUBLIC_BASE_URL);
    }

    #[test]
    fn test_public_base_url_trailing_slash_is_trimmed() {
        let config = ServerConfig::new(
            "postgres://db".to_string(),
            Some("127.0.0.1:8080".to_string()),
            Some("https://larder.example.com/".to_string()),
        );
        assert_eq!(config.bind_addr, "127.0.0.1:8080");
        assert_eq!(config.public_base_url, "https://larder.example.com");
    }
}
