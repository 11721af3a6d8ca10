//! Application configuration loaded from environment variables.
//!
//! Everything comes from the environment (plus an optional `.env` file for
//! local development); nothing is fetched at runtime.

use std::env;

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the hosted backend project (gateway, auth, storage)
    pub gateway_url: String,
    /// Public API key sent with every gateway/auth/storage request
    pub gateway_api_key: String,
    /// Secret used by the identity provider to sign access tokens (HS256).
    /// Sessions are validated locally against it.
    pub jwt_secret: Vec<u8>,
    /// Key for signing the OAuth state parameter
    pub oauth_state_key: Vec<u8>,
    /// Metadata service client ID (public)
    pub metadata_client_id: String,
    /// Metadata service client secret
    pub metadata_client_secret: String,
    /// Frontend URL for OAuth redirects and CORS
    pub frontend_url: String,
    /// Server port
    pub port: u16,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        Ok(Self {
            gateway_url: env::var("GATEWAY_URL")
                .map(|v| v.trim_end_matches('/').to_string())
                .map_err(|_| ConfigError::Missing("GATEWAY_URL"))?,
            gateway_api_key: env::var("GATEWAY_API_KEY")
                .map(|v| v.trim().to_string())
                .map_err(|_| ConfigError::Missing("GATEWAY_API_KEY"))?,
            jwt_secret: env::var("JWT_SECRET")
                .map_err(|_| ConfigError::Missing("JWT_SECRET"))?
                .into_bytes(),
            oauth_state_key: env::var("OAUTH_STATE_KEY")
                .map_err(|_| ConfigError::Missing("OAUTH_STATE_KEY"))?
                .into_bytes(),
            metadata_client_id: env::var("METADATA_CLIENT_ID")
                .map_err(|_| ConfigError::Missing("METADATA_CLIENT_ID"))?,
            metadata_client_secret: env::var("METADATA_CLIENT_SECRET")
                .map(|v| v.trim().to_string())
                .map_err(|_| ConfigError::Missing("METADATA_CLIENT_SECRET"))?,
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
        })
    }

    /// Default config for testing only.
    pub fn test_default() -> Self {
        Self {
            gateway_url: "http://localhost:54321".to_string(),
            gateway_api_key: "test_api_key".to_string(),
            jwt_secret: b"test_jwt_secret_32_bytes_minimum".to_vec(),
            oauth_state_key: b"test_oauth_state_key".to_vec(),
            metadata_client_id: "test_client_id".to_string(),
            metadata_client_secret: "test_secret".to_string(),
            frontend_url: "http://localhost:5173".to_string(),
            port: 8080,
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_from_env() {
        env::set_var("GATEWAY_URL", "http://localhost:54321/");
        env::set_var("GATEWAY_API_KEY", "test_key");
        env::set_var("JWT_SECRET", "test_jwt_secret_32_bytes_minimum");
        env::set_var("OAUTH_STATE_KEY", "test_state_key");
        env::set_var("METADATA_CLIENT_ID", "test_id");
        env::set_var("METADATA_CLIENT_SECRET", "test_secret");

        let config = Config::from_env().expect("Config should load");

        // Trailing slash is stripped so URL joining stays predictable
        assert_eq!(config.gateway_url, "http://localhost:54321");
        assert_eq!(config.gateway_api_key, "test_key");
        assert_eq!(config.port, 8080);
    }
}
