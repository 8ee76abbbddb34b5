//! Application configuration loaded from environment variables.

use std::env;
use std::time::Duration;

/// Default engine endpoint (stockfish.online v2).
pub const DEFAULT_ENGINE_API_URL: &str = "https://stockfish.online/api/s/v2.php";

/// Which document store backs the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DbBackend {
    Firestore,
    Memory,
}

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Frontend URL allowed by CORS
    pub frontend_url: String,
    /// GCP project ID (Firestore)
    pub gcp_project_id: String,
    /// Server port
    pub port: u16,
    /// JWT signing key for session tokens (raw bytes)
    pub jwt_signing_key: Vec<u8>,
    /// External engine endpoint
    pub engine_api_url: String,
    /// Timeout for a single outbound engine request
    pub engine_timeout: Duration,
    pub db_backend: DbBackend,
    /// PBKDF2 iterations for newly hashed passwords
    pub password_iterations: u32,
}

impl Config {
    /// Config for tests: in-memory store, fixed signing key.
    pub fn test_default() -> Self {
        Self {
            frontend_url: "http://localhost:5173".to_string(),
            gcp_project_id: "test-project".to_string(),
            port: 8080,
            jwt_signing_key: b"test_jwt_key_32_bytes_minimum!!".to_vec(),
            engine_api_url: "http://127.0.0.1:9/engine".to_string(),
            engine_timeout: Duration::from_secs(5),
            db_backend: DbBackend::Memory,
            password_iterations: 1_000,
        }
    }

    /// Load configuration from environment variables.
    ///
    /// A `.env` file is read first if present.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let db_backend = match env::var("DB_BACKEND")
            .unwrap_or_else(|_| "firestore".to_string())
            .to_ascii_lowercase()
            .as_str()
        {
            "firestore" => DbBackend::Firestore,
            "memory" => DbBackend::Memory,
            _ => return Err(ConfigError::Invalid("DB_BACKEND")),
        };

        Ok(Self {
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
            gcp_project_id: env::var("GCP_PROJECT_ID").unwrap_or_else(|_| "local-dev".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
            jwt_signing_key: env::var("JWT_SIGNING_KEY")
                .map_err(|_| ConfigError::Missing("JWT_SIGNING_KEY"))?
                .into_bytes(),
            engine_api_url: env::var("ENGINE_API_URL")
                .map(|v| v.trim().to_string())
                .unwrap_or_else(|_| DEFAULT_ENGINE_API_URL.to_string()),
            engine_timeout: Duration::from_secs(
                env::var("ENGINE_TIMEOUT_SECS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(15),
            ),
            db_backend,
            password_iterations: env::var("PASSWORD_HASH_ITERATIONS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(crate::services::password::DEFAULT_ITERATIONS),
        })
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),
}
