// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application configuration loaded from environment variables.

use std::env;
use std::time::Duration;

/// Longest accepted `SESSION_TTL_HOURS` (one year).
const MAX_SESSION_TTL_HOURS: u64 = 24 * 365;

/// Which document store backs the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Firestore,
    Memory,
}

/// Google OAuth client credentials.
#[derive(Debug, Clone)]
pub struct GoogleCredentials {
    pub client_id: String,
    pub client_secret: String,
}

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server port
    pub port: u16,
    /// Document store backend
    pub store_backend: StoreBackend,
    /// GCP project ID (Firestore backend)
    pub gcp_project_id: String,
    /// Frontend origin allowed by CORS
    pub frontend_url: String,
    /// Public base URL of this service, used for the OIDC redirect URI
    pub public_url: String,
    /// Google OIDC client. OIDC routes are disabled when absent.
    pub google: Option<GoogleCredentials>,
    /// Lifetime of password-login sessions
    pub session_ttl: Duration,
    /// Background sweep interval. `None` leaves expiry fully lazy.
    pub sweep_interval: Option<Duration>,
    /// bcrypt work factor for new password hashes
    pub bcrypt_cost: u32,
}

impl Config {
    /// Default config for testing only.
    pub fn test_default() -> Self {
        Self {
            port: 8080,
            store_backend: StoreBackend::Memory,
            gcp_project_id: "test-project".to_string(),
            frontend_url: "http://localhost:5173".to_string(),
            public_url: "http://localhost:8080".to_string(),
            google: Some(GoogleCredentials {
                client_id: "test-client-id.apps.googleusercontent.com".to_string(),
                client_secret: "test_secret".to_string(),
            }),
            session_ttl: Duration::from_secs(9 * 60 * 60),
            sweep_interval: None,
            bcrypt_cost: 4,
        }
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let store_backend = match env::var("STORE_BACKEND")
            .unwrap_or_else(|_| "firestore".to_string())
            .to_ascii_lowercase()
            .as_str()
        {
            "firestore" => StoreBackend::Firestore,
            "memory" => StoreBackend::Memory,
            _ => return Err(ConfigError::Invalid("STORE_BACKEND")),
        };

        let google = match (env::var("GOOGLE_CLIENT_ID"), env::var("GOOGLE_CLIENT_SECRET")) {
            (Ok(client_id), Ok(client_secret)) => Some(GoogleCredentials {
                client_id: client_id.trim().to_string(),
                client_secret: client_secret.trim().to_string(),
            }),
            (Ok(_), Err(_)) => return Err(ConfigError::Missing("GOOGLE_CLIENT_SECRET")),
            _ => None,
        };

        let session_ttl = env::var("SESSION_TTL_HOURS")
            .unwrap_or_else(|_| "9".to_string())
            .parse()
            .map_err(|_| ConfigError::Invalid("SESSION_TTL_HOURS"))
            .and_then(session_ttl_from_hours)?;

        let sweep_secs: u64 = env::var("SWEEP_INTERVAL_SECS")
            .unwrap_or_else(|_| "0".to_string())
            .parse()
            .map_err(|_| ConfigError::Invalid("SWEEP_INTERVAL_SECS"))?;

        let bcrypt_cost: u32 = env::var("BCRYPT_COST")
            .unwrap_or_else(|_| bcrypt::DEFAULT_COST.to_string())
            .parse()
            .map_err(|_| ConfigError::Invalid("BCRYPT_COST"))?;
        if !(4..=31).contains(&bcrypt_cost) {
            return Err(ConfigError::Invalid("BCRYPT_COST"));
        }

        let port = env::var("PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse()
            .unwrap_or(8080);

        Ok(Self {
            port,
            store_backend,
            gcp_project_id: env::var("GCP_PROJECT_ID").unwrap_or_else(|_| "local-dev".to_string()),
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
            public_url: env::var("PUBLIC_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or_else(|_| format!("http://localhost:{}", port)),
            google,
            session_ttl,
            sweep_interval: (sweep_secs > 0).then(|| Duration::from_secs(sweep_secs)),
            bcrypt_cost,
        })
    }

    /// Redirect URI registered with the identity provider.
    pub fn oidc_redirect_uri(&self) -> String {
        format!("{}/oidauth", self.public_url)
    }

    /// Whether cookies should carry the `Secure` attribute.
    pub fn is_secure(&self) -> bool {
        self.public_url.starts_with("https://")
    }
}

fn session_ttl_from_hours(hours: u64) -> Result<Duration, ConfigError> {
    if hours == 0 || hours > MAX_SESSION_TTL_HOURS {
        return Err(ConfigError::Invalid("SESSION_TTL_HOURS"));
    }
    hours
        .checked_mul(60 * 60)
        .map(Duration::from_secs)
        .ok_or(ConfigError::Invalid("SESSION_TTL_HOURS"))
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),
}
