//! Application configuration loaded from environment variables.
//!
//! Everything is read once at startup. Secrets (the Supabase service key,
//! the JWT secret, and the Stripe webhook secret) arrive as environment
//! variables injected by the deployment platform.

use std::env;

/// Default free-tier retention window in days.
const DEFAULT_RETENTION_DAYS: u32 = 60;

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    // --- Non-sensitive ---
    /// Base URL of the Supabase project (e.g. https://xyz.supabase.co)
    pub supabase_url: String,
    /// Frontend URL for CORS
    pub frontend_url: String,
    /// Server port
    pub port: u16,
    /// How many days of history free-tier users keep
    pub free_retention_days: u32,

    // --- Secrets ---
    /// Supabase service-role key (bypasses row-level security; server only)
    pub supabase_service_key: String,
    /// Secret the auth provider signs session JWTs with (HS256, raw bytes)
    pub jwt_secret: Vec<u8>,
    /// Stripe webhook endpoint signing secret (whsec_...)
    pub stripe_webhook_secret: String,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        Ok(Self {
            supabase_url: env::var("SUPABASE_URL")
                .map(|v| v.trim_end_matches('/').to_string())
                .map_err(|_| ConfigError::Missing("SUPABASE_URL"))?,
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:3000".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
            free_retention_days: env::var("FREE_RETENTION_DAYS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_RETENTION_DAYS),

            supabase_service_key: env::var("SUPABASE_SERVICE_KEY")
                .map(|v| v.trim().to_string())
                .map_err(|_| ConfigError::Missing("SUPABASE_SERVICE_KEY"))?,
            jwt_secret: env::var("SUPABASE_JWT_SECRET")
                .map_err(|_| ConfigError::Missing("SUPABASE_JWT_SECRET"))?
                .into_bytes(),
            stripe_webhook_secret: env::var("STRIPE_WEBHOOK_SECRET")
                .map(|v| v.trim().to_string())
                .map_err(|_| ConfigError::Missing("STRIPE_WEBHOOK_SECRET"))?,
        })
    }

    /// Fixed config for tests (no environment access).
    pub fn test_default() -> Self {
        Self {
            supabase_url: "http://localhost:54321".to_string(),
            frontend_url: "http://localhost:3000".to_string(),
            port: 8080,
            free_retention_days: DEFAULT_RETENTION_DAYS,
            supabase_service_key: "test_service_key".to_string(),
            jwt_secret: b"test_jwt_secret_32_bytes_minimum".to_vec(),
            stripe_webhook_secret: "whsec_test_secret".to_string(),
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),
}
