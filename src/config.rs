use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::constants::{
    DEFAULT_MULTI_STEP_TIMEOUT_MS, DEFAULT_POINT_TIMEOUT_MS, DEFAULT_TOKEN_TTL_SECS,
};
use crate::store::Timeouts;

/// Which storage backend the server runs on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackendKind {
    Redb,
    Memory,
}

impl FromStr for StoreBackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "redb" => Ok(StoreBackendKind::Redb),
            "memory" => Ok(StoreBackendKind::Memory),
            other => Err(format!("Invalid STORE_BACKEND: {other}")),
        }
    }
}

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub server_host: String,
    pub server_port: u16,
    pub store_backend: StoreBackendKind,
    pub database_path: String,
    pub allowed_origins: Vec<String>,
    pub environment: String,
    pub jwt_secret: String,
    pub token_ttl_secs: i64,
    pub store_point_timeout_ms: u64,
    pub store_multi_step_timeout_ms: u64,
    pub argon2_memory_kib: u32,
    pub argon2_iterations: u32,
    pub log_requests: bool,
}

/// Read `key`, falling back to `default`, and parse it
fn parse_var<T: FromStr>(key: &str, default: &str) -> Result<T, String> {
    env::var(key)
        .unwrap_or_else(|_| default.to_string())
        .parse()
        .map_err(|_| format!("Invalid {key}"))
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, String> {
        // Load .env file if it exists (development)
        dotenvy::dotenv().ok();

        let server_host = env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let server_port = parse_var("SERVER_PORT", "3000")?;

        let store_backend = env::var("STORE_BACKEND")
            .unwrap_or_else(|_| "redb".to_string())
            .parse()?;

        let database_path =
            env::var("DATABASE_PATH").unwrap_or_else(|_| "./data/glamfeed.redb".to_string());

        let allowed_origins = env::var("ALLOWED_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let environment = env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string());

        let jwt_secret =
            env::var("JWT_SECRET").map_err(|_| "JWT_SECRET must be set for token signing")?;
        if jwt_secret.is_empty() {
            return Err("JWT_SECRET must not be empty".to_string());
        }

        let token_ttl_secs = parse_var("TOKEN_TTL_SECS", &DEFAULT_TOKEN_TTL_SECS.to_string())?;
        let store_point_timeout_ms = parse_var(
            "STORE_POINT_TIMEOUT_MS",
            &DEFAULT_POINT_TIMEOUT_MS.to_string(),
        )?;
        let store_multi_step_timeout_ms = parse_var(
            "STORE_MULTI_STEP_TIMEOUT_MS",
            &DEFAULT_MULTI_STEP_TIMEOUT_MS.to_string(),
        )?;
        let argon2_memory_kib = parse_var("ARGON2_MEMORY_KIB", "19456")?;
        let argon2_iterations = parse_var("ARGON2_ITERATIONS", "2")?;
        let log_requests = parse_var("LOG_REQUESTS", "false")?;

        Ok(Config {
            server_host,
            server_port,
            store_backend,
            database_path,
            allowed_origins,
            environment,
            jwt_secret,
            token_ttl_secs,
            store_point_timeout_ms,
            store_multi_step_timeout_ms,
            argon2_memory_kib,
            argon2_iterations,
            log_requests,
        })
    }

    /// Get server address as string
    pub fn server_address(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }

    /// Store deadlines derived from the configured timeouts
    pub fn timeouts(&self) -> Timeouts {
        Timeouts {
            point: Duration::from_millis(self.store_point_timeout_ms),
            multi_step: Duration::from_millis(self.store_multi_step_timeout_ms),
        }
    }
}
