use std::time::Duration;

use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing or malformed.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub s3_bucket: String,
    pub s3_endpoint: String,
    /// Base URL that artifact keys are appended to.
    pub s3_public_url: String,
    pub aws_access_key_id: String,
    pub aws_secret_access_key: String,
    pub anthropic_api_key: String,
    /// Base URL of the headless Chromium conversion service.
    pub render_service_url: String,
    pub render_timeout: Duration,
    /// 0 disables the per-batch job ceiling.
    pub max_concurrent_jobs: usize,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let s3_bucket = require_env("S3_BUCKET")?;
        let s3_endpoint = require_env("S3_ENDPOINT")?;
        let s3_public_url = std::env::var("S3_PUBLIC_URL").unwrap_or_else(|_| {
            format!("{}/{}", s3_endpoint.trim_end_matches('/'), s3_bucket)
        });

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            s3_bucket,
            s3_endpoint,
            s3_public_url,
            aws_access_key_id: require_env("AWS_ACCESS_KEY_ID")?,
            aws_secret_access_key: require_env("AWS_SECRET_ACCESS_KEY")?,
            anthropic_api_key: require_env("ANTHROPIC_API_KEY")?,
            render_service_url: require_env("RENDER_SERVICE_URL")?,
            render_timeout: Duration::from_secs(
                parse_env("RENDER_TIMEOUT_SECS", 30)
                    .context("RENDER_TIMEOUT_SECS must be a whole number of seconds")?,
            ),
            max_concurrent_jobs: parse_env("MAX_CONCURRENT_JOBS", 4)
                .context("MAX_CONCURRENT_JOBS must be a non-negative integer")?,
            port: parse_env("PORT", 8080).context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => Ok(raw.trim().parse::<T>()?),
        Err(_) => Ok(default),
    }
}
