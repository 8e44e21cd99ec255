//! Configuration module
//!
//! All settings come from environment variables with sensible defaults, read
//! once at startup by `Config::from_env()`. A `.env` file is honored in
//! development via dotenvy.

use std::env;
use std::str::FromStr;

use crate::storage_types::StorageBackend;

const DEFAULT_SERVER_PORT: u16 = 3000;
const DEFAULT_MAX_FILE_SIZE_BYTES: usize = 10 * 1024 * 1024;
const DEFAULT_ALLOWED_CONTENT_TYPES: &str = "image/jpeg,image/png,image/webp,image/gif";
const DEFAULT_OBJECT_KEY_LENGTH: usize = 8;
const DEFAULT_RATE_LIMIT_MAX_ATTEMPTS: u32 = 20;
const DEFAULT_RATE_LIMIT_WINDOW_SECONDS: u64 = 60;
const DEFAULT_TURNSTILE_VERIFY_URL: &str =
    "https://challenges.cloudflare.com/turnstile/v0/siteverify";
const DEFAULT_TURNSTILE_TIMEOUT_SECONDS: u64 = 5;
const DEFAULT_LOCAL_STORAGE_PATH: &str = "./data/objects";

// Keys shorter than this make birthday collisions operationally likely;
// longer than 16 buys nothing for short share links.
const MIN_OBJECT_KEY_LENGTH: usize = 6;
const MAX_OBJECT_KEY_LENGTH: usize = 16;

/// Application configuration.
#[derive(Clone, Debug)]
pub struct Config {
    pub server_port: u16,
    pub environment: String,
    pub cors_origins: Vec<String>,
    // Storage configuration
    pub storage_backend: StorageBackend,
    pub local_storage_path: String,
    pub s3_bucket: Option<String>,
    pub s3_region: Option<String>,
    pub s3_endpoint: Option<String>, // Custom endpoint for S3-compatible providers (MinIO, R2, Spaces)
    // Upload admission configuration
    pub max_file_size_bytes: usize,
    pub allowed_content_types: Vec<String>,
    pub object_key_length: usize,
    pub strict_uploads: bool,
    // Rate limiting
    pub rate_limit_max_attempts: u32,
    pub rate_limit_window_seconds: u64,
    // Bot verification (disabled when no secret is configured)
    pub turnstile_secret: Option<String>,
    pub turnstile_verify_url: String,
    pub turnstile_timeout_seconds: u64,
    // Client identity
    pub trusted_proxy_count: usize,
}

impl Config {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let storage_backend = match env::var("STORAGE_BACKEND") {
            Ok(raw) => StorageBackend::from_str(&raw).map_err(anyhow::Error::msg)?,
            Err(_) => StorageBackend::Local,
        };

        let config = Config {
            server_port: env_parse("SERVER_PORT", DEFAULT_SERVER_PORT),
            environment: env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
            cors_origins: env_csv("CORS_ORIGINS", "*"),
            storage_backend,
            local_storage_path: env::var("LOCAL_STORAGE_PATH")
                .unwrap_or_else(|_| DEFAULT_LOCAL_STORAGE_PATH.to_string()),
            s3_bucket: env::var("S3_BUCKET").ok(),
            s3_region: env::var("S3_REGION").ok(),
            s3_endpoint: env::var("S3_ENDPOINT").ok(),
            max_file_size_bytes: env_parse("MAX_FILE_SIZE_BYTES", DEFAULT_MAX_FILE_SIZE_BYTES),
            allowed_content_types: env_csv(
                "ALLOWED_CONTENT_TYPES",
                DEFAULT_ALLOWED_CONTENT_TYPES,
            ),
            object_key_length: env_parse("OBJECT_KEY_LENGTH", DEFAULT_OBJECT_KEY_LENGTH)
                .clamp(MIN_OBJECT_KEY_LENGTH, MAX_OBJECT_KEY_LENGTH),
            strict_uploads: env_parse("STRICT_UPLOADS", false),
            rate_limit_max_attempts: env_parse(
                "RATE_LIMIT_MAX_ATTEMPTS",
                DEFAULT_RATE_LIMIT_MAX_ATTEMPTS,
            ),
            rate_limit_window_seconds: env_parse(
                "RATE_LIMIT_WINDOW_SECONDS",
                DEFAULT_RATE_LIMIT_WINDOW_SECONDS,
            ),
            turnstile_secret: env::var("TURNSTILE_SECRET").ok().filter(|s| !s.is_empty()),
            turnstile_verify_url: env::var("TURNSTILE_VERIFY_URL")
                .unwrap_or_else(|_| DEFAULT_TURNSTILE_VERIFY_URL.to_string()),
            turnstile_timeout_seconds: env_parse(
                "TURNSTILE_TIMEOUT_SECONDS",
                DEFAULT_TURNSTILE_TIMEOUT_SECONDS,
            ),
            trusted_proxy_count: env_parse("TRUSTED_PROXY_COUNT", 1),
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), anyhow::Error> {
        if self.storage_backend == StorageBackend::S3
            && (self.s3_bucket.is_none() || self.s3_region.is_none())
        {
            anyhow::bail!("S3_BUCKET and S3_REGION are required when STORAGE_BACKEND=s3");
        }
        if self.max_file_size_bytes == 0 {
            anyhow::bail!("MAX_FILE_SIZE_BYTES must be greater than zero");
        }
        if self.allowed_content_types.is_empty() {
            anyhow::bail!("ALLOWED_CONTENT_TYPES must not be empty");
        }
        if self.rate_limit_max_attempts == 0 || self.rate_limit_window_seconds == 0 {
            anyhow::bail!("rate limit window and ceiling must be greater than zero");
        }
        Ok(())
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        let env = self.environment.to_lowercase();
        env == "production" || env == "prod"
    }

    /// Whether human verification is mandatory for uploads.
    pub fn verification_enabled(&self) -> bool {
        self.turnstile_secret.is_some()
    }

    /// Total request body ceiling for the multipart endpoint.
    ///
    /// Allows a handful of max-size files plus multipart framing, so a single
    /// oversized file is reported per-file instead of killing the request at
    /// the transport layer.
    pub fn multipart_body_limit(&self) -> usize {
        self.max_file_size_bytes.saturating_mul(4) + 64 * 1024
    }
}

fn env_parse<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|raw| raw.parse::<T>().ok())
        .unwrap_or(default)
}

fn env_csv(key: &str, default: &str) -> Vec<String> {
    let raw = env::var(key).unwrap_or_else(|_| default.to_string());
    parse_csv(&raw)
}

fn parse_csv(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_csv_trims_and_lowercases() {
        assert_eq!(
            parse_csv(" image/JPEG, image/png ,,image/gif"),
            vec!["image/jpeg", "image/png", "image/gif"]
        );
        assert!(parse_csv("").is_empty());
    }

    #[test]
    fn test_default_content_types_are_images() {
        let defaults = parse_csv(DEFAULT_ALLOWED_CONTENT_TYPES);
        assert_eq!(
            defaults,
            vec!["image/jpeg", "image/png", "image/webp", "image/gif"]
        );
    }

    #[test]
    fn test_key_length_bounds() {
        assert!(DEFAULT_OBJECT_KEY_LENGTH >= MIN_OBJECT_KEY_LENGTH);
        assert!(DEFAULT_OBJECT_KEY_LENGTH <= MAX_OBJECT_KEY_LENGTH);
    }
}
