//! Shared application state.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use pixbin_core::{Config, UploadValidator};
use pixbin_storage::{create_storage, Storage};

use crate::limits::{CounterStore, RateLimiter, ShardedCounterStore, VisitCounter};
use crate::services::CaptchaVerifier;

/// Everything handlers need, built once at startup and shared behind an Arc.
pub struct AppState {
    pub config: Config,
    pub storage: Arc<dyn Storage>,
    pub validator: UploadValidator,
    pub rate_limiter: RateLimiter,
    pub visits: VisitCounter,
    /// Absent when no verification secret is configured; uploads then skip
    /// the challenge phase entirely.
    pub captcha: Option<CaptchaVerifier>,
}

impl AppState {
    pub async fn initialize(config: Config) -> Result<Arc<Self>> {
        let storage = create_storage(&config).await?;
        tracing::info!(backend = %storage.backend_type(), "Storage initialized");

        let validator = UploadValidator::new(
            config.max_file_size_bytes,
            config.allowed_content_types.clone(),
        );

        // The limiter and the visit counter share one store so an external
        // backend can replace both with a single swap.
        let counters: Arc<dyn CounterStore> = Arc::new(ShardedCounterStore::new());
        let rate_limiter = RateLimiter::new(
            counters.clone(),
            config.rate_limit_max_attempts,
            Duration::from_secs(config.rate_limit_window_seconds),
        );
        let visits = VisitCounter::new(counters);

        let captcha = match &config.turnstile_secret {
            Some(secret) => {
                tracing::info!("Human verification enabled for uploads");
                Some(CaptchaVerifier::new(
                    secret.clone(),
                    config.turnstile_verify_url.clone(),
                    config.turnstile_timeout_seconds,
                )?)
            }
            None => {
                tracing::warn!("No verification secret configured, uploads skip the challenge");
                None
            }
        };

        Ok(Arc::new(Self {
            config,
            storage,
            validator,
            rate_limiter,
            visits,
            captcha,
        }))
    }
}
