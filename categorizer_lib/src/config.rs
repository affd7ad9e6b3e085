//! Engine configuration with environment overrides.

use std::time::Duration;

use thiserror::Error;

/// Errors from configuration validation.
#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("workers must be between 1 and {max}, got {got}")]
    Workers { got: usize, max: usize },
    #[error("{0} must be greater than zero")]
    Zero(&'static str),
}

/// Upper bound on concurrent registry workers.
pub const MAX_WORKERS: usize = 32;

/// Knobs for the orchestrator, rate limiter and registry adapter.
#[derive(Debug, Clone, PartialEq)]
pub struct CategorizerConfig {
    /// Concurrent lookups in flight.
    pub workers: usize,
    /// Registry calls between shared cooldown pauses.
    pub cooldown_every: u64,
    /// Length of each shared cooldown pause.
    pub cooldown: Duration,
    /// Completed items between progress reports.
    pub progress_every: usize,
    /// Input size above which items are processed in sequential chunks.
    pub chunk_threshold: usize,
    /// Items per chunk in large-batch mode.
    pub chunk_size: usize,
    /// Registry hits requested per name search.
    pub search_size: u32,
    /// Retries after a rate-limited registry response.
    pub max_retries: u32,
    /// Base backoff for the first retry; doubled on each further attempt.
    pub retry_base: Duration,
}

impl Default for CategorizerConfig {
    fn default() -> Self {
        Self {
            workers: 5,
            cooldown_every: 10,
            cooldown: Duration::from_millis(1000),
            progress_every: 10,
            chunk_threshold: 200,
            chunk_size: 100,
            search_size: 10,
            max_retries: 3,
            retry_base: Duration::from_millis(2000),
        }
    }
}

impl CategorizerConfig {
    /// Defaults overridden by `CATEGORIZER_*` environment variables.
    ///
    /// Unparseable values fall back to the default silently; run
    /// [`validate`](Self::validate) afterwards.
    pub fn from_env() -> Self {
        let d = Self::default();
        Self {
            workers: env_usize("CATEGORIZER_WORKERS", d.workers),
            cooldown_every: env_u64("CATEGORIZER_COOLDOWN_EVERY", d.cooldown_every),
            cooldown: Duration::from_millis(env_u64(
                "CATEGORIZER_COOLDOWN_MS",
                d.cooldown.as_millis() as u64,
            )),
            progress_every: env_usize("CATEGORIZER_PROGRESS_EVERY", d.progress_every),
            chunk_threshold: env_usize("CATEGORIZER_CHUNK_THRESHOLD", d.chunk_threshold),
            chunk_size: env_usize("CATEGORIZER_CHUNK_SIZE", d.chunk_size),
            search_size: env_u64("CATEGORIZER_SEARCH_SIZE", d.search_size as u64) as u32,
            max_retries: env_u64("CATEGORIZER_RETRY_MAX", d.max_retries as u64) as u32,
            retry_base: Duration::from_millis(env_u64(
                "CATEGORIZER_RETRY_BASE_MS",
                d.retry_base.as_millis() as u64,
            )),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.workers == 0 || self.workers > MAX_WORKERS {
            return Err(ConfigError::Workers {
                got: self.workers,
                max: MAX_WORKERS,
            });
        }
        if self.cooldown_every == 0 {
            return Err(ConfigError::Zero("cooldown_every"));
        }
        if self.progress_every == 0 {
            return Err(ConfigError::Zero("progress_every"));
        }
        if self.chunk_size == 0 {
            return Err(ConfigError::Zero("chunk_size"));
        }
        if self.search_size == 0 {
            return Err(ConfigError::Zero("search_size"));
        }
        Ok(())
    }
}

/// Registry endpoint settings, read from `BRREG_*` variables.
#[derive(Debug, Clone, PartialEq)]
pub struct RegistrySettings {
    pub base_url: String,
    pub verify_tls: bool,
}

impl Default for RegistrySettings {
    fn default() -> Self {
        Self {
            base_url: brreg_api::DEFAULT_BASE_URL.to_string(),
            verify_tls: true,
        }
    }
}

impl RegistrySettings {
    pub fn from_env() -> Self {
        let d = Self::default();
        Self {
            base_url: std::env::var("BRREG_BASE_URL")
                .ok()
                .filter(|v| !v.trim().is_empty())
                .unwrap_or(d.base_url),
            verify_tls: env_bool("BRREG_SSL_VERIFY", d.verify_tls),
        }
    }
}

fn env_u64(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|val| val.trim().parse::<u64>().ok())
        .unwrap_or(default)
}

fn env_usize(key: &str, default: usize) -> usize {
    std::env::var(key)
        .ok()
        .and_then(|val| val.trim().parse::<usize>().ok())
        .unwrap_or(default)
}

fn env_bool(key: &str, default: bool) -> bool {
    match std::env::var(key) {
        Ok(val) => match val.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => true,
            "0" | "false" | "no" | "off" => false,
            _ => default,
        },
        Err(_) => default,
    }
}
