//! Configuration for the cache system

use crate::error::{CacheError, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;

/// Configuration for the cache coordinator and the in-memory provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Retention hint for bucket sub-caches registered in the top-level provider
    pub bucket_retention: Duration,

    /// TTL jitter factor (0.0 - 1.0)
    /// Stretches provider TTL hints by up to this fraction so reclamation of
    /// entries written together is spread out. Never shortens a hint.
    pub ttl_jitter: f64,

    /// Enable automatic cleanup of expired slots
    pub enable_auto_cleanup: bool,

    /// Interval for automatic cleanup sweeps
    pub cleanup_interval: Duration,

    /// Enable statistics collection
    pub enable_metrics: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            bucket_retention: Duration::from_secs(24 * 3600),
            ttl_jitter: 0.0,
            enable_auto_cleanup: true,
            // Sweep every 5 minutes
            cleanup_interval: Duration::from_secs(300),
            enable_metrics: true,
        }
    }
}

impl CacheConfig {
    /// Create a new builder for cache configuration
    pub fn builder() -> CacheConfigBuilder {
        CacheConfigBuilder::default()
    }

    /// Load configuration from the environment (and a `.env` file if present)
    ///
    /// Recognised variables:
    /// - `CACHE_BUCKET_RETENTION_SECS`
    /// - `CACHE_TTL_JITTER`
    /// - `CACHE_CLEANUP_INTERVAL_SECS`
    /// - `CACHE_AUTO_CLEANUP`
    /// - `CACHE_METRICS`
    ///
    /// Unset variables keep their defaults.
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build configuration from an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut builder = Self::builder();

        if let Some(secs) = parse_var::<u64, _>(&lookup, "CACHE_BUCKET_RETENTION_SECS")? {
            builder = builder.bucket_retention(Duration::from_secs(secs));
        }
        if let Some(jitter) = parse_var::<f64, _>(&lookup, "CACHE_TTL_JITTER")? {
            builder = builder.ttl_jitter(jitter);
        }
        if let Some(secs) = parse_var::<u64, _>(&lookup, "CACHE_CLEANUP_INTERVAL_SECS")? {
            builder = builder.cleanup_interval(Duration::from_secs(secs));
        }
        if let Some(enable) = parse_var::<bool, _>(&lookup, "CACHE_AUTO_CLEANUP")? {
            builder = builder.enable_auto_cleanup(enable);
        }
        if let Some(enable) = parse_var::<bool, _>(&lookup, "CACHE_METRICS")? {
            builder = builder.enable_metrics(enable);
        }

        let config = builder.build();
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.bucket_retention.is_zero() {
            return Err(CacheError::ConfigError(
                "bucket_retention must be greater than 0".to_string(),
            ));
        }

        if self.cleanup_interval.is_zero() {
            return Err(CacheError::ConfigError(
                "cleanup_interval must be greater than 0".to_string(),
            ));
        }

        if !(0.0..=1.0).contains(&self.ttl_jitter) {
            return Err(CacheError::ConfigError(
                "ttl_jitter must be between 0.0 and 1.0".to_string(),
            ));
        }

        Ok(())
    }

    /// Stretch a TTL hint by a random fraction of up to `ttl_jitter`
    ///
    /// Non-finite or non-positive jitter leaves the hint unchanged; the
    /// result saturates at `Duration::MAX`.
    pub fn ttl_with_jitter(&self, ttl: Duration) -> Duration {
        if !self.ttl_jitter.is_finite() || self.ttl_jitter <= 0.0 {
            return ttl;
        }

        let extra = ttl.as_secs_f64() * self.ttl_jitter * rand::random::<f64>();
        let extra = Duration::try_from_secs_f64(extra).unwrap_or(Duration::MAX);
        ttl.saturating_add(extra)
    }
}

fn parse_var<T, F>(lookup: &F, name: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        None => Ok(None),
        Some(raw) => raw.trim().parse::<T>().map(Some).map_err(|e| {
            CacheError::ConfigError(format!("{} has invalid value {:?}: {}", name, raw, e))
        }),
    }
}

/// Builder for cache configuration
#[derive(Debug, Default)]
pub struct CacheConfigBuilder {
    bucket_retention: Option<Duration>,
    ttl_jitter: Option<f64>,
    enable_auto_cleanup: Option<bool>,
    cleanup_interval: Option<Duration>,
    enable_metrics: Option<bool>,
}

impl CacheConfigBuilder {
    /// Set retention hint for bucket sub-caches
    pub fn bucket_retention(mut self, retention: Duration) -> Self {
        self.bucket_retention = Some(retention);
        self
    }

    /// Set TTL jitter factor (0.0 - 1.0)
    pub fn ttl_jitter(mut self, jitter: f64) -> Self {
        self.ttl_jitter = Some(jitter);
        self
    }

    /// Enable or disable automatic cleanup
    pub fn enable_auto_cleanup(mut self, enable: bool) -> Self {
        self.enable_auto_cleanup = Some(enable);
        self
    }

    /// Set cleanup interval
    pub fn cleanup_interval(mut self, interval: Duration) -> Self {
        self.cleanup_interval = Some(interval);
        self
    }

    /// Enable or disable statistics collection
    pub fn enable_metrics(mut self, enable: bool) -> Self {
        self.enable_metrics = Some(enable);
        self
    }

    /// Build the cache configuration
    pub fn build(self) -> CacheConfig {
        let defaults = CacheConfig::default();

        CacheConfig {
            bucket_retention: self.bucket_retention.unwrap_or(defaults.bucket_retention),
            ttl_jitter: self.ttl_jitter.unwrap_or(defaults.ttl_jitter),
            enable_auto_cleanup: self
                .enable_auto_cleanup
                .unwrap_or(defaults.enable_auto_cleanup),
            cleanup_interval: self.cleanup_interval.unwrap_or(defaults.cleanup_interval),
            enable_metrics: self.enable_metrics.unwrap_or(defaults.enable_metrics),
        }
    }
}

/// Preset configurations for common use cases
impl CacheConfig {
    /// Frequently written tables: short bucket retention, frequent sweeps
    pub fn realtime() -> Self {
        Self {
            bucket_retention: Duration::from_secs(3600),
            cleanup_interval: Duration::from_secs(30),
            ttl_jitter: 0.15,
            ..Default::default()
        }
    }

    /// Tables updated about once a day
    pub fn daily() -> Self {
        Self {
            bucket_retention: Duration::from_secs(24 * 3600),
            cleanup_interval: Duration::from_secs(900),
            ttl_jitter: 0.10,
            ..Default::default()
        }
    }
}
