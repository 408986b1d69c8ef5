//! Configuration validation.
//!
//! Reads the `[cache]`, `[anomaly]` and `[metrics]` sections, falling back to
//! documented defaults for absent keys, and rejects out-of-range values
//! before an analyzer is built.

use crate::cache::{
    CacheConfig, DEFAULT_COMPUTE_TIMEOUT_MS, DEFAULT_MAX_ENTRIES, DEFAULT_TTL_SECONDS,
};
use crate::domain::anomaly::{AnomalyConfig, DEFAULT_MIN_SAMPLES, DEFAULT_THRESHOLD};
use crate::domain::error::FincastError;
use crate::ports::config_port::ConfigPort;

pub const DEFAULT_HORIZON_MONTHS: u32 = 12;

#[derive(Debug, Clone, PartialEq)]
pub struct AnalyzerConfig {
    pub cache: CacheConfig,
    pub anomaly: AnomalyConfig,
    pub horizon_months: u32,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        AnalyzerConfig {
            cache: CacheConfig::default(),
            anomaly: AnomalyConfig::default(),
            horizon_months: DEFAULT_HORIZON_MONTHS,
        }
    }
}

pub fn build_analyzer_config(config: &dyn ConfigPort) -> Result<AnalyzerConfig, FincastError> {
    Ok(AnalyzerConfig {
        cache: build_cache_config(config)?,
        anomaly: build_anomaly_config(config)?,
        horizon_months: positive_int(config, "metrics", "horizon_months", DEFAULT_HORIZON_MONTHS as i64)?
            as u32,
    })
}

pub fn build_cache_config(config: &dyn ConfigPort) -> Result<CacheConfig, FincastError> {
    let cache = CacheConfig {
        ttl_seconds: positive_int(config, "cache", "ttl_seconds", DEFAULT_TTL_SECONDS as i64)?
            as u64,
        max_entries: positive_int(config, "cache", "max_entries", DEFAULT_MAX_ENTRIES as i64)?
            as usize,
        compute_timeout_ms: positive_int(
            config,
            "cache",
            "compute_timeout_ms",
            DEFAULT_COMPUTE_TIMEOUT_MS as i64,
        )? as u64,
    };
    cache.validate()?;
    Ok(cache)
}

pub fn build_anomaly_config(config: &dyn ConfigPort) -> Result<AnomalyConfig, FincastError> {
    let threshold = config.get_double("anomaly", "threshold", DEFAULT_THRESHOLD);
    if !threshold.is_finite() || threshold <= 0.0 {
        return Err(FincastError::ConfigInvalid {
            section: "anomaly".to_string(),
            key: "threshold".to_string(),
            reason: "threshold must be a positive number of standard deviations".to_string(),
        });
    }

    let min_samples = config.get_int("anomaly", "min_samples", DEFAULT_MIN_SAMPLES as i64);
    if min_samples < 2 {
        return Err(FincastError::ConfigInvalid {
            section: "anomaly".to_string(),
            key: "min_samples".to_string(),
            reason: "min_samples must be at least 2 to compute a standard deviation".to_string(),
        });
    }

    Ok(AnomalyConfig {
        threshold,
        min_samples: min_samples as usize,
    })
}

fn positive_int(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: i64,
) -> Result<i64, FincastError> {
    let value = config.get_int(section, key, default);
    if value <= 0 || value > u32::MAX as i64 {
        return Err(FincastError::ConfigInvalid {
            section: section.to_string(),
            key: key.to_string(),
            reason: format!("{key} must be a positive integer"),
        });
    }
    Ok(value)
}
