//! Configuration System
//!
//! Layered configuration for the batch engine: built-in defaults, the user-level config
//! file, workspace config files, then `VOCAB__SECTION__KEY` environment overrides.
//! Every tunable the engine consumes (batch size, quota limit, thresholds, retry and
//! cache parameters) lives here rather than in module-level constants.

use crate::error::ConfigError;
use crate::logging::LoggingConfig;
use crate::provider::ProviderConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

mod facade;
mod sources;

pub use facade::ConfigLoader;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VocabConfig {
    #[serde(default)]
    pub batch: BatchConfig,

    #[serde(default)]
    pub quota: QuotaConfig,

    #[serde(default)]
    pub policy: PolicyConfig,

    #[serde(default)]
    pub retry: RetryConfig,

    #[serde(default)]
    pub fallback: FallbackConfig,

    /// Text generation provider; without one the engine serves fallback words only.
    #[serde(default)]
    pub provider: Option<ProviderConfig>,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Batch sizing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Exact number of words a batch must hold before it is exposed.
    #[serde(default = "default_words_per_batch")]
    pub words_per_batch: usize,

    /// Upper bound on candidates requested from the provider in one call.
    #[serde(default = "default_generation_batch_size")]
    pub generation_batch_size: usize,

    /// Lower bound on candidates requested, to absorb duplicate loss on small gaps.
    #[serde(default = "default_min_request_size")]
    pub min_request_size: usize,
}

fn default_words_per_batch() -> usize {
    50
}

fn default_generation_batch_size() -> usize {
    100
}

fn default_min_request_size() -> usize {
    25
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            words_per_batch: default_words_per_batch(),
            generation_batch_size: default_generation_batch_size(),
            min_request_size: default_min_request_size(),
        }
    }
}

/// Provider quota estimate
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuotaConfig {
    /// Calls per window the free tier is assumed to allow.
    #[serde(default = "default_free_tier_limit")]
    pub free_tier_limit: u32,

    #[serde(default = "default_window_hours")]
    pub window_hours: u32,

    /// Below this remaining estimate the run starts on fallback words.
    #[serde(default = "default_min_remaining")]
    pub min_remaining: u32,
}

fn default_free_tier_limit() -> u32 {
    1500
}

fn default_window_hours() -> u32 {
    24
}

fn default_min_remaining() -> u32 {
    2
}

impl Default for QuotaConfig {
    fn default() -> Self {
        Self {
            free_tier_limit: default_free_tier_limit(),
            window_hours: default_window_hours(),
            min_remaining: default_min_remaining(),
        }
    }
}

/// Source-selection and deduplication thresholds.
///
/// `large_vocabulary_threshold` and `advanced_dedup_threshold` are independent knobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyConfig {
    /// Learners above this many words start on fallback words.
    #[serde(default = "default_large_vocabulary_threshold")]
    pub large_vocabulary_threshold: usize,

    /// Learners above this many words get fuzzy deduplication.
    #[serde(default = "default_advanced_dedup_threshold")]
    pub advanced_dedup_threshold: usize,

    /// Up to this many existing words are listed verbatim in the prompt.
    #[serde(default = "default_exclusion_list_limit")]
    pub exclusion_list_limit: usize,

    /// Levenshtein similarity ratio at which two words count as the same.
    #[serde(default = "default_similarity_threshold")]
    pub similarity_threshold: f64,
}

fn default_large_vocabulary_threshold() -> usize {
    200
}

fn default_advanced_dedup_threshold() -> usize {
    150
}

fn default_exclusion_list_limit() -> usize {
    200
}

fn default_similarity_threshold() -> f64 {
    0.85
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            large_vocabulary_threshold: default_large_vocabulary_threshold(),
            advanced_dedup_threshold: default_advanced_dedup_threshold(),
            exclusion_list_limit: default_exclusion_list_limit(),
            similarity_threshold: default_similarity_threshold(),
        }
    }
}

/// Retry and backoff
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    #[serde(default = "default_attempts")]
    pub max_attempts: usize,

    #[serde(default = "default_attempts")]
    pub backfill_attempts: usize,

    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,

    #[serde(default = "default_multiplier")]
    pub multiplier: f64,

    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
}

fn default_attempts() -> usize {
    3
}

fn default_base_delay_ms() -> u64 {
    1000
}

fn default_multiplier() -> f64 {
    2.0
}

fn default_max_delay_ms() -> u64 {
    8000
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_attempts(),
            backfill_attempts: default_attempts(),
            base_delay_ms: default_base_delay_ms(),
            multiplier: default_multiplier(),
            max_delay_ms: default_max_delay_ms(),
        }
    }
}

/// Fallback word sources
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FallbackConfig {
    #[serde(default = "default_min_ttl_hours")]
    pub min_ttl_hours: u32,

    #[serde(default = "default_max_ttl_hours")]
    pub max_ttl_hours: u32,

    /// JSON catalog replacing the built-in static catalog.
    #[serde(default)]
    pub catalog_path: Option<PathBuf>,
}

fn default_min_ttl_hours() -> u32 {
    12
}

fn default_max_ttl_hours() -> u32 {
    7 * 24
}

impl Default for FallbackConfig {
    fn default() -> Self {
        Self {
            min_ttl_hours: default_min_ttl_hours(),
            max_ttl_hours: default_max_ttl_hours(),
            catalog_path: None,
        }
    }
}

impl VocabConfig {
    /// Validate the entire configuration, collecting every problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors = Vec::new();

        if self.batch.words_per_batch == 0 {
            errors.push("batch.words_per_batch must be greater than zero".to_string());
        }
        if self.batch.generation_batch_size == 0 {
            errors.push("batch.generation_batch_size must be greater than zero".to_string());
        }
        if self.quota.window_hours == 0 {
            errors.push("quota.window_hours must be greater than zero".to_string());
        }
        if !(0.0..=1.0).contains(&self.policy.similarity_threshold) {
            errors.push(format!(
                "policy.similarity_threshold must be within 0.0..=1.0, got {}",
                self.policy.similarity_threshold
            ));
        }
        if self.retry.max_attempts == 0 {
            errors.push("retry.max_attempts must be at least 1".to_string());
        }
        if self.retry.multiplier < 1.0 {
            errors.push(format!(
                "retry.multiplier must be >= 1.0, got {}",
                self.retry.multiplier
            ));
        }
        if self.retry.base_delay_ms > self.retry.max_delay_ms {
            errors.push("retry.base_delay_ms cannot exceed retry.max_delay_ms".to_string());
        }
        if self.fallback.min_ttl_hours == 0 || self.fallback.min_ttl_hours > self.fallback.max_ttl_hours
        {
            errors.push(format!(
                "fallback ttl bounds invalid: min {}h, max {}h",
                self.fallback.min_ttl_hours, self.fallback.max_ttl_hours
            ));
        }
        if let Some(provider) = &self.provider {
            if let Err(e) = provider.validate() {
                errors.push(format!("provider: {}", e));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors.join("\n")))
        }
    }
}
