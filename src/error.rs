//! Error types for the vocabulary batch generation engine.

use crate::types::LearnerId;
use std::fmt;
use thiserror::Error;

/// Classification of a failed provider call.
///
/// The orchestrator branches on the kind, never on the message text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderErrorKind {
    /// The provider signalled quota exhaustion or rate limiting.
    RateLimited,
    /// Network, timeout, or unexpected HTTP failure.
    Transport,
    /// The response did not contain a parseable JSON array.
    Malformed,
    /// The response parsed but held no usable words.
    Empty,
    /// Credentials were rejected.
    Auth,
    /// No provider is configured for this engine.
    NotConfigured,
}

impl fmt::Display for ProviderErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ProviderErrorKind::RateLimited => "rate-limited",
            ProviderErrorKind::Transport => "transport",
            ProviderErrorKind::Malformed => "malformed-response",
            ProviderErrorKind::Empty => "empty-result",
            ProviderErrorKind::Auth => "auth",
            ProviderErrorKind::NotConfigured => "not-configured",
        };
        f.write_str(label)
    }
}

/// Failure of a single call to the text generation provider.
#[derive(Debug, Clone, Error)]
#[error("{kind} provider error: {message}")]
pub struct ProviderError {
    pub kind: ProviderErrorKind,
    pub message: String,
}

/// Substrings providers use to report quota exhaustion in free-form error text.
const RATE_LIMIT_SIGNATURES: &[&str] = &[
    "429",
    "quota",
    "too many requests",
    "rate limit",
    "rate_limit",
    "resource_exhausted",
];

impl ProviderError {
    pub fn new(kind: ProviderErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::RateLimited, message)
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::Transport, message)
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::Malformed, message)
    }

    pub fn empty(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::Empty, message)
    }

    /// Build an error from unstructured provider text.
    ///
    /// Text carrying a rate-limit signature becomes `RateLimited`, anything
    /// else is a `Transport` failure.
    pub fn classify(message: impl Into<String>) -> Self {
        let message = message.into();
        if Self::has_rate_limit_signature(&message) {
            Self::rate_limited(message)
        } else {
            Self::transport(message)
        }
    }

    pub fn has_rate_limit_signature(message: &str) -> bool {
        let lowered = message.to_lowercase();
        RATE_LIMIT_SIGNATURES
            .iter()
            .any(|signature| lowered.contains(signature))
    }

    pub fn is_rate_limited(&self) -> bool {
        self.kind == ProviderErrorKind::RateLimited
    }

    /// Whether another attempt against the same provider could succeed.
    pub fn is_retryable(&self) -> bool {
        !matches!(
            self.kind,
            ProviderErrorKind::Auth | ProviderErrorKind::NotConfigured
        )
    }
}

/// Errors surfaced by the word repository collaborator.
#[derive(Debug, Clone, Error)]
pub enum RepositoryError {
    /// The `(learner, language, level, original)` uniqueness constraint rejected the insert.
    #[error("Duplicate word for learner scope: {0}")]
    Duplicate(String),

    #[error("Repository failure: {0}")]
    Other(String),
}

impl RepositoryError {
    pub fn is_duplicate(&self) -> bool {
        matches!(self, RepositoryError::Duplicate(_))
    }
}

/// The only failure the public generation operation returns.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GenerationError {
    #[error("A generation run is already in progress for learner {learner}; retry later")]
    ConcurrentGenerationInProgress { learner: LearnerId },
}

/// Configuration and data-loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration error: {0}")]
    Invalid(String),

    #[error("Configuration validation failed:\n{0}")]
    Validation(String),

    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Catalog error: {0}")]
    Catalog(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failures surfaced by the `vocab-batch` binary.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    Generation(#[from] GenerationError),

    #[error("Runtime error: {0}")]
    Runtime(String),

    #[error("Output error: {0}")]
    Output(String),
}
