//! Vocab Batch: Exactly-Sized Vocabulary Batch Generation
//!
//! Fills fixed-size vocabulary batches for language learners from a quota-limited
//! text generation provider, with layered fallback word sources, deduplication
//! against the learner's existing words, and per-learner mutual exclusion.

pub mod cli;
pub mod clock;
pub mod config;
pub mod dedup;
pub mod error;
pub mod fallback;
pub mod generation;
pub mod language;
pub mod logging;
pub mod orchestrator;
pub mod provider;
pub mod quota;
pub mod repository;
pub mod retry;
pub mod types;
pub mod validator;

pub use error::{ConfigError, GenerationError, ProviderError, ProviderErrorKind, RepositoryError};
pub use orchestrator::{BatchSettings, GenerationService};
pub use types::{
    BatchOutcome, BatchRequest, BatchScope, GenerationMethod, LearnerId, OutcomeStatus,
    ProficiencyLevel, QuotaStatus, VocabularyWord, WordCandidate,
};
