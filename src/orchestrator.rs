//! Batch Orchestrator
//!
//! [`GenerationService::generate_next_batch`] fills one learner batch up to the
//! configured size: it takes the learner's lock, works out how many words are
//! missing, gathers candidates from the provider (or the fallback tiers), removes
//! duplicates, persists survivors one by one, backfills a shortfall caused by
//! duplicates, and reports a [`BatchOutcome`].
//!
//! Everything except lock contention is absorbed into the outcome.

pub mod lock;

pub use lock::{LearnerLockGuard, LearnerLocks};

use crate::clock::Clock;
use crate::config::VocabConfig;
use crate::dedup::{self, DedupPolicy};
use crate::error::{ConfigError, GenerationError, ProviderError};
use crate::fallback::FallbackWordProvider;
use crate::generation::{GenerationClient, WordRequest};
use crate::provider::{CompletionOptions, ModelProviderClient};
use crate::quota::QuotaTracker;
use crate::repository::{CacheInvalidator, NoopInvalidator, WordRepository};
use crate::retry::{RetryPolicy, Sleeper, TokioSleeper};
use crate::types::{
    BatchOutcome, BatchRequest, BatchScope, GenerationMethod, OutcomeStatus, VocabularyWord,
    WordCandidate,
};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

/// Sizing and source-selection policy for one service.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchSettings {
    pub words_per_batch: usize,
    pub generation_batch_size: usize,
    pub min_request_size: usize,
    /// Learners with more words than this are served from fallback sources.
    pub large_vocabulary_threshold: usize,
    /// Below this remaining-quota estimate, fallback sources are preferred.
    pub min_remaining_quota: u32,
    pub dedup: DedupPolicy,
}

impl Default for BatchSettings {
    fn default() -> Self {
        Self::from(&VocabConfig::default())
    }
}

impl From<&VocabConfig> for BatchSettings {
    fn from(config: &VocabConfig) -> Self {
        Self {
            words_per_batch: config.batch.words_per_batch,
            generation_batch_size: config.batch.generation_batch_size,
            min_request_size: config.batch.min_request_size,
            large_vocabulary_threshold: config.policy.large_vocabulary_threshold,
            min_remaining_quota: config.quota.min_remaining,
            dedup: DedupPolicy {
                advanced_threshold: config.policy.advanced_dedup_threshold,
                similarity_threshold: config.policy.similarity_threshold,
            },
        }
    }
}

impl BatchSettings {
    /// Candidates to ask for when `needed` words are missing.
    pub fn request_size(&self, needed: usize) -> usize {
        needed
            .saturating_mul(2)
            .max(self.min_request_size)
            .min(self.generation_batch_size)
    }
}

/// Candidates gathered by one retry loop.
#[derive(Debug, Default)]
struct Gathered {
    words: Vec<WordCandidate>,
    duplicates: usize,
    /// A fallback round already ran inside the loop.
    fallback_tried: bool,
}

/// Result of writing candidates to the repository.
#[derive(Debug, Default)]
struct Persisted {
    stored: usize,
    duplicates: usize,
    failures: usize,
}

pub struct GenerationService {
    locks: LearnerLocks,
    quota: Arc<QuotaTracker>,
    client: Arc<GenerationClient>,
    fallback: Arc<FallbackWordProvider>,
    repository: Arc<dyn WordRepository>,
    invalidator: Arc<dyn CacheInvalidator>,
    settings: BatchSettings,
    retry: RetryPolicy,
    sleeper: Arc<dyn Sleeper>,
}

impl GenerationService {
    pub fn new(
        client: Arc<GenerationClient>,
        fallback: Arc<FallbackWordProvider>,
        repository: Arc<dyn WordRepository>,
        settings: BatchSettings,
    ) -> Self {
        Self {
            locks: LearnerLocks::new(),
            quota: Arc::clone(client.quota()),
            client,
            fallback,
            repository,
            invalidator: Arc::new(NoopInvalidator),
            settings,
            retry: RetryPolicy::default(),
            sleeper: Arc::new(TokioSleeper),
        }
    }

    /// Wire a complete service from configuration around `provider`.
    pub fn from_config(
        config: &VocabConfig,
        provider: Arc<dyn ModelProviderClient>,
        repository: Arc<dyn WordRepository>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, ConfigError> {
        let quota = Arc::new(QuotaTracker::new(&config.quota, Arc::clone(&clock)));
        let options = config
            .provider
            .as_ref()
            .map(|p| p.default_options.clone())
            .unwrap_or_else(CompletionOptions::default);
        let client = Arc::new(GenerationClient::new(
            provider,
            quota,
            options,
            config.policy.exclusion_list_limit,
        ));
        let fallback = Arc::new(FallbackWordProvider::from_config(
            &config.fallback,
            clock,
            Some(Arc::clone(&client)),
        )?);
        Ok(Self::new(client, fallback, repository, BatchSettings::from(config))
            .with_retry_policy(RetryPolicy::from(&config.retry)))
    }

    pub fn with_invalidator(mut self, invalidator: Arc<dyn CacheInvalidator>) -> Self {
        self.invalidator = invalidator;
        self
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    pub fn settings(&self) -> &BatchSettings {
        &self.settings
    }

    pub fn quota(&self) -> &Arc<QuotaTracker> {
        &self.quota
    }

    pub fn locks(&self) -> &LearnerLocks {
        &self.locks
    }

    /// Fill the learner's next batch.
    ///
    /// Fails only when another run for the same learner is in progress. The lock
    /// is released on every return path.
    #[instrument(
        skip(self, request),
        fields(
            learner = %request.scope.learner,
            language = %request.scope.learning_language,
            level = %request.scope.level
        )
    )]
    pub async fn generate_next_batch(&self, request: BatchRequest) -> Result<BatchOutcome, GenerationError> {
        let learner = request.scope.learner.clone();
        let Some(_guard) = self.locks.try_acquire(&learner) else {
            warn!("Generation already in progress; request rejected");
            return Err(GenerationError::ConcurrentGenerationInProgress { learner });
        };

        let outcome = self.run(&request).await;
        info!(
            batch = outcome.batch_number,
            generated = outcome.generated_count,
            duplicates = outcome.duplicates_skipped,
            persistence_failures = outcome.persistence_failures,
            final_size = outcome.final_batch_size,
            complete = outcome.is_complete,
            method = %outcome.generation_method,
            status = ?outcome.status,
            "Batch generation finished"
        );
        Ok(outcome)
    }

    async fn run(&self, request: &BatchRequest) -> BatchOutcome {
        let scope = &request.scope;
        let target = self.settings.words_per_batch;

        let existing = match self.repository.find_existing(scope).await {
            Ok(words) => words,
            Err(err) => {
                error!(error = %err, "Failed to read existing vocabulary");
                return self.outcome(
                    request.batch_number.unwrap_or(1),
                    OutcomeStatus::RepositoryUnavailable,
                    GenerationMethod::Ai,
                    0,
                );
            }
        };

        let batch_number = resolve_batch_number(request.batch_number, &existing, target);
        let current = match self.repository.count(scope, Some(batch_number), false).await {
            Ok(count) => count,
            Err(err) => {
                error!(error = %err, batch = batch_number, "Failed to count batch words");
                return self.outcome(batch_number, OutcomeStatus::RepositoryUnavailable, GenerationMethod::Ai, 0);
            }
        };

        let words_needed = target.saturating_sub(current);
        if words_needed == 0 {
            debug!(batch = batch_number, current, "Batch already complete");
            return self.outcome(batch_number, OutcomeStatus::AlreadyComplete, GenerationMethod::Ai, current);
        }

        let mut known: Vec<String> = existing.into_iter().map(|w| w.original).collect();
        let mut method = self.select_source(known.len());
        info!(
            batch = batch_number,
            current,
            words_needed,
            existing = known.len(),
            method = %method,
            "Generating batch words"
        );

        let mut gathered = self
            .gather(scope, batch_number, words_needed, &known, &mut method, self.retry.max_attempts, true)
            .await;

        if gathered.words.is_empty() && !gathered.fallback_tried {
            warn!(batch = batch_number, "Retry loop produced no words; trying fallback sources");
            let words = self.fallback_round(scope, words_needed, &known).await;
            if !words.words.is_empty() {
                method = GenerationMethod::Fallback;
            }
            gathered.duplicates += words.duplicates;
            gathered.words = words.words;
        }

        if gathered.words.is_empty() {
            warn!(batch = batch_number, "No words available from any source");
            let mut outcome =
                self.outcome(batch_number, OutcomeStatus::NoWordsAvailable, method, current);
            outcome.duplicates_skipped = gathered.duplicates;
            return outcome;
        }

        let mut persisted = self.persist(scope, batch_number, gathered.words, &mut known).await;
        let mut duplicates = gathered.duplicates + persisted.duplicates;
        let mut final_size = self.batch_size(scope, batch_number, current + persisted.stored).await;

        let mut backfilled = false;
        if final_size < target && duplicates > 0 && !self.quota.is_exhausted() {
            backfilled = true;
            let (more, skipped) = self.backfill(scope, batch_number, final_size).await;
            duplicates += skipped + more.duplicates;
            persisted.stored += more.stored;
            persisted.failures += more.failures;
            final_size = self.batch_size(scope, batch_number, final_size + more.stored).await;
        }

        if persisted.stored > 0 {
            self.invalidate(scope, batch_number).await;
        }

        let is_complete = final_size >= target;
        BatchOutcome {
            batch_number,
            generated_count: persisted.stored,
            duplicates_skipped: duplicates,
            persistence_failures: persisted.failures,
            final_batch_size: final_size,
            is_complete,
            generation_method: method,
            backfilled,
            status: if is_complete {
                OutcomeStatus::Completed
            } else {
                OutcomeStatus::Partial
            },
            quota_status: self.quota.status(),
        }
    }

    fn select_source(&self, vocabulary_size: usize) -> GenerationMethod {
        if vocabulary_size > self.settings.large_vocabulary_threshold {
            debug!(vocabulary_size, "Large vocabulary; using fallback sources");
            return GenerationMethod::Fallback;
        }
        if self.quota.is_exhausted() {
            debug!("Quota exhausted; using fallback sources");
            return GenerationMethod::Fallback;
        }
        let remaining = self.quota.remaining_estimate();
        if remaining < self.settings.min_remaining_quota {
            debug!(remaining, "Quota estimate low; using fallback sources");
            return GenerationMethod::Fallback;
        }
        GenerationMethod::Ai
    }

    /// Bounded retry loop. Stops as soon as one word survives deduplication.
    ///
    /// With `allow_fallback`, a rate-limit failure switches `method` to fallback for the
    /// rest of the run; without it, the loop is provider-only and ends on rate limiting.
    #[allow(clippy::too_many_arguments)]
    async fn gather(
        &self,
        scope: &BatchScope,
        batch_number: u32,
        needed: usize,
        known: &[String],
        method: &mut GenerationMethod,
        attempts: usize,
        allow_fallback: bool,
    ) -> Gathered {
        let mut gathered = Gathered::default();
        let request = WordRequest {
            learning_language: &scope.learning_language,
            native_language: &scope.native_language,
            level: scope.level,
            count: self.settings.request_size(needed),
            existing: known,
            batch_number,
        };

        for attempt in 0..attempts {
            if *method == GenerationMethod::Fallback {
                let words = self.fallback_round(scope, needed, known).await;
                gathered.duplicates += words.duplicates;
                gathered.words = words.words;
                gathered.fallback_tried = true;
                break;
            }

            match self.client.generate(&request).await {
                Ok(generated) => {
                    let before = generated.words.len();
                    let mut survivors =
                        dedup::filter(generated.words, known, known.len(), &self.settings.dedup);
                    gathered.duplicates += generated.duplicates_removed + (before - survivors.len());
                    survivors.truncate(needed);
                    debug!(attempt, survivors = survivors.len(), "Provider attempt finished");
                    if !survivors.is_empty() {
                        gathered.words = survivors;
                        break;
                    }
                }
                Err(err) => {
                    if self.quota.check_status(Some(&err)) {
                        if !allow_fallback {
                            debug!(attempt, "Quota exhausted during provider-only loop");
                            break;
                        }
                        warn!(attempt, "Quota exhausted; switching to fallback sources");
                        *method = GenerationMethod::Fallback;
                        let words = self.fallback_round(scope, needed, known).await;
                        gathered.duplicates += words.duplicates;
                        gathered.words = words.words;
                        gathered.fallback_tried = true;
                        break;
                    }
                    if !err.is_retryable() {
                        error!(attempt, kind = %err.kind, error = %err, "Provider failure is not retryable");
                        break;
                    }
                    self.backoff(attempt, attempts, &err).await;
                }
            }
        }
        gathered
    }

    async fn backoff(&self, attempt: usize, attempts: usize, err: &ProviderError) {
        if attempt + 1 >= attempts {
            warn!(attempt, kind = %err.kind, error = %err, "Provider attempts exhausted");
            return;
        }
        let delay = self.retry.delay_for(attempt);
        warn!(
            attempt,
            kind = %err.kind,
            error = %err,
            delay_ms = delay.as_millis() as u64,
            "Provider attempt failed; backing off"
        );
        self.sleeper.sleep(delay).await;
    }

    async fn fallback_round(&self, scope: &BatchScope, needed: usize, known: &[String]) -> Gathered {
        let words = self
            .fallback
            .get_words(&scope.learning_language, scope.level, needed, known, &scope.native_language)
            .await;
        let before = words.len();
        let mut survivors = dedup::filter(words, known, known.len(), &self.settings.dedup);
        let duplicates = before - survivors.len();
        survivors.truncate(needed);
        Gathered {
            words: survivors,
            duplicates,
            fallback_tried: true,
        }
    }

    /// Insert each word on its own so one rejected insert does not affect the rest.
    async fn persist(
        &self,
        scope: &BatchScope,
        batch_number: u32,
        words: Vec<WordCandidate>,
        known: &mut Vec<String>,
    ) -> Persisted {
        let mut persisted = Persisted::default();
        for candidate in words {
            let word = VocabularyWord::from_candidate(scope, batch_number, candidate);
            let original = word.original.clone();
            match self.repository.create(word).await {
                Ok(()) => {
                    persisted.stored += 1;
                    known.push(original);
                }
                Err(err) if err.is_duplicate() => {
                    debug!(word = %original, "Word already stored; skipped");
                    persisted.duplicates += 1;
                }
                Err(err) => {
                    warn!(word = %original, error = %err, "Failed to store word");
                    persisted.failures += 1;
                }
            }
        }
        debug!(
            batch = batch_number,
            stored = persisted.stored,
            duplicates = persisted.duplicates,
            failures = persisted.failures,
            "Persistence pass finished"
        );
        persisted
    }

    /// Provider-only top-up after a shortfall caused by duplicates.
    /// Returns the persistence result and the duplicates found while gathering.
    async fn backfill(&self, scope: &BatchScope, batch_number: u32, current: usize) -> (Persisted, usize) {
        let mut known: Vec<String> = match self.repository.find_existing(scope).await {
            Ok(words) => words.into_iter().map(|w| w.original).collect(),
            Err(err) => {
                warn!(error = %err, "Skipping backfill; existing vocabulary unavailable");
                return (Persisted::default(), 0);
            }
        };
        let needed = self.settings.words_per_batch.saturating_sub(current);
        info!(batch = batch_number, needed, "Backfilling batch");

        let mut method = GenerationMethod::Ai;
        let gathered = self
            .gather(scope, batch_number, needed, &known, &mut method, self.retry.backfill_attempts, false)
            .await;
        if gathered.words.is_empty() {
            return (Persisted::default(), gathered.duplicates);
        }
        let persisted = self.persist(scope, batch_number, gathered.words, &mut known).await;
        (persisted, gathered.duplicates)
    }

    /// Current batch size from the repository, or `estimate` if it cannot be read.
    async fn batch_size(&self, scope: &BatchScope, batch_number: u32, estimate: usize) -> usize {
        match self.repository.count(scope, Some(batch_number), false).await {
            Ok(count) => count,
            Err(err) => {
                warn!(error = %err, "Could not recount batch; using local tally");
                estimate
            }
        }
    }

    async fn invalidate(&self, scope: &BatchScope, batch_number: u32) {
        if let Err(err) = self.invalidator.invalidate(&scope.learner).await {
            warn!(error = %err, "Learner cache invalidation failed");
        }
        if let Err(err) = self
            .invalidator
            .invalidate_batch(&scope.learner, scope.level, batch_number)
            .await
        {
            warn!(error = %err, batch = batch_number, "Batch cache invalidation failed");
        }
    }

    fn outcome(
        &self,
        batch_number: u32,
        status: OutcomeStatus,
        method: GenerationMethod,
        batch_size: usize,
    ) -> BatchOutcome {
        BatchOutcome {
            batch_number,
            generated_count: 0,
            duplicates_skipped: 0,
            persistence_failures: 0,
            final_batch_size: batch_size,
            is_complete: batch_size >= self.settings.words_per_batch,
            generation_method: method,
            backfilled: false,
            status,
            quota_status: self.quota.status(),
        }
    }
}

/// Batch to fill: the requested one, else the highest-numbered incomplete batch,
/// else the one after the last.
pub fn resolve_batch_number(
    requested: Option<u32>,
    existing: &[VocabularyWord],
    words_per_batch: usize,
) -> u32 {
    if let Some(batch) = requested {
        return batch.max(1);
    }
    let mut sizes: BTreeMap<u32, usize> = BTreeMap::new();
    for word in existing {
        *sizes.entry(word.batch_number).or_default() += 1;
    }
    if let Some((batch, _)) = sizes.iter().rev().find(|(_, size)| **size < words_per_batch) {
        return (*batch).max(1);
    }
    sizes.keys().next_back().map_or(1, |last| last + 1)
}
