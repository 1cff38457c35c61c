//! Generation Client
//!
//! One provider call per operation: build the prompt, count the call against the
//! quota estimate, and parse the JSON word array out of the reply. Failures come back
//! as [`ProviderError`] values with a kind; this layer never retries.

pub mod parse;
pub mod prompt;

use crate::dedup;
use crate::error::ProviderError;
use crate::provider::{ChatMessage, CompletionOptions, ModelProviderClient};
use crate::quota::QuotaTracker;
use crate::types::WordCandidate;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

pub use parse::parse_word_array;
pub use prompt::{CategoryMix, WordRequest};

/// Words from one learner-prompt call.
#[derive(Debug, Clone, Default)]
pub struct GeneratedWords {
    pub words: Vec<WordCandidate>,
    /// Parsed entries dropped as exact duplicates of existing or earlier words.
    pub duplicates_removed: usize,
}

pub struct GenerationClient {
    provider: Arc<dyn ModelProviderClient>,
    quota: Arc<QuotaTracker>,
    options: CompletionOptions,
    exclusion_list_limit: usize,
}

impl GenerationClient {
    pub fn new(
        provider: Arc<dyn ModelProviderClient>,
        quota: Arc<QuotaTracker>,
        options: CompletionOptions,
        exclusion_list_limit: usize,
    ) -> Self {
        Self {
            provider,
            quota,
            options,
            exclusion_list_limit,
        }
    }

    pub fn quota(&self) -> &Arc<QuotaTracker> {
        &self.quota
    }

    /// Generate learner-facing vocabulary.
    ///
    /// The reply is passed through one exact-match filter against `request.existing`
    /// before it is returned, so the result may be shorter than the parsed array.
    pub async fn generate(&self, request: &WordRequest<'_>) -> Result<GeneratedWords, ProviderError> {
        let user_prompt = prompt::learner_prompt(request, self.exclusion_list_limit);
        let content = self.call("learner_batch", user_prompt).await?;
        let parsed = parse_word_array(&content)?;
        let parsed_count = parsed.len();
        let words = dedup::filter_exact(parsed, request.existing);
        debug!(
            language = request.learning_language,
            level = %request.level,
            parsed = parsed_count,
            kept = words.len(),
            "Parsed generated words"
        );
        Ok(GeneratedWords {
            duplicates_removed: parsed_count - words.len(),
            words,
        })
    }

    /// Generate words for the fallback cache using the language-profile template.
    pub async fn generate_cultural(
        &self,
        request: &WordRequest<'_>,
    ) -> Result<Vec<WordCandidate>, ProviderError> {
        let user_prompt = prompt::cultural_prompt(request);
        let content = self.call("fallback_refresh", user_prompt).await?;
        let parsed = parse_word_array(&content)?;
        Ok(dedup::filter_exact(parsed, request.existing))
    }

    /// Translate English words into `learning_language`.
    pub async fn translate(
        &self,
        words: &[WordCandidate],
        learning_language: &str,
        native_language: &str,
    ) -> Result<Vec<WordCandidate>, ProviderError> {
        if words.is_empty() {
            return Ok(Vec::new());
        }
        let user_prompt = prompt::translation_prompt(words, learning_language, native_language);
        let content = self.call("translation", user_prompt).await?;
        parse_word_array(&content)
    }

    async fn call(&self, purpose: &'static str, user_prompt: String) -> Result<String, ProviderError> {
        // Counted before the request so a call that never returns is still counted
        self.quota.increment();

        let messages = vec![
            ChatMessage::system(prompt::system_prompt()),
            ChatMessage::user(user_prompt),
        ];
        let start = Instant::now();
        info!(
            purpose,
            provider = self.provider.provider_name(),
            model = self.provider.model_name(),
            "Provider request sent"
        );

        match self.provider.complete(messages, self.options.clone()).await {
            Ok(response) => {
                info!(
                    purpose,
                    provider = self.provider.provider_name(),
                    duration_ms = start.elapsed().as_millis() as u64,
                    response_chars = response.content.chars().count(),
                    "Provider response received"
                );
                Ok(response.content)
            }
            Err(err) => {
                warn!(
                    purpose,
                    provider = self.provider.provider_name(),
                    duration_ms = start.elapsed().as_millis() as u64,
                    kind = %err.kind,
                    error = %err,
                    "Provider request failed"
                );
                Err(err)
            }
        }
    }
}
