//! Fallback Word Provider
//!
//! Words that do not come from the primary learner prompt. Three tiers are tried in
//! order and merged: the static catalog, the TTL cache (refreshed through the
//! provider with the cultural prompt), and a fixed English emergency list that is
//! translated when possible. [`FallbackWordProvider::get_words`] never fails.

pub mod cache;
pub mod catalog;
pub mod emergency;

pub use cache::{FallbackCache, FallbackCacheEntry};
pub use catalog::{CatalogEntry, StaticCatalog};

use crate::clock::Clock;
use crate::config::FallbackConfig;
use crate::dedup;
use crate::generation::{GenerationClient, WordRequest};
use crate::language::LanguageProfile;
use crate::types::{ProficiencyLevel, WordCandidate};
use chrono::Duration;
use rand::seq::SliceRandom;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Largest refresh request sent to the provider.
const MAX_REFRESH_WORDS: usize = 250;

pub struct FallbackWordProvider {
    catalog: StaticCatalog,
    cache: FallbackCache,
    client: Option<Arc<GenerationClient>>,
    min_ttl: Duration,
    max_ttl: Duration,
}

impl FallbackWordProvider {
    pub fn new(
        catalog: StaticCatalog,
        cache: FallbackCache,
        client: Option<Arc<GenerationClient>>,
        config: &FallbackConfig,
    ) -> Self {
        Self {
            catalog,
            cache,
            client,
            min_ttl: Duration::hours(i64::from(config.min_ttl_hours)),
            max_ttl: Duration::hours(i64::from(config.max_ttl_hours)),
        }
    }

    /// Provider backed by the configured catalog and a fresh cache.
    pub fn from_config(
        config: &FallbackConfig,
        clock: Arc<dyn Clock>,
        client: Option<Arc<GenerationClient>>,
    ) -> Result<Self, crate::error::ConfigError> {
        let catalog = StaticCatalog::load(config.catalog_path.as_deref())?;
        Ok(Self::new(catalog, FallbackCache::new(clock), client, config))
    }

    pub fn catalog(&self) -> &StaticCatalog {
        &self.catalog
    }

    pub fn cache(&self) -> &FallbackCache {
        &self.cache
    }

    /// Up to `count` words not in `existing`. May return fewer, or none.
    pub async fn get_words(
        &self,
        learning_language: &str,
        level: ProficiencyLevel,
        count: usize,
        existing: &[String],
        native_language: &str,
    ) -> Vec<WordCandidate> {
        if count == 0 {
            return Vec::new();
        }

        let mut collected = take_shuffled(
            dedup::filter_exact(self.catalog.words(learning_language, level).to_vec(), existing),
            count,
        );
        debug!(
            language = learning_language,
            level = %level,
            catalog_words = collected.len(),
            requested = count,
            "Static catalog lookup"
        );
        if collected.len() >= count {
            return collected;
        }

        let mut excluded = existing.to_vec();
        excluded.extend(collected.iter().map(|w| w.original.clone()));

        if let Some(entry) = self.cache.get(learning_language, level) {
            let fresh = take_shuffled(dedup::filter_exact(entry.words, &excluded), count - collected.len());
            excluded.extend(fresh.iter().map(|w| w.original.clone()));
            collected.extend(fresh);
        }

        if collected.len() < count {
            let refreshed = self
                .refresh_cache(learning_language, native_language, level, count - collected.len(), &excluded)
                .await;
            let fresh = take_shuffled(dedup::filter_exact(refreshed, &excluded), count - collected.len());
            collected.extend(fresh);
        }

        if collected.is_empty() {
            collected = self
                .emergency(learning_language, native_language, level, count, existing)
                .await;
        }

        info!(
            language = learning_language,
            level = %level,
            requested = count,
            supplied = collected.len(),
            "Fallback words supplied"
        );
        collected
    }

    /// Regenerate the cache entry for the key. Returns the newly generated words.
    async fn refresh_cache(
        &self,
        learning_language: &str,
        native_language: &str,
        level: ProficiencyLevel,
        shortfall: usize,
        excluded: &[String],
    ) -> Vec<WordCandidate> {
        let Some(client) = self.available_client() else {
            return Vec::new();
        };

        let profile = LanguageProfile::lookup(learning_language);
        let requested = ((shortfall as f64) * cache::refresh_multiplier(profile, level)).ceil() as usize;
        let requested = requested.clamp(1, MAX_REFRESH_WORDS);
        let request = WordRequest {
            learning_language,
            native_language,
            level,
            count: requested,
            existing: excluded,
            batch_number: 0,
        };

        match client.generate_cultural(&request).await {
            Ok(words) if words.is_empty() => {
                debug!(language = learning_language, level = %level, "Fallback refresh produced no new words");
                Vec::new()
            }
            Ok(words) => {
                let ttl = cache::refresh_ttl(words.len(), requested, profile, self.min_ttl, self.max_ttl);
                let mut merged = self
                    .cache
                    .get(learning_language, level)
                    .map(|entry| entry.words)
                    .unwrap_or_default();
                merged.extend(words.iter().cloned());
                let merged = dedup::filter_exact(merged, &[]);
                info!(
                    language = learning_language,
                    level = %level,
                    requested,
                    obtained = words.len(),
                    cached = merged.len(),
                    ttl_hours = ttl.num_hours(),
                    "Fallback cache refreshed"
                );
                self.cache.put(learning_language, level, merged, ttl);
                words
            }
            Err(err) => {
                warn!(
                    language = learning_language,
                    level = %level,
                    kind = %err.kind,
                    error = %err,
                    "Fallback cache refresh failed"
                );
                Vec::new()
            }
        }
    }

    async fn emergency(
        &self,
        learning_language: &str,
        native_language: &str,
        level: ProficiencyLevel,
        count: usize,
        existing: &[String],
    ) -> Vec<WordCandidate> {
        let english = dedup::filter_exact(emergency::emergency_words(level), existing);
        let english: Vec<WordCandidate> = english.into_iter().take(count).collect();
        if english.is_empty() || learning_language.trim().eq_ignore_ascii_case("english") {
            return english;
        }

        if let Some(client) = self.available_client() {
            match client.translate(&english, learning_language, native_language).await {
                Ok(translated) => {
                    let translated: Vec<WordCandidate> = dedup::filter_exact(translated, existing)
                        .into_iter()
                        .take(count)
                        .collect();
                    if !translated.is_empty() {
                        return translated;
                    }
                }
                Err(err) => {
                    warn!(
                        language = learning_language,
                        kind = %err.kind,
                        error = %err,
                        "Emergency translation failed; serving English words"
                    );
                }
            }
        }
        english
    }

    /// The generation client, unless the provider has already reported exhaustion.
    fn available_client(&self) -> Option<&GenerationClient> {
        let client = self.client.as_deref()?;
        if client.quota().is_exhausted() {
            debug!("Quota exhausted; skipping provider call from fallback");
            return None;
        }
        Some(client)
    }
}

fn take_shuffled(mut words: Vec<WordCandidate>, count: usize) -> Vec<WordCandidate> {
    words.shuffle(&mut rand::thread_rng());
    words.truncate(count);
    words
}
