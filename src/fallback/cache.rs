//! TTL cache of provider-generated fallback words.
//!
//! Entries are derived data shared by every learner with the same (language, level).
//! Concurrent refreshes of one key are not coordinated; the last `put` wins.

use crate::clock::Clock;
use crate::language::LanguageProfile;
use crate::types::{ProficiencyLevel, WordCandidate};
use chrono::{DateTime, Duration, Utc};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Clone, PartialEq)]
pub struct FallbackCacheEntry {
    pub words: Vec<WordCandidate>,
    pub generated_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl FallbackCacheEntry {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

type CacheKey = (String, ProficiencyLevel);

fn key(language: &str, level: ProficiencyLevel) -> CacheKey {
    (language.trim().to_lowercase(), level)
}

pub struct FallbackCache {
    entries: RwLock<HashMap<CacheKey, FallbackCacheEntry>>,
    clock: Arc<dyn Clock>,
}

impl FallbackCache {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            clock,
        }
    }

    /// Unexpired entry for the key. An expired entry is evicted instead of returned.
    pub fn get(&self, language: &str, level: ProficiencyLevel) -> Option<FallbackCacheEntry> {
        let key = key(language, level);
        let now = self.clock.now();
        {
            let entries = self.entries.read();
            match entries.get(&key) {
                None => return None,
                Some(entry) if !entry.is_expired(now) => return Some(entry.clone()),
                Some(_) => {}
            }
        }
        let mut entries = self.entries.write();
        if entries.get(&key).is_some_and(|entry| entry.is_expired(now)) {
            entries.remove(&key);
            debug!(language, level = %level, "Evicted expired fallback cache entry");
        }
        None
    }

    pub fn put(&self, language: &str, level: ProficiencyLevel, words: Vec<WordCandidate>, ttl: Duration) {
        let now = self.clock.now();
        let entry = FallbackCacheEntry {
            words,
            generated_at: now,
            expires_at: now + ttl,
        };
        debug!(
            language,
            level = %level,
            words = entry.words.len(),
            expires_at = %entry.expires_at,
            "Stored fallback cache entry"
        );
        self.entries.write().insert(key(language, level), entry);
    }

    /// Drop every expired entry, returning how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired(now));
        before - entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

/// How many words a refresh asks for, as a multiple of the shortfall: 2x to 5x,
/// growing with language complexity and proficiency level.
pub fn refresh_multiplier(profile: &LanguageProfile, level: ProficiencyLevel) -> f64 {
    let raw = 2.0 + (profile.complexity() - 1.0) * 2.0 + f64::from(level.rank()) * 0.25;
    raw.clamp(2.0, 5.0)
}

/// Trust window for a refresh that obtained `obtained` of `requested` words.
///
/// Scales from `min` toward `max` with the yield and the language complexity.
pub fn refresh_ttl(
    obtained: usize,
    requested: usize,
    profile: &LanguageProfile,
    min: Duration,
    max: Duration,
) -> Duration {
    if requested == 0 || max <= min {
        return min;
    }
    let yield_ratio = (obtained as f64 / requested as f64).clamp(0.0, 1.0);
    let weight = yield_ratio * (profile.complexity() / 2.0);
    let span = (max - min).num_seconds() as f64;
    let ttl = min + Duration::seconds((span * weight).round() as i64);
    ttl.clamp(min, max)
}
