//! Deduplication Engine
//!
//! Pure filters that drop candidate words already present in a learner's vocabulary.
//! The exact pass compares case-insensitively. The advanced pass, used once a
//! vocabulary is large enough that the provider starts resurfacing near-duplicates,
//! also folds diacritics and articles and rejects close spellings and inflections.
//! Both passes also drop duplicates within the candidate list itself.

use crate::types::WordCandidate;
use std::collections::HashSet;
use tracing::debug;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Selects between the exact and advanced pass.
#[derive(Debug, Clone, PartialEq)]
pub struct DedupPolicy {
    /// Vocabularies larger than this get the advanced pass.
    pub advanced_threshold: usize,
    /// Levenshtein similarity ratio at or above which two words are treated as one.
    pub similarity_threshold: f64,
}

impl Default for DedupPolicy {
    fn default() -> Self {
        Self {
            advanced_threshold: 150,
            similarity_threshold: 0.85,
        }
    }
}

/// Leading articles ignored by the advanced pass.
const ARTICLES: &[&str] = &[
    "the", "a", "an", "le", "la", "les", "l'", "un", "une", "el", "los", "las", "der", "die",
    "das", "ein", "eine", "il", "lo", "gli", "o", "os", "as", "um", "uma",
];

/// Plural and verb-ending suffixes treated as inflection when one word extends the other.
/// Bare vowels are left out: "porte" is not a form of "port".
const INFLECTION_SUFFIXES: &[&str] = &["s", "es", "en", "er", "n", "r", "ed", "d", "ing", "x"];

/// Shortest stem the inflection rule applies to.
const MIN_STEM_CHARS: usize = 4;

/// Case-insensitive comparison key.
pub fn exact_key(word: &str) -> String {
    word.trim().to_lowercase()
}

/// Drop candidates whose `original` matches an existing word case-insensitively.
pub fn filter_exact(candidates: Vec<WordCandidate>, existing: &[String]) -> Vec<WordCandidate> {
    let mut seen: HashSet<String> = existing.iter().map(|w| exact_key(w)).collect();
    let before = candidates.len();
    let survivors: Vec<WordCandidate> = candidates
        .into_iter()
        .filter(|candidate| {
            let key = exact_key(&candidate.original);
            !key.is_empty() && seen.insert(key)
        })
        .collect();
    debug!(
        candidates = before,
        survivors = survivors.len(),
        existing = existing.len(),
        "Exact deduplication"
    );
    survivors
}

/// Drop candidates that normalize to, or closely resemble, an existing or earlier candidate word.
pub fn filter_advanced(
    candidates: Vec<WordCandidate>,
    existing: &[String],
    similarity_threshold: f64,
) -> Vec<WordCandidate> {
    let mut known: Vec<Vec<char>> = Vec::with_capacity(existing.len() + candidates.len());
    let mut known_keys: HashSet<String> = HashSet::with_capacity(existing.len());
    for word in existing {
        let key = normalize(word);
        if !key.is_empty() && known_keys.insert(key.clone()) {
            known.push(key.chars().collect());
        }
    }

    let before = candidates.len();
    let mut survivors = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        let key = normalize(&candidate.original);
        if key.is_empty() || known_keys.contains(&key) {
            continue;
        }
        let chars: Vec<char> = key.chars().collect();
        if known
            .iter()
            .any(|other| is_near_duplicate(&chars, other, similarity_threshold))
        {
            continue;
        }
        known_keys.insert(key);
        known.push(chars);
        survivors.push(candidate);
    }

    debug!(
        candidates = before,
        survivors = survivors.len(),
        existing = existing.len(),
        similarity_threshold,
        "Advanced deduplication"
    );
    survivors
}

/// Run the pass the policy selects for a vocabulary of `existing_count` words.
pub fn filter(
    candidates: Vec<WordCandidate>,
    existing: &[String],
    existing_count: usize,
    policy: &DedupPolicy,
) -> Vec<WordCandidate> {
    if existing_count > policy.advanced_threshold {
        filter_advanced(candidates, existing, policy.similarity_threshold)
    } else {
        filter_exact(candidates, existing)
    }
}

/// Comparison form for the advanced pass: case-folded, trimmed, whitespace collapsed,
/// Latin/Greek/Cyrillic diacritics removed and a leading article dropped.
pub fn normalize(word: &str) -> String {
    let lowered = exact_key(word);
    let mut folded = String::with_capacity(lowered.len());
    let mut last_base: Option<char> = None;
    for c in lowered.nfd() {
        if is_combining_mark(c) {
            if last_base.map(is_foldable_base).unwrap_or(false) {
                continue;
            }
        } else {
            last_base = Some(c);
        }
        folded.push(c);
    }
    let folded: String = folded.nfc().collect();
    let collapsed = folded.split_whitespace().collect::<Vec<_>>().join(" ");
    let stripped = strip_article(&collapsed);
    if stripped.is_empty() {
        collapsed
    } else {
        stripped.to_string()
    }
}

fn is_foldable_base(c: char) -> bool {
    let code = c as u32;
    // Latin, Latin Extended, Greek and Cyrillic. Kana voicing marks and similar stay.
    code < 0x0250 || (0x0370..=0x04FF).contains(&code) || (0x1E00..=0x1EFF).contains(&code)
}

fn strip_article(word: &str) -> &str {
    for article in ARTICLES {
        if let Some(rest) = word.strip_prefix(article) {
            if article.ends_with('\'') {
                return rest.trim_start();
            }
            if let Some(rest) = rest.strip_prefix(' ') {
                return rest.trim_start();
            }
        }
    }
    word
}

fn is_near_duplicate(a: &[char], b: &[char], threshold: f64) -> bool {
    if a == b {
        return true;
    }
    if shares_inflected_stem(a, b) {
        return true;
    }
    let max_len = a.len().max(b.len());
    if max_len == 0 {
        return false;
    }
    // Length gap alone already rules out the similarity threshold
    let min_distance = a.len().abs_diff(b.len());
    if 1.0 - (min_distance as f64 / max_len as f64) < threshold {
        return false;
    }
    let distance = levenshtein(a, b);
    1.0 - (distance as f64 / max_len as f64) >= threshold
}

fn shares_inflected_stem(a: &[char], b: &[char]) -> bool {
    let (short, long) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    if short.len() < MIN_STEM_CHARS || !long.starts_with(short) {
        return false;
    }
    let suffix: String = long[short.len()..].iter().collect();
    INFLECTION_SUFFIXES.contains(&suffix.as_str())
}

/// Edit distance over chars, two-row formulation.
fn levenshtein(a: &[char], b: &[char]) -> usize {
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }
    let mut previous: Vec<usize> = (0..=b.len()).collect();
    let mut current = vec![0usize; b.len() + 1];
    for (i, ca) in a.iter().enumerate() {
        current[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            current[j + 1] = (previous[j + 1] + 1)
                .min(current[j] + 1)
                .min(previous[j] + cost);
        }
        std::mem::swap(&mut previous, &mut current);
    }
    previous[b.len()]
}
