//! Core data types shared by every stage of batch generation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Opaque learner identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LearnerId(String);

impl LearnerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LearnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for LearnerId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for LearnerId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// CEFR-style learner skill tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ProficiencyLevel {
    A1,
    A2,
    B1,
    B2,
    C1,
    C2,
}

impl ProficiencyLevel {
    pub const ALL: [ProficiencyLevel; 6] = [
        ProficiencyLevel::A1,
        ProficiencyLevel::A2,
        ProficiencyLevel::B1,
        ProficiencyLevel::B2,
        ProficiencyLevel::C1,
        ProficiencyLevel::C2,
    ];

    /// Position in the ladder, 0 for A1 through 5 for C2.
    pub fn rank(self) -> u8 {
        match self {
            ProficiencyLevel::A1 => 0,
            ProficiencyLevel::A2 => 1,
            ProficiencyLevel::B1 => 2,
            ProficiencyLevel::B2 => 3,
            ProficiencyLevel::C1 => 4,
            ProficiencyLevel::C2 => 5,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ProficiencyLevel::A1 => "A1",
            ProficiencyLevel::A2 => "A2",
            ProficiencyLevel::B1 => "B1",
            ProficiencyLevel::B2 => "B2",
            ProficiencyLevel::C1 => "C1",
            ProficiencyLevel::C2 => "C2",
        }
    }

    /// Short description used when prompting the provider.
    pub fn describe(self) -> &'static str {
        match self {
            ProficiencyLevel::A1 => "absolute beginner, everyday concrete words",
            ProficiencyLevel::A2 => "elementary, common daily-life vocabulary",
            ProficiencyLevel::B1 => "intermediate, work, travel and opinions",
            ProficiencyLevel::B2 => "upper intermediate, abstract and topical vocabulary",
            ProficiencyLevel::C1 => "advanced, nuanced and idiomatic vocabulary",
            ProficiencyLevel::C2 => "mastery, rare, literary and specialised vocabulary",
        }
    }
}

impl fmt::Display for ProficiencyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProficiencyLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "A1" => Ok(ProficiencyLevel::A1),
            "A2" => Ok(ProficiencyLevel::A2),
            "B1" => Ok(ProficiencyLevel::B1),
            "B2" => Ok(ProficiencyLevel::B2),
            "C1" => Ok(ProficiencyLevel::C1),
            "C2" => Ok(ProficiencyLevel::C2),
            other => Err(format!("Unknown proficiency level: {}", other)),
        }
    }
}

/// Part-of-speech bucket used for category distribution targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WordCategory {
    Noun,
    Verb,
    Adjective,
    Adverb,
    #[serde(alias = "function", alias = "preposition", alias = "conjunction", alias = "pronoun")]
    FunctionWord,
    #[serde(alias = "expression")]
    Phrase,
}

/// A word proposed by the provider, a fallback catalog, or the emergency set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordCandidate {
    #[serde(alias = "word", alias = "term")]
    pub original: String,
    #[serde(alias = "meaning")]
    pub translation: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<WordCategory>,
}

impl WordCandidate {
    pub fn new(original: impl Into<String>, translation: impl Into<String>) -> Self {
        Self {
            original: original.into(),
            translation: translation.into(),
            category: None,
        }
    }

    pub fn with_category(mut self, category: WordCategory) -> Self {
        self.category = Some(category);
        self
    }
}

/// The learner/language/level scope a batch belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BatchScope {
    pub learner: LearnerId,
    pub learning_language: String,
    pub native_language: String,
    pub level: ProficiencyLevel,
}

impl BatchScope {
    pub fn new(
        learner: impl Into<LearnerId>,
        learning_language: impl Into<String>,
        native_language: impl Into<String>,
        level: ProficiencyLevel,
    ) -> Self {
        Self {
            learner: learner.into(),
            learning_language: learning_language.into(),
            native_language: native_language.into(),
            level,
        }
    }
}

/// Input to the "generate next batch" operation.
#[derive(Debug, Clone)]
pub struct BatchRequest {
    pub scope: BatchScope,
    /// Batch to fill. `None` resolves to the open batch, or the next one.
    pub batch_number: Option<u32>,
}

impl BatchRequest {
    pub fn new(scope: BatchScope) -> Self {
        Self {
            scope,
            batch_number: None,
        }
    }

    pub fn for_batch(scope: BatchScope, batch_number: u32) -> Self {
        Self {
            scope,
            batch_number: Some(batch_number),
        }
    }
}

/// A persisted vocabulary entry owned by the learner's word collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VocabularyWord {
    pub learner: LearnerId,
    pub original: String,
    pub translation: String,
    pub learned: bool,
    pub proficiency_level: ProficiencyLevel,
    pub learning_language: String,
    pub native_language: String,
    pub batch_number: u32,
}

impl VocabularyWord {
    pub fn from_candidate(scope: &BatchScope, batch_number: u32, candidate: WordCandidate) -> Self {
        Self {
            learner: scope.learner.clone(),
            original: candidate.original.trim().to_string(),
            translation: candidate.translation.trim().to_string(),
            learned: false,
            proficiency_level: scope.level,
            learning_language: scope.learning_language.clone(),
            native_language: scope.native_language.clone(),
            batch_number,
        }
    }
}

/// Which source supplied the words of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GenerationMethod {
    Ai,
    Fallback,
}

impl fmt::Display for GenerationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GenerationMethod::Ai => f.write_str("ai"),
            GenerationMethod::Fallback => f.write_str("fallback"),
        }
    }
}

/// Snapshot of the provider quota estimate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotaStatus {
    pub request_count: u32,
    pub remaining_estimate: u32,
    pub exhausted: bool,
    pub reset_at: DateTime<Utc>,
}

/// Terminal state of one orchestration run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeStatus {
    /// The batch reached its target size during this run.
    Completed,
    /// Words were added but the batch is still short of target.
    Partial,
    /// Nothing was needed; no provider call was made.
    AlreadyComplete,
    /// Neither the provider nor any fallback tier produced a usable word.
    NoWordsAvailable,
    /// The word repository could not be read.
    RepositoryUnavailable,
}

/// Structured result of "generate next batch".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchOutcome {
    pub batch_number: u32,
    pub generated_count: usize,
    pub duplicates_skipped: usize,
    pub persistence_failures: usize,
    pub final_batch_size: usize,
    pub is_complete: bool,
    pub generation_method: GenerationMethod,
    pub backfilled: bool,
    pub status: OutcomeStatus,
    pub quota_status: QuotaStatus,
}
