//! Collaborators the orchestrator persists through: the word repository and the
//! cache invalidation hook, plus in-process implementations of both.

use crate::dedup::exact_key;
use crate::error::RepositoryError;
use crate::types::{BatchScope, LearnerId, ProficiencyLevel, VocabularyWord};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::path::Path;

/// Storage for a learner's vocabulary.
///
/// Implementations must enforce uniqueness of `(learner, learning language, level,
/// original)` with case-insensitive `original`, reporting a violation as
/// [`RepositoryError::Duplicate`].
#[async_trait]
pub trait WordRepository: Send + Sync {
    async fn find_existing(&self, scope: &BatchScope) -> Result<Vec<VocabularyWord>, RepositoryError>;

    async fn count(
        &self,
        scope: &BatchScope,
        batch_number: Option<u32>,
        learned_only: bool,
    ) -> Result<usize, RepositoryError>;

    async fn create(&self, word: VocabularyWord) -> Result<(), RepositoryError>;
}

/// Hook notified after words are persisted. Failures are reported, never fatal.
#[async_trait]
pub trait CacheInvalidator: Send + Sync {
    async fn invalidate(&self, learner: &LearnerId) -> anyhow::Result<()>;

    async fn invalidate_batch(
        &self,
        learner: &LearnerId,
        level: ProficiencyLevel,
        batch_number: u32,
    ) -> anyhow::Result<()>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopInvalidator;

#[async_trait]
impl CacheInvalidator for NoopInvalidator {
    async fn invalidate(&self, _learner: &LearnerId) -> anyhow::Result<()> {
        Ok(())
    }

    async fn invalidate_batch(
        &self,
        _learner: &LearnerId,
        _level: ProficiencyLevel,
        _batch_number: u32,
    ) -> anyhow::Result<()> {
        Ok(())
    }
}

fn in_scope(word: &VocabularyWord, scope: &BatchScope) -> bool {
    word.learner == scope.learner
        && word.proficiency_level == scope.level
        && word.learning_language.eq_ignore_ascii_case(&scope.learning_language)
}

/// Vocabulary held in memory, optionally snapshotted to a JSON file.
#[derive(Debug, Default)]
pub struct InMemoryWordRepository {
    words: RwLock<Vec<VocabularyWord>>,
}

impl InMemoryWordRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed with `words`, skipping any that would violate uniqueness.
    pub fn with_words(words: impl IntoIterator<Item = VocabularyWord>) -> Self {
        let repo = Self::new();
        {
            let mut stored = repo.words.write();
            for word in words {
                if !Self::contains(&stored, &word) {
                    stored.push(word);
                }
            }
        }
        repo
    }

    /// Load a snapshot written by [`save`](Self::save). A missing file yields an empty repository.
    pub fn load(path: &Path) -> Result<Self, RepositoryError> {
        if !path.exists() {
            return Ok(Self::new());
        }
        let content = std::fs::read_to_string(path)
            .map_err(|e| RepositoryError::Other(format!("read {}: {}", path.display(), e)))?;
        let words: Vec<VocabularyWord> = serde_json::from_str(&content)
            .map_err(|e| RepositoryError::Other(format!("parse {}: {}", path.display(), e)))?;
        Ok(Self::with_words(words))
    }

    pub fn save(&self, path: &Path) -> Result<(), RepositoryError> {
        let json = serde_json::to_string_pretty(&*self.words.read())
            .map_err(|e| RepositoryError::Other(e.to_string()))?;
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| RepositoryError::Other(format!("create {}: {}", parent.display(), e)))?;
            }
        }
        std::fs::write(path, json)
            .map_err(|e| RepositoryError::Other(format!("write {}: {}", path.display(), e)))
    }

    pub fn snapshot(&self) -> Vec<VocabularyWord> {
        self.words.read().clone()
    }

    pub fn len(&self) -> usize {
        self.words.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.read().is_empty()
    }

    fn contains(stored: &[VocabularyWord], word: &VocabularyWord) -> bool {
        let key = exact_key(&word.original);
        stored.iter().any(|w| {
            w.learner == word.learner
                && w.proficiency_level == word.proficiency_level
                && w.learning_language.eq_ignore_ascii_case(&word.learning_language)
                && exact_key(&w.original) == key
        })
    }
}

#[async_trait]
impl WordRepository for InMemoryWordRepository {
    async fn find_existing(&self, scope: &BatchScope) -> Result<Vec<VocabularyWord>, RepositoryError> {
        Ok(self
            .words
            .read()
            .iter()
            .filter(|w| in_scope(w, scope))
            .cloned()
            .collect())
    }

    async fn count(
        &self,
        scope: &BatchScope,
        batch_number: Option<u32>,
        learned_only: bool,
    ) -> Result<usize, RepositoryError> {
        Ok(self
            .words
            .read()
            .iter()
            .filter(|w| in_scope(w, scope))
            .filter(|w| batch_number.map_or(true, |b| w.batch_number == b))
            .filter(|w| !learned_only || w.learned)
            .count())
    }

    async fn create(&self, word: VocabularyWord) -> Result<(), RepositoryError> {
        let mut stored = self.words.write();
        if Self::contains(&stored, &word) {
            return Err(RepositoryError::Duplicate(word.original));
        }
        stored.push(word);
        Ok(())
    }
}
