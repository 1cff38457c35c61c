//! Static word catalog keyed by (language, level).

use crate::error::ConfigError;
use crate::types::{ProficiencyLevel, WordCandidate};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

const BUILTIN_CATALOG: &str = include_str!("../../data/fallback_catalog.json");

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub language: String,
    pub level: ProficiencyLevel,
    pub words: Vec<WordCandidate>,
}

#[derive(Debug, Deserialize)]
struct CatalogFile {
    entries: Vec<CatalogEntry>,
}

#[derive(Debug, Clone, Default)]
pub struct StaticCatalog {
    entries: HashMap<(String, ProficiencyLevel), Vec<WordCandidate>>,
}

fn key(language: &str, level: ProficiencyLevel) -> (String, ProficiencyLevel) {
    (language.trim().to_lowercase(), level)
}

impl StaticCatalog {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Catalog compiled into the binary.
    pub fn builtin() -> Result<Self, ConfigError> {
        Self::from_json(BUILTIN_CATALOG)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
            .map_err(|e| ConfigError::Catalog(format!("{}: {}", path.display(), e)))
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let file: CatalogFile =
            serde_json::from_str(json).map_err(|e| ConfigError::Catalog(e.to_string()))?;
        Ok(Self::from_entries(file.entries))
    }

    /// Entries for the same key are concatenated.
    pub fn from_entries(entries: impl IntoIterator<Item = CatalogEntry>) -> Self {
        let mut map: HashMap<(String, ProficiencyLevel), Vec<WordCandidate>> = HashMap::new();
        for entry in entries {
            map.entry(key(&entry.language, entry.level))
                .or_default()
                .extend(entry.words);
        }
        Self { entries: map }
    }

    /// `path` when given, the built-in catalog otherwise.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::from_file(path),
            None => Self::builtin(),
        }
    }

    pub fn words(&self, language: &str, level: ProficiencyLevel) -> &[WordCandidate] {
        self.entries
            .get(&key(language, level))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// (language, level, word count) for every key, sorted.
    pub fn summary(&self) -> Vec<(String, ProficiencyLevel, usize)> {
        let mut rows: Vec<_> = self
            .entries
            .iter()
            .map(|((language, level), words)| (language.clone(), *level, words.len()))
            .collect();
        rows.sort();
        rows
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
