//! Last-resort English word lists, one per level band.

use crate::types::{ProficiencyLevel, WordCandidate, WordCategory};

const BEGINNER: &[(&str, WordCategory)] = &[
    ("water", WordCategory::Noun),
    ("food", WordCategory::Noun),
    ("house", WordCategory::Noun),
    ("friend", WordCategory::Noun),
    ("family", WordCategory::Noun),
    ("day", WordCategory::Noun),
    ("name", WordCategory::Noun),
    ("hand", WordCategory::Noun),
    ("eat", WordCategory::Verb),
    ("go", WordCategory::Verb),
    ("see", WordCategory::Verb),
    ("want", WordCategory::Verb),
    ("good", WordCategory::Adjective),
    ("big", WordCategory::Adjective),
    ("hot", WordCategory::Adjective),
    ("and", WordCategory::FunctionWord),
];

const INTERMEDIATE: &[(&str, WordCategory)] = &[
    ("journey", WordCategory::Noun),
    ("opinion", WordCategory::Noun),
    ("market", WordCategory::Noun),
    ("weather", WordCategory::Noun),
    ("health", WordCategory::Noun),
    ("neighbour", WordCategory::Noun),
    ("decide", WordCategory::Verb),
    ("explain", WordCategory::Verb),
    ("improve", WordCategory::Verb),
    ("borrow", WordCategory::Verb),
    ("expensive", WordCategory::Adjective),
    ("careful", WordCategory::Adjective),
    ("usually", WordCategory::Adverb),
    ("although", WordCategory::FunctionWord),
];

const ADVANCED: &[(&str, WordCategory)] = &[
    ("consequence", WordCategory::Noun),
    ("framework", WordCategory::Noun),
    ("insight", WordCategory::Noun),
    ("threshold", WordCategory::Noun),
    ("undermine", WordCategory::Verb),
    ("acknowledge", WordCategory::Verb),
    ("foster", WordCategory::Verb),
    ("ambiguous", WordCategory::Adjective),
    ("thorough", WordCategory::Adjective),
    ("reluctant", WordCategory::Adjective),
    ("nevertheless", WordCategory::FunctionWord),
    ("whereas", WordCategory::FunctionWord),
];

/// English words for `level`, with the English word doubling as its translation.
pub fn emergency_words(level: ProficiencyLevel) -> Vec<WordCandidate> {
    let list = match level {
        ProficiencyLevel::A1 | ProficiencyLevel::A2 => BEGINNER,
        ProficiencyLevel::B1 | ProficiencyLevel::B2 => INTERMEDIATE,
        ProficiencyLevel::C1 | ProficiencyLevel::C2 => ADVANCED,
    };
    list.iter()
        .map(|(word, category)| WordCandidate::new(*word, *word).with_category(*category))
        .collect()
}
