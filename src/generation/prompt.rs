//! Prompt templates for learner batches, fallback cache refreshes and translation.

use crate::language::LanguageProfile;
use crate::types::{ProficiencyLevel, WordCandidate};
use std::fmt::Write;

/// Target part-of-speech distribution, in percent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CategoryMix {
    pub nouns: u8,
    pub verbs: u8,
    pub adjectives: u8,
    pub function_words: u8,
}

impl CategoryMix {
    pub fn for_level(level: ProficiencyLevel) -> Self {
        match level {
            ProficiencyLevel::A1 | ProficiencyLevel::A2 => Self {
                nouns: 50,
                verbs: 25,
                adjectives: 15,
                function_words: 10,
            },
            ProficiencyLevel::B1 | ProficiencyLevel::B2 => Self {
                nouns: 40,
                verbs: 30,
                adjectives: 20,
                function_words: 10,
            },
            ProficiencyLevel::C1 | ProficiencyLevel::C2 => Self {
                nouns: 35,
                verbs: 30,
                adjectives: 25,
                function_words: 10,
            },
        }
    }
}

/// Everything a learner-facing generation prompt is built from.
#[derive(Debug, Clone, Copy)]
pub struct WordRequest<'a> {
    pub learning_language: &'a str,
    pub native_language: &'a str,
    pub level: ProficiencyLevel,
    pub count: usize,
    /// Originals already in the learner's scope.
    pub existing: &'a [String],
    pub batch_number: u32,
}

const RESPONSE_FORMAT: &str = "Respond with ONLY a JSON array, no commentary. Each element must be \
an object: {\"original\": \"<word in the learning language>\", \"translation\": \"<meaning in the \
native language>\", \"category\": \"noun|verb|adjective|adverb|function_word|phrase\"}.";

pub fn system_prompt() -> String {
    format!(
        "You are a meticulous vocabulary curriculum designer for language learners. \
         Every word you propose is real, correctly spelled and correctly translated. {}",
        RESPONSE_FORMAT
    )
}

/// Learner-facing batch prompt.
///
/// Vocabularies up to `exclusion_list_limit` words are listed verbatim; larger ones get
/// a distinctness instruction instead of the list.
pub fn learner_prompt(request: &WordRequest<'_>, exclusion_list_limit: usize) -> String {
    let profile = LanguageProfile::lookup(request.learning_language);
    let mix = CategoryMix::for_level(request.level);
    let mut prompt = String::new();

    let _ = writeln!(
        prompt,
        "Generate exactly {} unique {} vocabulary words for a {} speaker at CEFR level {} ({}).",
        request.count,
        request.learning_language,
        request.native_language,
        request.level,
        request.level.describe()
    );
    let _ = writeln!(
        prompt,
        "This is batch {} of the learner's course; words must be distinct from each other.",
        request.batch_number
    );
    let _ = writeln!(
        prompt,
        "Category distribution: about {}% nouns, {}% verbs, {}% adjectives/adverbs, {}% function words.",
        mix.nouns, mix.verbs, mix.adjectives, mix.function_words
    );

    if request.existing.is_empty() {
        let _ = writeln!(prompt, "The learner has no vocabulary yet; start with core high-frequency words.");
    } else if request.existing.len() <= exclusion_list_limit {
        let _ = writeln!(
            prompt,
            "Do NOT include any of these words the learner already has (or their inflected forms): {}",
            request.existing.join(", ")
        );
    } else {
        let _ = writeln!(
            prompt,
            "The learner already knows {} words at this level. Generate maximally distinct, less common \
             and more advanced vocabulary; avoid basic high-frequency words, inflected forms and \
             spelling variants of common words.",
            request.existing.len()
        );
    }

    push_orthography(&mut prompt, profile);
    prompt
}

/// Fallback-cache prompt: adds language-family metadata instead of learner history.
pub fn cultural_prompt(request: &WordRequest<'_>) -> String {
    let profile = LanguageProfile::lookup(request.learning_language);
    let mut prompt = String::new();

    let _ = writeln!(
        prompt,
        "Build a reusable {} word list of {} entries for {} speakers at CEFR level {} ({}).",
        request.learning_language,
        request.count,
        request.native_language,
        request.level,
        request.level.describe()
    );
    let _ = writeln!(prompt, "Language profile:");
    let _ = writeln!(prompt, "- Script: {}", profile.script.name());
    let _ = writeln!(prompt, "- Word order: {}", profile.word_order);
    let _ = writeln!(
        prompt,
        "- Grammatical gender: {}",
        if profile.grammatical_gender { "yes, mark it through the article" } else { "no" }
    );
    let _ = writeln!(
        prompt,
        "- Tonal: {}",
        if profile.tonal { "yes, keep tone marks exact" } else { "no" }
    );
    if !profile.regional_variants.is_empty() {
        let _ = writeln!(
            prompt,
            "- Regional variants: {}; prefer the most widely understood form",
            profile.regional_variants.join(", ")
        );
    }
    let _ = writeln!(
        prompt,
        "Favour culturally grounded everyday words (food, family, places, customs) alongside core vocabulary."
    );
    if !request.existing.is_empty() {
        let _ = writeln!(prompt, "Skip these words: {}", request.existing.join(", "));
    }

    push_orthography(&mut prompt, profile);
    prompt
}

/// Translate-only prompt for the emergency English word set.
pub fn translation_prompt(words: &[WordCandidate], learning_language: &str, native_language: &str) -> String {
    let profile = LanguageProfile::lookup(learning_language);
    let list = words
        .iter()
        .map(|w| w.original.as_str())
        .collect::<Vec<_>>()
        .join(", ");
    let mut prompt = format!(
        "Translate each of these English words into {}: {}.\n\
         For each word return \"original\" as the {} word and \"translation\" as its meaning in {}. \
         Keep the input order and do not add or drop words.\n",
        learning_language, list, learning_language, native_language
    );
    push_orthography(&mut prompt, profile);
    prompt
}

fn push_orthography(prompt: &mut String, profile: &LanguageProfile) {
    if let Some(orthography) = profile.orthography {
        let _ = writeln!(prompt, "Orthography: {}", orthography);
    }
    let _ = write!(prompt, "{}", RESPONSE_FORMAT);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request<'a>(existing: &'a [String]) -> WordRequest<'a> {
        WordRequest {
            learning_language: "French",
            native_language: "English",
            level: ProficiencyLevel::A2,
            count: 40,
            existing,
            batch_number: 3,
        }
    }

    #[test]
    fn test_learner_prompt_lists_small_vocabularies() {
        let existing = vec!["chat".to_string(), "chien".to_string()];
        let prompt = learner_prompt(&request(&existing), 200);
        assert!(prompt.contains("exactly 40"));
        assert!(prompt.contains("chat, chien"));
        assert!(prompt.contains("50% nouns"));
        assert!(prompt.contains("le/la"));
    }

    #[test]
    fn test_learner_prompt_switches_to_distinctness_for_large_vocabularies() {
        let existing: Vec<String> = (0..201).map(|i| format!("mot{}", i)).collect();
        let prompt = learner_prompt(&request(&existing), 200);
        assert!(!prompt.contains("mot17"));
        assert!(prompt.contains("maximally distinct"));
        assert!(prompt.contains("201 words"));
    }

    #[test]
    fn test_cultural_prompt_carries_language_profile() {
        let mut req = request(&[]);
        req.learning_language = "Chinese";
        let prompt = cultural_prompt(&req);
        assert!(prompt.contains("Script: Chinese characters"));
        assert!(prompt.contains("Tonal: yes"));
        assert!(prompt.contains("Regional variants"));
    }

    #[test]
    fn test_translation_prompt_has_no_generation_framing() {
        let words = vec![WordCandidate::new("water", "water")];
        let prompt = translation_prompt(&words, "Spanish", "English");
        assert!(prompt.starts_with("Translate each of these English words into Spanish: water."));
        assert!(!prompt.contains("CEFR"));
    }
}
