//! Extraction of the word array from free-form provider output.

use crate::error::ProviderError;
use crate::types::WordCandidate;
use serde_json::Value;
use tracing::debug;

/// Strip markdown code fences from a response
fn strip_markdown_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let clean = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .unwrap_or(trimmed);
    let clean = clean.strip_suffix("```").unwrap_or(clean);
    clean.trim()
}

/// Balanced `[...]` fragment beginning at byte offset `start`, ignoring brackets inside strings.
fn balanced_array_at(text: &str, start: usize) -> Option<&str> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escape_next = false;

    for (offset, c) in text[start..].char_indices() {
        if escape_next {
            escape_next = false;
            continue;
        }
        if in_string {
            match c {
                '\\' => escape_next = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '[' => depth += 1,
            ']' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(&text[start..=start + offset]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Repair the usual LLM JSON slips: smart quotes and trailing commas.
fn fix_json_issues(json: &str) -> String {
    let mut fixed = json
        .replace(['\u{201C}', '\u{201D}'], "\"")
        .replace(['\u{2018}', '\u{2019}'], "'");

    for (from, to) in [(",]", "]"), (",}", "}"), (", ]", "]"), (", }", "}")] {
        fixed = fixed.replace(from, to);
    }
    fixed
}

fn parse_array(fragment: &str) -> Option<Vec<Value>> {
    serde_json::from_str::<Vec<Value>>(fragment)
        .ok()
        .or_else(|| serde_json::from_str::<Vec<Value>>(&fix_json_issues(fragment)).ok())
}

/// Parse the first well-formed JSON array in `response` into word candidates.
///
/// Entries missing `original` or `translation` are skipped. Fails with
/// `Malformed` when no array parses, or when no entry is usable, and with
/// `Empty` when the array has no elements.
pub fn parse_word_array(response: &str) -> Result<Vec<WordCandidate>, ProviderError> {
    let clean = strip_markdown_fences(response);

    let array = clean
        .match_indices('[')
        .filter_map(|(start, _)| balanced_array_at(clean, start))
        .find_map(parse_array)
        .ok_or_else(|| {
            let preview: String = clean.chars().take(120).collect();
            ProviderError::malformed(format!("No JSON array found in response: {}", preview))
        })?;

    if array.is_empty() {
        return Err(ProviderError::empty("Provider returned an empty word list"));
    }

    let total = array.len();
    let words: Vec<WordCandidate> = array
        .into_iter()
        .filter_map(|value| serde_json::from_value::<WordCandidate>(value).ok())
        .filter(|word| !word.original.trim().is_empty() && !word.translation.trim().is_empty())
        .collect();

    if words.is_empty() {
        return Err(ProviderError::malformed(format!(
            "None of the {} array entries had original and translation fields",
            total
        )));
    }
    if words.len() < total {
        debug!(total, usable = words.len(), "Skipped unusable word entries");
    }
    Ok(words)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProviderErrorKind;
    use crate::types::WordCategory;

    #[test]
    fn test_parses_plain_array() {
        let words = parse_word_array(
            r#"[{"original": "chat", "translation": "cat", "category": "noun"},
                {"original": "manger", "translation": "to eat", "category": "verb"}]"#,
        )
        .unwrap();
        assert_eq!(words.len(), 2);
        assert_eq!(words[1].category, Some(WordCategory::Verb));
    }

    #[test]
    fn test_parses_fenced_array_with_prose() {
        let response = "Here are your words:\n```json\n[{\"original\": \"perro\", \"translation\": \"dog\"}]\n```";
        let words = parse_word_array(response).unwrap();
        assert_eq!(words[0].original, "perro");
    }

    #[test]
    fn test_skips_bracketed_prose_before_array() {
        let response = "[Note: generated] [{\"word\": \"Haus\", \"translation\": \"house\"}]";
        let words = parse_word_array(response).unwrap();
        assert_eq!(words[0].original, "Haus");
    }

    #[test]
    fn test_repairs_trailing_commas_and_smart_quotes() {
        let response = "[{\u{201C}original\u{201D}: \u{201C}sol\u{201D}, \u{201C}translation\u{201D}: \u{201C}sun\u{201D}},]";
        let words = parse_word_array(response).unwrap();
        assert_eq!(words[0].translation, "sun");
    }

    #[test]
    fn test_brackets_inside_strings_are_ignored() {
        let response = r#"[{"original": "a]b", "translation": "[x]"}]"#;
        let words = parse_word_array(response).unwrap();
        assert_eq!(words[0].original, "a]b");
    }

    #[test]
    fn test_missing_array_is_malformed() {
        let err = parse_word_array("I cannot help with that.").unwrap_err();
        assert_eq!(err.kind, ProviderErrorKind::Malformed);
    }

    #[test]
    fn test_empty_array_is_empty_result() {
        let err = parse_word_array("```json\n[]\n```").unwrap_err();
        assert_eq!(err.kind, ProviderErrorKind::Empty);
    }

    #[test]
    fn test_entries_without_fields_are_malformed() {
        let err = parse_word_array(r#"[{"foo": 1}, "bar"]"#).unwrap_err();
        assert_eq!(err.kind, ProviderErrorKind::Malformed);
    }

    #[test]
    fn test_partial_entries_are_skipped() {
        let words =
            parse_word_array(r#"[{"original": "uno", "translation": "one"}, {"original": "dos"}]"#)
                .unwrap();
        assert_eq!(words.len(), 1);
    }
}
