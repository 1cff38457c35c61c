//! CLI presentation: text and json formatters per command.

use crate::error::CliError;
use crate::fallback::StaticCatalog;
use crate::types::{BatchOutcome, OutcomeStatus, ProficiencyLevel};
use crate::validator::{BatchValidation, ExposureMode};
use comfy_table::presets::UTF8_BORDERS_ONLY;
use comfy_table::Table;
use owo_colors::OwoColorize;

fn to_json<T: serde::Serialize>(value: &T) -> Result<String, CliError> {
    serde_json::to_string_pretty(value).map_err(|e| CliError::Output(e.to_string()))
}

fn status_label(status: OutcomeStatus) -> String {
    match status {
        OutcomeStatus::Completed => format!("{}", "completed".green()),
        OutcomeStatus::AlreadyComplete => format!("{}", "already complete".green()),
        OutcomeStatus::Partial => format!("{}", "partial".yellow()),
        OutcomeStatus::NoWordsAvailable => format!("{}", "no words available".red()),
        OutcomeStatus::RepositoryUnavailable => format!("{}", "repository unavailable".red()),
    }
}

pub fn format_outcome_json(outcome: &BatchOutcome) -> Result<String, CliError> {
    to_json(outcome)
}

pub fn format_outcome_text(outcome: &BatchOutcome) -> String {
    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["Field", "Value"]);
    table.add_row(vec!["Batch".to_string(), outcome.batch_number.to_string()]);
    table.add_row(vec!["Status".to_string(), status_label(outcome.status)]);
    table.add_row(vec!["Method".to_string(), outcome.generation_method.to_string()]);
    table.add_row(vec!["Generated".to_string(), outcome.generated_count.to_string()]);
    table.add_row(vec!["Duplicates skipped".to_string(), outcome.duplicates_skipped.to_string()]);
    if outcome.persistence_failures > 0 {
        table.add_row(vec![
            "Persistence failures".to_string(),
            format!("{}", outcome.persistence_failures.red()),
        ]);
    }
    table.add_row(vec!["Batch size".to_string(), outcome.final_batch_size.to_string()]);
    table.add_row(vec!["Complete".to_string(), outcome.is_complete.to_string()]);
    table.add_row(vec!["Backfilled".to_string(), outcome.backfilled.to_string()]);
    table.add_row(vec![
        "Quota".to_string(),
        format!(
            "{} used, ~{} left{} (resets {})",
            outcome.quota_status.request_count,
            outcome.quota_status.remaining_estimate,
            if outcome.quota_status.exhausted { ", exhausted" } else { "" },
            outcome.quota_status.reset_at.format("%Y-%m-%d %H:%M UTC")
        ),
    ]);
    table.to_string()
}

pub fn format_validation_json(validation: &BatchValidation) -> Result<String, CliError> {
    to_json(validation)
}

pub fn format_validation_text(validation: &BatchValidation) -> String {
    if validation.is_valid {
        format!(
            "Batch {}: {} ({} / {} words)",
            validation.batch_number,
            "valid".green(),
            validation.actual_words,
            validation.expected_words
        )
    } else {
        let review = if validation.may_expose(ExposureMode::Review) {
            "; review mode only"
        } else {
            ""
        };
        format!(
            "Batch {}: {} ({} / {} words, {} missing){}",
            validation.batch_number,
            "invalid".red(),
            validation.actual_words,
            validation.expected_words,
            validation.missing_words(),
            review
        )
    }
}

pub fn format_catalog_summary(catalog: &StaticCatalog) -> String {
    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["Language", "Level", "Words"]);
    for (language, level, count) in catalog.summary() {
        table.add_row(vec![language, level.to_string(), count.to_string()]);
    }
    table.to_string()
}

pub fn format_catalog_words(catalog: &StaticCatalog, language: &str, level: ProficiencyLevel) -> String {
    let words = catalog.words(language, level);
    if words.is_empty() {
        return format!("No catalog words for {} {}", language, level);
    }
    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["Original", "Translation", "Category"]);
    for word in words {
        let category = word
            .category
            .map(|c| format!("{:?}", c).to_lowercase())
            .unwrap_or_else(|| "-".to_string());
        table.add_row(vec![word.original.clone(), word.translation.clone(), category]);
    }
    format!("{} {} ({} words)\n{}", language.bold(), level, words.len(), table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{GenerationMethod, QuotaStatus};
    use crate::validator::validate_batch;
    use chrono::Utc;

    fn outcome() -> BatchOutcome {
        BatchOutcome {
            batch_number: 2,
            generated_count: 48,
            duplicates_skipped: 0,
            persistence_failures: 0,
            final_batch_size: 48,
            is_complete: false,
            generation_method: GenerationMethod::Fallback,
            backfilled: false,
            status: OutcomeStatus::Partial,
            quota_status: QuotaStatus {
                request_count: 3,
                remaining_estimate: 1497,
                exhausted: true,
                reset_at: Utc::now(),
            },
        }
    }

    #[test]
    fn test_outcome_json_uses_lowercase_method() {
        let json = format_outcome_json(&outcome()).unwrap();
        assert!(json.contains("\"generation_method\": \"fallback\""));
        assert!(json.contains("\"status\": \"partial\""));
    }

    #[test]
    fn test_outcome_text_lists_fields() {
        let text = format_outcome_text(&outcome());
        assert!(text.contains("Batch size"));
        assert!(text.contains("exhausted"));
        assert!(!text.contains("Persistence failures"));
    }

    #[test]
    fn test_validation_text() {
        assert!(format_validation_text(&validate_batch(50, 1, 50)).contains("50 / 50"));
        assert!(format_validation_text(&validate_batch(48, 1, 50)).contains("2 missing"));
    }

    #[test]
    fn test_catalog_words_for_unknown_key() {
        let catalog = StaticCatalog::empty();
        assert_eq!(
            format_catalog_words(&catalog, "Klingon", ProficiencyLevel::A1),
            "No catalog words for Klingon A1"
        );
    }
}
