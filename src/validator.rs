//! Batch Integrity Validator
//!
//! A batch may be shown to a learner only when it holds exactly the configured number
//! of words. Review of completed or learned words is exempt.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchValidation {
    pub batch_number: u32,
    pub is_valid: bool,
    pub expected_words: usize,
    pub actual_words: usize,
}

/// How a consumer intends to show a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExposureMode {
    Learning,
    Review,
}

pub fn validate_batch(actual_words: usize, batch_number: u32, words_per_batch: usize) -> BatchValidation {
    BatchValidation {
        batch_number,
        is_valid: actual_words == words_per_batch,
        expected_words: words_per_batch,
        actual_words,
    }
}

impl BatchValidation {
    pub fn missing_words(&self) -> usize {
        self.expected_words.saturating_sub(self.actual_words)
    }

    pub fn may_expose(&self, mode: ExposureMode) -> bool {
        match mode {
            ExposureMode::Learning => self.is_valid,
            ExposureMode::Review => true,
        }
    }
}
