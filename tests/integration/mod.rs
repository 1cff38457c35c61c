//! Integration tests for the vocabulary batch engine

mod batch_generation;
mod config_loading;
mod fallback_tiers;
mod generation_lock;
mod word_store;

pub mod test_utils;
