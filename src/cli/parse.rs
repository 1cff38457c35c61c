//! CLI parse: clap types for vocab-batch. No behavior; definitions only.

use crate::types::ProficiencyLevel;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// vocab-batch - exactly-sized vocabulary batches for language learners
#[derive(Parser)]
#[command(name = "vocab-batch")]
#[command(about = "Generate exactly-sized vocabulary batches for language learners")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Workspace root; `config/` below it is searched for configuration
    #[arg(long, default_value = ".")]
    pub workspace: PathBuf,

    /// Configuration file path (overrides default config loading)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging (default: off)
    #[arg(long, default_value = "false")]
    pub verbose: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Fill the next vocabulary batch for a learner
    Generate {
        /// Learner identifier
        #[arg(long)]
        learner: String,

        /// Language being learned
        #[arg(long)]
        language: String,

        /// Learner's native language
        #[arg(long, default_value = "English")]
        native: String,

        /// Proficiency level (A1-C2)
        #[arg(long)]
        level: ProficiencyLevel,

        /// Batch to fill (default: the open batch, or the next one)
        #[arg(long)]
        batch: Option<u32>,

        /// Word store snapshot (default: <workspace>/.vocab-batch/words.json)
        #[arg(long)]
        store: Option<PathBuf>,

        /// Print the outcome as JSON
        #[arg(long)]
        json: bool,
    },

    /// Check whether a batch of the given size may be shown to a learner
    Validate {
        /// Words currently in the batch
        #[arg(long)]
        count: usize,

        /// Batch number
        #[arg(long)]
        batch: u32,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// List the static fallback catalog
    Catalog {
        /// Show the words for this language (requires --level)
        #[arg(long)]
        language: Option<String>,

        /// Proficiency level to show
        #[arg(long)]
        level: Option<ProficiencyLevel>,
    },

    /// Print the effective configuration as TOML (API keys masked)
    Config,
}
