//! CLI domain: parse, route, output, and presentation only.
//! No domain orchestration; single route table dispatches to domain services.

mod output;
mod parse;
mod presentation;
mod route;

pub use output::{exit_code, map_error};
pub use parse::{Cli, Commands};
pub use presentation::{
    format_catalog_summary, format_catalog_words, format_outcome_json, format_outcome_text,
    format_validation_json, format_validation_text,
};
pub use route::RunContext;
