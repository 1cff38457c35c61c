//! CLI output: error mapping from domain errors to stable CLI surface.

use crate::error::CliError;

/// Map domain/service errors to a string for CLI output.
pub fn map_error(e: &CliError) -> String {
    e.to_string()
}

/// Process exit code for a failed command. Lock contention gets its own code
/// so scripts can retry it.
pub fn exit_code(e: &CliError) -> i32 {
    match e {
        CliError::Generation(_) => 2,
        _ => 1,
    }
}
