//! User-level config file source: $XDG_CONFIG_HOME/vocab-batch/config.toml (or the platform equivalent).

use config::builder::DefaultState;
use config::ConfigBuilder;
use config::File;
use directories::BaseDirs;
use std::path::PathBuf;
use tracing::debug;

/// Path to the user-level config file, when a home directory can be resolved.
pub fn global_config_path() -> Option<PathBuf> {
    BaseDirs::new().map(|dirs| dirs.config_dir().join("vocab-batch").join("config.toml"))
}

/// Add the user-level config file to the builder if it exists.
pub fn add_to_builder(builder: ConfigBuilder<DefaultState>) -> ConfigBuilder<DefaultState> {
    match global_config_path() {
        Some(path) if path.exists() => {
            let canonical = path.canonicalize().unwrap_or(path);
            builder.add_source(File::from(canonical).required(false))
        }
        Some(path) => {
            debug!(config_path = %path.display(), "No user-level configuration file");
            builder
        }
        None => builder,
    }
}
