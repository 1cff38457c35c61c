//! Configuration loading facade.

use super::sources::{environment, global_file, workspace_file};
use super::VocabConfig;
use crate::error::ConfigError;
use config::{Config, File};
use std::path::{Path, PathBuf};
use tracing::debug;

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load layered configuration for a workspace and validate it.
    pub fn load(workspace_root: &Path) -> Result<VocabConfig, ConfigError> {
        let builder = Config::builder();
        let builder = global_file::add_to_builder(builder);
        let builder = workspace_file::add_to_builder(builder, workspace_root);
        let builder = environment::add_to_builder(builder);

        let config: VocabConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        debug!(
            workspace_root = %workspace_root.display(),
            words_per_batch = config.batch.words_per_batch,
            provider_configured = config.provider.is_some(),
            "Configuration loaded"
        );
        Ok(config)
    }

    /// Load a single explicit config file, without layering.
    pub fn load_from_file(path: &Path) -> Result<VocabConfig, ConfigError> {
        let config: VocabConfig = Config::builder()
            .add_source(File::from(path.to_path_buf()))
            .build()?
            .try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn global_config_path() -> Option<PathBuf> {
        global_file::global_config_path()
    }
}
