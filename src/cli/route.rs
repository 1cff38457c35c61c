//! CLI route: single route table and run context. Dispatches to domain services and presentation.

use crate::clock::SystemClock;
use crate::config::{ConfigLoader, VocabConfig};
use crate::error::CliError;
use crate::fallback::StaticCatalog;
use crate::orchestrator::GenerationService;
use crate::provider::{ModelProviderClient, ProviderFactory, UnconfiguredProvider};
use crate::repository::InMemoryWordRepository;
use crate::types::{BatchRequest, BatchScope, ProficiencyLevel};
use crate::validator::validate_batch;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

use crate::cli::parse::Commands;
use crate::cli::presentation::{
    format_catalog_summary, format_catalog_words, format_outcome_json, format_outcome_text,
    format_validation_json, format_validation_text,
};

/// Runtime context for CLI execution: workspace and loaded configuration.
pub struct RunContext {
    workspace_root: PathBuf,
    config: VocabConfig,
}

impl RunContext {
    /// Create run context from workspace root and optional config path. Uses ConfigLoader only.
    pub fn new(workspace_root: PathBuf, config_path: Option<PathBuf>) -> Result<Self, CliError> {
        let config = match config_path {
            Some(ref path) => ConfigLoader::load_from_file(path)?,
            None => ConfigLoader::load(&workspace_root)?,
        };
        Ok(Self {
            workspace_root,
            config,
        })
    }

    pub fn config(&self) -> &VocabConfig {
        &self.config
    }

    pub fn execute(&self, command: &Commands) -> Result<String, CliError> {
        match command {
            Commands::Generate {
                learner,
                language,
                native,
                level,
                batch,
                store,
                json,
            } => {
                let scope = BatchScope::new(learner.as_str(), language.as_str(), native.as_str(), *level);
                let request = BatchRequest {
                    scope,
                    batch_number: *batch,
                };
                let store_path = store.clone().unwrap_or_else(|| self.default_store_path());
                self.handle_generate(request, &store_path, *json)
            }
            Commands::Validate { count, batch, json } => {
                let validation = validate_batch(*count, *batch, self.config.batch.words_per_batch);
                if *json {
                    format_validation_json(&validation)
                } else {
                    Ok(format_validation_text(&validation))
                }
            }
            Commands::Catalog { language, level } => self.handle_catalog(language.as_deref(), *level),
            Commands::Config => self.handle_config(),
        }
    }

    fn default_store_path(&self) -> PathBuf {
        self.workspace_root.join(".vocab-batch").join("words.json")
    }

    fn provider(&self) -> Result<Arc<dyn ModelProviderClient>, CliError> {
        match &self.config.provider {
            Some(provider_config) => Ok(Arc::from(ProviderFactory::from_config(provider_config)?)),
            None => {
                warn!("No provider configured; only fallback sources are available");
                Ok(Arc::new(UnconfiguredProvider))
            }
        }
    }

    fn handle_generate(&self, request: BatchRequest, store_path: &Path, json: bool) -> Result<String, CliError> {
        let repository = Arc::new(InMemoryWordRepository::load(store_path)?);
        let service = GenerationService::from_config(
            &self.config,
            self.provider()?,
            repository.clone(),
            Arc::new(SystemClock),
        )?;

        let rt = tokio::runtime::Runtime::new()
            .map_err(|e| CliError::Runtime(format!("Failed to create runtime: {}", e)))?;
        let outcome = rt.block_on(service.generate_next_batch(request))?;

        if outcome.generated_count > 0 {
            repository.save(store_path)?;
            info!(path = %store_path.display(), words = repository.len(), "Word store saved");
        }

        if json {
            format_outcome_json(&outcome)
        } else {
            Ok(format_outcome_text(&outcome))
        }
    }

    fn handle_config(&self) -> Result<String, CliError> {
        let mut config = self.config.clone();
        if let Some(provider) = config.provider.as_mut() {
            if provider.api_key.is_some() {
                provider.api_key = Some("***".to_string());
            }
        }
        toml::to_string_pretty(&config)
            .map_err(|e| CliError::Output(format!("Failed to render configuration: {}", e)))
    }

    fn handle_catalog(&self, language: Option<&str>, level: Option<ProficiencyLevel>) -> Result<String, CliError> {
        let catalog = StaticCatalog::load(self.config.fallback.catalog_path.as_deref())?;
        match (language, level) {
            (Some(language), Some(level)) => Ok(format_catalog_words(&catalog, language, level)),
            (Some(_), None) => Err(CliError::Config(crate::error::ConfigError::Invalid(
                "--language requires --level".to_string(),
            ))),
            _ => Ok(format_catalog_summary(&catalog)),
        }
    }
}
