//! Layered configuration: workspace file, environment overlay and env var overrides

use crate::integration::test_utils::{json_words, with_isolated_env, ScriptedProvider};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;
use vocab_batch::clock::ManualClock;
use vocab_batch::config::ConfigLoader;
use vocab_batch::provider::ProviderType;
use vocab_batch::repository::InMemoryWordRepository;
use vocab_batch::{BatchRequest, BatchScope, ConfigError, GenerationService, ProficiencyLevel};

fn write_config(workspace: &Path, name: &str, body: &str) {
    let dir = workspace.join("config");
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join(name), body).unwrap();
}

const BASE: &str = r#"
[batch]
words_per_batch = 10

[provider]
provider_type = "ollama"
model = "llama3"
"#;

#[tokio::test]
async fn test_workspace_config_drives_batch_size() {
    let test_dir = TempDir::new().unwrap();
    let workspace = test_dir.path().join("ws");
    write_config(&workspace, "config.toml", BASE);

    let config = with_isolated_env(&test_dir, &[], || ConfigLoader::load(&workspace)).unwrap();
    assert_eq!(config.batch.words_per_batch, 10);
    let provider_config = config.provider.as_ref().unwrap();
    assert_eq!(provider_config.provider_type, ProviderType::Ollama);
    assert_eq!(provider_config.model, "llama3");

    let provider = Arc::new(ScriptedProvider::always(Ok(json_words("wort", 40))));
    let service = GenerationService::from_config(
        &config,
        provider.clone(),
        Arc::new(InMemoryWordRepository::new()),
        Arc::new(ManualClock::default()),
    )
    .unwrap();

    let outcome = service
        .generate_next_batch(BatchRequest::new(BatchScope::new(
            "learner-1",
            "German",
            "English",
            ProficiencyLevel::A1,
        )))
        .await
        .unwrap();
    assert_eq!(outcome.final_batch_size, 10);
    assert!(outcome.is_complete);
    assert_eq!(provider.calls(), 1);
}

#[test]
fn test_environment_overlay_file_takes_precedence() {
    let test_dir = TempDir::new().unwrap();
    let workspace = test_dir.path().join("ws");
    write_config(&workspace, "config.toml", BASE);
    write_config(&workspace, "test.toml", "[batch]\nwords_per_batch = 25\n");

    let config = with_isolated_env(&test_dir, &[("VOCAB_ENV", "test")], || {
        ConfigLoader::load(&workspace)
    })
    .unwrap();
    assert_eq!(config.batch.words_per_batch, 25);

    // Without the overlay selected, the base file wins
    let config = with_isolated_env(&test_dir, &[], || ConfigLoader::load(&workspace)).unwrap();
    assert_eq!(config.batch.words_per_batch, 10);
}

#[test]
fn test_environment_variable_overrides_files() {
    let test_dir = TempDir::new().unwrap();
    let workspace = test_dir.path().join("ws");
    write_config(&workspace, "config.toml", BASE);

    let config = with_isolated_env(
        &test_dir,
        &[("VOCAB__BATCH__WORDS_PER_BATCH", "40")],
        || ConfigLoader::load(&workspace),
    )
    .unwrap();
    assert_eq!(config.batch.words_per_batch, 40);
}

#[test]
fn test_defaults_apply_without_any_config_file() {
    let test_dir = TempDir::new().unwrap();
    let workspace = test_dir.path().join("empty");
    fs::create_dir_all(&workspace).unwrap();

    let config = with_isolated_env(&test_dir, &[], || ConfigLoader::load(&workspace)).unwrap();
    assert_eq!(config.batch.words_per_batch, 50);
    assert!(config.provider.is_none());
}

#[test]
fn test_zero_batch_size_is_rejected() {
    let test_dir = TempDir::new().unwrap();
    let workspace = test_dir.path().join("ws");
    write_config(&workspace, "config.toml", "[batch]\nwords_per_batch = 0\n");

    let result = with_isolated_env(&test_dir, &[], || ConfigLoader::load(&workspace));
    match result {
        Err(ConfigError::Validation(message)) => assert!(message.contains("words_per_batch")),
        other => panic!("expected validation error, got {:?}", other.map(|c| c.batch.words_per_batch)),
    }
}
