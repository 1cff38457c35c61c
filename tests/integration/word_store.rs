//! JSON word store snapshots and the CLI run context

use crate::integration::test_utils::{build_service, catalog, json_words, with_isolated_env, ScriptedProvider};
use std::sync::Arc;
use tempfile::TempDir;
use vocab_batch::cli::{Commands, RunContext};
use vocab_batch::repository::{InMemoryWordRepository, WordRepository};
use vocab_batch::{BatchOutcome, BatchRequest, BatchScope, GenerationMethod, ProficiencyLevel};

fn scope() -> BatchScope {
    BatchScope::new("learner-1", "Italian", "English", ProficiencyLevel::A1)
}

#[tokio::test]
async fn test_snapshot_carries_known_words_into_the_next_run() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("store").join("words.json");

    let repo = Arc::new(InMemoryWordRepository::load(&path).unwrap());
    assert!(repo.is_empty());
    let provider = Arc::new(ScriptedProvider::always(Ok(json_words("parola", 60))));
    let t = build_service(provider, repo.clone(), catalog("Italian", ProficiencyLevel::A1, &[]));
    let first = t.service.generate_next_batch(BatchRequest::new(scope())).await.unwrap();
    assert!(first.is_complete);
    repo.save(&path).unwrap();

    // A fresh process reloads the snapshot and continues with batch two
    let reloaded = Arc::new(InMemoryWordRepository::load(&path).unwrap());
    assert_eq!(reloaded.len(), 50);
    let provider = Arc::new(ScriptedProvider::always(Ok(json_words("parola", 120))));
    let t = build_service(provider.clone(), reloaded.clone(), catalog("Italian", ProficiencyLevel::A1, &[]));
    let second = t.service.generate_next_batch(BatchRequest::new(scope())).await.unwrap();

    assert_eq!(second.batch_number, 2);
    assert!(second.is_complete);
    assert_eq!(second.duplicates_skipped, 50);
    assert!(provider.prompts()[0].contains("parola0"));
    assert_eq!(reloaded.count(&scope(), None, false).await.unwrap(), 100);
}

#[test]
fn test_cli_generate_then_validate_without_provider() {
    let test_dir = TempDir::new().unwrap();
    let workspace = test_dir.path().join("ws");
    std::fs::create_dir_all(&workspace).unwrap();

    let (generated, validation) = with_isolated_env(&test_dir, &[], || {
        let context = RunContext::new(workspace.clone(), None).unwrap();
        let generated = context
            .execute(&Commands::Generate {
                learner: "learner-1".to_string(),
                language: "Spanish".to_string(),
                native: "English".to_string(),
                level: ProficiencyLevel::A1,
                batch: None,
                store: None,
                json: true,
            })
            .unwrap();
        let outcome: BatchOutcome = serde_json::from_str(&generated).unwrap();
        let validation = context
            .execute(&Commands::Validate {
                count: outcome.final_batch_size,
                batch: outcome.batch_number,
                json: true,
            })
            .unwrap();
        (outcome, validation)
    });

    // The built-in Spanish A1 catalog holds fewer words than a batch
    assert_eq!(generated.generation_method, GenerationMethod::Fallback);
    assert_eq!(generated.batch_number, 1);
    assert_eq!(generated.final_batch_size, 30);
    assert!(!generated.is_complete);
    assert!(validation.contains("\"is_valid\": false"));

    let store = workspace.join(".vocab-batch").join("words.json");
    let saved = InMemoryWordRepository::load(&store).unwrap();
    assert_eq!(saved.len(), 30);
}
