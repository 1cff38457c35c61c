//! End-to-end batch generation against the in-memory word store

use crate::integration::test_utils::{build_service, catalog, json_array, json_words, ScriptedProvider};
use chrono::Duration;
use std::collections::HashSet;
use std::sync::Arc;
use vocab_batch::repository::{InMemoryWordRepository, WordRepository};
use vocab_batch::{
    BatchRequest, BatchScope, GenerationMethod, OutcomeStatus, ProficiencyLevel, ProviderError,
    VocabularyWord, WordCandidate,
};

fn scope() -> BatchScope {
    BatchScope::new("learner-1", "French", "English", ProficiencyLevel::A1)
}

#[tokio::test]
async fn test_duplicates_are_removed_and_batch_truncated_to_size() {
    // Three words already learned in an earlier batch
    let repo = Arc::new(InMemoryWordRepository::with_words(
        ["chat", "chien", "maison"]
            .iter()
            .map(|w| VocabularyWord::from_candidate(&scope(), 1, WordCandidate::new(*w, "x"))),
    ));

    // 60 candidates: 55 new words plus 5 case variants of the existing three
    let mut reply: Vec<String> = (0..55).map(|i| format!("mot{}", i)).collect();
    reply.extend(["Chat", "CHIEN", "maison", "chat", "Maison"].iter().map(|s| s.to_string()));
    let provider = Arc::new(ScriptedProvider::always(Ok(json_array(&reply))));
    let t = build_service(provider.clone(), repo.clone(), catalog("French", ProficiencyLevel::A1, &[]));

    let outcome = t
        .service
        .generate_next_batch(BatchRequest::for_batch(scope(), 2))
        .await
        .unwrap();

    assert_eq!(outcome.generated_count, 50);
    assert_eq!(outcome.final_batch_size, 50);
    assert!(outcome.is_complete);
    assert_eq!(outcome.generation_method, GenerationMethod::Ai);
    assert_eq!(outcome.duplicates_skipped, 5);
    assert!(!outcome.backfilled);
    assert_eq!(provider.calls(), 1);
    assert_eq!(repo.count(&scope(), Some(2), false).await.unwrap(), 50);
    // Existing words were listed to the provider
    assert!(provider.prompts()[0].contains("chat, chien, maison"));
}

#[tokio::test]
async fn test_consecutive_batches_never_repeat_a_word() {
    let repo = Arc::new(InMemoryWordRepository::new());
    let mut second: Vec<String> = (0..30).map(|i| format!("MOT{}", i)).collect();
    second.extend((0..60).map(|i| format!("neu{}", i)));
    let provider = Arc::new(ScriptedProvider::new(
        vec![Ok(json_words("mot", 60)), Ok(json_array(&second))],
        Err(ProviderError::transport("script exhausted")),
    ));
    let t = build_service(provider.clone(), repo.clone(), catalog("French", ProficiencyLevel::A1, &[]));

    let first = t.service.generate_next_batch(BatchRequest::new(scope())).await.unwrap();
    let next = t.service.generate_next_batch(BatchRequest::new(scope())).await.unwrap();

    assert_eq!(first.batch_number, 1);
    assert_eq!(next.batch_number, 2);
    assert!(first.is_complete && next.is_complete);
    assert_eq!(next.duplicates_skipped, 30);

    let words = repo.snapshot();
    assert_eq!(words.len(), 100);
    let unique: HashSet<String> = words.iter().map(|w| w.original.to_lowercase()).collect();
    assert_eq!(unique.len(), 100);
}

#[tokio::test]
async fn test_complete_batch_makes_no_provider_calls() {
    let repo = Arc::new(InMemoryWordRepository::new());
    let provider = Arc::new(ScriptedProvider::always(Ok(json_words("mot", 60))));
    let t = build_service(provider.clone(), repo, catalog("French", ProficiencyLevel::A1, &[]));

    t.service.generate_next_batch(BatchRequest::for_batch(scope(), 1)).await.unwrap();
    assert_eq!(provider.calls(), 1);

    for _ in 0..3 {
        let outcome = t
            .service
            .generate_next_batch(BatchRequest::for_batch(scope(), 1))
            .await
            .unwrap();
        assert_eq!(outcome.status, OutcomeStatus::AlreadyComplete);
        assert_eq!(outcome.generated_count, 0);
        assert!(outcome.is_complete);
    }
    assert_eq!(provider.calls(), 1);
}

#[tokio::test]
async fn test_partial_batch_is_closed_by_the_next_run() {
    let repo = Arc::new(InMemoryWordRepository::new());
    let catalog_words: Vec<String> = (0..48).map(|i| format!("cat{}", i)).collect();
    let catalog_refs: Vec<&str> = catalog_words.iter().map(String::as_str).collect();
    let provider = Arc::new(ScriptedProvider::new(
        vec![Err(ProviderError::classify("429 Too Many Requests"))],
        Ok(json_words("ai", 10)),
    ));
    let t = build_service(provider.clone(), repo.clone(), catalog("French", ProficiencyLevel::A1, &catalog_refs));

    let first = t.service.generate_next_batch(BatchRequest::new(scope())).await.unwrap();
    assert_eq!(first.final_batch_size, 48);
    assert_eq!(first.status, OutcomeStatus::Partial);

    // Quota window rolls over
    t.clock.advance(Duration::hours(25));
    assert!(!t.quota.is_exhausted());

    let second = t.service.generate_next_batch(BatchRequest::new(scope())).await.unwrap();
    assert_eq!(second.batch_number, 1);
    assert_eq!(second.generated_count, 2);
    assert_eq!(second.final_batch_size, 50);
    assert!(second.is_complete);
    assert_eq!(second.generation_method, GenerationMethod::Ai);
}

#[tokio::test]
async fn test_retries_back_off_exponentially() {
    let repo = Arc::new(InMemoryWordRepository::new());
    let provider = Arc::new(ScriptedProvider::always(Err(ProviderError::transport("connection refused"))));
    let t = build_service(
        provider.clone(),
        repo,
        catalog("French", ProficiencyLevel::A1, &["le pain", "la table"]),
    );

    let outcome = t.service.generate_next_batch(BatchRequest::new(scope())).await.unwrap();

    // Three provider attempts, one refresh attempt from the fallback tier
    assert_eq!(provider.calls(), 4);
    assert_eq!(
        t.sleeper.delays(),
        vec![std::time::Duration::from_secs(1), std::time::Duration::from_secs(2)]
    );
    assert_eq!(outcome.generation_method, GenerationMethod::Fallback);
    assert_eq!(outcome.generated_count, 2);
    assert!(!outcome.quota_status.exhausted);
}
