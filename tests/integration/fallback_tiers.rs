//! Fallback sources under provider exhaustion, cache expiry and large vocabularies

use crate::integration::test_utils::{build_service, catalog, json_words, ScriptedProvider};
use chrono::Duration;
use std::sync::Arc;
use vocab_batch::fallback::StaticCatalog;
use vocab_batch::repository::InMemoryWordRepository;
use vocab_batch::{
    BatchRequest, BatchScope, GenerationMethod, OutcomeStatus, ProficiencyLevel, ProviderError,
    VocabularyWord, WordCandidate,
};

#[tokio::test]
async fn test_rate_limited_provider_falls_back_to_catalog() {
    let words: Vec<String> = (0..48).map(|i| format!("catalogue{}", i)).collect();
    let refs: Vec<&str> = words.iter().map(String::as_str).collect();
    let provider = Arc::new(ScriptedProvider::always(Err(ProviderError::classify(
        "status 429: Too Many Requests",
    ))));
    let t = build_service(
        provider.clone(),
        Arc::new(InMemoryWordRepository::new()),
        catalog("French", ProficiencyLevel::A1, &refs),
    );

    let outcome = t
        .service
        .generate_next_batch(BatchRequest::new(BatchScope::new(
            "learner-1",
            "French",
            "English",
            ProficiencyLevel::A1,
        )))
        .await
        .unwrap();

    assert_eq!(outcome.generated_count, 48);
    assert_eq!(outcome.final_batch_size, 48);
    assert!(!outcome.is_complete);
    assert_eq!(outcome.generation_method, GenerationMethod::Fallback);
    assert!(outcome.quota_status.exhausted);
    assert_eq!(provider.calls(), 1);
}

#[tokio::test]
async fn test_exhausted_quota_serves_untranslated_emergency_words() {
    let provider = Arc::new(ScriptedProvider::always(Err(ProviderError::classify(
        "RESOURCE_EXHAUSTED: quota exceeded",
    ))));
    let t = build_service(
        provider.clone(),
        Arc::new(InMemoryWordRepository::new()),
        StaticCatalog::empty(),
    );

    let outcome = t
        .service
        .generate_next_batch(BatchRequest::new(BatchScope::new(
            "learner-2",
            "Swahili",
            "English",
            ProficiencyLevel::B1,
        )))
        .await
        .unwrap();

    assert_eq!(outcome.generation_method, GenerationMethod::Fallback);
    assert!(outcome.generated_count > 0);
    assert_eq!(outcome.status, OutcomeStatus::Partial);
    assert_eq!(provider.calls(), 1);
}

#[tokio::test]
async fn test_expired_cache_entry_is_regenerated() {
    let provider = Arc::new(ScriptedProvider::always(Ok(json_words("단어", 60))));
    let t = build_service(
        provider.clone(),
        Arc::new(InMemoryWordRepository::new()),
        StaticCatalog::empty(),
    );

    let words = t.fallback.get_words("Korean", ProficiencyLevel::A2, 20, &[], "English").await;
    assert_eq!(words.len(), 20);
    assert_eq!(provider.calls(), 1);
    let entry = t.fallback.cache().get("Korean", ProficiencyLevel::A2).unwrap();
    assert!(entry.expires_at > entry.generated_at + Duration::hours(12));
    assert!(entry.expires_at <= entry.generated_at + Duration::hours(168));

    // Served from cache while fresh
    t.fallback.get_words("Korean", ProficiencyLevel::A2, 20, &[], "English").await;
    assert_eq!(provider.calls(), 1);

    t.clock.advance(Duration::hours(169));
    assert!(t.fallback.cache().get("Korean", ProficiencyLevel::A2).is_none());
    let words = t.fallback.get_words("Korean", ProficiencyLevel::A2, 20, &[], "English").await;
    assert_eq!(words.len(), 20);
    assert_eq!(provider.calls(), 2);
}

#[tokio::test]
async fn test_large_vocabulary_uses_fallback_sources() {
    let scope = BatchScope::new("learner-3", "French", "English", ProficiencyLevel::A1);
    // Four full batches plus one word in batch five
    let seeded = (0..201).map(|i| {
        VocabularyWord::from_candidate(&scope, (i / 50 + 1) as u32, WordCandidate::new(format!("seed{}", i), "x"))
    });
    let repo = Arc::new(InMemoryWordRepository::with_words(seeded));

    let words: Vec<String> = (0..60).map(|i| format!("mot{}", i)).collect();
    let refs: Vec<&str> = words.iter().map(String::as_str).collect();
    let provider = Arc::new(ScriptedProvider::always(Ok(json_words("ai", 60))));
    let t = build_service(provider.clone(), repo, catalog("French", ProficiencyLevel::A1, &refs));

    let outcome = t.service.generate_next_batch(BatchRequest::new(scope)).await.unwrap();

    assert_eq!(outcome.batch_number, 5);
    assert_eq!(outcome.generated_count, 49);
    assert!(outcome.is_complete);
    assert_eq!(outcome.generation_method, GenerationMethod::Fallback);
    assert_eq!(provider.calls(), 0);
}
