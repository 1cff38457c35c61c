//! Per-learner mutual exclusion across concurrent generation runs

use crate::integration::test_utils::{build_service, catalog, json_words, GatedProvider};
use std::sync::Arc;
use vocab_batch::repository::InMemoryWordRepository;
use vocab_batch::{BatchRequest, BatchScope, GenerationError, LearnerId, ProficiencyLevel};

fn request(learner: &str) -> BatchRequest {
    BatchRequest::new(BatchScope::new(learner, "German", "English", ProficiencyLevel::A2))
}

#[tokio::test]
async fn test_second_run_for_same_learner_is_rejected() {
    let provider = Arc::new(GatedProvider::new(json_words("wort", 60)));
    let t = build_service(
        provider.clone(),
        Arc::new(InMemoryWordRepository::new()),
        catalog("German", ProficiencyLevel::A2, &[]),
    );
    let service = Arc::new(t.service);

    let first = tokio::spawn({
        let service = service.clone();
        async move { service.generate_next_batch(request("u1")).await }
    });
    provider.wait_for_calls(1).await;
    assert!(service.locks().is_locked(&LearnerId::new("u1")));

    let rejected = service.generate_next_batch(request("u1")).await;
    match rejected {
        Err(GenerationError::ConcurrentGenerationInProgress { learner }) => {
            assert_eq!(learner, LearnerId::new("u1"));
        }
        other => panic!("expected lock contention, got {:?}", other),
    }
    assert_eq!(provider.calls(), 1);

    provider.open();
    let outcome = first.await.unwrap().unwrap();
    assert!(outcome.is_complete);
    assert!(!service.locks().is_locked(&LearnerId::new("u1")));

    // Lock released: the next run for the same learner proceeds
    let next = service.generate_next_batch(request("u1")).await.unwrap();
    assert_eq!(next.batch_number, 2);
}

#[tokio::test]
async fn test_different_learners_run_concurrently() {
    let provider = Arc::new(GatedProvider::new(json_words("wort", 60)));
    let t = build_service(
        provider.clone(),
        Arc::new(InMemoryWordRepository::new()),
        catalog("German", ProficiencyLevel::A2, &[]),
    );
    let service = Arc::new(t.service);

    let runs: Vec<_> = ["u1", "u2"]
        .into_iter()
        .map(|learner| {
            let service = service.clone();
            tokio::spawn(async move { service.generate_next_batch(request(learner)).await })
        })
        .collect();

    // Both runs reach the provider while neither has finished
    provider.wait_for_calls(2).await;
    assert_eq!(service.locks().held_count(), 2);

    provider.open();
    for run in runs {
        let outcome = run.await.unwrap().unwrap();
        assert_eq!(outcome.final_batch_size, 50);
    }
    assert_eq!(service.locks().held_count(), 0);
}
