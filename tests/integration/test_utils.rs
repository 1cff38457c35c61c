//! Shared test utilities for integration tests
//!
//! Scripted and gated providers, a service builder, and environment isolation for
//! configuration tests.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::TempDir;
use tokio::sync::{Notify, Semaphore};
use vocab_batch::clock::ManualClock;
use vocab_batch::config::{FallbackConfig, QuotaConfig};
use vocab_batch::fallback::{CatalogEntry, FallbackCache, FallbackWordProvider, StaticCatalog};
use vocab_batch::generation::GenerationClient;
use vocab_batch::provider::{
    ChatMessage, CompletionOptions, CompletionResponse, MessageRole, ModelProviderClient,
};
use vocab_batch::quota::QuotaTracker;
use vocab_batch::repository::WordRepository;
use vocab_batch::retry::RecordingSleeper;
use vocab_batch::{BatchSettings, GenerationService, ProficiencyLevel, ProviderError, WordCandidate};

/// JSON array of `n` words named `{prefix}{i}`.
pub fn json_words(prefix: &str, n: usize) -> String {
    json_array(&(0..n).map(|i| format!("{}{}", prefix, i)).collect::<Vec<_>>())
}

pub fn json_array(originals: &[String]) -> String {
    let items: Vec<String> = originals
        .iter()
        .map(|w| format!(r#"{{"original": "{}", "translation": "tr-{}"}}"#, w, w))
        .collect();
    format!("```json\n[{}]\n```", items.join(",\n"))
}

/// Replays scripted replies, then repeats a fallback reply.
pub struct ScriptedProvider {
    replies: Mutex<VecDeque<Result<String, ProviderError>>>,
    fallback: Result<String, ProviderError>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedProvider {
    pub fn new(replies: Vec<Result<String, ProviderError>>, fallback: Result<String, ProviderError>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            fallback,
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn always(reply: Result<String, ProviderError>) -> Self {
        Self::new(Vec::new(), reply)
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().len()
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().clone()
    }
}

fn user_prompt(messages: &[ChatMessage]) -> String {
    messages
        .iter()
        .filter(|m| m.role == MessageRole::User)
        .map(|m| m.content.clone())
        .collect::<Vec<_>>()
        .join("\n")
}

#[async_trait]
impl ModelProviderClient for ScriptedProvider {
    async fn complete(
        &self,
        messages: Vec<ChatMessage>,
        _options: CompletionOptions,
    ) -> Result<CompletionResponse, ProviderError> {
        self.prompts.lock().push(user_prompt(&messages));
        let reply = self
            .replies
            .lock()
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone());
        reply.map(|content| CompletionResponse {
            content,
            model: "scripted".to_string(),
        })
    }

    fn provider_name(&self) -> &str {
        "scripted"
    }

    fn model_name(&self) -> &str {
        "scripted"
    }
}

/// Holds every call until [`open`](Self::open) is called, then answers with `reply`.
pub struct GatedProvider {
    gate: Semaphore,
    entered: Notify,
    calls: AtomicUsize,
    reply: String,
}

impl GatedProvider {
    pub fn new(reply: String) -> Self {
        Self {
            gate: Semaphore::new(0),
            entered: Notify::new(),
            calls: AtomicUsize::new(0),
            reply,
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Wait until at least `n` calls are parked at the gate.
    pub async fn wait_for_calls(&self, n: usize) {
        while self.calls() < n {
            self.entered.notified().await;
        }
    }

    pub fn open(&self) {
        self.gate.add_permits(1);
    }
}

#[async_trait]
impl ModelProviderClient for GatedProvider {
    async fn complete(
        &self,
        _messages: Vec<ChatMessage>,
        _options: CompletionOptions,
    ) -> Result<CompletionResponse, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.entered.notify_one();
        // The permit goes back on drop, so one `open` releases every caller
        let _permit = self
            .gate
            .acquire()
            .await
            .map_err(|e| ProviderError::transport(e.to_string()))?;
        Ok(CompletionResponse {
            content: self.reply.clone(),
            model: "gated".to_string(),
        })
    }

    fn provider_name(&self) -> &str {
        "gated"
    }

    fn model_name(&self) -> &str {
        "gated"
    }
}

pub fn catalog(language: &str, level: ProficiencyLevel, originals: &[&str]) -> StaticCatalog {
    StaticCatalog::from_entries(vec![CatalogEntry {
        language: language.to_string(),
        level,
        words: originals
            .iter()
            .map(|w| WordCandidate::new(*w, format!("tr-{}", w)))
            .collect(),
    }])
}

/// A service plus handles to its injected parts.
pub struct TestService {
    pub service: GenerationService,
    pub quota: Arc<QuotaTracker>,
    pub clock: Arc<ManualClock>,
    pub sleeper: Arc<RecordingSleeper>,
    pub fallback: Arc<FallbackWordProvider>,
}

pub fn build_service(
    provider: Arc<dyn ModelProviderClient>,
    repository: Arc<dyn WordRepository>,
    catalog: StaticCatalog,
) -> TestService {
    let clock = Arc::new(ManualClock::default());
    let quota = Arc::new(QuotaTracker::new(&QuotaConfig::default(), clock.clone()));
    let client = Arc::new(GenerationClient::new(
        provider,
        quota.clone(),
        CompletionOptions::default(),
        200,
    ));
    let fallback = Arc::new(FallbackWordProvider::new(
        catalog,
        FallbackCache::new(clock.clone()),
        Some(client.clone()),
        &FallbackConfig::default(),
    ));
    let sleeper = Arc::new(RecordingSleeper::new());
    let service = GenerationService::new(client, fallback.clone(), repository, BatchSettings::default())
        .with_sleeper(sleeper.clone());
    TestService {
        service,
        quota,
        clock,
        sleeper,
        fallback,
    }
}

/// Serializes access to process environment variables across tests
static ENV_MUTEX: std::sync::Mutex<()> = std::sync::Mutex::new(());

const ISOLATED_VARS: &[&str] = &["HOME", "XDG_CONFIG_HOME", "VOCAB_ENV"];

/// Run `f` with HOME and XDG_CONFIG_HOME pointed into `test_dir`, restoring the
/// environment afterwards. `vars` are set for the duration of the call.
pub fn with_isolated_env<F, R>(test_dir: &TempDir, vars: &[(&str, &str)], f: F) -> R
where
    F: FnOnce() -> R,
{
    let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    let names: Vec<&str> = ISOLATED_VARS
        .iter()
        .copied()
        .chain(vars.iter().map(|(k, _)| *k))
        .collect();
    let saved: Vec<(&str, Option<String>)> =
        names.iter().map(|k| (*k, std::env::var(k).ok())).collect();

    let home = test_dir.path().join("home");
    let config_home = test_dir.path().join("xdg-config");
    std::fs::create_dir_all(&home).unwrap();
    std::fs::create_dir_all(&config_home).unwrap();
    std::env::set_var("HOME", &home);
    std::env::set_var("XDG_CONFIG_HOME", &config_home);
    std::env::remove_var("VOCAB_ENV");
    for (key, value) in vars {
        std::env::set_var(key, value);
    }

    let result = f();

    for (key, value) in saved {
        match value {
            Some(v) => std::env::set_var(key, v),
            None => std::env::remove_var(key),
        }
    }
    result
}
