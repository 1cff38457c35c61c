//! Text Generation Provider
//!
//! Provider-agnostic interface to the external text generation service, with
//! reqwest-backed clients for OpenAI-compatible endpoints, Google Gemini and Ollama.
//! Every failure is mapped to a [`ProviderError`] whose kind the engine branches on.

use crate::error::{ProviderError, ProviderErrorKind};
use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;

pub mod profile;

pub use profile::{provider_type_slug, ProviderConfig, ProviderType};

/// Resolved provider connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ModelProvider {
    OpenAI {
        model: String,
        api_key: String,
        base_url: Option<String>, // Any OpenAI-compatible endpoint
    },
    Gemini {
        model: String,
        api_key: String,
        base_url: Option<String>,
    },
    Ollama {
        model: String,
        base_url: Option<String>, // Default: http://localhost:11434
    },
}

/// Chat message role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

/// Chat message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: MessageRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }
}

/// Completion options
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionOptions {
    #[serde(default)]
    pub temperature: Option<f32>, // 0.0-2.0
    #[serde(default)]
    pub max_tokens: Option<u32>,
}

impl Default for CompletionOptions {
    fn default() -> Self {
        Self {
            temperature: Some(0.9),
            max_tokens: Some(8192),
        }
    }
}

/// Completion response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionResponse {
    pub content: String,
    pub model: String,
}

/// Model provider client trait
#[async_trait]
pub trait ModelProviderClient: Send + Sync {
    /// Generate a completion from a list of messages
    async fn complete(
        &self,
        messages: Vec<ChatMessage>,
        options: CompletionOptions,
    ) -> Result<CompletionResponse, ProviderError>;

    fn provider_name(&self) -> &str;

    fn model_name(&self) -> &str;
}

fn role_to_string(role: MessageRole) -> &'static str {
    match role {
        MessageRole::System => "system",
        MessageRole::User => "user",
        MessageRole::Assistant => "assistant",
    }
}

// Maps reqwest transport failures onto provider error kinds
fn map_http_error(error: reqwest::Error) -> ProviderError {
    if let Some(status) = error.status() {
        return status_error(status, &error.to_string());
    }
    if error.is_timeout() {
        ProviderError::transport(format!("Request timeout: {}", error))
    } else if error.is_connect() {
        ProviderError::transport(format!("Connection error: {}", error))
    } else {
        ProviderError::classify(format!("HTTP error: {}", error))
    }
}

fn status_error(status: StatusCode, body: &str) -> ProviderError {
    match status.as_u16() {
        429 => ProviderError::rate_limited(format!("Rate limit exceeded (429): {}", body)),
        401 | 403 => ProviderError::new(
            ProviderErrorKind::Auth,
            format!("Authentication failed ({}): {}", status, body),
        ),
        _ => ProviderError::classify(format!("Request failed with status {}: {}", status, body)),
    }
}

async fn ensure_success(response: Response) -> Result<Response, ProviderError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string());
    Err(status_error(status, &body))
}

const PROVIDER_HTTP_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const PROVIDER_HTTP_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

fn build_provider_http_client() -> Result<Client, ProviderError> {
    Client::builder()
        .connect_timeout(PROVIDER_HTTP_CONNECT_TIMEOUT)
        .timeout(PROVIDER_HTTP_REQUEST_TIMEOUT)
        .build()
        .map_err(|e| ProviderError::transport(format!("Failed to create HTTP client: {}", e)))
}

// OpenAI-compatible API request/response structures
#[derive(Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<OpenAIMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    stream: bool,
}

#[derive(Serialize, Deserialize)]
struct OpenAIMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    model: String,
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: OpenAIMessage,
}

/// OpenAI-compatible chat completions client
pub struct OpenAIClient {
    client: Client,
    model: String,
    api_key: String,
    base_url: String,
}

impl OpenAIClient {
    pub fn new(
        model: String,
        api_key: String,
        base_url: Option<String>,
    ) -> Result<Self, ProviderError> {
        Ok(Self {
            client: build_provider_http_client()?,
            model,
            api_key,
            base_url: base_url.unwrap_or_else(|| "https://api.openai.com/v1".to_string()),
        })
    }
}

#[async_trait]
impl ModelProviderClient for OpenAIClient {
    async fn complete(
        &self,
        messages: Vec<ChatMessage>,
        options: CompletionOptions,
    ) -> Result<CompletionResponse, ProviderError> {
        let request = ChatCompletionRequest {
            model: self.model.clone(),
            messages: messages
                .into_iter()
                .map(|msg| OpenAIMessage {
                    role: role_to_string(msg.role).to_string(),
                    content: msg.content,
                })
                .collect(),
            temperature: options.temperature,
            max_tokens: options.max_tokens,
            stream: false,
        };

        let url = format!("{}/chat/completions", self.base_url.trim_end_matches('/'));
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(map_http_error)?;
        let response = ensure_success(response).await?;

        let completion: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::transport(format!("Failed to decode response: {}", e)))?;

        let choice = completion
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::empty("No choices in response"))?;

        Ok(CompletionResponse {
            content: choice.message.content,
            model: completion.model,
        })
    }

    fn provider_name(&self) -> &str {
        "openai"
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

/// Google Gemini `generateContent` client
pub struct GeminiClient {
    client: Client,
    model: String,
    api_key: String,
    base_url: String,
}

impl GeminiClient {
    pub fn new(
        model: String,
        api_key: String,
        base_url: Option<String>,
    ) -> Result<Self, ProviderError> {
        Ok(Self {
            client: build_provider_http_client()?,
            model,
            api_key,
            base_url: base_url
                .unwrap_or_else(|| "https://generativelanguage.googleapis.com/v1beta".to_string()),
        })
    }
}

#[async_trait]
impl ModelProviderClient for GeminiClient {
    async fn complete(
        &self,
        messages: Vec<ChatMessage>,
        options: CompletionOptions,
    ) -> Result<CompletionResponse, ProviderError> {
        let system_text: Vec<String> = messages
            .iter()
            .filter(|m| m.role == MessageRole::System)
            .map(|m| m.content.clone())
            .collect();
        let contents: Vec<serde_json::Value> = messages
            .iter()
            .filter(|m| m.role != MessageRole::System)
            .map(|m| {
                let role = if m.role == MessageRole::Assistant {
                    "model"
                } else {
                    "user"
                };
                json!({ "role": role, "parts": [{ "text": m.content }] })
            })
            .collect();

        let mut body = json!({
            "contents": contents,
            "generationConfig": {
                "temperature": options.temperature,
                "maxOutputTokens": options.max_tokens,
            },
        });
        if !system_text.is_empty() {
            body["systemInstruction"] = json!({ "parts": [{ "text": system_text.join("\n\n") }] });
        }

        let url = format!(
            "{}/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model
        );
        let response = self
            .client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await
            .map_err(map_http_error)?;
        let response = ensure_success(response).await?;

        #[derive(Deserialize)]
        struct GeminiResponse {
            #[serde(default)]
            candidates: Vec<GeminiCandidate>,
        }
        #[derive(Deserialize)]
        struct GeminiCandidate {
            content: Option<GeminiContent>,
        }
        #[derive(Deserialize)]
        struct GeminiContent {
            #[serde(default)]
            parts: Vec<GeminiPart>,
        }
        #[derive(Deserialize)]
        struct GeminiPart {
            #[serde(default)]
            text: String,
        }

        let parsed: GeminiResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::transport(format!("Failed to decode response: {}", e)))?;

        let content = parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| c.parts.into_iter().map(|p| p.text).collect::<String>())
            .ok_or_else(|| ProviderError::empty("No candidates in Gemini response"))?;

        Ok(CompletionResponse {
            content,
            model: self.model.clone(),
        })
    }

    fn provider_name(&self) -> &str {
        "gemini"
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

/// Ollama local model client
pub struct OllamaClient {
    client: Client,
    model: String,
    base_url: String,
}

impl OllamaClient {
    pub fn new(model: String, base_url: Option<String>) -> Result<Self, ProviderError> {
        Ok(Self {
            client: build_provider_http_client()?,
            model,
            base_url: base_url.unwrap_or_else(|| "http://localhost:11434".to_string()),
        })
    }
}

#[async_trait]
impl ModelProviderClient for OllamaClient {
    async fn complete(
        &self,
        messages: Vec<ChatMessage>,
        options: CompletionOptions,
    ) -> Result<CompletionResponse, ProviderError> {
        let ollama_messages: Vec<serde_json::Value> = messages
            .into_iter()
            .map(|msg| json!({ "role": role_to_string(msg.role), "content": msg.content }))
            .collect();

        let mut request_options = serde_json::Map::new();
        if let Some(temperature) = options.temperature {
            request_options.insert("temperature".to_string(), json!(temperature));
        }
        if let Some(max_tokens) = options.max_tokens {
            request_options.insert("num_predict".to_string(), json!(max_tokens));
        }

        let url = format!("{}/api/chat", self.base_url.trim_end_matches('/'));
        let response = self
            .client
            .post(&url)
            .json(&json!({
                "model": self.model,
                "messages": ollama_messages,
                "stream": false,
                "options": request_options,
            }))
            .send()
            .await
            .map_err(map_http_error)?;
        let response = ensure_success(response).await?;

        #[derive(Deserialize)]
        struct OllamaResponse {
            message: OpenAIMessage,
            model: String,
        }

        let parsed: OllamaResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::transport(format!("Failed to decode response: {}", e)))?;

        Ok(CompletionResponse {
            content: parsed.message.content,
            model: parsed.model,
        })
    }

    fn provider_name(&self) -> &str {
        "ollama"
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

/// Provider factory
pub struct ProviderFactory;

impl ProviderFactory {
    pub fn create_client(
        provider: &ModelProvider,
    ) -> Result<Box<dyn ModelProviderClient>, ProviderError> {
        match provider {
            ModelProvider::OpenAI {
                model,
                api_key,
                base_url,
            } => Ok(Box::new(OpenAIClient::new(
                model.clone(),
                api_key.clone(),
                base_url.clone(),
            )?)),
            ModelProvider::Gemini {
                model,
                api_key,
                base_url,
            } => Ok(Box::new(GeminiClient::new(
                model.clone(),
                api_key.clone(),
                base_url.clone(),
            )?)),
            ModelProvider::Ollama { model, base_url } => {
                Ok(Box::new(OllamaClient::new(model.clone(), base_url.clone())?))
            }
        }
    }

    pub fn from_config(config: &ProviderConfig) -> Result<Box<dyn ModelProviderClient>, ProviderError> {
        Self::create_client(&config.to_model_provider()?)
    }
}

/// Stand-in used when no provider is configured. Every call fails with `NotConfigured`,
/// which leaves the engine on its fallback sources.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnconfiguredProvider;

#[async_trait]
impl ModelProviderClient for UnconfiguredProvider {
    async fn complete(
        &self,
        _messages: Vec<ChatMessage>,
        _options: CompletionOptions,
    ) -> Result<CompletionResponse, ProviderError> {
        Err(ProviderError::new(
            ProviderErrorKind::NotConfigured,
            "No text generation provider configured",
        ))
    }

    fn provider_name(&self) -> &str {
        "none"
    }

    fn model_name(&self) -> &str {
        "none"
    }
}

// Scripted provider for unit tests
#[cfg(test)]
pub struct ScriptedProvider {
    responses: parking_lot::Mutex<std::collections::VecDeque<Result<String, ProviderError>>>,
    fallback: Result<String, ProviderError>,
    prompts: parking_lot::Mutex<Vec<String>>,
}

#[cfg(test)]
impl ScriptedProvider {
    /// Replays `responses` in order, then answers every further call with `fallback`.
    pub fn new(
        responses: Vec<Result<String, ProviderError>>,
        fallback: Result<String, ProviderError>,
    ) -> Self {
        Self {
            responses: parking_lot::Mutex::new(responses.into()),
            fallback,
            prompts: parking_lot::Mutex::new(Vec::new()),
        }
    }

    pub fn always(response: Result<String, ProviderError>) -> Self {
        Self::new(Vec::new(), response)
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().len()
    }

    /// User prompt of every call made so far.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().clone()
    }
}

#[cfg(test)]
#[async_trait]
impl ModelProviderClient for ScriptedProvider {
    async fn complete(
        &self,
        messages: Vec<ChatMessage>,
        _options: CompletionOptions,
    ) -> Result<CompletionResponse, ProviderError> {
        let prompt = messages
            .iter()
            .filter(|m| m.role == MessageRole::User)
            .map(|m| m.content.as_str())
            .collect::<Vec<_>>()
            .join("\n");
        self.prompts.lock().push(prompt);
        let next = self
            .responses
            .lock()
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone());
        next.map(|content| CompletionResponse {
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
