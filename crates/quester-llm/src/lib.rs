//! Reasoning oracle client — OpenAI-compatible chat completions.
//!
//! Non-streaming: the flow consumes whole completions, so a single JSON
//! round trip is enough. A `base_url` override makes this work with any
//! OpenAI-compatible backend (Ollama, vLLM, Groq, OpenRouter, ...).

use futures::future::BoxFuture;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use quester_core::config::ModelConfig;
use quester_core::error::{QuesterError, Result};
use quester_core::traits::ReasoningClient;

const OPENAI_API_URL: &str = "https://api.openai.com/v1/chat/completions";

pub struct OpenAiClient {
    http: Client,
    config: ModelConfig,
}

impl OpenAiClient {
    pub fn new(config: ModelConfig) -> Self {
        Self {
            http: Client::new(),
            config,
        }
    }

    fn endpoint(&self) -> &str {
        self.config.base_url.as_deref().unwrap_or(OPENAI_API_URL)
    }
}

// Request types
#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<OaiMessage>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Serialize)]
struct OaiMessage {
    role: &'static str,
    content: String,
}

// Response types
#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

impl ReasoningClient for OpenAiClient {
    fn reason(&self, prompt: String) -> BoxFuture<'_, Result<String>> {
        Box::pin(async move {
            let api_key = self
                .config
                .api_key
                .clone()
                .ok_or_else(|| QuesterError::Config("model.api_key is not set".into()))?;

            let request = ChatRequest {
                model: self.config.model_id.clone(),
                messages: vec![OaiMessage {
                    role: "user",
                    content: prompt,
                }],
                max_tokens: self.config.max_tokens,
                temperature: self.config.temperature,
            };

            debug!(model = %self.config.model_id, "Sending chat completion request");

            let resp = self
                .http
                .post(self.endpoint())
                .bearer_auth(api_key)
                .json(&request)
                .send()
                .await
                .map_err(|e| QuesterError::Oracle(e.to_string()))?;

            let status = resp.status();
            if !status.is_success() {
                let body = resp.text().await.unwrap_or_default();
                return Err(QuesterError::Oracle(format!(
                    "HTTP {status}: {}",
                    body.chars().take(500).collect::<String>()
                )));
            }

            let body: ChatResponse = resp
                .json()
                .await
                .map_err(|e| QuesterError::Oracle(format!("malformed response body: {e}")))?;

            body.choices
                .into_iter()
                .next()
                .and_then(|c| c.message.content)
                .filter(|text| !text.is_empty())
                .ok_or_else(|| QuesterError::Oracle("completion contained no text".into()))
        })
    }
}
