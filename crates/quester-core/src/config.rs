use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{QuesterError, Result};

/// Top-level Quester configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub agent: AgentConfig,
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default)]
    pub search: SearchConfig,
}

/// Loop policy for the agent run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Maximum search rounds before the decide stage is forced to answer.
    #[serde(default = "default_max_searches")]
    pub max_searches: usize,
    /// Results requested per retrieval call.
    #[serde(default = "default_max_results")]
    pub max_results: usize,
    /// Per-result preview length used when condensing history into the
    /// decide prompt, so prompts do not grow unboundedly with history.
    #[serde(default = "default_result_preview_chars")]
    pub result_preview_chars: usize,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_searches: default_max_searches(),
            max_results: default_max_results(),
            result_preview_chars: default_result_preview_chars(),
        }
    }
}

fn default_max_searches() -> usize { 3 }
fn default_max_results() -> usize { 5 }
fn default_result_preview_chars() -> usize { 200 }

/// Reasoning oracle configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    #[serde(default = "default_model_id")]
    pub model_id: String,
    #[serde(default)]
    pub api_key: Option<String>,
    /// Full chat-completions endpoint override for OpenAI-compatible
    /// backends (Ollama, vLLM, Groq, OpenRouter, ...).
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            model_id: default_model_id(),
            api_key: None,
            base_url: None,
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
        }
    }
}

fn default_model_id() -> String { "gpt-4o".to_string() }
fn default_max_tokens() -> u32 { 1000 }
fn default_temperature() -> f32 { 0.7 }

/// Retry policy applied to each stage's execute phase.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Total attempts, including the first.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Fixed wait between attempts.
    #[serde(default = "default_wait_ms")]
    pub wait_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            wait_ms: default_wait_ms(),
        }
    }
}

fn default_max_attempts() -> u32 { 3 }
fn default_wait_ms() -> u64 { 1000 }

/// Retrieval oracle configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchConfig {
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub base_url: Option<String>,
}

impl AppConfig {
    /// Load config from a TOML file, with env var expansion.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|_| QuesterError::ConfigNotFound(path.display().to_string()))?;

        // Expand ${ENV_VAR} references
        let expanded = expand_env_vars(&content);

        toml::from_str(&expanded).map_err(|e| QuesterError::Config(e.to_string()))
    }
}

/// Expand `${ENV_VAR}` patterns in a string.
fn expand_env_vars(input: &str) -> String {
    let mut result = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '$' && chars.peek() == Some(&'{') {
            chars.next(); // consume '{'
            let mut var_name = String::new();
            for c in chars.by_ref() {
                if c == '}' {
                    break;
                }
                var_name.push(c);
            }
            match std::env::var(&var_name) {
                Ok(val) => result.push_str(&val),
                Err(_) => {
                    // Keep original if env var not set
                    result.push_str(&format!("${{{}}}", var_name));
                }
            }
        } else {
            result.push(c);
        }
    }
    result
}
