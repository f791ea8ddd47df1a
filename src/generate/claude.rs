//! Claude Backend
//!
//! Anthropic messages API. The key is read from ANTHROPIC_API_KEY.

use std::env;
use std::time::Duration;

use async_trait::async_trait;

use super::{LanguageModel, TransportError};

pub const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";
const BASE_URL: &str = "https://api.anthropic.com/v1";

/// Claude API backend
#[derive(Debug, Clone)]
pub struct ClaudeModel {
    api_key: Option<String>,
    model: String,
    base_url: String,
    max_tokens: u32,
}

impl ClaudeModel {
    pub fn new() -> Self {
        Self {
            api_key: env::var("ANTHROPIC_API_KEY").ok().filter(|k| !k.is_empty()),
            model: DEFAULT_MODEL.to_string(),
            base_url: BASE_URL.to_string(),
            max_tokens: 2048,
        }
    }

    /// Create with explicit configuration
    pub fn with_config(api_key: Option<String>, model: Option<String>, max_tokens: u32) -> Self {
        Self {
            api_key,
            model: model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            base_url: BASE_URL.to_string(),
            max_tokens,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    fn call_api(
        base_url: &str,
        api_key: &str,
        model: &str,
        max_tokens: u32,
        prompt: &str,
        timeout: Duration,
    ) -> Result<String, TransportError> {
        let client = ureq::AgentBuilder::new().timeout(timeout).build();

        let response = client
            .post(&format!("{}/messages", base_url))
            .set("x-api-key", api_key)
            .set("anthropic-version", "2023-06-01")
            .set("content-type", "application/json")
            .send_json(ureq::json!({
                "model": model,
                "max_tokens": max_tokens,
                "messages": [{
                    "role": "user",
                    "content": prompt
                }]
            }))
            .map_err(|e| match e {
                ureq::Error::Status(status, resp) => TransportError::Api {
                    status,
                    message: resp.into_string().unwrap_or_default(),
                },
                _ => TransportError::Network {
                    message: e.to_string(),
                },
            })?;

        let body: serde_json::Value = response.into_json().map_err(|e| TransportError::Parse {
            message: e.to_string(),
        })?;

        body["content"][0]["text"]
            .as_str()
            .map(|s| s.to_string())
            .ok_or_else(|| TransportError::Parse {
                message: "No text content in Claude response".to_string(),
            })
    }
}

impl Default for ClaudeModel {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LanguageModel for ClaudeModel {
    fn name(&self) -> &str {
        "claude"
    }

    async fn complete(&self, prompt: &str, timeout: Duration) -> Result<String, TransportError> {
        let api_key = self
            .api_key
            .clone()
            .ok_or_else(|| TransportError::NotConfigured {
                backend: "claude".to_string(),
            })?;
        let base_url = self.base_url.clone();
        let model = self.model.clone();
        let max_tokens = self.max_tokens;
        let prompt = prompt.to_string();

        tokio::task::spawn_blocking(move || {
            Self::call_api(&base_url, &api_key, &model, max_tokens, &prompt, timeout)
        })
        .await
        .map_err(|e| TransportError::Network {
            message: format!("Claude request task failed: {}", e),
        })?
    }
}
