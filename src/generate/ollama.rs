//! Ollama Backend
//!
//! Local LLM support via Ollama for offline operation.

use std::env;
use std::time::Duration;

use async_trait::async_trait;

use super::{LanguageModel, TransportError};

pub const DEFAULT_HOST: &str = "http://localhost:11434";
pub const DEFAULT_MODEL: &str = "llama3";

/// Ollama local LLM backend
#[derive(Debug, Clone)]
pub struct OllamaModel {
    host: String,
    model: String,
}

impl OllamaModel {
    /// Create from OLLAMA_HOST / OLLAMA_MODEL, falling back to defaults
    pub fn new() -> Self {
        Self {
            host: env::var("OLLAMA_HOST").unwrap_or_else(|_| DEFAULT_HOST.to_string()),
            model: env::var("OLLAMA_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string()),
        }
    }

    /// Create with explicit configuration
    pub fn with_config(host: String, model: String) -> Self {
        Self { host, model }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Blocking call to `/api/generate`
    fn call_api(
        host: &str,
        model: &str,
        prompt: &str,
        timeout: Duration,
    ) -> Result<String, TransportError> {
        let client = ureq::AgentBuilder::new().timeout(timeout).build();

        let response = client
            .post(&format!("{}/api/generate", host.trim_end_matches('/')))
            .set("content-type", "application/json")
            .send_json(ureq::json!({
                "model": model,
                "prompt": prompt,
                "stream": false,
                "format": "json"
            }))
            .map_err(|e| match e {
                ureq::Error::Status(status, resp) => TransportError::Api {
                    status,
                    message: resp.into_string().unwrap_or_default(),
                },
                _ => TransportError::Network {
                    message: format!("Ollama connection failed: {}. Is Ollama running?", e),
                },
            })?;

        let body: serde_json::Value = response.into_json().map_err(|e| TransportError::Parse {
            message: e.to_string(),
        })?;

        body["response"]
            .as_str()
            .map(|s| s.to_string())
            .ok_or_else(|| TransportError::Parse {
                message: "No response in Ollama output".to_string(),
            })
    }
}

impl Default for OllamaModel {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LanguageModel for OllamaModel {
    fn name(&self) -> &str {
        "ollama"
    }

    async fn complete(&self, prompt: &str, timeout: Duration) -> Result<String, TransportError> {
        let host = self.host.clone();
        let model = self.model.clone();
        let prompt = prompt.to_string();
        tokio::task::spawn_blocking(move || Self::call_api(&host, &model, &prompt, timeout))
            .await
            .map_err(|e| TransportError::Network {
                message: format!("Ollama request task failed: {}", e),
            })?
    }
}
