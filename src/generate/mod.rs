//! Generative Model Adapter
//!
//! Wraps an opaque text-completion service: builds the category instruction,
//! sends it with a timeout and hands back the raw text. Malformed output is
//! not an error here; the normalizer deals with it.

pub mod claude;
pub mod mock;
pub mod ollama;
pub mod prompt;

pub use claude::ClaudeModel;
pub use mock::ScriptedModel;
pub use ollama::OllamaModel;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, warn};

use crate::model::ProblemDescription;
use crate::recipe::ExpectedShape;

/// Default upper bound on a single completion
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Transport-level failure talking to the language model
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TransportError {
    #[error("language model did not answer within {0:?}")]
    Timeout(Duration),

    #[error("network error: {message}")]
    Network { message: String },

    #[error("language model API error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("backend '{backend}' is not configured")]
    NotConfigured { backend: String },

    #[error("could not read language model response: {message}")]
    Parse { message: String },
}

/// Opaque text-completion service
#[async_trait]
pub trait LanguageModel: Send + Sync {
    fn name(&self) -> &str;

    /// Complete `prompt`; implementations should honour `timeout` themselves
    /// where the transport allows it
    async fn complete(&self, prompt: &str, timeout: Duration) -> Result<String, TransportError>;
}

/// Sends category instructions to a [`LanguageModel`] under a hard timeout
#[derive(Clone)]
pub struct GenerativeAdapter {
    model: Arc<dyn LanguageModel>,
    default_timeout: Duration,
}

impl GenerativeAdapter {
    pub fn new(model: Arc<dyn LanguageModel>) -> Self {
        Self::with_timeout(model, DEFAULT_TIMEOUT)
    }

    /// A zero timeout is replaced by the default
    pub fn with_timeout(model: Arc<dyn LanguageModel>, default_timeout: Duration) -> Self {
        let default_timeout = if default_timeout.is_zero() {
            DEFAULT_TIMEOUT
        } else {
            default_timeout
        };
        GenerativeAdapter {
            model,
            default_timeout,
        }
    }

    pub fn backend_name(&self) -> &str {
        self.model.name()
    }

    pub fn default_timeout(&self) -> Duration {
        self.default_timeout
    }

    /// Ask for a model of `shape`'s category. `repair` lists the violated
    /// expectations of a previous answer, quoted verbatim in the prompt.
    pub async fn generate(
        &self,
        shape: &ExpectedShape,
        description: &ProblemDescription,
        repair: Option<&[String]>,
        timeout: Option<Duration>,
    ) -> Result<String, TransportError> {
        let timeout = timeout
            .filter(|t| !t.is_zero())
            .unwrap_or(self.default_timeout);
        let prompt = match repair {
            Some(violations) => prompt::repair_prompt(shape, description, violations),
            None => prompt::instruction(shape, description),
        };
        debug!(
            backend = self.model.name(),
            category = %shape.category,
            repair = repair.is_some(),
            prompt_len = prompt.len(),
            "requesting completion"
        );

        match tokio::time::timeout(timeout, self.model.complete(&prompt, timeout)).await {
            Ok(result) => result,
            Err(_) => {
                warn!(backend = self.model.name(), ?timeout, "language model timed out");
                Err(TransportError::Timeout(timeout))
            }
        }
    }
}

impl std::fmt::Debug for GenerativeAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenerativeAdapter")
            .field("backend", &self.model.name())
            .field("default_timeout", &self.default_timeout)
            .finish()
    }
}
