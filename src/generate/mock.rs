//! Scripted backend for tests and offline runs

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use super::{LanguageModel, TransportError};

/// Replays canned replies in order; the last reply repeats once the script runs out
pub struct ScriptedModel {
    replies: Vec<String>,
    delay: Option<Duration>,
    failure: Option<TransportError>,
    calls: AtomicUsize,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedModel {
    pub fn new(replies: Vec<String>) -> Self {
        ScriptedModel {
            replies,
            delay: None,
            failure: None,
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Every call fails with `error`
    pub fn failing(error: TransportError) -> Self {
        let mut model = Self::new(Vec::new());
        model.failure = Some(error);
        model
    }

    /// Sleep before answering
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Prompts received so far
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().map(|p| p.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl LanguageModel for ScriptedModel {
    fn name(&self) -> &str {
        "mock"
    }

    async fn complete(&self, prompt: &str, _timeout: Duration) -> Result<String, TransportError> {
        let index = self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(prompt.to_string());
        }
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(error) = &self.failure {
            return Err(error.clone());
        }
        self.replies
            .get(index)
            .or_else(|| self.replies.last())
            .cloned()
            .ok_or_else(|| TransportError::NotConfigured {
                backend: "mock (no scripted replies)".to_string(),
            })
    }
}
