// SPDX-FileCopyrightText: 2026 Persona Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock LLM provider with a FIFO queue of scripted outcomes.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use persona_core::{AdapterType, HealthStatus, LlmProvider, PersonaError, PluginAdapter};

#[derive(Default)]
struct Script {
    outcomes: VecDeque<Result<String, PersonaError>>,
    prompts: Vec<String>,
}

/// A mock LLM that returns queued replies or errors in order.
///
/// Clones share the same queue, so a test can keep a handle after handing
/// an `Arc` to the router. An exhausted queue yields a `Provider` error.
#[derive(Clone, Default)]
pub struct MockLlmProvider {
    script: Arc<Mutex<Script>>,
    delay: Option<Duration>,
}

impl MockLlmProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mock pre-loaded with successful replies.
    pub fn with_replies<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mock = Self::new();
        for reply in replies {
            mock.push_reply(reply);
        }
        mock
    }

    /// Sleep this long before answering each call.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn push_reply(&self, reply: impl Into<String>) {
        self.lock().outcomes.push_back(Ok(reply.into()));
    }

    pub fn push_error(&self, error: PersonaError) {
        self.lock().outcomes.push_back(Err(error));
    }

    /// Every prompt received so far, in call order.
    pub fn prompts(&self) -> Vec<String> {
        self.lock().prompts.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Script> {
        self.script.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl PluginAdapter for MockLlmProvider {
    fn name(&self) -> &str {
        "mock-llm"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Llm
    }

    async fn health_check(&self) -> Result<HealthStatus, PersonaError> {
        Ok(HealthStatus::Healthy)
    }
}

#[async_trait]
impl LlmProvider for MockLlmProvider {
    async fn classify(&self, prompt: &str) -> Result<String, PersonaError> {
        let outcome = {
            let mut script = self.lock();
            script.prompts.push(prompt.to_string());
            script.outcomes.pop_front()
        };
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        outcome.unwrap_or_else(|| {
            Err(PersonaError::Provider {
                message: "mock LLM has no scripted reply".into(),
                source: None,
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn outcomes_are_returned_in_order() {
        let mock = MockLlmProvider::with_replies(["first", "second"]);
        mock.push_error(PersonaError::Cancelled);

        assert_eq!(mock.classify("p1").await.unwrap(), "first");
        assert_eq!(mock.classify("p2").await.unwrap(), "second");
        assert!(matches!(mock.classify("p3").await, Err(PersonaError::Cancelled)));
        assert!(matches!(mock.classify("p4").await, Err(PersonaError::Provider { .. })));
        assert_eq!(mock.prompts(), vec!["p1", "p2", "p3", "p4"]);
    }

    #[tokio::test]
    async fn clones_share_the_script() {
        let mock = MockLlmProvider::new();
        let handle = mock.clone();
        handle.push_reply("it_expert");
        assert_eq!(mock.classify("q").await.unwrap(), "it_expert");
        assert_eq!(handle.prompts().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn delay_is_applied() {
        let mock = MockLlmProvider::with_replies(["late"]).with_delay(Duration::from_secs(5));
        let start = tokio::time::Instant::now();
        mock.classify("q").await.unwrap();
        assert!(start.elapsed() >= Duration::from_secs(5));
    }
}
