// SPDX-FileCopyrightText: 2026 Persona Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Level 3: closed-set classification by an external LLM.
//!
//! This is the only stage that returns errors. The coordinator decides what
//! to do with them.

use std::sync::Arc;
use std::time::Duration;

use persona_core::{CategoryId, LlmProvider, PersonaError, PluginAdapter};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// LLM-backed classifier restricted to a fixed category set.
pub struct FallbackClassifier {
    provider: Option<Arc<dyn LlmProvider>>,
    known: Vec<CategoryId>,
    default_category: CategoryId,
    timeout: Duration,
}

impl FallbackClassifier {
    /// `known` must include the default category.
    pub fn new(known: Vec<CategoryId>, default_category: CategoryId, timeout: Duration) -> Self {
        Self {
            provider: None,
            known,
            default_category,
            timeout,
        }
    }

    pub fn with_provider(mut self, provider: Arc<dyn LlmProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn has_provider(&self) -> bool {
        self.provider.is_some()
    }

    pub async fn classify_with_llm(&self, query: &str) -> Result<CategoryId, PersonaError> {
        self.classify_with_llm_cancellable(query, &CancellationToken::new())
            .await
    }

    /// Ask the provider to pick one known category for `query`.
    ///
    /// Unrecognised answers map to the default category. Transport failures,
    /// empty answers, timeouts, and cancellation are returned as errors.
    pub async fn classify_with_llm_cancellable(
        &self,
        query: &str,
        cancel: &CancellationToken,
    ) -> Result<CategoryId, PersonaError> {
        let provider = self.provider.as_ref().ok_or_else(|| {
            PersonaError::ProviderUnavailable("no LLM provider configured".into())
        })?;

        let prompt = self.build_prompt(query);
        let raw = tokio::select! {
            _ = cancel.cancelled() => return Err(PersonaError::Cancelled),
            res = tokio::time::timeout(self.timeout, provider.classify(&prompt)) => {
                res.map_err(|_| PersonaError::Timeout { duration: self.timeout })??
            }
        };

        let category = self.parse_response(&raw)?;
        debug!(provider = provider.name(), category = %category, "LLM classification");
        Ok(category)
    }

    pub fn build_prompt(&self, query: &str) -> String {
        let categories = self
            .known
            .iter()
            .map(CategoryId::as_str)
            .collect::<Vec<_>>()
            .join(", ");
        format!(
            "Classify the user request into exactly one of these categories: {categories}.\n\
             Answer with the category identifier only, with no explanation.\n\
             If none fits, answer {default}.\n\n\
             Request: {query}\n\
             Category:",
            default = self.default_category,
        )
    }

    /// Normalise a raw completion into a known category.
    pub fn parse_response(&self, raw: &str) -> Result<CategoryId, PersonaError> {
        let answer = raw
            .trim()
            .trim_matches(|c: char| matches!(c, '"' | '\'' | '`' | '.') || c.is_whitespace())
            .to_lowercase();

        if answer.is_empty() {
            return Err(PersonaError::LlmInvalidResponse("empty completion".into()));
        }

        match self.known.iter().find(|c| c.as_str() == answer) {
            Some(category) => Ok(category.clone()),
            None => {
                warn!(answer = %answer, "LLM answered outside the category set, using default");
                Ok(self.default_category.clone())
            }
        }
    }
}
