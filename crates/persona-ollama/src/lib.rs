// SPDX-FileCopyrightText: 2026 Persona Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Ollama LLM provider for the persona router's fallback stage.
//!
//! Sends the closed-set classification prompt to `/api/generate` with
//! streaming disabled and temperature zero.

pub mod client;
pub mod types;

use std::time::Duration;

use async_trait::async_trait;
use persona_config::model::LlmConfig;
use persona_core::{AdapterType, HealthStatus, LlmProvider, PersonaError, PluginAdapter};
use tracing::debug;

use crate::client::OllamaClient;

pub struct OllamaProvider {
    client: OllamaClient,
}

impl OllamaProvider {
    pub fn new(endpoint: &str, model: &str, timeout: Duration) -> Result<Self, PersonaError> {
        Ok(Self {
            client: OllamaClient::new(endpoint, model, timeout)?,
        })
    }

    /// Build from the `[llm]` config section.
    pub fn from_config(config: &LlmConfig) -> Result<Self, PersonaError> {
        Self::new(&config.endpoint, &config.model, config.timeout())
    }

    pub fn with_client(client: OllamaClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl PluginAdapter for OllamaProvider {
    fn name(&self) -> &str {
        "ollama"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Llm
    }

    async fn health_check(&self) -> Result<HealthStatus, PersonaError> {
        match self.client.ping().await {
            Ok(()) => Ok(HealthStatus::Healthy),
            Err(e) => Ok(HealthStatus::Unhealthy(e.to_string())),
        }
    }
}

#[async_trait]
impl LlmProvider for OllamaProvider {
    async fn classify(&self, prompt: &str) -> Result<String, PersonaError> {
        debug!(model = self.client.model(), "sending classification prompt");
        self.client.generate(prompt).await
    }
}
