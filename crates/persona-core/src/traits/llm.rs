// SPDX-FileCopyrightText: 2026 Persona Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! LLM provider trait used for last-resort classification.

use async_trait::async_trait;

use crate::error::PersonaError;
use crate::traits::adapter::PluginAdapter;

/// An opaque text-in, text-out language model.
///
/// Implementations may fail or hang; callers are expected to bound the
/// call with a timeout.
#[async_trait]
pub trait LlmProvider: PluginAdapter {
    /// Sends `prompt` and returns the raw completion text.
    async fn classify(&self, prompt: &str) -> Result<String, PersonaError>;
}
