// SPDX-FileCopyrightText: 2026 Persona Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the persona router.

use thiserror::Error;

/// The primary error type used across collaborator traits and routing stages.
#[derive(Debug, Error)]
pub enum PersonaError {
    /// Configuration errors (invalid TOML, missing fields, bad values).
    #[error("configuration error: {0}")]
    Config(String),

    /// Rule catalog could not be parsed or failed validation.
    #[error("rule catalog error: {0}")]
    Catalog(String),

    /// Caller supplied input the router cannot act on.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The usage history backend failed or returned unusable data.
    #[error("history unavailable: {message}")]
    HistoryUnavailable {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// LLM provider transport or API failure.
    #[error("provider error: {message}")]
    Provider {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The LLM answered, but the answer was empty or malformed.
    #[error("invalid LLM response: {0}")]
    LlmInvalidResponse(String),

    /// No LLM provider is configured for this deployment.
    #[error("LLM provider unavailable: {0}")]
    ProviderUnavailable(String),

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Operation was cancelled by the caller.
    #[error("operation cancelled")]
    Cancelled,

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl PersonaError {
    /// Returns true for failures of the LLM stage that the coordinator
    /// recovers from by falling back to the keyword result.
    pub fn is_llm_failure(&self) -> bool {
        matches!(
            self,
            PersonaError::Provider { .. }
                | PersonaError::LlmInvalidResponse(_)
                | PersonaError::ProviderUnavailable(_)
                | PersonaError::Timeout { .. }
                | PersonaError::Cancelled
        )
    }
}
