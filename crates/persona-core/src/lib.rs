// SPDX-FileCopyrightText: 2026 Persona Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the persona router.
//!
//! This crate provides the error taxonomy, shared types, and the
//! collaborator traits (usage history, LLM classification) that the
//! routing engine consumes but does not own.

pub mod error;
pub mod traits;
pub mod types;

pub use error::PersonaError;
pub use types::{AdapterType, CategoryId, HealthStatus, UsageRecord};

pub use traits::{HistoryProvider, LlmProvider, PluginAdapter};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn persona_error_display_messages() {
        let timeout = PersonaError::Timeout {
            duration: std::time::Duration::from_secs(3),
        };
        assert_eq!(timeout.to_string(), "operation timed out after 3s");

        let history = PersonaError::HistoryUnavailable {
            message: "db locked".into(),
            source: None,
        };
        assert_eq!(history.to_string(), "history unavailable: db locked");
        assert_eq!(PersonaError::Cancelled.to_string(), "operation cancelled");
    }

    #[test]
    fn llm_failures_are_recoverable() {
        assert!(PersonaError::Cancelled.is_llm_failure());
        assert!(PersonaError::LlmInvalidResponse("empty".into()).is_llm_failure());
        assert!(PersonaError::ProviderUnavailable("disabled".into()).is_llm_failure());
        assert!(PersonaError::Provider {
            message: "503".into(),
            source: Some(Box::new(std::io::Error::other("down"))),
        }
        .is_llm_failure());
        assert!(!PersonaError::Catalog("bad".into()).is_llm_failure());
        assert!(!PersonaError::Internal("bug".into()).is_llm_failure());
    }

    #[test]
    fn adapter_type_round_trips_through_strings() {
        use std::str::FromStr;

        for variant in [AdapterType::History, AdapterType::Llm] {
            let parsed = AdapterType::from_str(&variant.to_string()).expect("should parse back");
            assert_eq!(variant, parsed);
        }
    }

    #[test]
    fn category_id_serializes_as_plain_string() {
        let id = CategoryId::new("it_expert");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"it_expert\"");
        assert_eq!(id, "it_expert");
        assert_eq!(id.to_string(), "it_expert");
    }

    #[test]
    fn all_traits_are_exported() {
        fn _assert_plugin_adapter<T: PluginAdapter>() {}
        fn _assert_history_provider<T: HistoryProvider>() {}
        fn _assert_llm_provider<T: LlmProvider>() {}
    }
}
