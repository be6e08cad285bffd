// SPDX-FileCopyrightText: 2026 Persona Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Checks semantic constraints serde cannot express: confidence ranges,
//! non-zero limits and timeouts, and LLM settings when the stage is enabled.

use crate::diagnostic::ConfigError;
use crate::model::PersonaConfig;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized configuration.
///
/// Collects every violation instead of stopping at the first one.
pub fn validate_config(config: &PersonaConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if !LOG_LEVELS.contains(&config.agent.log_level.as_str()) {
        errors.push(ConfigError::validation(format!(
            "agent.log_level `{}` must be one of {}",
            config.agent.log_level,
            LOG_LEVELS.join(", ")
        )));
    }

    if config.agent.user_id.trim().is_empty() {
        errors.push(ConfigError::validation("agent.user_id must not be empty"));
    }

    if let Some(path) = &config.catalog.path
        && path.trim().is_empty()
    {
        errors.push(ConfigError::validation(
            "catalog.path must not be empty when set",
        ));
    }

    let unit_values = [
        ("routing.keyword_accept_threshold", config.routing.keyword_accept_threshold),
        ("routing.context_accept_threshold", config.routing.context_accept_threshold),
        ("routing.fallback_keep_threshold", config.routing.fallback_keep_threshold),
        ("routing.llm_confidence", config.routing.llm_confidence),
        ("context.max_prior_confidence", config.context.max_prior_confidence),
        ("context.min_usage_share", config.context.min_usage_share),
        ("context.max_confidence", config.context.max_confidence),
        ("suggestions.min_confidence", config.suggestions.min_confidence),
    ];
    for (key, value) in unit_values {
        check_unit_interval(&mut errors, key, value);
    }

    if !(config.context.boost > 0.0 && config.context.boost <= 1.0) {
        errors.push(ConfigError::validation(format!(
            "context.boost must be in (0, 1], got {}",
            config.context.boost
        )));
    }

    if config.context.history_limit == 0 {
        errors.push(ConfigError::validation(
            "context.history_limit must be at least 1",
        ));
    }

    if config.context.timeout_ms == 0 {
        errors.push(ConfigError::validation("context.timeout_ms must be at least 1"));
    }

    if config.llm.timeout_ms == 0 {
        errors.push(ConfigError::validation("llm.timeout_ms must be at least 1"));
    }

    if config.llm.enabled {
        if config.llm.endpoint.trim().is_empty() {
            errors.push(ConfigError::validation(
                "llm.endpoint must not be empty when llm.enabled = true",
            ));
        }
        if config.llm.model.trim().is_empty() {
            errors.push(ConfigError::validation(
                "llm.model must not be empty when llm.enabled = true",
            ));
        }
    }

    if config.suggestions.max_history == 0 {
        errors.push(ConfigError::validation(
            "suggestions.max_history must be at least 1",
        ));
    }

    if config.suggestions.excerpt_chars == 0 {
        errors.push(ConfigError::validation(
            "suggestions.excerpt_chars must be at least 1",
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_unit_interval(errors: &mut Vec<ConfigError>, key: &str, value: f32) {
    if !(0.0..=1.0).contains(&value) {
        errors.push(ConfigError::validation(format!(
            "{key} must be between 0.0 and 1.0, got {value}"
        )));
    }
}
