// SPDX-FileCopyrightText: 2026 Persona Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the persona router.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Top-level persona router configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PersonaConfig {
    /// Identity and logging settings.
    #[serde(default)]
    pub agent: AgentConfig,

    /// Rule catalog location.
    #[serde(default)]
    pub catalog: CatalogConfig,

    /// Routing thresholds.
    #[serde(default)]
    pub routing: RoutingConfig,

    /// Usage-history enrichment settings.
    #[serde(default)]
    pub context: ContextConfig,

    /// LLM fallback classification settings.
    #[serde(default)]
    pub llm: LlmConfig,

    /// Persona switch suggestion settings.
    #[serde(default)]
    pub suggestions: SuggestionConfig,
}

/// Identity and logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AgentConfig {
    /// Display name used in logs and the shell prompt.
    #[serde(default = "default_agent_name")]
    pub name: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// User the CLI routes as. The desktop deployment is single-tenant.
    #[serde(default = "default_user_id")]
    pub user_id: String,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            name: default_agent_name(),
            log_level: default_log_level(),
            user_id: default_user_id(),
        }
    }
}

fn default_agent_name() -> String {
    "persona".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_user_id() -> String {
    "local".to_string()
}

/// Rule catalog configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CatalogConfig {
    /// Path to an external catalog TOML file. `None` uses the built-in catalog.
    #[serde(default)]
    pub path: Option<String>,
}

/// Confidence thresholds applied by the routing coordinator.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RoutingConfig {
    /// Keyword results strictly above this confidence are accepted without enrichment.
    #[serde(default = "default_keyword_accept_threshold")]
    pub keyword_accept_threshold: f32,

    /// Enriched results strictly above this confidence skip the LLM.
    #[serde(default = "default_context_accept_threshold")]
    pub context_accept_threshold: f32,

    /// On LLM failure, the keyword category is kept when its confidence is strictly above this.
    #[serde(default = "default_fallback_keep_threshold")]
    pub fallback_keep_threshold: f32,

    /// Confidence reported for a successful LLM classification.
    #[serde(default = "default_llm_confidence")]
    pub llm_confidence: f32,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            keyword_accept_threshold: default_keyword_accept_threshold(),
            context_accept_threshold: default_context_accept_threshold(),
            fallback_keep_threshold: default_fallback_keep_threshold(),
            llm_confidence: default_llm_confidence(),
        }
    }
}

fn default_keyword_accept_threshold() -> f32 {
    0.9
}

fn default_context_accept_threshold() -> f32 {
    0.8
}

fn default_fallback_keep_threshold() -> f32 {
    0.5
}

fn default_llm_confidence() -> f32 {
    0.85
}

/// Usage-history enrichment configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ContextConfig {
    /// Enable history-based enrichment.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Number of recent usage records to sample.
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,

    /// Enrichment only applies to priors strictly below this confidence.
    #[serde(default = "default_max_prior_confidence")]
    pub max_prior_confidence: f32,

    /// Habitual category must hold strictly more than this share of the sample.
    #[serde(default = "default_min_usage_share")]
    pub min_usage_share: f32,

    /// Confidence added to the prior when enrichment applies.
    #[serde(default = "default_boost")]
    pub boost: f32,

    /// Upper bound on an enriched confidence.
    #[serde(default = "default_max_confidence")]
    pub max_confidence: f32,

    /// Timeout for the history lookup, in milliseconds.
    #[serde(default = "default_context_timeout_ms")]
    pub timeout_ms: u64,
}

impl ContextConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            history_limit: default_history_limit(),
            max_prior_confidence: default_max_prior_confidence(),
            min_usage_share: default_min_usage_share(),
            boost: default_boost(),
            max_confidence: default_max_confidence(),
            timeout_ms: default_context_timeout_ms(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_history_limit() -> usize {
    10
}

fn default_max_prior_confidence() -> f32 {
    0.8
}

fn default_min_usage_share() -> f32 {
    0.6
}

fn default_boost() -> f32 {
    0.15
}

fn default_max_confidence() -> f32 {
    0.9
}

fn default_context_timeout_ms() -> u64 {
    1000
}

/// LLM fallback configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LlmConfig {
    /// Enable the LLM stage. When false, low-confidence queries take the fallback path.
    #[serde(default)]
    pub enabled: bool,

    /// Base URL of an Ollama-compatible server.
    #[serde(default = "default_llm_endpoint")]
    pub endpoint: String,

    /// Model used for classification.
    #[serde(default = "default_llm_model")]
    pub model: String,

    /// Timeout for one classification call, in milliseconds.
    #[serde(default = "default_llm_timeout_ms")]
    pub timeout_ms: u64,
}

impl LlmConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            endpoint: default_llm_endpoint(),
            model: default_llm_model(),
            timeout_ms: default_llm_timeout_ms(),
        }
    }
}

fn default_llm_endpoint() -> String {
    "http://localhost:11434".to_string()
}

fn default_llm_model() -> String {
    "llama3.2".to_string()
}

fn default_llm_timeout_ms() -> u64 {
    3000
}

/// Persona switch suggestion configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SuggestionConfig {
    /// Whether suggestions start enabled. Can be toggled at runtime.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Minimum keyword confidence for a suggestion.
    #[serde(default = "default_suggestion_min_confidence")]
    pub min_confidence: f32,

    /// Queries shorter than this many characters never produce a suggestion.
    #[serde(default = "default_min_query_chars")]
    pub min_query_chars: usize,

    /// Number of suggestions kept in history (oldest evicted first).
    #[serde(default = "default_max_history")]
    pub max_history: usize,

    /// Maximum characters of the query stored with a suggestion.
    #[serde(default = "default_excerpt_chars")]
    pub excerpt_chars: usize,
}

impl Default for SuggestionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            min_confidence: default_suggestion_min_confidence(),
            min_query_chars: default_min_query_chars(),
            max_history: default_max_history(),
            excerpt_chars: default_excerpt_chars(),
        }
    }
}

fn default_suggestion_min_confidence() -> f32 {
    0.85
}

fn default_min_query_chars() -> usize {
    10
}

fn default_max_history() -> usize {
    50
}

fn default_excerpt_chars() -> usize {
    200
}
