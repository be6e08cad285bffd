// SPDX-FileCopyrightText: 2026 Persona Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Multi-stage intent routing for persona agents.
//!
//! Queries pass through up to three levels of escalating cost:
//!
//! 1. [`KeywordClassifier`]: whole-word trigger phrase matching against a
//!    [`RuleCatalog`].
//! 2. [`ContextEnricher`]: biases uncertain results toward the persona the
//!    user has been using.
//! 3. [`FallbackClassifier`]: asks an LLM to pick from the known categories.
//!
//! [`RoutingCoordinator`] runs the levels and keeps process-wide statistics.
//! [`RouterContext`] adds one user's suggestion loop and active persona on top.

pub mod catalog;
pub mod classifier;
pub mod context;
pub mod enrich;
pub mod event;
pub mod fallback;
pub mod history;
pub mod router;
pub mod stats;
pub mod suggestion;

pub use catalog::{Rule, RuleCatalog};
pub use classifier::{ClassificationReason, ClassificationResult, ContextBoost, KeywordClassifier};
pub use context::RouterContext;
pub use enrich::ContextEnricher;
pub use event::{PersonaEvent, SwitchSource};
pub use fallback::FallbackClassifier;
pub use history::InMemoryHistory;
pub use router::RoutingCoordinator;
pub use stats::{LevelCounts, RoutingLevel, RoutingStats, StatsRecorder, register_metrics};
pub use suggestion::{Suggestion, SuggestionManager, SuggestionStats};
