// SPDX-FileCopyrightText: 2026 Persona Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The routing state machine.
//!
//! `KEYWORD -> (accept) -> CONTEXT -> (accept) -> LLM -> accept | fallback`.
//! Every call ends with exactly one stats update for the level that decided.

use std::sync::Arc;

use persona_config::model::{PersonaConfig, RoutingConfig};
use persona_core::{CategoryId, HistoryProvider, LlmProvider, PersonaError};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::catalog::RuleCatalog;
use crate::classifier::{
    ClassificationReason, ClassificationResult, DEFAULT_CONFIDENCE, KeywordClassifier,
};
use crate::enrich::ContextEnricher;
use crate::fallback::FallbackClassifier;
use crate::stats::{RoutingLevel, RoutingStats, StatsRecorder};

/// Process-wide router: the three classification levels plus shared stats.
pub struct RoutingCoordinator {
    classifier: Arc<KeywordClassifier>,
    enricher: ContextEnricher,
    fallback: FallbackClassifier,
    known: Vec<CategoryId>,
    thresholds: RoutingConfig,
    stats: StatsRecorder,
}

impl RoutingCoordinator {
    /// Build a coordinator with no history and no LLM attached.
    pub fn new(catalog: &RuleCatalog, config: &PersonaConfig) -> Result<Self, PersonaError> {
        let classifier = Arc::new(KeywordClassifier::new(catalog)?);
        let known = catalog.known_categories();
        Ok(Self {
            enricher: ContextEnricher::new(config.context.clone(), &known),
            fallback: FallbackClassifier::new(
                known.clone(),
                catalog.default_category().clone(),
                config.llm.timeout(),
            ),
            classifier,
            known,
            thresholds: config.routing.clone(),
            stats: StatsRecorder::new(),
        })
    }

    pub fn with_history(mut self, history: Arc<dyn HistoryProvider>) -> Self {
        self.enricher = self.enricher.with_history(history);
        self
    }

    pub fn with_llm(mut self, llm: Arc<dyn LlmProvider>) -> Self {
        self.fallback = self.fallback.with_provider(llm);
        self
    }

    /// The Level-1 classifier, shareable with suggestion managers.
    pub fn classifier(&self) -> &Arc<KeywordClassifier> {
        &self.classifier
    }

    pub fn known_categories(&self) -> &[CategoryId] {
        &self.known
    }

    pub fn is_known(&self, category: &CategoryId) -> bool {
        self.known.contains(category)
    }

    pub fn default_category(&self) -> &CategoryId {
        self.classifier.default_category()
    }

    /// Route `query` for `user_id`. Never fails; errors degrade to a fallback result.
    pub async fn route(&self, query: &str, user_id: &str) -> ClassificationResult {
        self.route_cancellable(query, user_id, &CancellationToken::new())
            .await
    }

    pub async fn route_cancellable(
        &self,
        query: &str,
        user_id: &str,
        cancel: &CancellationToken,
    ) -> ClassificationResult {
        let (result, level) = self.decide(query, user_id, cancel).await;
        self.stats.record_routing(level, &result.category).await;
        info!(
            user_id,
            category = %result.category,
            confidence = result.confidence,
            reason = %result.reason,
            level = %level,
            "query routed"
        );
        result
    }

    async fn decide(
        &self,
        query: &str,
        user_id: &str,
        cancel: &CancellationToken,
    ) -> (ClassificationResult, RoutingLevel) {
        let keyword = self.classifier.classify(query);
        if keyword.reason == ClassificationReason::InvalidInput
            || keyword.confidence > self.thresholds.keyword_accept_threshold
        {
            return (keyword, RoutingLevel::Keyword);
        }

        let enriched = self
            .enricher
            .enrich_cancellable(keyword.clone(), user_id, cancel)
            .await;
        if enriched.confidence > self.thresholds.context_accept_threshold {
            return (enriched, RoutingLevel::Context);
        }

        debug!(
            category = %enriched.category,
            confidence = enriched.confidence,
            "escalating to LLM"
        );
        let result = match self.fallback.classify_with_llm_cancellable(query, cancel).await {
            Ok(category) => ClassificationResult::new(
                category,
                self.thresholds.llm_confidence,
                ClassificationReason::LlmClassification,
            ),
            Err(e) => {
                if matches!(e, PersonaError::ProviderUnavailable(_)) {
                    debug!("no LLM configured, taking fallback path");
                } else {
                    warn!(error = %e, "LLM classification failed, falling back");
                }
                self.error_fallback(keyword)
            }
        };
        (result, RoutingLevel::Llm)
    }

    /// Keep the keyword result when it was reasonably confident, else the default.
    fn error_fallback(&self, keyword: ClassificationResult) -> ClassificationResult {
        if keyword.confidence > self.thresholds.fallback_keep_threshold {
            ClassificationResult {
                reason: ClassificationReason::Fallback,
                context: None,
                ..keyword
            }
        } else {
            ClassificationResult::new(
                self.default_category().clone(),
                DEFAULT_CONFIDENCE,
                ClassificationReason::Fallback,
            )
        }
    }

    pub async fn get_stats(&self) -> RoutingStats {
        self.stats.snapshot().await
    }

    pub async fn reset_stats(&self) {
        self.stats.reset().await;
    }

    pub async fn record_user_override(&self) {
        self.stats.record_override().await;
    }
}
