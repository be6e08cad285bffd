// SPDX-FileCopyrightText: 2026 Persona Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Level 2: bias uncertain classifications toward the user's habitual persona.
//!
//! Enrichment never fails. History errors, timeouts, and cancellation all
//! leave the prior result untouched.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use persona_config::model::ContextConfig;
use persona_core::{CategoryId, HistoryProvider, PersonaError, UsageRecord};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::classifier::{ClassificationReason, ClassificationResult, ContextBoost, round_confidence};

/// Usage-history based enrichment stage.
pub struct ContextEnricher {
    history: Option<Arc<dyn HistoryProvider>>,
    config: ContextConfig,
    known: HashSet<CategoryId>,
}

impl ContextEnricher {
    pub fn new(config: ContextConfig, known_categories: &[CategoryId]) -> Self {
        Self {
            history: None,
            config,
            known: known_categories.iter().cloned().collect(),
        }
    }

    pub fn with_history(mut self, history: Arc<dyn HistoryProvider>) -> Self {
        self.history = Some(history);
        self
    }

    /// Enrich `prior` using `user_id`'s recent sessions.
    pub async fn enrich(&self, prior: ClassificationResult, user_id: &str) -> ClassificationResult {
        self.enrich_cancellable(prior, user_id, &CancellationToken::new())
            .await
    }

    /// Like [`enrich`](Self::enrich), but gives up on the lookup when `cancel` fires.
    pub async fn enrich_cancellable(
        &self,
        prior: ClassificationResult,
        user_id: &str,
        cancel: &CancellationToken,
    ) -> ClassificationResult {
        let Some(history) = self.history.as_ref().filter(|_| self.config.enabled) else {
            return prior;
        };
        if prior.confidence >= self.config.max_prior_confidence {
            return prior;
        }

        let records = match self.fetch(history.as_ref(), user_id, cancel).await {
            Ok(records) => records,
            Err(e) => {
                warn!(user_id, error = %e, "usage history unavailable, skipping enrichment");
                return prior;
            }
        };

        let Some((mode, share, sample_size)) = habitual_category(&records, self.config.history_limit)
        else {
            return prior;
        };

        if share <= self.config.min_usage_share {
            debug!(user_id, category = %mode, share, "no dominant habitual persona");
            return prior;
        }
        if !self.known.contains(&mode) {
            warn!(user_id, category = %mode, "history names an unknown category, ignoring");
            return prior;
        }

        let confidence =
            round_confidence((prior.confidence + self.config.boost).min(self.config.max_confidence));
        debug!(
            user_id,
            from = %prior.category,
            to = %mode,
            confidence,
            share,
            "context boost applied"
        );

        ClassificationResult {
            category: mode,
            confidence,
            reason: ClassificationReason::ContextBoost,
            context: Some(ContextBoost {
                usage_frequency: share,
                sample_size,
            }),
            ..prior
        }
    }

    async fn fetch(
        &self,
        history: &dyn HistoryProvider,
        user_id: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<UsageRecord>, PersonaError> {
        let timeout = self.config.timeout();
        tokio::select! {
            _ = cancel.cancelled() => Err(PersonaError::Cancelled),
            res = tokio::time::timeout(timeout, history.get_recent(user_id, self.config.history_limit)) => {
                res.unwrap_or(Err(PersonaError::Timeout { duration: timeout }))
            }
        }
    }
}

/// Most frequent category among the first `limit` records, with its share and the sample size.
///
/// Ties go to the category seen most recently.
fn habitual_category(
    records: &[UsageRecord],
    limit: usize,
) -> Option<(CategoryId, f32, usize)> {
    let sample = &records[..records.len().min(limit)];
    if sample.is_empty() {
        return None;
    }

    let mut counts: HashMap<&CategoryId, usize> = HashMap::new();
    let mut order: Vec<&CategoryId> = Vec::new();
    for record in sample {
        let count = counts.entry(&record.category).or_insert(0);
        if *count == 0 {
            order.push(&record.category);
        }
        *count += 1;
    }

    let mut best: Option<(&CategoryId, usize)> = None;
    for category in order {
        let count = counts[category];
        if best.is_none_or(|(_, c)| count > c) {
            best = Some((category, count));
        }
    }

    best.map(|(category, count)| {
        (
            category.clone(),
            count as f32 / sample.len() as f32,
            sample.len(),
        )
    })
}
