// SPDX-FileCopyrightText: 2026 Persona Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Non-committal "switch persona?" suggestions.
//!
//! Suggestions come from the keyword classifier alone, so analysing a query
//! never touches history or the LLM. Each suggestion is resolved at most once,
//! either accepted or rejected.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, TimeDelta, Utc};
use persona_config::model::SuggestionConfig;
use persona_core::CategoryId;
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::debug;

use crate::classifier::{ClassificationReason, KeywordClassifier};
use crate::stats::record_suggestion_metric;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Suggestion {
    pub suggested_category: CategoryId,
    pub current_category: CategoryId,
    pub confidence: f32,
    pub matched_phrases: Vec<String>,
    pub query_excerpt: String,
    /// Unique within one manager; used as the suggestion's identity.
    pub created_at: DateTime<Utc>,
    pub accepted: bool,
    pub rejected: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolved_at: Option<DateTime<Utc>>,
}

impl Suggestion {
    pub fn is_pending(&self) -> bool {
        !self.accepted && !self.rejected
    }

    fn resolve(&mut self, accepted: bool, at: DateTime<Utc>) -> bool {
        if !self.is_pending() {
            return false;
        }
        self.accepted = accepted;
        self.rejected = !accepted;
        self.resolved_at = Some(at);
        true
    }
}

/// Derived from the suggestion history on demand.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SuggestionStats {
    pub total: usize,
    pub accepted: usize,
    pub rejected: usize,
    pub pending: usize,
    /// Percentage with one decimal, e.g. `"45.5%"`, or `"0%"` with no history.
    pub acceptance_rate: String,
    pub per_category: BTreeMap<CategoryId, usize>,
    pub most_suggested_category: Option<CategoryId>,
}

#[derive(Default)]
struct SuggestionState {
    /// Newest first.
    history: VecDeque<Suggestion>,
    last: Option<Suggestion>,
    last_created: Option<DateTime<Utc>>,
}

pub struct SuggestionManager {
    classifier: Arc<KeywordClassifier>,
    config: SuggestionConfig,
    enabled: AtomicBool,
    state: Mutex<SuggestionState>,
}

impl SuggestionManager {
    pub fn new(classifier: Arc<KeywordClassifier>, config: SuggestionConfig) -> Self {
        Self {
            enabled: AtomicBool::new(config.enabled),
            classifier,
            config,
            state: Mutex::new(SuggestionState::default()),
        }
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Relaxed);
        debug!(enabled, "suggestions toggled");
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    /// Propose a switch away from `current` if the query clearly belongs elsewhere.
    ///
    /// Returns `None` when suggestions are disabled, the query is too short,
    /// the detected persona is already active, or detection is not confident.
    pub async fn analyze(&self, query: &str, current: &CategoryId) -> Option<Suggestion> {
        if !self.is_enabled() {
            return None;
        }
        if query.trim().chars().count() < self.config.min_query_chars {
            return None;
        }

        let detected = self.classifier.classify(query);
        if detected.reason == ClassificationReason::InvalidInput
            || &detected.category == current
            || detected.confidence < self.config.min_confidence
        {
            return None;
        }

        let mut state = self.state.lock().await;
        let created_at = next_timestamp(state.last_created);
        state.last_created = Some(created_at);

        let suggestion = Suggestion {
            suggested_category: detected.category,
            current_category: current.clone(),
            confidence: detected.confidence,
            matched_phrases: detected.matched_phrases,
            query_excerpt: query.chars().take(self.config.excerpt_chars).collect(),
            created_at,
            accepted: false,
            rejected: false,
            resolved_at: None,
        };

        state.history.push_front(suggestion.clone());
        state.history.truncate(self.config.max_history);
        state.last = Some(suggestion.clone());
        drop(state);

        record_suggestion_metric("offered");
        debug!(
            from = %suggestion.current_category,
            to = %suggestion.suggested_category,
            confidence = suggestion.confidence,
            "suggestion offered"
        );
        Some(suggestion)
    }

    /// Mark `suggestion` accepted. `false` if it is unknown or already resolved.
    pub async fn accept(&self, suggestion: &Suggestion) -> bool {
        self.resolve(suggestion, true).await.is_some()
    }

    /// Mark `suggestion` rejected. `false` if it is unknown or already resolved.
    pub async fn reject(&self, suggestion: &Suggestion) -> bool {
        self.resolve(suggestion, false).await.is_some()
    }

    /// Resolve the suggestion created at the same instant as `target`.
    ///
    /// Returns the resolved suggestion only when this call made the transition.
    pub(crate) async fn resolve(&self, target: &Suggestion, accepted: bool) -> Option<Suggestion> {
        let now = Utc::now();
        let mut state = self.state.lock().await;
        let SuggestionState { history, last, .. } = &mut *state;

        let mut resolved = None;
        if let Some(entry) = history
            .iter_mut()
            .find(|s| s.created_at == target.created_at)
            && entry.resolve(accepted, now)
        {
            resolved = Some(entry.clone());
        }
        if let Some(entry) = last.as_mut().filter(|s| s.created_at == target.created_at)
            && entry.resolve(accepted, now)
            && resolved.is_none()
        {
            resolved = Some(entry.clone());
        }
        drop(state);

        if resolved.is_some() {
            record_suggestion_metric(if accepted { "accepted" } else { "rejected" });
        }
        resolved
    }

    pub async fn last_suggestion(&self) -> Option<Suggestion> {
        self.state.lock().await.last.clone()
    }

    /// Newest first.
    pub async fn history(&self) -> Vec<Suggestion> {
        self.state.lock().await.history.iter().cloned().collect()
    }

    pub async fn get_stats(&self) -> SuggestionStats {
        let state = self.state.lock().await;
        compute_stats(&state.history)
    }
}

/// Strictly increasing creation timestamps so equality identifies one suggestion.
fn next_timestamp(previous: Option<DateTime<Utc>>) -> DateTime<Utc> {
    let now = Utc::now();
    match previous {
        Some(prev) if now <= prev => prev + TimeDelta::microseconds(1),
        _ => now,
    }
}

fn compute_stats(history: &VecDeque<Suggestion>) -> SuggestionStats {
    let total = history.len();
    let accepted = history.iter().filter(|s| s.accepted).count();
    let rejected = history.iter().filter(|s| s.rejected).count();

    let acceptance_rate = if total == 0 {
        "0%".to_string()
    } else {
        // Half-up to one decimal, so 1 of 16 reads 6.3% rather than 6.2%.
        let rate = (accepted as f64 * 1000.0 / total as f64).round() / 10.0;
        format!("{rate:.1}%")
    };

    let mut counts: HashMap<&CategoryId, usize> = HashMap::new();
    let mut most: Option<(&CategoryId, usize)> = None;
    for s in history {
        *counts.entry(&s.suggested_category).or_insert(0) += 1;
    }
    // Newest first, so on ties the most recently suggested category wins.
    for s in history {
        let count = counts[&s.suggested_category];
        if most.is_none_or(|(_, c)| count > c) {
            most = Some((&s.suggested_category, count));
        }
    }

    SuggestionStats {
        total,
        accepted,
        rejected,
        pending: total - accepted - rejected,
        acceptance_rate,
        per_category: counts.iter().map(|(c, n)| ((*c).clone(), *n)).collect(),
        most_suggested_category: most.map(|(c, _)| c.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Rule, RuleCatalog};

    fn manager_with(config: SuggestionConfig) -> SuggestionManager {
        let catalog = RuleCatalog::new(
            CategoryId::new("assistant"),
            vec![
                Rule {
                    category: CategoryId::new("it_expert"),
                    trigger_phrases: vec!["server".into(), "bug".into()],
                    base_confidence: 0.85,
                },
                Rule {
                    category: CategoryId::new("hr_expert"),
                    trigger_phrases: vec!["payroll".into(), "vacation".into()],
                    base_confidence: 0.9,
                },
                Rule {
                    category: CategoryId::new("sales_expert"),
                    trigger_phrases: vec!["quote".into()],
                    base_confidence: 0.6,
                },
            ],
        )
        .unwrap();
        let classifier = KeywordClassifier::new(&catalog).unwrap();
        SuggestionManager::new(Arc::new(classifier), config)
    }

    fn manager() -> SuggestionManager {
        manager_with(SuggestionConfig::default())
    }

    fn assistant() -> CategoryId {
        CategoryId::new("assistant")
    }

    #[tokio::test]
    async fn confident_detection_produces_suggestion() {
        let mgr = manager();
        let s = mgr
            .analyze("the server crashed again", &assistant())
            .await
            .expect("suggestion");
        assert_eq!(s.suggested_category, "it_expert");
        assert_eq!(s.current_category, "assistant");
        assert_eq!(s.matched_phrases, vec!["server"]);
        assert!(s.is_pending());
        assert_eq!(mgr.last_suggestion().await, Some(s));
    }

    #[tokio::test]
    async fn null_cases() {
        let mgr = manager();
        // Too short.
        assert!(mgr.analyze("hi", &assistant()).await.is_none());
        assert!(mgr.analyze(" server  ", &assistant()).await.is_none());
        // Already active.
        let it = CategoryId::new("it_expert");
        assert!(mgr.analyze("the server crashed again", &it).await.is_none());
        // Below 0.85.
        assert!(mgr.analyze("send me a quote please", &assistant()).await.is_none());
        // No match at all.
        assert!(mgr.analyze("tell me a long story", &assistant()).await.is_none());
        // Disabled.
        mgr.set_enabled(false);
        assert!(!mgr.is_enabled());
        assert!(mgr.analyze("the server crashed again", &assistant()).await.is_none());

        assert!(mgr.history().await.is_empty());
    }

    #[tokio::test]
    async fn accept_and_reject_are_exclusive_and_idempotent() {
        let mgr = manager();
        let s = mgr.analyze("payroll question here", &assistant()).await.unwrap();

        assert!(mgr.accept(&s).await);
        assert!(!mgr.accept(&s).await);
        assert!(!mgr.reject(&s).await);

        let stored = mgr.last_suggestion().await.unwrap();
        assert!(stored.accepted);
        assert!(!stored.rejected);
        assert!(stored.resolved_at.is_some());

        let stats = mgr.get_stats().await;
        assert_eq!(stats.accepted, 1);
        assert_eq!(stats.rejected, 0);
        assert_eq!(stats.acceptance_rate, "100.0%");
    }

    #[tokio::test]
    async fn unknown_suggestion_is_not_resolved() {
        let mgr = manager();
        let s = mgr.analyze("payroll question here", &assistant()).await.unwrap();
        let stranger = Suggestion {
            created_at: s.created_at - TimeDelta::seconds(5),
            ..s
        };
        assert!(!mgr.reject(&stranger).await);
        assert_eq!(mgr.get_stats().await.pending, 1);
    }

    #[tokio::test]
    async fn history_is_bounded_newest_first() {
        let mgr = manager_with(SuggestionConfig {
            max_history: 3,
            ..SuggestionConfig::default()
        });
        for i in 0..5 {
            mgr.analyze(&format!("server problem number {i}"), &assistant())
                .await
                .unwrap();
        }
        let history = mgr.history().await;
        assert_eq!(history.len(), 3);
        assert_eq!(history[0].query_excerpt, "server problem number 4");
        assert_eq!(history[2].query_excerpt, "server problem number 2");
        assert!(history.windows(2).all(|w| w[0].created_at > w[1].created_at));
    }

    #[tokio::test]
    async fn excerpt_is_truncated_by_chars() {
        let mgr = manager_with(SuggestionConfig {
            excerpt_chars: 12,
            ..SuggestionConfig::default()
        });
        let s = mgr
            .analyze("vacation à préparer pour l'été prochain", &assistant())
            .await
            .unwrap();
        assert_eq!(s.query_excerpt, "vacation à p");
    }

    #[tokio::test]
    async fn empty_stats_never_divide_by_zero() {
        let stats = manager().get_stats().await;
        assert_eq!(stats.total, 0);
        assert_eq!(stats.acceptance_rate, "0%");
        assert_eq!(stats.most_suggested_category, None);
        assert!(stats.per_category.is_empty());
    }

    #[tokio::test]
    async fn acceptance_rate_rounds_half_up() {
        let mgr = manager();
        let mut first = None;
        for _ in 0..16 {
            let s = mgr.analyze("payroll question here", &assistant()).await.unwrap();
            first.get_or_insert(s);
        }
        assert!(mgr.accept(&first.unwrap()).await);

        let stats = mgr.get_stats().await;
        assert_eq!(stats.total, 16);
        assert_eq!(stats.acceptance_rate, "6.3%");
    }

    #[tokio::test]
    async fn most_suggested_ties_favour_recent() {
        let mgr = manager();
        mgr.analyze("server is down today", &assistant()).await.unwrap();
        mgr.analyze("payroll is late today", &assistant()).await.unwrap();
        let stats = mgr.get_stats().await;
        assert_eq!(stats.per_category[&CategoryId::new("it_expert")], 1);
        assert_eq!(stats.per_category[&CategoryId::new("hr_expert")], 1);
        assert_eq!(stats.most_suggested_category, Some(CategoryId::new("hr_expert")));

        mgr.analyze("another server bug", &assistant()).await.unwrap();
        let stats = mgr.get_stats().await;
        assert_eq!(stats.most_suggested_category, Some(CategoryId::new("it_expert")));
    }

    #[test]
    fn timestamps_strictly_increase() {
        let future = Utc::now() + TimeDelta::seconds(60);
        let next = next_timestamp(Some(future));
        assert_eq!(next, future + TimeDelta::microseconds(1));
        assert!(next_timestamp(None) <= Utc::now());
    }
}
