// SPDX-FileCopyrightText: 2026 Persona Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory routing counters.
//!
//! Counts live behind a tokio mutex and are also mirrored to the `metrics`
//! facade, so any installed recorder can export them.

use std::collections::BTreeMap;

use metrics::describe_counter;
use persona_core::CategoryId;
use serde::Serialize;
use strum::{Display, EnumString};
use tokio::sync::Mutex;

/// The stage that produced a final routing decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum RoutingLevel {
    Keyword,
    Context,
    Llm,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LevelCounts {
    pub keyword: u64,
    pub context: u64,
    pub llm: u64,
}

impl LevelCounts {
    fn bump(&mut self, level: RoutingLevel) {
        match level {
            RoutingLevel::Keyword => self.keyword += 1,
            RoutingLevel::Context => self.context += 1,
            RoutingLevel::Llm => self.llm += 1,
        }
    }
}

/// Read-only snapshot of the routing counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RoutingStats {
    pub total_routings: u64,
    pub by_level: LevelCounts,
    pub by_category: BTreeMap<CategoryId, u64>,
    /// Manual persona switches.
    pub user_overrides: u64,
}

/// Register metric descriptions for the router's counters.
///
/// Optional; call once after installing a recorder.
pub fn register_metrics() {
    describe_counter!("persona_routings_total", "Completed routing decisions");
    describe_counter!("persona_user_overrides_total", "Manual persona switches");
    describe_counter!("persona_suggestions_total", "Suggestions by outcome");
}

pub(crate) fn record_suggestion_metric(outcome: &'static str) {
    metrics::counter!("persona_suggestions_total", "outcome" => outcome).increment(1);
}

#[derive(Default)]
pub struct StatsRecorder {
    inner: Mutex<RoutingStats>,
}

impl StatsRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one completed routing. All three counters move under a single lock.
    pub async fn record_routing(&self, level: RoutingLevel, category: &CategoryId) {
        {
            let mut stats = self.inner.lock().await;
            stats.total_routings += 1;
            stats.by_level.bump(level);
            *stats.by_category.entry(category.clone()).or_insert(0) += 1;
        }
        metrics::counter!(
            "persona_routings_total",
            "level" => level.to_string(),
            "category" => category.to_string()
        )
        .increment(1);
    }

    pub async fn record_override(&self) {
        self.inner.lock().await.user_overrides += 1;
        metrics::counter!("persona_user_overrides_total").increment(1);
    }

    pub async fn snapshot(&self) -> RoutingStats {
        self.inner.lock().await.clone()
    }

    pub async fn reset(&self) {
        *self.inner.lock().await = RoutingStats::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn routing_moves_all_three_counters() {
        let stats = StatsRecorder::new();
        let it = CategoryId::new("it_expert");
        stats.record_routing(RoutingLevel::Keyword, &it).await;
        stats.record_routing(RoutingLevel::Llm, &it).await;
        stats
            .record_routing(RoutingLevel::Context, &CategoryId::new("hr_expert"))
            .await;

        let snap = stats.snapshot().await;
        assert_eq!(snap.total_routings, 3);
        assert_eq!(
            snap.by_level,
            LevelCounts {
                keyword: 1,
                context: 1,
                llm: 1
            }
        );
        assert_eq!(snap.by_category[&it], 2);
        assert_eq!(snap.user_overrides, 0);
    }

    #[tokio::test]
    async fn overrides_and_reset() {
        let stats = StatsRecorder::new();
        stats.record_override().await;
        stats.record_override().await;
        assert_eq!(stats.snapshot().await.user_overrides, 2);

        stats.reset().await;
        assert_eq!(stats.snapshot().await, RoutingStats::default());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_recording_is_not_lost() {
        let stats = Arc::new(StatsRecorder::new());
        let handles: Vec<_> = (0..50)
            .map(|_| {
                let stats = Arc::clone(&stats);
                tokio::spawn(async move {
                    stats
                        .record_routing(RoutingLevel::Keyword, &CategoryId::new("assistant"))
                        .await;
                })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap();
        }

        let snap = stats.snapshot().await;
        assert_eq!(snap.total_routings, 50);
        assert_eq!(snap.by_level.keyword, 50);
    }

    #[test]
    fn level_labels_are_snake_case() {
        assert_eq!(RoutingLevel::Llm.to_string(), "llm");
        assert_eq!(serde_json::to_string(&RoutingLevel::Keyword).unwrap(), "\"keyword\"");
    }
}
