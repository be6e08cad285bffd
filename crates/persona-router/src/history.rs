// SPDX-FileCopyrightText: 2026 Persona Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Process-local usage history.

use std::collections::{HashMap, VecDeque};

use async_trait::async_trait;
use chrono::Utc;
use persona_core::{
    AdapterType, CategoryId, HealthStatus, HistoryProvider, PersonaError, PluginAdapter,
    UsageRecord,
};
use tokio::sync::RwLock;

/// Bounded per-user session log, newest first.
pub struct InMemoryHistory {
    capacity: usize,
    sessions: RwLock<HashMap<String, VecDeque<UsageRecord>>>,
}

impl InMemoryHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Record that `user_id` is now working with `category`.
    pub async fn record(&self, user_id: &str, category: &CategoryId) {
        let mut sessions = self.sessions.write().await;
        let log = sessions.entry(user_id.to_string()).or_default();
        log.push_front(UsageRecord {
            category: category.clone(),
            timestamp: Utc::now(),
        });
        log.truncate(self.capacity);
    }

    pub async fn session_count(&self, user_id: &str) -> usize {
        self.sessions.read().await.get(user_id).map_or(0, VecDeque::len)
    }
}

#[async_trait]
impl PluginAdapter for InMemoryHistory {
    fn name(&self) -> &str {
        "in-memory-history"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::History
    }

    async fn health_check(&self) -> Result<HealthStatus, PersonaError> {
        Ok(HealthStatus::Healthy)
    }
}

#[async_trait]
impl HistoryProvider for InMemoryHistory {
    async fn get_recent(
        &self,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<UsageRecord>, PersonaError> {
        let sessions = self.sessions.read().await;
        Ok(sessions
            .get(user_id)
            .map(|log| log.iter().take(limit).cloned().collect())
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn records_newest_first_and_bounded() {
        let history = InMemoryHistory::new(3);
        for category in ["a", "b", "c", "d"] {
            history.record("u1", &CategoryId::new(category)).await;
        }
        assert_eq!(history.session_count("u1").await, 3);

        let recent = history.get_recent("u1", 2).await.unwrap();
        let categories: Vec<_> = recent.iter().map(|r| r.category.as_str()).collect();
        assert_eq!(categories, vec!["d", "c"]);
    }

    #[tokio::test]
    async fn users_are_isolated() {
        let history = InMemoryHistory::new(10);
        history.record("u1", &CategoryId::new("it_expert")).await;
        assert!(history.get_recent("u2", 10).await.unwrap().is_empty());
        assert_eq!(history.session_count("u2").await, 0);
    }

    #[tokio::test]
    async fn reports_as_healthy_history_adapter() {
        let history = InMemoryHistory::new(1);
        assert_eq!(history.adapter_type(), AdapterType::History);
        assert_eq!(history.health_check().await.unwrap(), HealthStatus::Healthy);
    }
}
