// SPDX-FileCopyrightText: 2026 Persona Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock usage history with fixed records.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{TimeDelta, Utc};
use persona_core::{
    AdapterType, CategoryId, HealthStatus, HistoryProvider, PersonaError, PluginAdapter,
    UsageRecord,
};

/// A history provider that returns the same records for every user.
///
/// The `limit` argument is ignored on purpose so tests can check that
/// callers bound their own sample.
#[derive(Clone, Default)]
pub struct MockHistoryProvider {
    records: Vec<UsageRecord>,
    failure: Option<String>,
    delay: Option<Duration>,
    calls: Arc<AtomicUsize>,
}

impl MockHistoryProvider {
    /// An empty history.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records for `categories`, most recent first, one minute apart.
    pub fn with_categories(categories: &[&str]) -> Self {
        let now = Utc::now();
        let records = categories
            .iter()
            .enumerate()
            .map(|(i, category)| UsageRecord {
                category: CategoryId::new(*category),
                timestamp: now - TimeDelta::minutes(i as i64),
            })
            .collect();
        Self {
            records,
            ..Self::default()
        }
    }

    /// Every lookup fails with `HistoryUnavailable`.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            failure: Some(message.into()),
            ..Self::default()
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Number of `get_recent` calls so far, shared across clones.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PluginAdapter for MockHistoryProvider {
    fn name(&self) -> &str {
        "mock-history"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::History
    }

    async fn health_check(&self) -> Result<HealthStatus, PersonaError> {
        match &self.failure {
            Some(message) => Ok(HealthStatus::Unhealthy(message.clone())),
            None => Ok(HealthStatus::Healthy),
        }
    }
}

#[async_trait]
impl HistoryProvider for MockHistoryProvider {
    async fn get_recent(
        &self,
        _user_id: &str,
        _limit: usize,
    ) -> Result<Vec<UsageRecord>, PersonaError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        match &self.failure {
            Some(message) => Err(PersonaError::HistoryUnavailable {
                message: message.clone(),
                source: None,
            }),
            None => Ok(self.records.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn returns_records_most_recent_first() {
        let mock = MockHistoryProvider::with_categories(&["it_expert", "hr_expert"]);
        let records = mock.get_recent("anyone", 1).await.unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].category, "it_expert");
        assert!(records[0].timestamp > records[1].timestamp);
        assert_eq!(mock.call_count(), 1);
    }

    #[tokio::test]
    async fn failing_mock_reports_unavailable() {
        let mock = MockHistoryProvider::failing("db locked");
        let err = mock.get_recent("u", 10).await.unwrap_err();
        assert!(matches!(err, PersonaError::HistoryUnavailable { .. }));
        assert_eq!(
            mock.health_check().await.unwrap(),
            HealthStatus::Unhealthy("db locked".into())
        );
    }
}
