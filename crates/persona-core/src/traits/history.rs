// SPDX-FileCopyrightText: 2026 Persona Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! History provider trait for per-user persona usage lookups.

use async_trait::async_trait;

use crate::error::PersonaError;
use crate::traits::adapter::PluginAdapter;
use crate::types::UsageRecord;

/// Source of a user's recent persona usage.
///
/// Used by context enrichment to bias ambiguous classifications toward
/// the persona a user habitually works with.
#[async_trait]
pub trait HistoryProvider: PluginAdapter {
    /// Returns up to `limit` usage records for `user_id`, most recent first.
    async fn get_recent(
        &self,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<UsageRecord>, PersonaError>;
}
