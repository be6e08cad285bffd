// SPDX-FileCopyrightText: 2026 Persona Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-user routing handle.
//!
//! A [`RouterContext`] owns one user's suggestion state and active persona,
//! and shares the process-wide [`RoutingCoordinator`] (and its statistics)
//! with every other context.

use std::sync::Arc;

use persona_config::model::SuggestionConfig;
use persona_core::{CategoryId, PersonaError};
use tokio::sync::{Mutex, mpsc};
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::classifier::ClassificationResult;
use crate::event::{EventSink, PersonaEvent, SwitchSource};
use crate::router::RoutingCoordinator;
use crate::stats::RoutingStats;
use crate::suggestion::{Suggestion, SuggestionManager, SuggestionStats};

pub struct RouterContext {
    coordinator: Arc<RoutingCoordinator>,
    user_id: String,
    suggestions: SuggestionManager,
    active: Mutex<CategoryId>,
    events: EventSink,
}

impl RouterContext {
    /// Start `user_id` on the catalog's default persona.
    pub fn new(
        coordinator: Arc<RoutingCoordinator>,
        user_id: impl Into<String>,
        suggestions: SuggestionConfig,
    ) -> Self {
        let manager = SuggestionManager::new(Arc::clone(coordinator.classifier()), suggestions);
        let active = coordinator.default_category().clone();
        Self {
            coordinator,
            user_id: user_id.into(),
            suggestions: manager,
            active: Mutex::new(active),
            events: EventSink::default(),
        }
    }

    /// Deliver [`PersonaEvent`]s to `sender`.
    pub fn with_events(mut self, sender: mpsc::Sender<PersonaEvent>) -> Self {
        self.events = EventSink::new(Some(sender));
        self
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn coordinator(&self) -> &Arc<RoutingCoordinator> {
        &self.coordinator
    }

    pub async fn active_persona(&self) -> CategoryId {
        self.active.lock().await.clone()
    }

    pub async fn route(&self, query: &str) -> ClassificationResult {
        self.route_cancellable(query, &CancellationToken::new())
            .await
    }

    pub async fn route_cancellable(
        &self,
        query: &str,
        cancel: &CancellationToken,
    ) -> ClassificationResult {
        let result = self
            .coordinator
            .route_cancellable(query, &self.user_id, cancel)
            .await;
        self.events.emit(PersonaEvent::Routed {
            user_id: self.user_id.clone(),
            result: result.clone(),
        });
        result
    }

    pub async fn analyze_suggestion(&self, query: &str, current: &CategoryId) -> Option<Suggestion> {
        let suggestion = self.suggestions.analyze(query, current).await?;
        self.events
            .emit(PersonaEvent::SuggestionOffered(suggestion.clone()));
        Some(suggestion)
    }

    /// Accept a suggestion and switch to its persona.
    pub async fn accept_suggestion(&self, suggestion: &Suggestion) -> bool {
        let Some(resolved) = self.suggestions.resolve(suggestion, true).await else {
            return false;
        };
        let from = std::mem::replace(
            &mut *self.active.lock().await,
            resolved.suggested_category.clone(),
        );
        info!(
            user_id = %self.user_id,
            from = %from,
            to = %resolved.suggested_category,
            "suggestion accepted"
        );
        self.events.emit(PersonaEvent::PersonaSwitched {
            user_id: self.user_id.clone(),
            from,
            to: resolved.suggested_category.clone(),
            source: SwitchSource::Suggestion,
        });
        self.events.emit(PersonaEvent::SuggestionResolved {
            suggestion: resolved,
            accepted: true,
        });
        true
    }

    pub async fn reject_suggestion(&self, suggestion: &Suggestion) -> bool {
        let Some(resolved) = self.suggestions.resolve(suggestion, false).await else {
            return false;
        };
        self.events.emit(PersonaEvent::SuggestionResolved {
            suggestion: resolved,
            accepted: false,
        });
        true
    }

    /// Manually switch persona. Counts as a user override.
    pub async fn switch_persona(&self, to: &CategoryId) -> Result<(), PersonaError> {
        if !self.coordinator.is_known(to) {
            return Err(PersonaError::InvalidInput(format!("unknown persona `{to}`")));
        }
        let from = std::mem::replace(&mut *self.active.lock().await, to.clone());
        self.coordinator.record_user_override().await;
        info!(user_id = %self.user_id, from = %from, to = %to, "persona switched");
        self.events.emit(PersonaEvent::PersonaSwitched {
            user_id: self.user_id.clone(),
            from,
            to: to.clone(),
            source: SwitchSource::Manual,
        });
        Ok(())
    }

    pub async fn last_suggestion(&self) -> Option<Suggestion> {
        self.suggestions.last_suggestion().await
    }

    pub async fn get_stats(&self) -> RoutingStats {
        self.coordinator.get_stats().await
    }

    pub async fn get_suggestion_stats(&self) -> SuggestionStats {
        self.suggestions.get_stats().await
    }

    pub fn set_suggestions_enabled(&self, enabled: bool) {
        self.suggestions.set_enabled(enabled);
    }

    pub fn suggestions_enabled(&self) -> bool {
        self.suggestions.is_enabled()
    }
}
