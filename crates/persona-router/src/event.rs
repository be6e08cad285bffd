// SPDX-FileCopyrightText: 2026 Persona Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Persona lifecycle events delivered over an explicit channel.

use persona_core::CategoryId;
use serde::Serialize;
use strum::Display;
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, warn};

use crate::classifier::ClassificationResult;
use crate::suggestion::Suggestion;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum SwitchSource {
    /// Chosen directly by the user.
    Manual,
    /// An accepted suggestion.
    Suggestion,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PersonaEvent {
    Routed {
        user_id: String,
        result: ClassificationResult,
    },
    SuggestionOffered(Suggestion),
    SuggestionResolved {
        suggestion: Suggestion,
        accepted: bool,
    },
    PersonaSwitched {
        user_id: String,
        from: CategoryId,
        to: CategoryId,
        source: SwitchSource,
    },
}

/// Optional sending half. Delivery is best-effort and never blocks.
#[derive(Clone, Default)]
pub(crate) struct EventSink(Option<mpsc::Sender<PersonaEvent>>);

impl EventSink {
    pub(crate) fn new(sender: Option<mpsc::Sender<PersonaEvent>>) -> Self {
        Self(sender)
    }

    pub(crate) fn emit(&self, event: PersonaEvent) {
        let Some(sender) = &self.0 else {
            return;
        };
        match sender.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(event)) => {
                warn!(?event, "event channel full, dropping event");
            }
            Err(TrySendError::Closed(_)) => {
                debug!("event receiver dropped");
            }
        }
    }
}
