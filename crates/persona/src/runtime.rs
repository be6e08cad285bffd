// SPDX-FileCopyrightText: 2026 Persona Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Wiring shared by every subcommand: tracing and router construction.

use std::sync::Arc;

use persona_config::PersonaConfig;
use persona_core::PersonaError;
use persona_router::{InMemoryHistory, RoutingCoordinator, RuleCatalog};
use tracing::info;

/// Initialize the tracing subscriber. `RUST_LOG` takes precedence over config.
pub fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("persona={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}

/// A ready-to-use router with its catalog and process-local history.
pub struct Runtime {
    pub catalog: RuleCatalog,
    pub coordinator: Arc<RoutingCoordinator>,
    pub history: Arc<InMemoryHistory>,
}

impl Runtime {
    pub fn build(config: &PersonaConfig) -> Result<Self, PersonaError> {
        let catalog = RuleCatalog::from_config(&config.catalog)?;
        let history = Arc::new(InMemoryHistory::new(config.context.history_limit));

        let mut coordinator =
            RoutingCoordinator::new(&catalog, config)?.with_history(history.clone());
        if config.llm.enabled {
            coordinator = with_llm(coordinator, config)?;
        }
        persona_router::register_metrics();

        info!(
            catalog_version = catalog.version(),
            rules = catalog.rules().len(),
            llm = config.llm.enabled,
            "router ready"
        );

        Ok(Self {
            catalog,
            coordinator: Arc::new(coordinator),
            history,
        })
    }
}

#[cfg(feature = "ollama")]
fn with_llm(
    coordinator: RoutingCoordinator,
    config: &PersonaConfig,
) -> Result<RoutingCoordinator, PersonaError> {
    let provider = persona_ollama::OllamaProvider::from_config(&config.llm)?;
    Ok(coordinator.with_llm(Arc::new(provider)))
}

#[cfg(not(feature = "ollama"))]
fn with_llm(
    coordinator: RoutingCoordinator,
    _config: &PersonaConfig,
) -> Result<RoutingCoordinator, PersonaError> {
    tracing::warn!("llm.enabled is set but the ollama feature is not compiled in");
    Ok(coordinator)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_builds_builtin_router() {
        let runtime = Runtime::build(&PersonaConfig::default()).unwrap();
        assert_eq!(runtime.catalog.default_category(), "assistant");
        assert!(runtime.coordinator.is_known(&"it_expert".into()));
    }

    #[test]
    fn missing_catalog_file_is_an_error() {
        let mut config = PersonaConfig::default();
        config.catalog.path = Some("/nonexistent/catalog.toml".into());
        assert!(matches!(
            Runtime::build(&config),
            Err(PersonaError::Catalog(_))
        ));
    }
}
