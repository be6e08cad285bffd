// SPDX-FileCopyrightText: 2026 Persona Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! One-shot subcommands: `route`, `suggest`, `catalog`, `config`.

use colored::Colorize;
use persona_config::PersonaConfig;
use persona_core::{CategoryId, PersonaError};
use persona_router::{ClassificationResult, RouterContext, RuleCatalog, Suggestion};

use crate::runtime::Runtime;

pub async fn route(
    config: &PersonaConfig,
    query: &str,
    user: Option<&str>,
    json: bool,
) -> Result<(), PersonaError> {
    let runtime = Runtime::build(config)?;
    let user_id = user.unwrap_or(&config.agent.user_id);
    let result = runtime.coordinator.route(query, user_id).await;

    if json {
        println!("{}", to_json(&result)?);
    } else {
        println!("{}", format_result(&result));
    }
    Ok(())
}

pub async fn suggest(
    config: &PersonaConfig,
    query: &str,
    current: Option<&str>,
    json: bool,
) -> Result<(), PersonaError> {
    let runtime = Runtime::build(config)?;
    let current = match current {
        Some(c) => {
            let category = CategoryId::new(c);
            if !runtime.coordinator.is_known(&category) {
                return Err(PersonaError::InvalidInput(format!("unknown persona `{c}`")));
            }
            category
        }
        None => runtime.catalog.default_category().clone(),
    };

    let ctx = RouterContext::new(
        runtime.coordinator,
        config.agent.user_id.clone(),
        config.suggestions.clone(),
    );
    let suggestion = ctx.analyze_suggestion(query, &current).await;

    match (suggestion, json) {
        (Some(s), true) => println!("{}", to_json(&s)?),
        (None, true) => println!("null"),
        (Some(s), false) => println!("{}", format_suggestion(&s)),
        (None, false) => println!("no suggestion"),
    }
    Ok(())
}

pub fn catalog(config: &PersonaConfig) -> Result<(), PersonaError> {
    let catalog = RuleCatalog::from_config(&config.catalog)?;
    print!("{}", format_catalog(&catalog));
    Ok(())
}

pub fn print_config(config: &PersonaConfig) -> Result<(), PersonaError> {
    let rendered = toml::to_string_pretty(config)
        .map_err(|e| PersonaError::Internal(format!("failed to render config: {e}")))?;
    print!("{rendered}");
    Ok(())
}

pub fn to_json<T: serde::Serialize>(value: &T) -> Result<String, PersonaError> {
    serde_json::to_string_pretty(value)
        .map_err(|e| PersonaError::Internal(format!("failed to serialize output: {e}")))
}

pub fn format_result(result: &ClassificationResult) -> String {
    let mut line = format!(
        "{} {} ({})",
        result.category.as_str().bold().green(),
        format!("{:.2}", result.confidence).cyan(),
        result.reason
    );
    if !result.matched_phrases.is_empty() {
        line.push_str(&format!(" matched: {}", result.matched_phrases.join(", ")));
    }
    if let Some(boost) = &result.context {
        line.push_str(&format!(
            " history: {:.0}% of {} sessions",
            boost.usage_frequency * 100.0,
            boost.sample_size
        ));
    }
    line
}

pub fn format_suggestion(s: &Suggestion) -> String {
    format!(
        "switch from {} to {}? ({:.2}, matched: {})",
        s.current_category,
        s.suggested_category.as_str().bold().yellow(),
        s.confidence,
        s.matched_phrases.join(", ")
    )
}

pub fn format_catalog(catalog: &RuleCatalog) -> String {
    let mut out = format!(
        "catalog v{} (default: {})\n",
        catalog.version(),
        catalog.default_category()
    );
    for rule in catalog.rules() {
        out.push_str(&format!(
            "  {:<20} {:.2}  {} phrases\n",
            rule.category.as_str(),
            rule.base_confidence,
            rule.trigger_phrases.len()
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use persona_router::ClassificationReason;

    #[test]
    fn result_line_mentions_category_and_phrases() {
        colored::control::set_override(false);
        let mut result = ClassificationResult::new(
            CategoryId::new("it_expert"),
            0.9,
            ClassificationReason::KeywordMatch,
        );
        result.matched_phrases = vec!["server".into(), "bug".into()];
        assert_eq!(
            format_result(&result),
            "it_expert 0.90 (keyword_match) matched: server, bug"
        );
    }

    #[test]
    fn catalog_listing_has_one_line_per_rule() {
        colored::control::set_override(false);
        let catalog = RuleCatalog::builtin().unwrap();
        let listing = format_catalog(&catalog);
        assert!(listing.starts_with("catalog v1 (default: assistant)"));
        assert_eq!(listing.lines().count(), catalog.rules().len() + 1);
        assert!(listing.contains("it_expert"));
    }

    #[test]
    fn config_renders_as_toml() {
        let rendered = toml::to_string_pretty(&PersonaConfig::default()).unwrap();
        assert!(rendered.contains("[routing]"));
        assert!(rendered.contains("keyword_accept_threshold"));
    }

    #[test]
    fn json_output_uses_snake_case_reasons() {
        let result = ClassificationResult::new(
            CategoryId::new("assistant"),
            1.0,
            ClassificationReason::InvalidInput,
        );
        let json = to_json(&result).unwrap();
        assert!(json.contains("\"invalid_input\""));
        assert!(!json.contains("context"));
    }
}
