// SPDX-FileCopyrightText: 2026 Persona Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Rule catalog: the ordered table of persona categories and their trigger phrases.
//!
//! The catalog is data, not code. A default catalog ships embedded in the
//! crate, and deployments can point `catalog.path` at their own TOML file.
//! Rule order is significant: classification ties go to the earlier rule.

use std::collections::HashSet;
use std::path::Path;

use persona_config::model::CatalogConfig;
use persona_core::{CategoryId, PersonaError};
use serde::{Deserialize, Serialize};

const BUILTIN_CATALOG: &str = include_str!("../catalog/default.toml");

/// A single persona rule.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Rule {
    pub category: CategoryId,
    /// Distinct trigger phrases, in declaration order.
    pub trigger_phrases: Vec<String>,
    /// Confidence of a single-phrase match. Always in `(0, 1]`.
    pub base_confidence: f32,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct CatalogFile {
    #[serde(default = "default_version")]
    version: u32,
    default_category: String,
    #[serde(default)]
    rules: Vec<RuleEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RuleEntry {
    category: String,
    base_confidence: f32,
    trigger_phrases: Vec<String>,
}

fn default_version() -> u32 {
    1
}

/// Validated, ordered set of persona rules plus the default category.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RuleCatalog {
    version: u32,
    default_category: CategoryId,
    rules: Vec<Rule>,
}

impl RuleCatalog {
    /// Build a catalog from already-constructed rules, validating them.
    pub fn new(default_category: CategoryId, rules: Vec<Rule>) -> Result<Self, PersonaError> {
        let mut errors = Vec::new();
        let rules = rules
            .into_iter()
            .enumerate()
            .map(|(i, rule)| normalize_rule(i, rule, &mut errors))
            .collect::<Vec<_>>();

        validate(&default_category, &rules, &mut errors);

        if errors.is_empty() {
            Ok(Self {
                version: default_version(),
                default_category,
                rules,
            })
        } else {
            Err(PersonaError::Catalog(errors.join("; ")))
        }
    }

    /// The catalog embedded in the crate.
    pub fn builtin() -> Result<Self, PersonaError> {
        Self::from_toml_str(BUILTIN_CATALOG)
    }

    /// Parse and validate a catalog TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self, PersonaError> {
        let file: CatalogFile = toml::from_str(content)
            .map_err(|e| PersonaError::Catalog(format!("invalid catalog TOML: {e}")))?;

        let rules = file
            .rules
            .into_iter()
            .map(|entry| Rule {
                category: CategoryId(entry.category),
                trigger_phrases: entry.trigger_phrases,
                base_confidence: entry.base_confidence,
            })
            .collect();

        let mut catalog = Self::new(CategoryId(file.default_category), rules)?;
        catalog.version = file.version;
        Ok(catalog)
    }

    /// Load a catalog from a TOML file on disk.
    pub fn from_path(path: &Path) -> Result<Self, PersonaError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            PersonaError::Catalog(format!("failed to read {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&content)
    }

    /// Load the catalog selected by configuration (file if set, built-in otherwise).
    pub fn from_config(config: &CatalogConfig) -> Result<Self, PersonaError> {
        match &config.path {
            Some(path) => Self::from_path(Path::new(path)),
            None => Self::builtin(),
        }
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn default_category(&self) -> &CategoryId {
        &self.default_category
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Rule categories in catalog order, followed by the default category.
    pub fn known_categories(&self) -> Vec<CategoryId> {
        self.rules
            .iter()
            .map(|r| r.category.clone())
            .chain(std::iter::once(self.default_category.clone()))
            .collect()
    }
}

/// Trim phrases, drop blanks, and de-duplicate case-insensitively keeping the first spelling.
fn normalize_rule(index: usize, rule: Rule, errors: &mut Vec<String>) -> Rule {
    let mut seen = HashSet::new();
    let phrases: Vec<String> = rule
        .trigger_phrases
        .iter()
        .map(|p| p.trim())
        .filter(|p| !p.is_empty())
        .filter(|p| seen.insert(p.to_lowercase()))
        .map(str::to_string)
        .collect();

    if phrases.is_empty() {
        errors.push(format!(
            "rules[{index}] ({}) has no trigger phrases",
            rule.category
        ));
    }

    Rule {
        trigger_phrases: phrases,
        ..rule
    }
}

fn validate(default_category: &CategoryId, rules: &[Rule], errors: &mut Vec<String>) {
    if !is_valid_id(default_category.as_str()) {
        errors.push(format!(
            "default_category `{default_category}` must be non-empty lowercase [a-z0-9_-]"
        ));
    }

    if rules.is_empty() {
        errors.push("catalog must declare at least one rule".to_string());
    }

    let mut seen = HashSet::new();
    for (i, rule) in rules.iter().enumerate() {
        if !is_valid_id(rule.category.as_str()) {
            errors.push(format!(
                "rules[{i}].category `{}` must be non-empty lowercase [a-z0-9_-]",
                rule.category
            ));
        }
        if &rule.category == default_category {
            errors.push(format!(
                "rules[{i}].category `{}` duplicates the default category",
                rule.category
            ));
        }
        if !seen.insert(&rule.category) {
            errors.push(format!("duplicate rule category `{}`", rule.category));
        }
        if !(rule.base_confidence > 0.0 && rule.base_confidence <= 1.0) {
            errors.push(format!(
                "rules[{i}].base_confidence must be in (0, 1], got {}",
                rule.base_confidence
            ));
        }
    }
}

fn is_valid_id(id: &str) -> bool {
    !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '-')
}
