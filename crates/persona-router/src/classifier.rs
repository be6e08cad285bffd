// SPDX-FileCopyrightText: 2026 Persona Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Level 1: keyword classification against the rule catalog.
//!
//! Zero-cost and deterministic: no I/O, no network. Every trigger phrase is
//! matched as a whole-word, case-insensitive literal, and the rule with the
//! strictly highest confidence wins (earlier rules win ties).

use persona_core::{CategoryId, PersonaError};
use regex::Regex;
use serde::Serialize;
use strum::Display;

use crate::catalog::RuleCatalog;

/// Confidence ceiling for keyword matches.
pub const MAX_KEYWORD_CONFIDENCE: f32 = 0.95;

/// Confidence added per matched phrase beyond the first.
pub const PER_MATCH_BONUS: f32 = 0.05;

/// Confidence reported when no rule matches.
pub const DEFAULT_CONFIDENCE: f32 = 0.5;

/// At most this many matched phrases are reported.
pub const MAX_MATCHED_PHRASES: usize = 5;

/// Why a classification ended up with its category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ClassificationReason {
    /// No trigger phrase matched.
    Default,
    KeywordMatch,
    /// Usage history overrode an uncertain keyword result.
    ContextBoost,
    LlmClassification,
    /// The LLM stage failed and the keyword result (or default) was kept.
    Fallback,
    /// The query was empty; nothing was classified.
    InvalidInput,
}

/// Diagnostic payload attached by context enrichment.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContextBoost {
    /// Share of the sampled sessions spent in the boosted category.
    pub usage_frequency: f32,
    pub sample_size: usize,
}

/// Outcome of any routing stage.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassificationResult {
    pub category: CategoryId,
    /// Always within `[0, 1]`.
    pub confidence: f32,
    pub reason: ClassificationReason,
    /// Matched trigger phrases in catalog order, at most [`MAX_MATCHED_PHRASES`].
    pub matched_phrases: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<ContextBoost>,
}

impl ClassificationResult {
    pub fn new(category: CategoryId, confidence: f32, reason: ClassificationReason) -> Self {
        Self {
            category,
            confidence: confidence.clamp(0.0, 1.0),
            reason,
            matched_phrases: Vec::new(),
            context: None,
        }
    }
}

struct CompiledRule {
    category: CategoryId,
    base_confidence: f32,
    phrases: Vec<(String, Regex)>,
}

/// Heuristic keyword classifier over a [`RuleCatalog`].
pub struct KeywordClassifier {
    rules: Vec<CompiledRule>,
    default_category: CategoryId,
}

impl KeywordClassifier {
    /// Compile every trigger phrase of the catalog into a word-boundary matcher.
    pub fn new(catalog: &RuleCatalog) -> Result<Self, PersonaError> {
        let rules = catalog
            .rules()
            .iter()
            .map(|rule| {
                let phrases = rule
                    .trigger_phrases
                    .iter()
                    .map(|phrase| Ok((phrase.clone(), phrase_matcher(phrase)?)))
                    .collect::<Result<Vec<_>, PersonaError>>()?;
                Ok(CompiledRule {
                    category: rule.category.clone(),
                    base_confidence: rule.base_confidence,
                    phrases,
                })
            })
            .collect::<Result<Vec<_>, PersonaError>>()?;

        Ok(Self {
            rules,
            default_category: catalog.default_category().clone(),
        })
    }

    pub fn default_category(&self) -> &CategoryId {
        &self.default_category
    }

    /// Classify a query by trigger phrase matches.
    pub fn classify(&self, query: &str) -> ClassificationResult {
        if query.trim().is_empty() {
            return ClassificationResult::new(
                self.default_category.clone(),
                1.0,
                ClassificationReason::InvalidInput,
            );
        }

        let lower = query.to_lowercase();
        let mut best: Option<ClassificationResult> = None;

        for rule in &self.rules {
            let matched: Vec<&str> = rule
                .phrases
                .iter()
                .filter(|(_, re)| re.is_match(&lower))
                .map(|(phrase, _)| phrase.as_str())
                .collect();

            if matched.is_empty() {
                continue;
            }

            let confidence = match_confidence(rule.base_confidence, matched.len());
            // Strictly greater: ties keep the earlier rule.
            if best.as_ref().is_none_or(|b| confidence > b.confidence) {
                let mut result = ClassificationResult::new(
                    rule.category.clone(),
                    confidence,
                    ClassificationReason::KeywordMatch,
                );
                result.matched_phrases = matched
                    .into_iter()
                    .take(MAX_MATCHED_PHRASES)
                    .map(str::to_string)
                    .collect();
                best = Some(result);
            }
        }

        best.unwrap_or_else(|| {
            ClassificationResult::new(
                self.default_category.clone(),
                DEFAULT_CONFIDENCE,
                ClassificationReason::Default,
            )
        })
    }
}

/// `min(0.95, base + 0.05 × (matches − 1))` for a rule with at least one match.
pub fn match_confidence(base_confidence: f32, match_count: usize) -> f32 {
    let extra = match_count.saturating_sub(1) as f32;
    round_confidence((base_confidence + PER_MATCH_BONUS * extra).min(MAX_KEYWORD_CONFIDENCE))
}

/// Snap a computed confidence to four decimals.
///
/// `0.85 + 0.05` is `0.90000004` in `f32`; rounding makes it compare equal to a
/// configured `0.9` so strict thresholds behave as written.
pub fn round_confidence(value: f32) -> f32 {
    (value * 1e4).round() / 1e4
}

fn phrase_matcher(phrase: &str) -> Result<Regex, PersonaError> {
    let pattern = format!(r"(?i)\b{}\b", regex::escape(&phrase.to_lowercase()));
    Regex::new(&pattern)
        .map_err(|e| PersonaError::Catalog(format!("cannot compile phrase `{phrase}`: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::LazyLock;

    use crate::catalog::Rule;
    use proptest::prelude::*;

    fn catalog(rules: Vec<(&str, f32, Vec<&str>)>) -> RuleCatalog {
        RuleCatalog::new(
            CategoryId::new("assistant"),
            rules
                .into_iter()
                .map(|(category, base, phrases)| Rule {
                    category: CategoryId::new(category),
                    trigger_phrases: phrases.into_iter().map(str::to_string).collect(),
                    base_confidence: base,
                })
                .collect(),
        )
        .unwrap()
    }

    fn it_catalog() -> RuleCatalog {
        catalog(vec![
            ("it_expert", 0.85, vec!["debug", "api", "endpoint", "error", "server"]),
            ("hr_expert", 0.85, vec!["vacation", "payroll", "salary"]),
        ])
    }

    #[test]
    fn single_match_uses_base_confidence() {
        let c = KeywordClassifier::new(&it_catalog()).unwrap();
        let result = c.classify("when is payroll processed?");
        assert_eq!(result.category, "hr_expert");
        assert_eq!(result.confidence, 0.85);
        assert_eq!(result.reason, ClassificationReason::KeywordMatch);
        assert_eq!(result.matched_phrases, vec!["payroll"]);
    }

    #[test]
    fn extra_matches_raise_confidence_up_to_cap() {
        let c = KeywordClassifier::new(&catalog(vec![("it", 0.7, vec!["api", "server", "error"])])).unwrap();
        assert_eq!(c.classify("api").confidence, 0.7);
        assert_eq!(c.classify("api server").confidence, match_confidence(0.7, 2));
        assert_eq!(c.classify("api server error").confidence, match_confidence(0.7, 3));

        let capped = KeywordClassifier::new(&it_catalog()).unwrap();
        let result = capped.classify("I need to debug this API endpoint error");
        assert_eq!(result.confidence, MAX_KEYWORD_CONFIDENCE);
        assert_eq!(result.matched_phrases, vec!["debug", "api", "endpoint", "error"]);
    }

    #[test]
    fn matching_respects_word_boundaries() {
        let c = KeywordClassifier::new(&it_catalog()).unwrap();
        // "rapid" contains "api" but not as a whole word.
        let result = c.classify("we need rapid growth this quarter");
        assert_eq!(result.reason, ClassificationReason::Default);
    }

    #[test]
    fn matching_is_case_insensitive() {
        let c = KeywordClassifier::new(&it_catalog()).unwrap();
        assert_eq!(c.classify("SERVER is down").category, "it_expert");
    }

    #[test]
    fn regex_metacharacters_are_literal() {
        let c = KeywordClassifier::new(&catalog(vec![("it", 0.8, vec!["c.b", "a+b"])])).unwrap();
        assert_eq!(c.classify("see c.b now").category, "it");
        assert_eq!(c.classify("see cxb now").reason, ClassificationReason::Default);
        assert_eq!(c.classify("a+b ok").category, "it");
    }

    #[test]
    fn no_match_returns_default() {
        let c = KeywordClassifier::new(&it_catalog()).unwrap();
        let result = c.classify("tell me a joke");
        assert_eq!(result.category, "assistant");
        assert_eq!(result.confidence, DEFAULT_CONFIDENCE);
        assert_eq!(result.reason, ClassificationReason::Default);
        assert!(result.matched_phrases.is_empty());
    }

    #[test]
    fn empty_query_is_invalid_input() {
        let c = KeywordClassifier::new(&it_catalog()).unwrap();
        for query in ["", "   ", "\n\t"] {
            let result = c.classify(query);
            assert_eq!(result.reason, ClassificationReason::InvalidInput);
            assert_eq!(result.category, "assistant");
            assert_eq!(result.confidence, 1.0);
        }
    }

    #[test]
    fn ties_go_to_earlier_rule() {
        let c = KeywordClassifier::new(&catalog(vec![
            ("first", 0.85, vec!["report"]),
            ("second", 0.85, vec!["quarterly"]),
        ]))
        .unwrap();
        assert_eq!(c.classify("quarterly report").category, "first");
    }

    #[test]
    fn higher_confidence_later_rule_wins() {
        let c = KeywordClassifier::new(&catalog(vec![
            ("first", 0.7, vec!["report"]),
            ("second", 0.85, vec!["quarterly"]),
        ]))
        .unwrap();
        assert_eq!(c.classify("quarterly report").category, "second");
    }

    #[test]
    fn matched_phrases_are_capped() {
        let c = KeywordClassifier::new(&catalog(vec![(
            "it",
            0.5,
            vec!["a1", "a2", "a3", "a4", "a5", "a6", "a7"],
        )]))
        .unwrap();
        let result = c.classify("a1 a2 a3 a4 a5 a6 a7");
        assert_eq!(result.matched_phrases.len(), MAX_MATCHED_PHRASES);
        assert_eq!(result.matched_phrases[4], "a5");
        // All seven matches count toward confidence, not just the reported five.
        assert_eq!(result.confidence, match_confidence(0.5, 7));
    }

    #[test]
    fn multi_word_and_accented_phrases_match() {
        let c = KeywordClassifier::new(&RuleCatalog::builtin().unwrap()).unwrap();
        assert_eq!(c.classify("Where is the balance sheet?").category, "finance_expert");
        assert_eq!(c.classify("Je dois poser un congé").category, "hr_expert");
        assert_eq!(c.classify("Le serveur renvoie une erreur").category, "it_expert");
    }

    #[test]
    fn reason_display_is_snake_case() {
        assert_eq!(ClassificationReason::KeywordMatch.to_string(), "keyword_match");
        assert_eq!(ClassificationReason::LlmClassification.to_string(), "llm_classification");
        assert_eq!(
            serde_json::to_string(&ClassificationReason::ContextBoost).unwrap(),
            "\"context_boost\""
        );
    }

    static BUILTIN: LazyLock<KeywordClassifier> = LazyLock::new(|| {
        KeywordClassifier::new(&RuleCatalog::builtin().unwrap()).unwrap()
    });

    #[test]
    fn two_matches_on_high_base_land_exactly_on_threshold() {
        assert_eq!(match_confidence(0.85, 2), 0.9);
        assert_eq!(match_confidence(0.8, 3), 0.9);
        assert!(match_confidence(0.85, 2) <= 0.9);
    }

    proptest! {
        #[test]
        fn confidence_follows_formula(base in 0.05f32..=1.0, n in 1usize..=8) {
            let phrases: Vec<String> = (0..8).map(|i| format!("term{i}")).collect();
            let refs: Vec<&str> = phrases.iter().map(String::as_str).collect();
            let c = KeywordClassifier::new(&catalog(vec![("only", base, refs)])).unwrap();
            let query = phrases[..n].join(" ");

            let result = c.classify(&query);
            let expected = (base + 0.05 * (n as f32 - 1.0)).min(0.95);
            prop_assert!((result.confidence - expected).abs() < 1e-4);
            prop_assert_eq!(result.matched_phrases.len(), n.min(MAX_MATCHED_PHRASES));
        }

        #[test]
        fn confidence_is_always_a_probability(query in ".{0,80}") {
            let result = BUILTIN.classify(&query);
            prop_assert!((0.0..=1.0).contains(&result.confidence));
        }
    }
}
