/// Grammar definitions: loading, rule grouping, validation and lint.
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use tracing::{debug, warn};

use crate::schema::rule::ProductionRule;

#[derive(Debug, Error)]
pub enum GrammarError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("malformed rule on line {line}: '{text}'")]
    MalformedRule { line: usize, text: String },
    #[error("grammar failed validation: {}", join_issues(.0))]
    Invalid(Vec<ValidationIssue>),
    #[error("unknown preset: {0}")]
    UnknownPreset(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("RON deserialization error: {0}")]
    Ron(#[from] ron::error::SpannedError),
    #[error("RON value error: {0}")]
    RonValue(#[from] ron::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

fn join_issues(issues: &[ValidationIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// A problem that strict mode refuses to build with.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationIssue {
    #[error("{count} rule(s) have an empty predecessor")]
    EmptyPredecessor { count: usize },
    #[error("rule {position} for '{symbol}' has probability {probability} outside [0, 1]")]
    ProbabilityOutOfRange {
        symbol: String,
        position: usize,
        probability: f64,
    },
    #[error("probabilities for '{symbol}' sum to {total}, expected 1")]
    ProbabilityMass { symbol: String, total: f64 },
}

/// A suspicious but legal construct, reported by the linter.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LintWarning {
    #[error("rule {position} for '{symbol}' is never selected: earlier rules already cover probability 1")]
    UnreachableRule { symbol: String, position: usize },
    #[error("rule {position} for '{symbol}' has zero probability")]
    ZeroProbability { symbol: String, position: usize },
    #[error("predecessor '{symbol}' is longer than one character and never matches")]
    MultiCharPredecessor { symbol: String },
}

/// Tolerance used when checking that a group's probabilities sum to 1.
pub const PROBABILITY_EPSILON: f64 = 1e-9;

/// Production rules grouped by predecessor, input order kept within
/// each group.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    groups: FxHashMap<String, Vec<ProductionRule>>,
    /// Predecessors in first-seen order.
    order: Vec<String>,
}

impl RuleSet {
    pub fn new<I>(rules: I) -> Self
    where
        I: IntoIterator<Item = ProductionRule>,
    {
        let mut set = Self::default();
        for rule in rules {
            set.push(rule);
        }
        set
    }

    pub fn push(&mut self, rule: ProductionRule) {
        let key = rule.predecessor().to_string();
        match self.groups.get_mut(&key) {
            Some(group) => group.push(rule),
            None => {
                self.order.push(key.clone());
                self.groups.insert(key, vec![rule]);
            }
        }
    }

    pub fn get(&self, predecessor: &str) -> Option<&[ProductionRule]> {
        self.groups.get(predecessor).map(Vec::as_slice)
    }

    pub fn for_char(&self, c: char) -> Option<&[ProductionRule]> {
        let mut buf = [0u8; 4];
        self.get(c.encode_utf8(&mut buf))
    }

    pub fn has_rules(&self, c: char) -> bool {
        self.for_char(c).is_some()
    }

    /// Number of distinct predecessors.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn rule_count(&self) -> usize {
        self.groups.values().map(Vec::len).sum()
    }

    /// Groups in first-seen order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[ProductionRule])> + '_ {
        self.order
            .iter()
            .filter_map(|key| self.groups.get(key).map(|g| (key.as_str(), g.as_slice())))
    }

    /// Checks applied by strict mode. Groups containing a `min_param` rule
    /// are exempt from the probability-mass check, since their candidate
    /// set changes per occurrence.
    pub fn validate(&self) -> Vec<ValidationIssue> {
        let mut issues = Vec::new();

        for (symbol, group) in self.iter() {
            if symbol.is_empty() {
                issues.push(ValidationIssue::EmptyPredecessor { count: group.len() });
                continue;
            }

            for (position, rule) in group.iter().enumerate() {
                if !(0.0..=1.0).contains(&rule.probability) {
                    issues.push(ValidationIssue::ProbabilityOutOfRange {
                        symbol: symbol.to_string(),
                        position,
                        probability: rule.probability,
                    });
                }
            }

            if group.iter().all(|r| r.min_param.is_none()) {
                let total: f64 = group.iter().map(|r| r.probability).sum();
                if !((total - 1.0).abs() <= PROBABILITY_EPSILON) {
                    issues.push(ValidationIssue::ProbabilityMass {
                        symbol: symbol.to_string(),
                        total,
                    });
                }
            }
        }

        issues
    }

    pub fn lint(&self) -> Vec<LintWarning> {
        let mut warnings = Vec::new();

        for (symbol, group) in self.iter() {
            if symbol.chars().count() > 1 {
                warnings.push(LintWarning::MultiCharPredecessor {
                    symbol: symbol.to_string(),
                });
            }

            for (position, rule) in group.iter().enumerate() {
                if rule.probability == 0.0 {
                    warnings.push(LintWarning::ZeroProbability {
                        symbol: symbol.to_string(),
                        position,
                    });
                }
            }

            if group.iter().any(|r| r.min_param.is_some()) {
                continue;
            }
            let mut cumulative = 0.0;
            for (position, rule) in group.iter().enumerate() {
                if cumulative >= 1.0 {
                    warnings.push(LintWarning::UnreachableRule {
                        symbol: symbol.to_string(),
                        position,
                    });
                }
                cumulative += rule.probability;
            }
        }

        warnings
    }
}

impl FromIterator<ProductionRule> for RuleSet {
    fn from_iter<I: IntoIterator<Item = ProductionRule>>(iter: I) -> Self {
        Self::new(iter)
    }
}

/// The serializable form of a grammar: what data files and presets hold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename = "Grammar")]
pub struct GrammarDefinition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Turn angle in degrees for the renderer; not used by rewriting.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub angle: Option<f64>,
    pub axiom: String,
    pub rules: Vec<ProductionRule>,
}

// The RON loader reads `rules` as a raw value first so a non-list can be
// reported as an invalid argument rather than a parse error.
#[derive(Debug, Deserialize)]
#[serde(rename = "Grammar")]
struct RonGrammar {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    angle: Option<f64>,
    axiom: String,
    rules: ron::Value,
}

fn rules_not_a_list() -> GrammarError {
    GrammarError::InvalidArgument("rules must be a list".to_string())
}

impl GrammarDefinition {
    pub fn new(axiom: impl Into<String>, rules: Vec<ProductionRule>) -> Self {
        Self {
            name: None,
            angle: None,
            axiom: axiom.into(),
            rules,
        }
    }

    /// Load a grammar file. `.json` files are read as JSON, everything
    /// else as RON.
    pub fn load_from_path(path: &Path) -> Result<GrammarDefinition, GrammarError> {
        let contents = std::fs::read_to_string(path)?;
        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        let definition = if is_json {
            Self::parse_json(&contents)?
        } else {
            Self::parse_ron(&contents)?
        };
        debug!(
            path = %path.display(),
            rules = definition.rules.len(),
            "loaded grammar"
        );
        Ok(definition)
    }

    /// Parse a grammar from a RON string.
    pub fn parse_ron(input: &str) -> Result<GrammarDefinition, GrammarError> {
        let raw: RonGrammar = ron::from_str(input)?;
        if !matches!(raw.rules, ron::Value::Seq(_)) {
            return Err(rules_not_a_list());
        }
        let rules: Vec<ProductionRule> = raw.rules.into_rust()?;
        Ok(GrammarDefinition {
            name: raw.name,
            angle: raw.angle,
            axiom: raw.axiom,
            rules,
        })
    }

    /// Parse a grammar from a JSON string.
    pub fn parse_json(input: &str) -> Result<GrammarDefinition, GrammarError> {
        let value: serde_json::Value = serde_json::from_str(input)?;
        if !value.get("rules").is_some_and(serde_json::Value::is_array) {
            return Err(rules_not_a_list());
        }
        Ok(serde_json::from_value(value)?)
    }

    pub fn to_ron(&self) -> Result<String, GrammarError> {
        let config = ron::ser::PrettyConfig::default().struct_names(true);
        Ok(ron::ser::to_string_pretty(self, config)?)
    }

    pub fn rule_set(&self) -> RuleSet {
        self.rules.iter().cloned().collect()
    }
}

/// Parse rules written one per line as `X=successor`, each with
/// probability 1.
///
/// Only the text between the first and second `=` is kept as the
/// successor. Lines without `=` are skipped, or rejected when `strict`.
///
/// Each symbol holds at most one rule: a later line replaces an earlier one
/// in place. An empty successor (`F=`) clears the symbol's rule, so the
/// symbol is copied through unchanged.
pub fn parse_rule_text(text: &str, strict: bool) -> Result<Vec<ProductionRule>, GrammarError> {
    let mut rules: Vec<ProductionRule> = Vec::new();

    for (index, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let mut parts = line.split('=');
        let symbol = parts.next().unwrap_or_default().trim();
        let Some(replacement) = parts.next() else {
            if strict {
                return Err(GrammarError::MalformedRule {
                    line: index + 1,
                    text: line.to_string(),
                });
            }
            warn!(line = index + 1, text = line, "skipping rule line without '='");
            continue;
        };

        let replacement = replacement.trim();
        let existing = rules.iter().position(|r| r.symbol == symbol);
        match (existing, replacement.is_empty()) {
            (Some(pos), true) => {
                rules.remove(pos);
            }
            (None, true) => {}
            (Some(pos), false) => rules[pos].replacement = replacement.to_string(),
            (None, false) => rules.push(ProductionRule::new(symbol, replacement, 1.0)),
        }
    }

    Ok(rules)
}
