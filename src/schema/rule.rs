use serde::{Deserialize, Serialize};

fn default_probability() -> f64 {
    1.0
}

/// A single production: `symbol → replacement`, chosen with `probability`
/// among the other rules sharing the same predecessor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductionRule {
    /// Predecessor. Anything from the first `(` on is ignored when grouping,
    /// so `A(x)` and `A` name the same predecessor.
    pub symbol: String,
    /// Successor pattern. May contain `${i}` placeholders.
    pub replacement: String,
    #[serde(default = "default_probability")]
    pub probability: f64,
    /// The rule only applies to occurrences whose first parameter is at
    /// least this value.
    #[serde(
        default,
        alias = "minParam",
        alias = "min",
        skip_serializing_if = "Option::is_none"
    )]
    pub min_param: Option<f64>,
}

impl ProductionRule {
    pub fn new(symbol: impl Into<String>, replacement: impl Into<String>, probability: f64) -> Self {
        Self {
            symbol: symbol.into(),
            replacement: replacement.into(),
            probability,
            min_param: None,
        }
    }

    pub fn with_min_param(mut self, min_param: f64) -> Self {
        self.min_param = Some(min_param);
        self
    }

    /// The bare predecessor identifier, with any parameter suffix stripped.
    pub fn predecessor(&self) -> &str {
        match self.symbol.find('(') {
            Some(idx) => &self.symbol[..idx],
            None => &self.symbol,
        }
    }

    /// Whether this rule may rewrite an occurrence carrying `params`.
    ///
    /// Rules without `min_param` always apply. Guarded rules need a first
    /// parameter that is `>= min_param`; `NaN` never qualifies.
    pub fn accepts(&self, params: &[f64]) -> bool {
        match self.min_param {
            Some(min) => params.first().is_some_and(|first| *first >= min),
            None => true,
        }
    }
}
