//! Bundled grammar templates, compiled into the library.

use crate::core::grammar::{GrammarDefinition, GrammarError};

const PRESETS: &[(&str, &str)] = &[
    ("hilbert", include_str!("../presets/hilbert.ron")),
    ("koch_island", include_str!("../presets/koch_island.ron")),
    ("snowflake", include_str!("../presets/snowflake.ron")),
    ("stochastic_bush", include_str!("../presets/stochastic_bush.ron")),
    ("simple_raceme", include_str!("../presets/simple_raceme.ron")),
    ("acropetal_raceme", include_str!("../presets/acropetal_raceme.ron")),
    ("compound_raceme", include_str!("../presets/compound_raceme.ron")),
];

/// Preset names, in a stable order.
pub fn names() -> Vec<&'static str> {
    PRESETS.iter().map(|(name, _)| *name).collect()
}

pub fn source(name: &str) -> Option<&'static str> {
    PRESETS
        .iter()
        .find(|(preset, _)| *preset == name)
        .map(|(_, text)| *text)
}

pub fn load(name: &str) -> Result<GrammarDefinition, GrammarError> {
    let text = source(name).ok_or_else(|| GrammarError::UnknownPreset(name.to_string()))?;
    GrammarDefinition::parse_ron(text)
}

pub fn all() -> Result<Vec<(&'static str, GrammarDefinition)>, GrammarError> {
    PRESETS
        .iter()
        .map(|(name, text)| Ok((*name, GrammarDefinition::parse_ron(text)?)))
        .collect()
}
