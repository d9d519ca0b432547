/// The rewrite engine: axiom, grouped rules, and the rewrite loop.
///
/// Each pass tokenizes the current string, then rewrites token by token:
/// characters without rules are copied, bare rule symbols take a
/// probabilistically selected successor as-is, and parameterized
/// occurrences take a successor expanded against their parameters.
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::core::expr::{self, ExpressionMode};
use crate::core::grammar::{GrammarDefinition, GrammarError, RuleSet};
use crate::core::lexer::{self, Module, Segment};
use crate::core::random::{RandomSource, StdRandom};
use crate::schema::rule::ProductionRule;
use crate::schema::symbol::Symbol;

/// Engine behaviour switches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineOptions {
    pub expressions: ExpressionMode,
    /// Refuse to build grammars that fail [`RuleSet::validate`].
    pub strict: bool,
}

/// A stochastic, parametric L-system. Built via `LSystem::builder()`.
#[derive(Debug, Clone)]
pub struct LSystem<R = StdRandom> {
    axiom: String,
    rules: RuleSet,
    options: EngineOptions,
    rng: R,
}

/// Builder for constructing an [`LSystem`].
#[derive(Debug, Clone)]
pub struct LSystemBuilder<R = StdRandom> {
    axiom: String,
    rules: Option<Vec<ProductionRule>>,
    options: EngineOptions,
    rng: R,
}

impl LSystem<StdRandom> {
    /// Starts a builder whose random source is a `StdRandom` seeded with 0.
    pub fn builder() -> LSystemBuilder<StdRandom> {
        LSystemBuilder {
            axiom: String::new(),
            rules: None,
            options: EngineOptions::default(),
            rng: StdRandom::default(),
        }
    }

    pub fn new(
        axiom: impl Into<String>,
        rules: Vec<ProductionRule>,
    ) -> Result<LSystem<StdRandom>, GrammarError> {
        Self::builder().axiom(axiom).rules(rules).build()
    }

    pub fn from_definition(definition: &GrammarDefinition) -> Result<LSystem<StdRandom>, GrammarError> {
        Self::builder().definition(definition).build()
    }
}

impl<R: RandomSource> LSystem<R> {
    pub fn with_random_source(
        axiom: impl Into<String>,
        rules: Vec<ProductionRule>,
        rng: R,
    ) -> Result<LSystem<R>, GrammarError> {
        LSystem::builder()
            .axiom(axiom)
            .rules(rules)
            .random_source(rng)
            .build()
    }

    /// Rewrite the axiom `iterations` times, drawing from the engine's own
    /// source. Successive calls continue that source's sequence.
    pub fn generate(&mut self, iterations: usize) -> String {
        let Self {
            axiom,
            rules,
            options,
            rng,
        } = self;
        run(axiom, rules, *options, iterations, rng)
    }

    /// [`generate`](Self::generate), parsed into a symbol stream.
    pub fn generate_symbols(&mut self, iterations: usize) -> Vec<Symbol> {
        lexer::parse_symbols(&self.generate(iterations))
    }

    pub fn random_source_mut(&mut self) -> &mut R {
        &mut self.rng
    }

    pub fn into_random_source(self) -> R {
        self.rng
    }
}

impl<R> LSystem<R> {
    pub fn axiom(&self) -> &str {
        &self.axiom
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    pub fn options(&self) -> EngineOptions {
        self.options
    }

    /// Rewrite the axiom `iterations` times with a caller-supplied source.
    /// The engine itself is not modified.
    pub fn generate_with<S>(&self, iterations: usize, rng: &mut S) -> String
    where
        S: RandomSource + ?Sized,
    {
        run(&self.axiom, &self.rules, self.options, iterations, rng)
    }

    /// One rewrite pass over an arbitrary state.
    pub fn rewrite<S>(&self, input: &str, rng: &mut S) -> String
    where
        S: RandomSource + ?Sized,
    {
        rewrite_pass(&self.rules, self.options, input, rng)
    }

    /// Expand `rule`'s successor against `params` using this engine's
    /// expression mode.
    pub fn expand_successor(&self, rule: &ProductionRule, params: &[f64]) -> String {
        expr::expand(&rule.replacement, params, self.options.expressions)
    }
}

/// Pick one candidate by cumulative probability.
///
/// Draws a single sample `r` and returns the first rule whose running
/// probability total reaches `r`. When the total never reaches `r` the
/// last candidate is returned. `None` only for an empty candidate list,
/// in which case nothing is drawn.
pub fn select_rule<'r, I, S>(candidates: I, rng: &mut S) -> Option<&'r ProductionRule>
where
    I: IntoIterator<Item = &'r ProductionRule>,
    S: RandomSource + ?Sized,
{
    let mut candidates = candidates.into_iter().peekable();
    candidates.peek()?;

    let draw = rng.next_f64();
    let mut cumulative = 0.0;
    let mut last = None;
    for rule in candidates {
        cumulative += rule.probability;
        if draw <= cumulative {
            return Some(rule);
        }
        last = Some(rule);
    }

    trace!(draw, cumulative, "draw above total probability, falling back to last rule");
    last
}

fn run<S>(
    axiom: &str,
    rules: &RuleSet,
    options: EngineOptions,
    iterations: usize,
    rng: &mut S,
) -> String
where
    S: RandomSource + ?Sized,
{
    debug!(iterations, axiom, "generating");
    let mut state = axiom.to_string();
    for pass in 0..iterations {
        state = rewrite_pass(rules, options, &state, rng);
        trace!(pass, len = state.len(), "rewrite pass complete");
    }
    debug!(len = state.len(), "generation finished");
    state
}

fn rewrite_pass<S>(rules: &RuleSet, options: EngineOptions, input: &str, rng: &mut S) -> String
where
    S: RandomSource + ?Sized,
{
    let mut out = String::with_capacity(input.len() * 2);

    for segment in lexer::scan(input, |c| rules.has_rules(c)) {
        match segment {
            Segment::Literal(text) => out.push_str(text),
            Segment::Bare(c) => match rules.for_char(c).and_then(|group| select_rule(group, rng)) {
                Some(rule) => out.push_str(&rule.replacement),
                None => out.push(c),
            },
            Segment::Module(module) => rewrite_module(rules, options, &module, rng, &mut out),
        }
    }

    out
}

fn rewrite_module<S>(
    rules: &RuleSet,
    options: EngineOptions,
    module: &Module<'_>,
    rng: &mut S,
    out: &mut String,
) where
    S: RandomSource + ?Sized,
{
    let Some((symbol, params)) = &module.parsed else {
        out.push_str(module.raw);
        return;
    };
    let Some(group) = rules.for_char(*symbol) else {
        out.push_str(module.raw);
        return;
    };

    let applicable: Vec<&ProductionRule> = group.iter().filter(|r| r.accepts(params)).collect();
    match select_rule(applicable, rng) {
        Some(rule) => out.push_str(&expr::expand(&rule.replacement, params, options.expressions)),
        // Every candidate was guarded out: the occurrence stays as written.
        None => out.push_str(module.raw),
    }
}

impl<R> LSystemBuilder<R> {
    pub fn axiom(mut self, axiom: impl Into<String>) -> Self {
        self.axiom = axiom.into();
        self
    }

    pub fn rule(mut self, rule: ProductionRule) -> Self {
        self.rules.get_or_insert_with(Vec::new).push(rule);
        self
    }

    pub fn rules(mut self, rules: Vec<ProductionRule>) -> Self {
        self.rules = Some(rules);
        self
    }

    /// Take axiom and rules from a loaded grammar definition.
    pub fn definition(self, definition: &GrammarDefinition) -> Self {
        self.axiom(definition.axiom.clone())
            .rules(definition.rules.clone())
    }

    pub fn options(mut self, options: EngineOptions) -> Self {
        self.options = options;
        self
    }

    pub fn strict(mut self, strict: bool) -> Self {
        self.options.strict = strict;
        self
    }

    pub fn expressions(mut self, mode: ExpressionMode) -> Self {
        self.options.expressions = mode;
        self
    }

    pub fn random_source<S: RandomSource>(self, rng: S) -> LSystemBuilder<S> {
        LSystemBuilder {
            axiom: self.axiom,
            rules: self.rules,
            options: self.options,
            rng,
        }
    }

    pub fn build(self) -> Result<LSystem<R>, GrammarError> {
        let rules = self
            .rules
            .ok_or_else(|| GrammarError::InvalidArgument("rules must be a list".to_string()))?;
        let rules = RuleSet::new(rules);

        if self.options.strict {
            let issues = rules.validate();
            if !issues.is_empty() {
                return Err(GrammarError::Invalid(issues));
            }
        }

        debug!(
            predecessors = rules.len(),
            rules = rules.rule_count(),
            strict = self.options.strict,
            "built L-system"
        );

        Ok(LSystem {
            axiom: self.axiom,
            rules,
            options: self.options,
            rng: self.rng,
        })
    }
}

impl LSystemBuilder<StdRandom> {
    pub fn seed(mut self, seed: u64) -> Self {
        self.rng = StdRandom::seeded(seed);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::random::SequenceSource;

    fn rule(symbol: &str, replacement: &str, probability: f64) -> ProductionRule {
        ProductionRule::new(symbol, replacement, probability)
    }

    #[test]
    fn builder_without_rules_is_invalid_argument() {
        let err = LSystem::builder().axiom("F").build().unwrap_err();
        assert!(matches!(err, GrammarError::InvalidArgument(_)));
    }

    #[test]
    fn builder_with_empty_rules_is_fine() {
        let mut sys = LSystem::builder().axiom("F").rules(Vec::new()).build().unwrap();
        assert_eq!(sys.generate(3), "F");
    }

    #[test]
    fn builder_rule_by_rule() {
        let mut sys = LSystem::builder()
            .axiom("F")
            .rule(rule("F", "F+F-F", 1.0))
            .build()
            .unwrap();
        assert_eq!(sys.generate(1), "F+F-F");
    }

    #[test]
    fn strict_rejects_bad_mass_tolerant_accepts() {
        let rules = vec![rule("a", "x", 0.75), rule("a", "y", 1.0)];
        let err = LSystem::builder()
            .axiom("a")
            .rules(rules.clone())
            .strict(true)
            .build()
            .unwrap_err();
        assert!(matches!(err, GrammarError::Invalid(ref issues) if issues.len() == 1));

        assert!(LSystem::new("a", rules).is_ok());
    }

    #[test]
    fn select_rule_boundaries() {
        let rules = [rule("F", "first", 0.5), rule("F", "second", 0.5)];
        let pick = |draw: f64| {
            select_rule(&rules, &mut SequenceSource::constant(draw))
                .unwrap()
                .replacement
                .clone()
        };
        assert_eq!(pick(0.0), "first");
        assert_eq!(pick(0.5), "first");
        assert_eq!(pick(0.500001), "second");
        assert_eq!(pick(0.999), "second");
    }

    #[test]
    fn select_rule_falls_back_to_last() {
        let rules = [rule("F", "a", 0.1), rule("F", "b", 0.2)];
        let mut source = SequenceSource::constant(0.9);
        assert_eq!(select_rule(&rules, &mut source).unwrap().replacement, "b");
        assert_eq!(source.draws(), 1);
    }

    #[test]
    fn select_rule_empty_draws_nothing() {
        let mut source = SequenceSource::constant(0.3);
        assert!(select_rule(&[] as &[ProductionRule], &mut source).is_none());
        assert_eq!(source.draws(), 0);
    }

    #[test]
    fn bare_symbol_keeps_placeholders() {
        let mut sys = LSystem::new("A", vec![rule("A", "I(${0})A(${0}*0.9)", 1.0)]).unwrap();
        assert_eq!(sys.generate(1), "I(${0})A(${0}*0.9)");
    }

    #[test]
    fn bare_symbol_ignores_min_param() {
        let mut sys = LSystem::new("c", vec![rule("c", "d", 1.0).with_min_param(5.0)]).unwrap();
        assert_eq!(sys.generate(1), "d");
    }

    #[test]
    fn guarded_rules_pick_by_first_parameter() {
        let rules = vec![
            rule("c", "Ic(${0}-1)", 1.0).with_min_param(1.0),
            rule("c", "d", 1.0).with_min_param(0.0),
        ];
        let mut sys = LSystem::new("c(2)", rules).unwrap();
        assert_eq!(sys.generate(1), "Ic(1)");
        assert_eq!(sys.generate(2), "IIc(0)");
        assert_eq!(sys.generate(3), "IId");
    }

    #[test]
    fn draws_once_per_selection() {
        let sys = LSystem::new(
            "FXF(1)",
            vec![rule("F", "G", 0.5), rule("F", "H", 0.5)],
        )
        .unwrap();
        let mut source = SequenceSource::new(vec![0.1, 0.9, 0.1]);
        assert_eq!(sys.generate_with(1, &mut source), "GXH");
        assert_eq!(source.draws(), 2);
    }

    #[test]
    fn parameterized_symbol_without_close_is_bare() {
        let mut sys = LSystem::new("A(1", vec![rule("A", "B(${0})", 1.0)]).unwrap();
        assert_eq!(sys.generate(1), "B(${0})(1");
    }

    #[test]
    fn full_expression_mode() {
        let mut sys = LSystem::builder()
            .axiom("A(1)")
            .rule(rule("A", "A(${0}*0.9+2)", 1.0))
            .expressions(ExpressionMode::Full)
            .build()
            .unwrap();
        assert_eq!(sys.generate(1), "A(2.9)");
    }

    #[test]
    fn rewrite_single_pass() {
        let sys = LSystem::new("", vec![rule("F", "FF", 1.0)]).unwrap();
        let mut source = SequenceSource::constant(0.0);
        assert_eq!(sys.rewrite("F[+F]", &mut source), "FF[+FF]");
    }

    #[test]
    fn generate_symbols_parses_output() {
        let mut sys = LSystem::new("A(1)", vec![rule("A", "I(${0})A(${0}*0.5)", 1.0)]).unwrap();
        let symbols = sys.generate_symbols(2);
        let rendered: Vec<String> = symbols.iter().map(ToString::to_string).collect();
        assert_eq!(rendered, vec!["I(1)", "I(0.5)", "A(0.25)"]);
    }

    #[test]
    fn seed_is_reproducible() {
        let rules = vec![rule("F", "F[+F]", 0.5), rule("F", "F[-F]", 0.5)];
        let a = LSystem::builder()
            .axiom("F")
            .rules(rules.clone())
            .seed(9)
            .build()
            .unwrap()
            .generate(5);
        let b = LSystem::builder()
            .axiom("F")
            .rules(rules)
            .seed(9)
            .build()
            .unwrap()
            .generate(5);
        assert_eq!(a, b);
    }
}
