/// Property tests for the rewrite engine and successor expansion.
use lsystem_engine::core::engine::{select_rule, LSystem};
use lsystem_engine::core::expr::{evaluate, expand, fold_arithmetic, format_number, ExpressionMode};
use lsystem_engine::core::lexer::parse_float;
use lsystem_engine::core::random::{SequenceSource, StdRandom};
use lsystem_engine::schema::rule::ProductionRule;
use proptest::prelude::*;

// ---------------------------------------------------------------------------
// Helpers / Strategies
// ---------------------------------------------------------------------------

/// Successor text drawn from the characters grammars actually use.
fn arb_successor() -> impl Strategy<Value = String> {
    "[A-Fa-f+\\-\\[\\]()0-9.*, ]{0,6}|[A-F]\\(\\$\\{[0-2]\\}[*+\\-][0-9]\\)"
}

/// Generate a single rule for one of the letters `A`-`F`.
fn arb_rule() -> impl Strategy<Value = ProductionRule> {
    (
        "[A-F]",
        arb_successor(),
        0.0f64..=1.0,
        proptest::option::of(-2.0f64..4.0),
    )
        .prop_map(|(symbol, replacement, probability, min_param)| {
            let rule = ProductionRule::new(symbol, replacement, probability);
            match min_param {
                Some(min) => rule.with_min_param(min),
                None => rule,
            }
        })
}

fn arb_rules() -> impl Strategy<Value = Vec<ProductionRule>> {
    prop::collection::vec(arb_rule(), 0..6)
}

fn arb_axiom() -> impl Strategy<Value = String> {
    "[A-F]{0,3}|[A-F]\\([0-9]{1,2}(,[0-9])?\\)"
}

fn arb_mode() -> impl Strategy<Value = ExpressionMode> {
    prop_oneof![Just(ExpressionMode::Legacy), Just(ExpressionMode::Full)]
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn zero_iterations_is_identity(axiom in ".{0,20}", rules in arb_rules(), seed in any::<u64>()) {
        let system = LSystem::new(axiom.clone(), rules).unwrap();
        let mut rng = StdRandom::seeded(seed);
        prop_assert_eq!(system.generate_with(0, &mut rng), axiom);
    }

    #[test]
    fn symbols_without_rules_never_change(
        axiom in "[GHXYZ+\\-\\[\\]0-9().]{0,16}",
        rules in arb_rules(),
        iterations in 0usize..4,
        seed in any::<u64>(),
    ) {
        let system = LSystem::new(axiom.clone(), rules).unwrap();
        let mut rng = StdRandom::seeded(seed);
        prop_assert_eq!(system.generate_with(iterations, &mut rng), axiom);
    }

    #[test]
    fn same_seed_same_output(
        axiom in arb_axiom(),
        rules in arb_rules(),
        mode in arb_mode(),
        iterations in 0usize..3,
        seed in any::<u64>(),
    ) {
        let build = || {
            LSystem::builder()
                .axiom(axiom.clone())
                .rules(rules.clone())
                .expressions(mode)
                .seed(seed)
                .build()
                .unwrap()
        };
        prop_assert_eq!(build().generate(iterations), build().generate(iterations));
    }

    #[test]
    fn fixed_sequence_same_output(
        axiom in arb_axiom(),
        rules in arb_rules(),
        draws in prop::collection::vec(0.0f64..1.0, 1..8),
        iterations in 0usize..3,
    ) {
        let system = LSystem::new(axiom, rules).unwrap();
        let first = system.generate_with(iterations, &mut SequenceSource::new(draws.clone()));
        let second = system.generate_with(iterations, &mut SequenceSource::new(draws));
        prop_assert_eq!(first, second);
    }

    #[test]
    fn arbitrary_input_never_panics(
        axiom in ".{0,12}",
        rules in arb_rules(),
        mode in arb_mode(),
        seed in any::<u64>(),
    ) {
        let system = LSystem::builder()
            .axiom(axiom)
            .rules(rules)
            .expressions(mode)
            .build()
            .unwrap();
        let mut rng = StdRandom::seeded(seed);
        let _ = system.generate_with(2, &mut rng);
    }

    #[test]
    fn selection_picks_covering_rule(
        weights in prop::collection::vec(0.01f64..1.0, 1..6),
        draw in 0.0f64..1.0,
    ) {
        let total: f64 = weights.iter().sum();
        let rules: Vec<ProductionRule> = weights
            .iter()
            .enumerate()
            .map(|(i, w)| ProductionRule::new("A", i.to_string(), w / total))
            .collect();

        let picked = select_rule(&rules, &mut SequenceSource::constant(draw)).unwrap();
        let index: usize = picked.replacement.parse().unwrap();

        let before: f64 = rules[..index].iter().map(|r| r.probability).sum();
        prop_assert!(draw > before || index == 0);
        if index + 1 < rules.len() {
            prop_assert!(draw <= before + rules[index].probability);
        }
    }
}

// ---------------------------------------------------------------------------
// Expansion
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn formatted_numbers_parse_back(value in any::<f64>().prop_filter("finite", |v| v.is_finite())) {
        let text = format_number(value);
        let back = parse_float(&text);
        if value == 0.0 {
            prop_assert_eq!(back, 0.0);
        } else {
            prop_assert_eq!(back, value);
        }
    }

    #[test]
    fn single_operation_folds_like_evaluator(a in 0u32..10_000, b in 0u32..10_000, op in "[*+\\-]") {
        let text = format!("{}{}{}", a, op, b);
        let expected = evaluate(&text).map(format_number).unwrap();
        prop_assert_eq!(fold_arithmetic(&text), expected);
    }

    #[test]
    fn full_mode_agrees_with_legacy_on_single_operations(
        p in (0u32..10_000).prop_map(|n| f64::from(n) / 8.0),
        factor in 0u32..100,
        op in "[*+\\-]",
    ) {
        let template = format!("A(${{0}}{}{})", op, factor);
        prop_assert_eq!(
            expand(&template, &[p], ExpressionMode::Legacy),
            expand(&template, &[p], ExpressionMode::Full)
        );
    }
}
