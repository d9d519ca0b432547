/// L-system generator. Rewrites a preset, a grammar file or inline rules.
///
/// Usage: lsystem (--preset <name> | --grammar <path> | --axiom <s> --rule <X=...>...)
///                [--iterations <n>] [--seed <n> | --seed-text <s>] [--strict]
///                [--full-expressions] [--format string|symbols|summary]
use clap::{Parser, ValueEnum};
use lsystem_engine::core::engine::{EngineOptions, LSystem};
use lsystem_engine::core::expr::ExpressionMode;
use lsystem_engine::core::grammar::{parse_rule_text, GrammarDefinition, GrammarError};
use lsystem_engine::core::lexer::parse_symbols;
use lsystem_engine::core::random::{Mulberry32, RandomSource, StdRandom};
use lsystem_engine::core::turtle::TurtleAlphabet;
use lsystem_engine::presets;
use std::path::PathBuf;
use std::process;
use tracing_subscriber::prelude::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// The generated string.
    String,
    /// One symbol per line.
    Symbols,
    /// Turtle command counts.
    Summary,
}

#[derive(Debug, Parser)]
#[command(name = "lsystem")]
#[command(about = "Generate L-system strings", long_about = None)]
#[command(version)]
struct Cli {
    /// Bundled preset to load
    #[arg(long, conflicts_with_all = ["grammar", "axiom"])]
    preset: Option<String>,

    /// Grammar file (.ron or .json)
    #[arg(long, conflicts_with = "axiom")]
    grammar: Option<PathBuf>,

    /// Axiom for inline rules
    #[arg(long)]
    axiom: Option<String>,

    /// Inline rule as `X=successor` (probability 1); repeatable
    #[arg(long = "rule", requires = "axiom")]
    rules: Vec<String>,

    /// Number of rewrite passes
    #[arg(short = 'n', long, default_value_t = 4)]
    iterations: usize,

    /// Seed for the standard generator
    #[arg(long, default_value_t = 0, conflicts_with = "seed_text")]
    seed: u64,

    /// Text seed for the mulberry32 generator used by the browser tools
    #[arg(long)]
    seed_text: Option<String>,

    /// Reject grammars that fail validation
    #[arg(long)]
    strict: bool,

    /// Evaluate full arithmetic expressions in parameter lists
    #[arg(long)]
    full_expressions: bool,

    #[arg(long, value_enum, default_value_t = OutputFormat::String)]
    format: OutputFormat,

    /// List bundled presets and exit
    #[arg(long)]
    list_presets: bool,

    /// Log level, used when RUST_LOG is unset
    #[arg(long, default_value = "warn", env = "LSYSTEM_LOG")]
    log_level: String,
}

fn main() {
    let cli = Cli::parse();

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if cli.list_presets {
        for name in presets::names() {
            println!("{}", name);
        }
        return;
    }

    if let Err(e) = run(&cli) {
        eprintln!("ERROR: {}", e);
        process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<(), GrammarError> {
    let definition = load_definition(cli)?;
    let options = EngineOptions {
        expressions: if cli.full_expressions {
            ExpressionMode::Full
        } else {
            ExpressionMode::Legacy
        },
        strict: cli.strict,
    };

    let output = match &cli.seed_text {
        Some(text) => generate(&definition, options, Mulberry32::from_text(text), cli.iterations)?,
        None => generate(&definition, options, StdRandom::seeded(cli.seed), cli.iterations)?,
    };

    match cli.format {
        OutputFormat::String => println!("{}", output),
        OutputFormat::Symbols => {
            for symbol in parse_symbols(&output) {
                println!("{}", symbol);
            }
        }
        OutputFormat::Summary => {
            let summary = TurtleAlphabet::default().summarize(&output);
            if let Some(name) = &definition.name {
                println!("Grammar: {}", name);
            }
            if let Some(angle) = definition.angle {
                println!("Angle: {}°", angle);
            }
            println!("Length: {}", output.chars().count());
            println!("Forward moves: {}", summary.forward);
            println!("Turns: {}", summary.turns);
            println!("Branches: {} (max depth {})", summary.branches, summary.max_depth);
            println!("Inert symbols: {}", summary.inert);
            if summary.unbalanced_pops > 0 || summary.unclosed_pushes > 0 {
                println!(
                    "Unbalanced brackets: {} stray ']', {} unclosed '['",
                    summary.unbalanced_pops, summary.unclosed_pushes
                );
            }
        }
    }

    Ok(())
}

fn load_definition(cli: &Cli) -> Result<GrammarDefinition, GrammarError> {
    if let Some(name) = &cli.preset {
        return presets::load(name);
    }
    if let Some(path) = &cli.grammar {
        return GrammarDefinition::load_from_path(path);
    }
    match &cli.axiom {
        Some(axiom) => {
            let rules = parse_rule_text(&cli.rules.join("\n"), cli.strict)?;
            Ok(GrammarDefinition::new(axiom.clone(), rules))
        }
        None => Err(GrammarError::InvalidArgument(
            "one of --preset, --grammar or --axiom is required".to_string(),
        )),
    }
}

fn generate<R: RandomSource>(
    definition: &GrammarDefinition,
    options: EngineOptions,
    rng: R,
    iterations: usize,
) -> Result<String, GrammarError> {
    let mut system = LSystem::builder()
        .definition(definition)
        .options(options)
        .random_source(rng)
        .build()?;
    Ok(system.generate(iterations))
}
