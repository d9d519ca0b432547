/// Grammar Linter: validates rule probabilities and predecessor coverage.
///
/// Usage: grammar_linter <path>... [--presets] [--strict-warnings]
use clap::Parser;
use lsystem_engine::core::grammar::GrammarDefinition;
use lsystem_engine::presets;
use std::path::{Path, PathBuf};
use std::process;

#[derive(Debug, Parser)]
#[command(name = "grammar_linter")]
#[command(about = "Validate L-system grammar files", long_about = None)]
struct Cli {
    /// Grammar files or directories (.ron / .json, searched recursively)
    paths: Vec<PathBuf>,

    /// Also lint the bundled presets
    #[arg(long)]
    presets: bool,

    /// Treat warnings as errors
    #[arg(long)]
    strict_warnings: bool,
}

struct Report {
    errors: Vec<String>,
    warnings: Vec<String>,
}

fn main() {
    let cli = Cli::parse();

    if cli.paths.is_empty() && !cli.presets {
        eprintln!("ERROR: nothing to lint; pass a path or --presets");
        process::exit(1);
    }

    let mut grammars: Vec<(String, GrammarDefinition)> = Vec::new();
    let mut report = Report {
        errors: Vec::new(),
        warnings: Vec::new(),
    };

    if cli.presets {
        for name in presets::names() {
            match presets::load(name) {
                Ok(def) => grammars.push((format!("preset:{}", name), def)),
                Err(e) => report.errors.push(format!("preset:{}: {}", name, e)),
            }
        }
    }

    for path in &cli.paths {
        if path.is_file() {
            load_grammar(path, &mut grammars, &mut report);
        } else if path.is_dir() {
            load_grammars_recursive(path, &mut grammars, &mut report);
        } else {
            eprintln!("ERROR: Path '{}' does not exist", path.display());
            process::exit(1);
        }
    }

    println!("Loaded {} grammars", grammars.len());

    for (label, def) in &grammars {
        lint_grammar(label, def, &mut report);
    }

    println!("\n=== Grammar Lint Report ===\n");

    if report.errors.is_empty() && report.warnings.is_empty() {
        println!("All checks passed!");
    }

    for warning in &report.warnings {
        println!("WARNING: {}", warning);
    }

    for error in &report.errors {
        println!("ERROR: {}", error);
    }

    println!(
        "\nSummary: {} errors, {} warnings",
        report.errors.len(),
        report.warnings.len()
    );

    let failed = !report.errors.is_empty() || (cli.strict_warnings && !report.warnings.is_empty());
    process::exit(if failed { 1 } else { 0 });
}

fn is_grammar_file(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|s| s.to_str()),
        Some("ron") | Some("json")
    )
}

fn load_grammar(path: &Path, grammars: &mut Vec<(String, GrammarDefinition)>, report: &mut Report) {
    match GrammarDefinition::load_from_path(path) {
        Ok(def) => {
            println!("  Loaded: {}", path.display());
            grammars.push((path.display().to_string(), def));
        }
        Err(e) => report.errors.push(format!("{}: {}", path.display(), e)),
    }
}

fn load_grammars_recursive(
    dir: &Path,
    grammars: &mut Vec<(String, GrammarDefinition)>,
    report: &mut Report,
) {
    if let Ok(entries) = std::fs::read_dir(dir) {
        let mut paths: Vec<PathBuf> = entries.flatten().map(|e| e.path()).collect();
        paths.sort();
        for path in paths {
            if path.is_dir() {
                load_grammars_recursive(&path, grammars, report);
            } else if is_grammar_file(&path) {
                load_grammar(&path, grammars, report);
            }
        }
    }
}

fn lint_grammar(label: &str, def: &GrammarDefinition, report: &mut Report) {
    if def.axiom.is_empty() {
        report.warnings.push(format!("{}: axiom is empty", label));
    }

    let rules = def.rule_set();
    for issue in rules.validate() {
        report.errors.push(format!("{}: {}", label, issue));
    }
    for warning in rules.lint() {
        report.warnings.push(format!("{}: {}", label, warning));
    }

    // Symbols in the axiom that no rule rewrites are fine (constants), but an
    // axiom with none at all never changes.
    if !def.axiom.is_empty() && !def.axiom.chars().any(|c| rules.has_rules(c)) {
        report
            .warnings
            .push(format!("{}: no symbol in the axiom has a rule", label));
    }
}
