/// Turtle interpretation boundary: which generated symbols a renderer
/// treats as moves, turns, and branch brackets.
///
/// Nothing here computes geometry. It only labels symbols so a renderer
/// (or a test) can walk the output with a shared vocabulary.
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use crate::core::lexer;
use crate::schema::symbol::Symbol;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TurtleCommand {
    /// Draw a segment. Parameters, if any, are the renderer's payload
    /// (segment length, width, ...).
    Forward(Symbol),
    TurnLeft,
    TurnRight,
    /// Save position and heading.
    Push,
    /// Restore the last saved position and heading.
    Pop,
    /// No drawing effect.
    Inert(Symbol),
}

/// The symbol conventions used to classify output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurtleAlphabet {
    pub forward: FxHashSet<char>,
    /// Treat every lowercase ASCII letter as a forward move (growth-stage
    /// letters in raceme grammars).
    pub lowercase_forward: bool,
}

impl Default for TurtleAlphabet {
    fn default() -> Self {
        Self {
            forward: ['F', 'A', 'I'].into_iter().collect(),
            lowercase_forward: true,
        }
    }
}

impl TurtleAlphabet {
    /// An alphabet where only the given characters move forward.
    pub fn with_forward(chars: &str) -> Self {
        Self {
            forward: chars.chars().collect(),
            lowercase_forward: false,
        }
    }

    pub fn classify(&self, symbol: Symbol) -> TurtleCommand {
        match symbol.name {
            '+' => TurtleCommand::TurnLeft,
            '-' => TurtleCommand::TurnRight,
            '[' => TurtleCommand::Push,
            ']' => TurtleCommand::Pop,
            c if self.forward.contains(&c) || (self.lowercase_forward && c.is_ascii_lowercase()) => {
                TurtleCommand::Forward(symbol)
            }
            _ => TurtleCommand::Inert(symbol),
        }
    }

    pub fn interpret(&self, output: &str) -> Vec<TurtleCommand> {
        lexer::parse_symbols(output)
            .into_iter()
            .map(|symbol| self.classify(symbol))
            .collect()
    }

    pub fn summarize(&self, output: &str) -> CommandSummary {
        let mut summary = CommandSummary::default();
        let mut depth = 0usize;

        for command in self.interpret(output) {
            match command {
                TurtleCommand::Forward(_) => summary.forward += 1,
                TurtleCommand::TurnLeft | TurtleCommand::TurnRight => summary.turns += 1,
                TurtleCommand::Push => {
                    summary.branches += 1;
                    depth += 1;
                    summary.max_depth = summary.max_depth.max(depth);
                }
                TurtleCommand::Pop => match depth.checked_sub(1) {
                    Some(d) => depth = d,
                    None => summary.unbalanced_pops += 1,
                },
                TurtleCommand::Inert(_) => summary.inert += 1,
            }
        }
        summary.unclosed_pushes = depth;
        summary
    }
}

/// Command counts for one generated string.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandSummary {
    pub forward: usize,
    pub turns: usize,
    pub branches: usize,
    pub inert: usize,
    pub max_depth: usize,
    /// `]` with no matching `[`; renderers ignore these.
    pub unbalanced_pops: usize,
    pub unclosed_pushes: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_defaults() {
        let alphabet = TurtleAlphabet::default();
        let commands = alphabet.interpret("F+[-I(2)]aX");
        assert_eq!(commands[0], TurtleCommand::Forward(Symbol::new('F')));
        assert_eq!(commands[1], TurtleCommand::TurnLeft);
        assert_eq!(commands[2], TurtleCommand::Push);
        assert_eq!(commands[3], TurtleCommand::TurnRight);
        assert_eq!(commands[4], TurtleCommand::Forward(Symbol::with_params('I', vec![2.0])));
        assert_eq!(commands[5], TurtleCommand::Pop);
        assert_eq!(commands[6], TurtleCommand::Forward(Symbol::new('a')));
        assert_eq!(commands[7], TurtleCommand::Inert(Symbol::new('X')));
    }

    #[test]
    fn custom_alphabet() {
        let alphabet = TurtleAlphabet::with_forward("G");
        assert_eq!(alphabet.classify(Symbol::new('G')), TurtleCommand::Forward(Symbol::new('G')));
        assert_eq!(alphabet.classify(Symbol::new('F')), TurtleCommand::Inert(Symbol::new('F')));
        assert_eq!(alphabet.classify(Symbol::new('a')), TurtleCommand::Inert(Symbol::new('a')));
    }

    #[test]
    fn summary_counts_and_depth() {
        let summary = TurtleAlphabet::default().summarize("F[+F[-F]]F]X[");
        assert_eq!(summary.forward, 4);
        assert_eq!(summary.turns, 2);
        assert_eq!(summary.branches, 3);
        assert_eq!(summary.max_depth, 2);
        assert_eq!(summary.unbalanced_pops, 1);
        assert_eq!(summary.unclosed_pushes, 1);
        assert_eq!(summary.inert, 1);
    }
}
