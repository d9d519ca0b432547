//! Stochastic, parametric L-system string rewriting.
//!
//! Rewrites an axiom through weighted production rules, carrying numeric
//! parameters on symbols and folding the arithmetic in each successor. The
//! output string is meant for a turtle-graphics renderer; see
//! [`core::turtle`] for the symbol conventions.
//!
//! ```
//! use lsystem_engine::core::engine::LSystem;
//! use lsystem_engine::schema::rule::ProductionRule;
//!
//! let mut plant = LSystem::new(
//!     "A(1)",
//!     vec![ProductionRule::new("A", "I(${0})A(${0}*0.9)", 1.0)],
//! )
//! .unwrap();
//! assert_eq!(plant.generate(1), "I(1)A(0.9)");
//! ```

pub mod core;
pub mod presets;
pub mod schema;

pub use crate::core::engine::{EngineOptions, LSystem, LSystemBuilder};
pub use crate::core::expr::ExpressionMode;
pub use crate::core::grammar::{GrammarDefinition, GrammarError, RuleSet};
pub use crate::core::random::{Mulberry32, RandomSource, SequenceSource, StdRandom};
pub use crate::schema::rule::ProductionRule;
pub use crate::schema::symbol::Symbol;
