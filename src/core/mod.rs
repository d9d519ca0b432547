pub mod engine;
pub mod expr;
pub mod grammar;
pub mod lexer;
pub mod random;
pub mod turtle;
