//! Plain data types shared by the engine and its consumers.

pub mod rule;
pub mod symbol;
