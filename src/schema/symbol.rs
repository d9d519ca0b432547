use serde::{Deserialize, Serialize};
use std::fmt;

use crate::core::expr::format_number;

/// One symbol of a generated string, with its positional parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Symbol {
    pub name: char,
    #[serde(default)]
    pub params: Vec<f64>,
}

impl Symbol {
    pub fn new(name: char) -> Self {
        Self {
            name,
            params: Vec::new(),
        }
    }

    pub fn with_params(name: char, params: Vec<f64>) -> Self {
        Self { name, params }
    }

    pub fn is_parameterized(&self) -> bool {
        !self.params.is_empty()
    }

    /// Parameter at `index`, if the occurrence carries one.
    pub fn param(&self, index: usize) -> Option<f64> {
        self.params.get(index).copied()
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        if !self.params.is_empty() {
            let rendered: Vec<String> = self.params.iter().map(|p| format_number(*p)).collect();
            write!(f, "({})", rendered.join(","))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_bare() {
        assert_eq!(Symbol::new('F').to_string(), "F");
    }

    #[test]
    fn display_parameterized() {
        let s = Symbol::with_params('A', vec![1.0, 0.9]);
        assert_eq!(s.to_string(), "A(1,0.9)");
        assert_eq!(s.param(1), Some(0.9));
        assert_eq!(s.param(2), None);
    }
}
