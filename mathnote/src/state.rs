//! Per-parse state threaded through the reducers.

use crate::{Catalog, MathError, Value};
use smartstring::alias::String;
use std::sync::Arc;

/// Ceilings that guard against pathological inputs. A value equal to its
/// ceiling passes; only strictly greater magnitudes are rejected.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Limits {
    pub max_number: f64,
    pub max_exponent: f64,
    pub max_factorial: f64,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_number: f64::INFINITY,
            max_exponent: f64::INFINITY,
            max_factorial: f64::INFINITY,
        }
    }
}

impl Limits {
    pub fn check_number(&self, literal: &str, value: f64) -> Result<(), MathError> {
        if value > self.max_number {
            return Err(MathError::NumberLiteralOverflow {
                literal: literal.into(),
                limit: self.max_number,
            });
        }
        Ok(())
    }

    /// Checks an exponent whose value is known; symbolic exponents pass.
    pub fn check_exponent(max_exponent: f64, exponent: &Value) -> Result<(), MathError> {
        match exponent.to_f64() {
            Some(value) if value.abs() > max_exponent => Err(MathError::ExponentOverflow {
                value,
                limit: max_exponent,
            }),
            _ => Ok(()),
        }
    }

    pub fn check_factorial(max_factorial: f64, operand: &Value) -> Result<(), MathError> {
        match operand.to_f64() {
            Some(value) if value.abs() > max_factorial => Err(MathError::FactorialOverflow {
                value,
                limit: max_factorial,
            }),
            _ => Ok(()),
        }
    }
}

/// Everything a parse reads or records besides the token stream.
#[derive(Debug, Clone)]
pub struct ParserState {
    pub catalog: Arc<Catalog>,
    /// Variables in the order they were resolved; duplicates are kept.
    pub variables: Vec<String>,
    pub limits: Limits,
    /// Parse a function definition instead of an equation.
    pub defining: bool,
}

impl ParserState {
    pub fn new(catalog: Arc<Catalog>, limits: Limits) -> Self {
        Self {
            catalog,
            variables: Vec::new(),
            limits,
            defining: false,
        }
    }

    pub fn defining(mut self, defining: bool) -> Self {
        self.defining = defining;
        self
    }
}

impl Default for ParserState {
    fn default() -> Self {
        Self::new(Catalog::builtin(), Limits::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ceilings_are_inclusive() {
        let limits = Limits {
            max_number: 100.0,
            max_exponent: 3.0,
            max_factorial: 5.0,
        };
        assert!(limits.check_number("100", 100.0).is_ok());
        assert!(matches!(
            limits.check_number("101", 101.0),
            Err(MathError::NumberLiteralOverflow { .. })
        ));
        assert!(Limits::check_exponent(3.0, &Value::int(-3)).is_ok());
        assert!(matches!(
            Limits::check_exponent(3.0, &Value::int(4)),
            Err(MathError::ExponentOverflow { value, limit }) if value == 4.0 && limit == 3.0
        ));
        assert!(Limits::check_exponent(3.0, &Value::symbol("n")).is_ok());
        assert!(Limits::check_factorial(5.0, &Value::int(5)).is_ok());
        assert!(Limits::check_factorial(5.0, &Value::int(6)).is_err());
    }

    #[test]
    fn default_state_uses_builtins() {
        let state = ParserState::default().defining(true);
        assert!(state.defining);
        assert!(state.catalog.function("sqrt").is_some());
        assert_eq!(state.limits.max_number, f64::INFINITY);
    }
}
