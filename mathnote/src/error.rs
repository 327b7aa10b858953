//! # Notation Error Type
//!
//! [`MathError`] is the single error surface of the notation engine. It
//! covers lexical and syntax failures, the overflow guards, function
//! definition and application problems, and faults bubbling up from the
//! `mathnote-lr` machinery (table construction, scanner, parser driver).
//!
//! Lower-level errors convert with `#[from]`, so `?` works throughout the
//! pipeline.
use crate::TokenID;
use mathnote_lr::{DriverError, GrammarError, Position, ScanError};
use smartstring::alias::String;
use std::time::Duration;
use thiserror::Error;

/// Everything that can go wrong between source text and a symbolic value.
///
/// # Example
/// ```rust
/// # use mathnote::{MathError, Notation};
/// let err = Notation::new().parse("x = y = z").unwrap_err();
/// assert!(matches!(err, MathError::Syntax { .. }));
/// assert_eq!(
///     err.to_string(),
///     "Encountered a EQ: '=' @ 1:7 where it was not expected"
/// );
/// ```
#[derive(Debug, Clone, Error)]
pub enum MathError {
    /// A character no lexical rule accepts.
    #[error("Unrecognized input {text:?} @ {position}")]
    Lex { text: String, position: Position },

    /// A token for which the parse tables have no action.
    #[error("Encountered a {kind}: '{lexeme}' @ {position} where it was not expected")]
    Syntax {
        kind: TokenID,
        lexeme: String,
        position: Position,
    },

    /// The input ended while a construct was still open.
    #[error("Unexpected end of input @ {position}")]
    UnexpectedEnd { position: Position },

    #[error("Number literal {literal} exceeds the maximum of {limit}")]
    NumberLiteralOverflow { literal: String, limit: f64 },

    #[error("Exponent {value} exceeds the maximum of {limit}")]
    ExponentOverflow { value: f64, limit: f64 },

    #[error("Factorial of {value} exceeds the maximum of {limit}")]
    FactorialOverflow { value: f64, limit: f64 },

    /// A `SET | interval` prefix naming no known number set.
    #[error("Invalid domain {name:?}, expected one of complex, real, rational, integer, whole, natural")]
    InvalidDomain { name: String },

    /// A formal parameter of a defined function that is not a plain symbol.
    #[error("Argument {argument} of {function} is not a symbol")]
    InvalidFunctionArgument { function: String, argument: String },

    /// An unknown name applied to zero or several arguments.
    #[error("{name} is not a function and cannot be applied to {count} arguments")]
    InvalidFunctionCall { name: String, count: usize },

    /// A definition string that does not parse as `name(args) = body`.
    #[error("Invalid function syntax: {text}\nCorrect Ex: f(x) = x^2")]
    NotAFunction {
        text: String,
        #[source]
        cause: Box<MathError>,
    },

    /// The left side of `@` names no known function.
    #[error("Unknown function {name:?}")]
    UnknownFunction { name: String },

    #[error("{0} is not callable")]
    NotCallable(String),

    #[error("{name} takes {expected} argument(s) but {found} were given")]
    ArityMismatch {
        name: String,
        expected: String,
        found: usize,
    },

    #[error("Timed out after {0:?}")]
    Timeout(Duration),

    /// The worker thread ended without reporting a result.
    #[error("worker thread exited without a result")]
    WorkerLost,

    #[error("grammar error: {0}")]
    Grammar(#[from] GrammarError),

    #[error("scanner error: {0}")]
    Scan(#[from] ScanError),

    #[error("parser fault: {0}")]
    Driver(#[from] DriverError),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn _assert_send_sync_static<T: Send + Sync + 'static>() {}

    #[test]
    fn math_error_is_send_sync_static() {
        _assert_send_sync_static::<MathError>();
    }

    #[test]
    fn syntax_message_names_token_and_position() {
        let err = MathError::Syntax {
            kind: TokenID::Sub,
            lexeme: "-".into(),
            position: Position::new(1, 3),
        };
        assert_eq!(
            err.to_string(),
            "Encountered a SUB: '-' @ 1:3 where it was not expected"
        );
    }

    #[test]
    fn not_a_function_keeps_cause() {
        use std::error::Error;
        let cause = MathError::UnexpectedEnd {
            position: Position::new(1, 5),
        };
        let err = MathError::NotAFunction {
            text: "f(x".into(),
            cause: Box::new(cause),
        };
        assert!(err.to_string().starts_with("Invalid function syntax: f(x"));
        assert!(err.source().is_some());
    }

    #[test]
    fn driver_faults_convert() {
        let err: MathError = DriverError::StackUnderflow.into();
        assert!(matches!(err, MathError::Driver(DriverError::StackUnderflow)));
    }
}
