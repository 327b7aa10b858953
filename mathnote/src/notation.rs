//! # High-level API
//!
//! [`Notation`] bundles a [`Catalog`] and [`Limits`] and parses text against
//! them. [`Problem`] is the request shape callers typically hold: an
//! equation, an optional domain, user functions and constants.
//!
//! ```rust
//! use mathnote::Notation;
//!
//! let mut notation = Notation::new();
//! notation.define("f(x) = x^2").unwrap();
//! let parsed = notation.parse("f(3) + y").unwrap();
//! assert_eq!(parsed.free_symbols(), ["y"]);
//! assert_eq!(parsed.evaluate().unwrap().to_string(), "y + 9");
//! ```

use crate::parser::parse_str;
use crate::{Ast, Catalog, Function, Limits, MathError, Number, ParserState, Value};
use smartstring::alias::String;
use std::sync::{Arc, mpsc};
use std::thread;
use std::time::Duration;

/// A parser front end with its own function and constant catalog.
///
/// The catalog is shared copy-on-write: cloning a `Notation` is cheap, and
/// registering a function on one clone leaves the others untouched.
#[derive(Debug, Clone)]
pub struct Notation {
    catalog: Arc<Catalog>,
    limits: Limits,
}

impl Default for Notation {
    fn default() -> Self {
        Self::new()
    }
}

impl Notation {
    /// Builtin functions and constants, no limits.
    pub fn new() -> Self {
        Self {
            catalog: Catalog::builtin(),
            limits: Limits::default(),
        }
    }

    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }

    /// Registers a named numeric constant.
    pub fn with_constant(mut self, name: &str, value: f64) -> Self {
        Arc::make_mut(&mut self.catalog).insert_constant(name, Value::Number(Number::Real(value)));
        self
    }

    /// Registers a multi-letter name that must not be split into letters.
    pub fn with_symbol(mut self, name: &str) -> Self {
        Arc::make_mut(&mut self.catalog).insert_symbol(name);
        self
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn limits(&self) -> Limits {
        self.limits
    }

    fn state(&self, defining: bool) -> ParserState {
        ParserState::new(Arc::clone(&self.catalog), self.limits).defining(defining)
    }

    /// Parses `name(params) = body` and registers the function, replacing
    /// any function of the same name.
    ///
    /// Text that is not a definition fails with [`MathError::NotAFunction`].
    pub fn define(&mut self, src: &str) -> Result<Function, MathError> {
        let mut state = self.state(true);
        let root = parse_str(src, &mut state).map_err(|cause| match cause {
            MathError::Lex { .. } | MathError::Syntax { .. } | MathError::UnexpectedEnd { .. } => {
                MathError::NotAFunction {
                    text: src.into(),
                    cause: Box::new(cause),
                }
            }
            other => other,
        })?;
        let Value::Function(function) = root.evaluate()? else {
            return Err(MathError::NotCallable(src.into()));
        };
        log::debug!("defined {}", function.name());
        Arc::make_mut(&mut self.catalog).insert_function(function.clone());
        Ok(function)
    }

    /// Parses one equation, inequality, interval or expression.
    pub fn parse(&self, src: &str) -> Result<Parsed, MathError> {
        let mut state = self.state(false);
        let root = parse_str(src, &mut state)?;
        Ok(Parsed {
            root,
            variables: state.variables,
        })
    }

    /// Parses a domain: an interval, optionally prefixed by a number set
    /// (`R|[0, 1]`).
    pub fn parse_domain(&self, src: &str) -> Result<Parsed, MathError> {
        let parsed = self.parse(src)?;
        match parsed.root {
            Ast::Interval { .. } | Ast::CompoundInterval { .. } => Ok(parsed),
            _ => Err(MathError::InvalidDomain { name: src.into() }),
        }
    }
}

/// A parse result with the variables met along the way.
#[derive(Debug, Clone)]
pub struct Parsed {
    pub root: Ast,
    /// In resolution order, with repeats.
    pub variables: Vec<String>,
}

impl Parsed {
    pub fn evaluate(&self) -> Result<Value, MathError> {
        self.root.evaluate()
    }

    /// Distinct variables in source order, leaving out the ones a limit,
    /// sum or product binds.
    pub fn free_symbols(&self) -> Vec<&str> {
        self.root.free_symbols()
    }
}

/// An equation with its surrounding definitions.
#[derive(Debug, Clone, Default)]
pub struct Problem {
    pub equation: std::string::String,
    pub domain: Option<std::string::String>,
    /// Definitions such as `f(x) = x^2`, registered in order.
    pub functions: Vec<std::string::String>,
    pub constants: Vec<(std::string::String, f64)>,
    pub limits: Limits,
}

/// A [`Problem`] after parsing and evaluation.
#[derive(Debug, Clone)]
pub struct Prepared {
    pub equation: Parsed,
    pub value: Value,
    pub domain: Option<Parsed>,
    pub domain_value: Option<Value>,
}

impl Problem {
    pub fn new(equation: &str) -> Self {
        Self {
            equation: equation.into(),
            ..Self::default()
        }
    }

    pub fn notation(&self) -> Result<Notation, MathError> {
        let mut notation = self
            .constants
            .iter()
            .fold(Notation::new().with_limits(self.limits), |n, (name, value)| {
                n.with_constant(name, *value)
            });
        for definition in &self.functions {
            notation.define(definition)?;
        }
        Ok(notation)
    }

    /// Registers the functions and constants, then parses and evaluates the
    /// equation and the domain.
    pub fn prepare(&self) -> Result<Prepared, MathError> {
        let notation = self.notation()?;
        let equation = notation.parse(&self.equation)?;
        let value = equation.evaluate()?;
        let domain = self
            .domain
            .as_deref()
            .map(|src| notation.parse_domain(src))
            .transpose()?;
        let domain_value = domain.as_ref().map(Parsed::evaluate).transpose()?;
        Ok(Prepared {
            equation,
            value,
            domain,
            domain_value,
        })
    }
}

/// Runs `job` on a worker thread and waits at most `timeout` for it.
///
/// A job that overruns is abandoned, not cancelled: its thread keeps running
/// until it finishes on its own.
pub fn with_timeout<T, F>(timeout: Duration, job: F) -> Result<T, MathError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, MathError> + Send + 'static,
{
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let _ = tx.send(job());
    });
    match rx.recv_timeout(timeout) {
        Ok(result) => result,
        Err(mpsc::RecvTimeoutError::Timeout) => {
            log::warn!("job abandoned after {timeout:?}");
            Err(MathError::Timeout(timeout))
        }
        Err(mpsc::RecvTimeoutError::Disconnected) => Err(MathError::WorkerLost),
    }
}
