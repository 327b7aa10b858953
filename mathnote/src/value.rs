//! Symbolic values.
//!
//! Parsed notation evaluates to a tree of [`Value`] nodes. Unlike the
//! [`Ast`](crate::Ast), sums and products are **flattened**: `x + (y + z)`
//! is a single [`Value::Add`] with three terms, and numeric terms/factors are
//! folded into one coefficient as the tree is built.
//!
//! Folding never goes further than that. Only numeric operands are combined,
//! relations between numbers become booleans and everything else stays an
//! opaque symbolic tree for a downstream algebra engine.
//!
//! ```rust
//! use mathnote::{Number, Value};
//!
//! let x = Value::symbol("x");
//! let sum = Value::add(Value::add(x.clone(), Value::int(2)), Value::int(3));
//! assert_eq!(sum, Value::Add(vec![x, Value::Number(Number::integer(5))]));
//! assert_eq!(sum.to_string(), "x + 5");
//! ```

use crate::catalog::eval_builtin;
use crate::{MathError, Number};
use smartstring::alias::String;
use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

/// Named mathematical constants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Constant {
    Pi,
    E,
    I,
    GoldenRatio,
    Infinity,
    /// The unsigned infinity produced by division by zero.
    ComplexInfinity,
}

impl Constant {
    /// Real approximation, if the constant is real.
    pub fn approx(self) -> Option<f64> {
        match self {
            Constant::Pi => Some(std::f64::consts::PI),
            Constant::E => Some(std::f64::consts::E),
            Constant::GoldenRatio => Some(1.618_033_988_749_895),
            Constant::Infinity => Some(f64::INFINITY),
            Constant::I | Constant::ComplexInfinity => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Constant::Pi => "pi",
            Constant::E => "E",
            Constant::I => "I",
            Constant::GoldenRatio => "GoldenRatio",
            Constant::Infinity => "oo",
            Constant::ComplexInfinity => "zoo",
        }
    }
}

/// Relational operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Relation {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl Relation {
    pub fn symbol(self) -> &'static str {
        match self {
            Relation::Eq => "=",
            Relation::Ne => "!=",
            Relation::Lt => "<",
            Relation::Le => "<=",
            Relation::Gt => ">",
            Relation::Ge => ">=",
        }
    }

    pub fn holds(self, ord: Ordering) -> bool {
        match self {
            Relation::Eq => ord == Ordering::Equal,
            Relation::Ne => ord != Ordering::Equal,
            Relation::Lt => ord == Ordering::Less,
            Relation::Le => ord != Ordering::Greater,
            Relation::Gt => ord == Ordering::Greater,
            Relation::Ge => ord != Ordering::Less,
        }
    }
}

/// The number sets an interval can be restricted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NumberSet {
    Complexes,
    Reals,
    Rationals,
    Integers,
    /// Non-negative integers.
    Whole,
    /// Positive integers.
    Naturals,
}

impl NumberSet {
    /// Looks a set up by full name, plural or one-letter alias, ignoring case.
    ///
    /// ```rust
    /// # use mathnote::NumberSet;
    /// assert_eq!(NumberSet::lookup("Reals"), Some(NumberSet::Reals));
    /// assert_eq!(NumberSet::lookup("z"), Some(NumberSet::Integers));
    /// assert_eq!(NumberSet::lookup("primes"), None);
    /// ```
    pub fn lookup(name: &str) -> Option<Self> {
        let name = name.to_lowercase();
        let set = match name.as_str() {
            "complex" | "complexes" | "c" => NumberSet::Complexes,
            "real" | "reals" | "r" => NumberSet::Reals,
            "rational" | "rationals" | "q" => NumberSet::Rationals,
            "integer" | "integers" | "z" => NumberSet::Integers,
            "whole" | "wholes" | "w" => NumberSet::Whole,
            "natural" | "naturals" | "n" => NumberSet::Naturals,
            _ => return None,
        };
        Some(set)
    }

    pub fn name(self) -> &'static str {
        match self {
            NumberSet::Complexes => "Complexes",
            NumberSet::Reals => "Reals",
            NumberSet::Rationals => "Rationals",
            NumberSet::Integers => "Integers",
            NumberSet::Whole => "Naturals0",
            NumberSet::Naturals => "Naturals",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Interval {
    pub lower: Box<Value>,
    pub upper: Box<Value>,
    pub left_open: bool,
    pub right_open: bool,
}

type Callable = dyn Fn(&[Value]) -> Result<Value, MathError> + Send + Sync;

/// A callable value: a builtin, a user-defined function or a composition.
///
/// Two functions compare equal when their names and arities match.
#[derive(Clone)]
pub struct Function {
    name: String,
    min_args: usize,
    max_args: usize,
    body: Arc<Callable>,
}

impl Function {
    pub fn new<F>(name: &str, min_args: usize, max_args: usize, body: F) -> Self
    where
        F: Fn(&[Value]) -> Result<Value, MathError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            min_args,
            max_args,
            body: Arc::new(body),
        }
    }

    /// A builtin that applies itself symbolically, e.g. `sin(x)`.
    pub fn builtin(name: &'static str, min_args: usize, max_args: usize) -> Self {
        Self::new(name, min_args, max_args, move |args| {
            Ok(Value::apply(name, args.to_vec()))
        })
    }

    /// A user-defined function: each call substitutes the actual arguments
    /// for `params` in `body`, all at once.
    pub fn defined(name: &str, params: Vec<Value>, body: Value) -> Self {
        let arity = params.len();
        Self::new(name, arity, arity, move |args| {
            let pairs: Vec<(Value, Value)> =
                params.iter().cloned().zip(args.iter().cloned()).collect();
            Ok(body.replace_all(&pairs))
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn check_arity(&self, found: usize) -> Result<(), MathError> {
        if (self.min_args..=self.max_args).contains(&found) {
            return Ok(());
        }
        let expected = if self.min_args == self.max_args {
            format!("{}", self.min_args)
        } else {
            format!("{} to {}", self.min_args, self.max_args)
        };
        Err(MathError::ArityMismatch {
            name: self.name.clone(),
            expected: expected.into(),
            found,
        })
    }

    pub fn call(&self, args: &[Value]) -> Result<Value, MathError> {
        self.check_arity(args.len())?;
        (self.body)(args)
    }

    /// `self @ inner`: a function that feeds the result of `inner` to `self`.
    pub fn compose(&self, inner: &Function) -> Function {
        let outer = self.clone();
        let first = inner.clone();
        let name = format!("{}@{}", self.name, inner.name);
        Function::new(&name, inner.min_args, inner.max_args, move |args| {
            outer.call(&[first.call(args)?])
        })
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Function")
            .field("name", &self.name)
            .field("min_args", &self.min_args)
            .field("max_args", &self.max_args)
            .finish_non_exhaustive()
    }
}

impl PartialEq for Function {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.min_args == other.min_args
            && self.max_args == other.max_args
    }
}

/// A symbolic value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Number(Number),
    Bool(bool),
    Symbol(String),
    Constant(Constant),
    Add(Vec<Value>),
    Mul(Vec<Value>),
    Pow(Box<Value>, Box<Value>),
    Mod(Box<Value>, Box<Value>),
    Factorial(Box<Value>),
    Abs(Box<Value>),
    Apply(String, Vec<Value>),
    Relation(Relation, Box<Value>, Box<Value>),
    Interval(Interval),
    Set(NumberSet),
    Intersection(Box<Value>, Box<Value>),
    Limit {
        var: String,
        approach: Box<Value>,
        body: Box<Value>,
    },
    Sum {
        var: String,
        lower: Box<Value>,
        upper: Box<Value>,
        body: Box<Value>,
    },
    Product {
        var: String,
        lower: Box<Value>,
        upper: Box<Value>,
        body: Box<Value>,
    },
    Function(Function),
}

/// Ranges longer than this are left as symbolic sums/products.
const MAX_FOLDED_TERMS: i128 = 1000;

fn collect(mut items: Vec<Value>, wrap: fn(Vec<Value>) -> Value) -> Value {
    if items.len() == 1 {
        if let Some(item) = items.pop() {
            return item;
        }
    }
    wrap(items)
}

impl Value {
    pub fn int(n: i64) -> Self {
        Value::Number(Number::from(n))
    }

    pub fn symbol(name: &str) -> Self {
        Value::Symbol(name.into())
    }

    pub fn as_number(&self) -> Option<Number> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    fn into_terms(self) -> Vec<Value> {
        match self {
            Value::Add(terms) => terms,
            other => vec![other],
        }
    }

    fn into_factors(self) -> Vec<Value> {
        match self {
            Value::Mul(factors) => factors,
            other => vec![other],
        }
    }

    fn is_infinite(&self) -> bool {
        matches!(
            self,
            Value::Constant(Constant::Infinity | Constant::ComplexInfinity)
        )
    }

    /// `a + b`, flattened, with numeric terms folded into a trailing constant.
    pub fn add(a: Value, b: Value) -> Value {
        let mut constant = Number::ZERO;
        let mut terms = Vec::new();
        for term in a.into_terms().into_iter().chain(b.into_terms()) {
            match term {
                Value::Number(n) => constant = constant.add(n),
                term => terms.push(term),
            }
        }
        if !constant.is_zero() || terms.is_empty() {
            terms.push(Value::Number(constant));
        }
        collect(terms, Value::Add)
    }

    /// `a * b`, flattened, with numeric factors folded into a leading
    /// coefficient.
    pub fn mul(a: Value, b: Value) -> Value {
        let mut coeff = Number::ONE;
        let mut factors = Vec::new();
        for factor in a.into_factors().into_iter().chain(b.into_factors()) {
            match factor {
                Value::Number(n) => coeff = coeff.mul(n),
                factor => factors.push(factor),
            }
        }
        if coeff.is_zero() && !factors.iter().any(Value::is_infinite) {
            return Value::Number(coeff);
        }
        if !coeff.is_one() || factors.is_empty() {
            factors.insert(0, Value::Number(coeff));
        }
        collect(factors, Value::Mul)
    }

    pub fn neg(a: Value) -> Value {
        Value::mul(Value::Number(Number::MINUS_ONE), a)
    }

    pub fn sub(a: Value, b: Value) -> Value {
        Value::add(a, Value::neg(b))
    }

    /// `a / b`; exact for rationals, `zoo` when dividing by zero.
    pub fn div(a: Value, b: Value) -> Value {
        match b.as_number() {
            Some(d) => match (a.as_number(), Number::ONE.div(d)) {
                (_, None) => Value::Constant(Constant::ComplexInfinity),
                (Some(n), Some(_)) => n
                    .div(d)
                    .map_or(Value::Constant(Constant::ComplexInfinity), Value::Number),
                (None, Some(inv)) => Value::mul(a, Value::Number(inv)),
            },
            None => Value::mul(a, Value::pow(b, Value::int(-1))),
        }
    }

    pub fn pow(base: Value, exponent: Value) -> Value {
        if let Some(e) = exponent.as_number() {
            if e.is_zero() {
                return Value::int(1);
            }
            if e.is_one() {
                return base;
            }
            if let Some(b) = base.as_number() {
                if let Some(r) = b.pow(e) {
                    return Value::Number(r);
                }
                if b.is_zero() && e.is_negative() {
                    return Value::Constant(Constant::ComplexInfinity);
                }
            }
        }
        if base.as_number().is_some_and(Number::is_one) {
            return Value::int(1);
        }
        Value::Pow(Box::new(base), Box::new(exponent))
    }

    pub fn modulo(a: Value, b: Value) -> Value {
        if let (Some(x), Some(y)) = (a.as_number(), b.as_number()) {
            if let Some(r) = x.rem(y) {
                return Value::Number(r);
            }
        }
        Value::Mod(Box::new(a), Box::new(b))
    }

    pub fn factorial(a: Value) -> Value {
        if let Some(n) = a.as_number() {
            if let Some(r) = n.factorial() {
                return Value::Number(r);
            }
            if n.is_integer() && n.is_negative() {
                return Value::Constant(Constant::ComplexInfinity);
            }
        }
        Value::Factorial(Box::new(a))
    }

    pub fn abs(a: Value) -> Value {
        match a {
            Value::Number(n) => Value::Number(n.abs()),
            Value::Abs(_) => a,
            a => Value::Abs(Box::new(a)),
        }
    }

    /// Applies a builtin by name. Calls whose arguments are all inexact
    /// numbers are evaluated numerically.
    pub fn apply(name: &str, args: Vec<Value>) -> Value {
        if name == "abs" && args.len() == 1 {
            if let Some(arg) = args.into_iter().next() {
                return Value::abs(arg);
            }
            return Value::Apply(name.into(), Vec::new());
        }
        let reals: Option<Vec<f64>> = args
            .iter()
            .map(|a| match a {
                Value::Number(Number::Real(x)) => Some(*x),
                _ => None,
            })
            .collect();
        if let Some(r) = reals
            .filter(|r| !r.is_empty())
            .and_then(|r| eval_builtin(name, &r))
        {
            return Value::Number(Number::Real(r));
        }
        Value::Apply(name.into(), args)
    }

    /// Builds a relation, folding it to a boolean when both sides are
    /// numeric or structurally identical.
    pub fn relation(op: Relation, left: Value, right: Value) -> Value {
        let ord = match (left.as_number(), right.as_number()) {
            (Some(a), Some(b)) => a.compare(b),
            _ => match (left.to_f64(), right.to_f64()) {
                (Some(a), Some(b)) => a.partial_cmp(&b),
                _ if left == right && matches!(op, Relation::Eq | Relation::Ne) => {
                    Some(Ordering::Equal)
                }
                _ => None,
            },
        };
        match ord {
            Some(ord) => Value::Bool(op.holds(ord)),
            None => Value::Relation(op, Box::new(left), Box::new(right)),
        }
    }

    /// An interval; infinite endpoints are always open.
    pub fn interval(lower: Value, upper: Value, left_open: bool, right_open: bool) -> Value {
        let infinite = |v: &Value| v.to_f64().is_some_and(f64::is_infinite);
        Value::Interval(Interval {
            left_open: left_open || infinite(&lower),
            right_open: right_open || infinite(&upper),
            lower: Box::new(lower),
            upper: Box::new(upper),
        })
    }

    /// `set ∩ interval`. Intervals are real, so intersecting with the reals
    /// or the complexes is a no-op.
    pub fn intersect(set: Value, interval: Value) -> Value {
        match (&set, &interval) {
            (Value::Set(NumberSet::Reals | NumberSet::Complexes), Value::Interval(_)) => interval,
            _ => Value::Intersection(Box::new(set), Box::new(interval)),
        }
    }

    pub fn limit(var: &str, approach: Value, body: Value) -> Value {
        if !body.contains_symbol(var) {
            return body;
        }
        Value::Limit {
            var: var.into(),
            approach: Box::new(approach),
            body: Box::new(body),
        }
    }

    /// `sum_(var = lower)^upper body`, folded when both bounds are integers.
    pub fn sum(var: &str, lower: Value, upper: Value, body: Value) -> Value {
        match Self::fold_range(var, &lower, &upper, &body, Value::int(0), Value::add) {
            Some(v) => v,
            None => Value::Sum {
                var: var.into(),
                lower: Box::new(lower),
                upper: Box::new(upper),
                body: Box::new(body),
            },
        }
    }

    pub fn product(var: &str, lower: Value, upper: Value, body: Value) -> Value {
        match Self::fold_range(var, &lower, &upper, &body, Value::int(1), Value::mul) {
            Some(v) => v,
            None => Value::Product {
                var: var.into(),
                lower: Box::new(lower),
                upper: Box::new(upper),
                body: Box::new(body),
            },
        }
    }

    fn fold_range(
        var: &str,
        lower: &Value,
        upper: &Value,
        body: &Value,
        init: Value,
        op: fn(Value, Value) -> Value,
    ) -> Option<Value> {
        let lo = lower.as_number()?.as_integer()?;
        let hi = upper.as_number()?.as_integer()?;
        if hi.checked_sub(lo)? >= MAX_FOLDED_TERMS {
            return None;
        }
        let mut acc = init;
        for k in lo..=hi {
            let k = Value::Number(Number::integer(k));
            acc = op(acc, body.subs(var, &k));
        }
        Some(acc)
    }

    pub fn contains_symbol(&self, name: &str) -> bool {
        match self {
            Value::Symbol(s) => s == name,
            Value::Number(_)
            | Value::Bool(_)
            | Value::Constant(_)
            | Value::Set(_)
            | Value::Function(_) => false,
            Value::Add(items) | Value::Mul(items) | Value::Apply(_, items) => {
                items.iter().any(|v| v.contains_symbol(name))
            }
            Value::Pow(a, b)
            | Value::Mod(a, b)
            | Value::Relation(_, a, b)
            | Value::Intersection(a, b) => a.contains_symbol(name) || b.contains_symbol(name),
            Value::Factorial(a) | Value::Abs(a) => a.contains_symbol(name),
            Value::Interval(i) => i.lower.contains_symbol(name) || i.upper.contains_symbol(name),
            Value::Limit { var, approach, body } => {
                approach.contains_symbol(name) || (var != name && body.contains_symbol(name))
            }
            Value::Sum { var, lower, upper, body } | Value::Product { var, lower, upper, body } => {
                lower.contains_symbol(name)
                    || upper.contains_symbol(name)
                    || (var != name && body.contains_symbol(name))
            }
        }
    }

    /// Replaces the symbol `name` with `with`.
    pub fn subs(&self, name: &str, with: &Value) -> Value {
        self.replace_all(&[(Value::symbol(name), with.clone())])
    }

    /// Simultaneously replaces every occurrence of each target with its
    /// replacement and re-folds the result. Bound variables of limits, sums
    /// and products are left alone inside their bodies.
    pub fn replace_all(&self, pairs: &[(Value, Value)]) -> Value {
        if let Some((_, with)) = pairs.iter().find(|(target, _)| target == self) {
            return with.clone();
        }
        let r = |v: &Value| v.replace_all(pairs);
        let bound = |var: &str| -> Vec<(Value, Value)> {
            pairs
                .iter()
                .filter(|(t, _)| !matches!(t, Value::Symbol(s) if s == var))
                .cloned()
                .collect()
        };
        match self {
            Value::Number(_)
            | Value::Bool(_)
            | Value::Symbol(_)
            | Value::Constant(_)
            | Value::Set(_)
            | Value::Function(_) => self.clone(),
            Value::Add(terms) => terms.iter().map(r).fold(Value::int(0), Value::add),
            Value::Mul(factors) => factors.iter().map(r).fold(Value::int(1), Value::mul),
            Value::Pow(a, b) => Value::pow(r(a), r(b)),
            Value::Mod(a, b) => Value::modulo(r(a), r(b)),
            Value::Factorial(a) => Value::factorial(r(a)),
            Value::Abs(a) => Value::abs(r(a)),
            Value::Apply(name, args) => Value::apply(name, args.iter().map(r).collect()),
            Value::Relation(op, a, b) => Value::relation(*op, r(a), r(b)),
            Value::Interval(i) => {
                Value::interval(r(&i.lower), r(&i.upper), i.left_open, i.right_open)
            }
            Value::Intersection(a, b) => Value::intersect(r(a), r(b)),
            Value::Limit { var, approach, body } => {
                Value::limit(var, r(approach), body.replace_all(&bound(var)))
            }
            Value::Sum { var, lower, upper, body } => {
                Value::sum(var, r(lower), r(upper), body.replace_all(&bound(var)))
            }
            Value::Product { var, lower, upper, body } => {
                Value::product(var, r(lower), r(upper), body.replace_all(&bound(var)))
            }
        }
    }

    /// Numeric approximation, when the value is a real number.
    pub fn to_f64(&self) -> Option<f64> {
        let x = match self {
            Value::Number(n) => n.to_f64(),
            Value::Constant(c) => c.approx()?,
            Value::Add(terms) => terms.iter().map(Value::to_f64).sum::<Option<f64>>()?,
            Value::Mul(factors) => factors.iter().map(Value::to_f64).product::<Option<f64>>()?,
            Value::Pow(a, b) => a.to_f64()?.powf(b.to_f64()?),
            Value::Mod(a, b) => Number::Real(a.to_f64()?)
                .rem(Number::Real(b.to_f64()?))?
                .to_f64(),
            Value::Factorial(a) => Number::Real(a.to_f64()?).factorial()?.to_f64(),
            Value::Abs(a) => a.to_f64()?.abs(),
            Value::Apply(name, args) => {
                let args: Option<Vec<f64>> = args.iter().map(Value::to_f64).collect();
                eval_builtin(name, &args?)?
            }
            _ => return None,
        };
        (!x.is_nan()).then_some(x)
    }

    /// Binding strength used when printing.
    fn prec(&self) -> u8 {
        match self {
            Value::Relation(..) => 0,
            Value::Add(_) => 1,
            Value::Mul(_) => 2,
            Value::Number(Number::Rational(n, d)) if *n < 0 || *d != 1 => 2,
            Value::Number(Number::Real(x)) if *x < 0.0 => 2,
            Value::Pow(..) => 3,
            _ => 4,
        }
    }

    fn fmt_child(&self, f: &mut fmt::Formatter<'_>, min_prec: u8) -> fmt::Result {
        if self.prec() < min_prec {
            write!(f, "({self})")
        } else {
            write!(f, "{self}")
        }
    }

    /// For a term printed after `-`: the negated term, if this one carries a
    /// negative sign.
    fn negated(&self) -> Option<Value> {
        match self {
            Value::Number(n) if n.is_negative() => Some(Value::Number(n.neg())),
            Value::Mul(factors) => match factors.first() {
                Some(Value::Number(c)) if c.is_negative() => {
                    let rest = factors[1..].iter().cloned();
                    Some(
                        std::iter::once(Value::Number(c.neg()))
                            .chain(rest)
                            .fold(Value::int(1), Value::mul),
                    )
                }
                _ => None,
            },
            _ => None,
        }
    }

    fn fmt_product(factors: &[Value], f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut factors = factors;
        if let Some((Value::Number(c), rest)) = factors.split_first() {
            if *c == Number::MINUS_ONE && !rest.is_empty() {
                write!(f, "-")?;
                factors = rest;
            }
        }
        let mut numer = Vec::new();
        let mut denom = Vec::new();
        for factor in factors {
            match factor {
                Value::Pow(base, e) if e.as_number().is_some_and(Number::is_negative) => {
                    let e = e.as_number().map(Number::neg).unwrap_or(Number::ONE);
                    denom.push(Value::pow((**base).clone(), Value::Number(e)));
                }
                factor => numer.push(factor),
            }
        }
        if numer.is_empty() {
            write!(f, "1")?;
        }
        for (i, factor) in numer.iter().enumerate() {
            if i > 0 {
                write!(f, "*")?;
            }
            factor.fmt_child(f, 3)?;
        }
        match denom.as_slice() {
            [] => Ok(()),
            [single] => {
                write!(f, "/")?;
                single.fmt_child(f, 3)
            }
            many => {
                write!(f, "/(")?;
                for (i, factor) in many.iter().enumerate() {
                    if i > 0 {
                        write!(f, "*")?;
                    }
                    factor.fmt_child(f, 3)?;
                }
                write!(f, ")")
            }
        }
    }

    fn fmt_list(items: &[Value], f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, item) in items.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{item}")?;
        }
        Ok(())
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(n) => write!(f, "{n}"),
            Value::Bool(true) => write!(f, "True"),
            Value::Bool(false) => write!(f, "False"),
            Value::Symbol(s) => write!(f, "{s}"),
            Value::Constant(c) => write!(f, "{}", c.name()),
            Value::Add(terms) => {
                for (i, term) in terms.iter().enumerate() {
                    match (i, term.negated()) {
                        (0, _) => term.fmt_child(f, 1)?,
                        (_, Some(neg)) => {
                            write!(f, " - ")?;
                            neg.fmt_child(f, 2)?;
                        }
                        (_, None) => {
                            write!(f, " + ")?;
                            term.fmt_child(f, 2)?;
                        }
                    }
                }
                Ok(())
            }
            Value::Mul(factors) => Value::fmt_product(factors, f),
            Value::Pow(base, exponent) => {
                base.fmt_child(f, 4)?;
                write!(f, "^")?;
                exponent.fmt_child(f, 4)
            }
            Value::Mod(a, b) => write!(f, "Mod({a}, {b})"),
            Value::Factorial(a) => {
                a.fmt_child(f, 4)?;
                write!(f, "!")
            }
            Value::Abs(a) => write!(f, "|{a}|"),
            Value::Apply(name, args) => {
                write!(f, "{name}(")?;
                Value::fmt_list(args, f)?;
                write!(f, ")")
            }
            Value::Relation(op, a, b) => {
                a.fmt_child(f, 1)?;
                write!(f, " {} ", op.symbol())?;
                b.fmt_child(f, 1)
            }
            Value::Interval(i) => write!(
                f,
                "{}{}, {}{}",
                if i.left_open { '(' } else { '[' },
                i.lower,
                i.upper,
                if i.right_open { ')' } else { ']' }
            ),
            Value::Set(set) => write!(f, "{}", set.name()),
            Value::Intersection(a, b) => write!(f, "Intersection({a}, {b})"),
            Value::Limit { var, approach, body } => write!(f, "Limit({body}, {var}, {approach})"),
            Value::Sum { var, lower, upper, body } => {
                write!(f, "Sum({body}, ({var}, {lower}, {upper}))")
            }
            Value::Product { var, lower, upper, body } => {
                write!(f, "Product({body}, ({var}, {lower}, {upper}))")
            }
            Value::Function(func) => write!(f, "{}", func.name()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn x() -> Value {
        Value::symbol("x")
    }

    fn y() -> Value {
        Value::symbol("y")
    }

    #[test]
    fn sums_flatten_and_fold() {
        let v = Value::add(Value::add(x(), Value::int(1)), Value::add(y(), Value::int(-1)));
        assert_eq!(v, Value::Add(vec![x(), y()]));
        assert_eq!(Value::sub(x(), x()), Value::Add(vec![x(), Value::neg(x())]));
        assert_eq!(Value::add(Value::int(2), Value::int(3)), Value::int(5));
    }

    #[test]
    fn products_flatten_and_fold() {
        let v = Value::mul(Value::mul(Value::int(2), x()), Value::mul(Value::int(3), y()));
        assert_eq!(v, Value::Mul(vec![Value::int(6), x(), y()]));
        assert_eq!(Value::mul(Value::int(0), x()), Value::int(0));
        assert_eq!(Value::mul(Value::int(1), x()), x());
    }

    #[test]
    fn division_is_exact() {
        assert_eq!(
            Value::div(Value::int(1), Value::int(3)),
            Value::Number(Number::rational(1, 3).unwrap())
        );
        assert_eq!(
            Value::div(Value::int(1), Value::int(0)),
            Value::Constant(Constant::ComplexInfinity)
        );
        assert_eq!(
            Value::div(x(), Value::int(2)),
            Value::Mul(vec![Value::Number(Number::rational(1, 2).unwrap()), x()])
        );
        assert_eq!(Value::div(x(), y()).to_string(), "x/y");
    }

    #[test]
    fn powers_fold_numbers_only() {
        assert_eq!(Value::pow(Value::int(2), Value::int(10)), Value::int(1024));
        assert_eq!(Value::pow(x(), Value::int(1)), x());
        assert_eq!(Value::pow(x(), Value::int(0)), Value::int(1));
        assert_eq!(
            Value::pow(Value::int(-8), Value::Number(Number::rational(1, 3).unwrap())),
            Value::Pow(
                Box::new(Value::int(-8)),
                Box::new(Value::Number(Number::rational(1, 3).unwrap()))
            )
        );
    }

    #[test]
    fn relations_fold_to_booleans() {
        assert_eq!(Value::relation(Relation::Eq, Value::int(5), Value::int(5)), Value::Bool(true));
        assert_eq!(
            Value::relation(Relation::Gt, Value::Constant(Constant::Pi), Value::int(3)),
            Value::Bool(true)
        );
        assert_eq!(
            Value::relation(Relation::Eq, x(), Value::int(5)),
            Value::Relation(Relation::Eq, Box::new(x()), Box::new(Value::int(5)))
        );
        assert_eq!(Value::relation(Relation::Ne, x(), x()), Value::Bool(false));
    }

    #[test]
    fn sums_fold_over_integer_ranges() {
        let body = Value::pow(Value::symbol("k"), Value::int(2));
        assert_eq!(Value::sum("k", Value::int(1), Value::int(3), body.clone()), Value::int(14));
        assert_eq!(
            Value::product("k", Value::int(1), Value::int(4), Value::symbol("k")),
            Value::int(24)
        );
        assert!(matches!(
            Value::sum("k", Value::int(1), Value::symbol("n"), body),
            Value::Sum { .. }
        ));
    }

    #[test]
    fn substitution_respects_bound_variables() {
        let body = Value::mul(Value::symbol("k"), x());
        let sum = Value::sum("k", Value::int(1), Value::symbol("n"), body);
        let replaced = sum.subs("k", &Value::int(7)).subs("x", &Value::int(2));
        let Value::Sum { body, .. } = replaced else {
            panic!("expected a symbolic sum");
        };
        assert_eq!(*body, Value::Mul(vec![Value::int(2), Value::symbol("k")]));
    }

    #[test]
    fn replace_all_is_simultaneous() {
        let v = Value::add(x(), y());
        let swapped = v.replace_all(&[(x(), y()), (y(), x())]);
        assert_eq!(swapped, Value::Add(vec![y(), x()]));
    }

    #[test]
    fn infinite_endpoints_are_open() {
        let v = Value::interval(
            Value::neg(Value::Constant(Constant::Infinity)),
            x(),
            false,
            false,
        );
        let Value::Interval(i) = v else {
            panic!("expected an interval");
        };
        assert!(i.left_open);
        assert!(!i.right_open);
    }

    #[test]
    fn functions_compose() {
        let square = Function::defined("f", vec![x()], Value::pow(x(), Value::int(2)));
        let inc = Function::defined("g", vec![x()], Value::add(x(), Value::int(1)));
        let both = square.compose(&inc);
        assert_eq!(both.name(), "f@g");
        assert_eq!(both.call(&[Value::int(2)]).unwrap(), Value::int(9));
        assert!(matches!(
            both.call(&[]),
            Err(MathError::ArityMismatch { found: 0, .. })
        ));
    }

    #[test]
    fn display() {
        let v = Value::add(
            Value::add(Value::pow(x(), Value::int(2)), Value::mul(Value::int(-2), x())),
            Value::int(-1),
        );
        assert_eq!(v.to_string(), "x^2 - 2*x - 1");
        assert_eq!(Value::neg(x()).to_string(), "-x");
        assert_eq!(
            Value::pow(Value::add(x(), Value::int(1)), Value::int(2)).to_string(),
            "(x + 1)^2"
        );
        assert_eq!(Value::factorial(x()).to_string(), "x!");
    }
}
