//! # Syntax tree
//!
//! [`Ast`] is the owned, immutable tree the parser builds. Every node
//! evaluates to a symbolic [`Value`], children first.
//!
//! `Display` renders a node back into notation the parser accepts, fully
//! parenthesized, so printing and re-parsing gives a tree that evaluates to
//! the same value.

use crate::state::Limits;
use crate::value::{Function, NumberSet, Relation, Value};
use crate::{MathError, Number};
use indexmap::IndexSet;
use smartstring::alias::String;
use std::fmt;
use std::iter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
}

impl BinaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "%",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Ast {
    Number {
        literal: String,
        value: Number,
    },
    Variable(String),
    Constant {
        name: String,
        value: Value,
    },
    /// A function reference, the operand of `@`.
    Function(Function),
    Pos(Box<Ast>),
    Neg(Box<Ast>),
    Fac {
        operand: Box<Ast>,
        max_factorial: f64,
    },
    Abs(Box<Ast>),
    Binary {
        op: BinaryOp,
        left: Box<Ast>,
        right: Box<Ast>,
    },
    Pow {
        base: Box<Ast>,
        exponent: Box<Ast>,
        max_exponent: f64,
    },
    At {
        function: Box<Ast>,
        argument: Box<Ast>,
    },
    Conditional {
        op: Relation,
        left: Box<Ast>,
        right: Box<Ast>,
    },
    /// `left_bracket` is `[` or `(`, `right_bracket` is `]` or `)`.
    Interval {
        left_bracket: char,
        lower: Box<Ast>,
        upper: Box<Ast>,
        right_bracket: char,
    },
    CompoundInterval {
        set: NumberSet,
        interval: Box<Ast>,
    },
    DefinedFunction {
        name: String,
        params: Vec<Ast>,
        body: Box<Ast>,
    },
    FunctionCall {
        function: Function,
        args: Vec<Ast>,
    },
    Limit {
        target: String,
        approach: Box<Ast>,
        body: Box<Ast>,
    },
    Summation {
        var: String,
        lower: Box<Ast>,
        upper: Box<Ast>,
        body: Box<Ast>,
    },
    Product {
        var: String,
        lower: Box<Ast>,
        upper: Box<Ast>,
        body: Box<Ast>,
    },
    /// A root relation that folded to a boolean.
    BooleanResult(Box<Ast>),
}

impl Ast {
    pub fn binary(op: BinaryOp, left: Ast, right: Ast) -> Ast {
        Ast::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// A numeric literal, rejected when it exceeds `max_number`.
    pub fn number(literal: &str, value: Number, limits: &Limits) -> Result<Ast, MathError> {
        limits.check_number(literal, value.to_f64())?;
        Ok(Ast::Number {
            literal: literal.into(),
            value,
        })
    }

    /// `base ^ exponent`, rejected when the exponent is known and its
    /// magnitude exceeds `max_exponent`.
    pub fn pow(base: Ast, exponent: Ast, max_exponent: f64) -> Result<Ast, MathError> {
        if let Ok(value) = exponent.evaluate() {
            Limits::check_exponent(max_exponent, &value)?;
        }
        Ok(Ast::Pow {
            base: Box::new(base),
            exponent: Box::new(exponent),
            max_exponent,
        })
    }

    /// `operand!`, rejected when the operand is known and its magnitude
    /// exceeds `max_factorial`.
    pub fn fac(operand: Ast, max_factorial: f64) -> Result<Ast, MathError> {
        if let Ok(value) = operand.evaluate() {
            Limits::check_factorial(max_factorial, &value)?;
        }
        Ok(Ast::Fac {
            operand: Box::new(operand),
            max_factorial,
        })
    }

    fn children_mut(&mut self) -> Vec<&mut Ast> {
        match self {
            Ast::Number { .. } | Ast::Variable(_) | Ast::Constant { .. } | Ast::Function(_) => {
                Vec::new()
            }
            Ast::Pos(x) | Ast::Neg(x) | Ast::Abs(x) | Ast::BooleanResult(x) => vec![x.as_mut()],
            Ast::Fac { operand, .. } => vec![operand.as_mut()],
            Ast::Binary { left, right, .. } | Ast::Conditional { left, right, .. } => {
                vec![left.as_mut(), right.as_mut()]
            }
            Ast::Pow { base, exponent, .. } => vec![base.as_mut(), exponent.as_mut()],
            Ast::At { function, argument } => vec![function.as_mut(), argument.as_mut()],
            Ast::Interval { lower, upper, .. } => vec![lower.as_mut(), upper.as_mut()],
            Ast::CompoundInterval { interval, .. } => vec![interval.as_mut()],
            Ast::DefinedFunction { params, body, .. } => {
                params.iter_mut().chain(iter::once(body.as_mut())).collect()
            }
            Ast::FunctionCall { args, .. } => args.iter_mut().collect(),
            Ast::Limit { approach, body, .. } => vec![approach.as_mut(), body.as_mut()],
            Ast::Summation {
                lower, upper, body, ..
            }
            | Ast::Product {
                lower, upper, body, ..
            } => vec![lower.as_mut(), upper.as_mut(), body.as_mut()],
        }
    }

    /// Turns every constant called one of `names` back into a variable.
    fn rebind_constants(&mut self, names: &[String]) {
        if let Ast::Constant { name, .. } = self {
            if names.contains(&*name) {
                *self = Ast::Variable(name.clone());
            }
            return;
        }
        for child in self.children_mut() {
            child.rebind_constants(names);
        }
    }

    /// Variables not bound by an enclosing limit, sum, product or function
    /// definition, in source order without repeats.
    pub fn free_symbols(&self) -> Vec<&str> {
        let mut free = IndexSet::new();
        self.collect_free(&mut Vec::new(), &mut free);
        free.into_iter().collect()
    }

    fn collect_scoped<'a>(
        &'a self,
        names: &[&'a str],
        bound: &mut Vec<&'a str>,
        free: &mut IndexSet<&'a str>,
    ) {
        let depth = bound.len();
        bound.extend_from_slice(names);
        self.collect_free(bound, free);
        bound.truncate(depth);
    }

    fn collect_free<'a>(&'a self, bound: &mut Vec<&'a str>, free: &mut IndexSet<&'a str>) {
        match self {
            Ast::Variable(v) => {
                if !bound.contains(&v.as_str()) {
                    free.insert(v.as_str());
                }
            }
            Ast::Limit {
                target,
                approach,
                body,
            } => {
                approach.collect_free(bound, free);
                body.collect_scoped(&[target.as_str()], bound, free);
            }
            Ast::Summation {
                var,
                lower,
                upper,
                body,
            }
            | Ast::Product {
                var,
                lower,
                upper,
                body,
            } => {
                lower.collect_free(bound, free);
                upper.collect_free(bound, free);
                body.collect_scoped(&[var.as_str()], bound, free);
            }
            Ast::DefinedFunction { params, body, .. } => {
                let names: Vec<&str> = params
                    .iter()
                    .filter_map(|p| match p {
                        Ast::Variable(v) | Ast::Constant { name: v, .. } => Some(v.as_str()),
                        _ => None,
                    })
                    .collect();
                body.collect_scoped(&names, bound, free);
            }
            Ast::Number { .. } | Ast::Constant { .. } | Ast::Function(_) => {}
            Ast::Pos(x) | Ast::Neg(x) | Ast::Abs(x) | Ast::BooleanResult(x) => {
                x.collect_free(bound, free)
            }
            Ast::Fac { operand, .. } => operand.collect_free(bound, free),
            Ast::Binary { left, right, .. } | Ast::Conditional { left, right, .. } => {
                left.collect_free(bound, free);
                right.collect_free(bound, free);
            }
            Ast::Pow { base, exponent, .. } => {
                base.collect_free(bound, free);
                exponent.collect_free(bound, free);
            }
            Ast::At { function, argument } => {
                function.collect_free(bound, free);
                argument.collect_free(bound, free);
            }
            Ast::Interval { lower, upper, .. } => {
                lower.collect_free(bound, free);
                upper.collect_free(bound, free);
            }
            Ast::CompoundInterval { interval, .. } => interval.collect_free(bound, free),
            Ast::FunctionCall { args, .. } => {
                for arg in args {
                    arg.collect_free(bound, free);
                }
            }
        }
    }

    pub fn evaluate(&self) -> Result<Value, MathError> {
        let value = match self {
            Ast::Number { value, .. } => Value::Number(*value),
            Ast::Variable(name) => Value::Symbol(name.clone()),
            Ast::Constant { value, .. } => value.clone(),
            Ast::Function(function) => Value::Function(function.clone()),
            Ast::Pos(x) => x.evaluate()?,
            Ast::Neg(x) => Value::neg(x.evaluate()?),
            Ast::Fac {
                operand,
                max_factorial,
            } => {
                let v = operand.evaluate()?;
                Limits::check_factorial(*max_factorial, &v)?;
                Value::factorial(v)
            }
            Ast::Abs(x) => Value::abs(x.evaluate()?),
            Ast::Binary { op, left, right } => {
                let (l, r) = (left.evaluate()?, right.evaluate()?);
                match op {
                    BinaryOp::Add => Value::add(l, r),
                    BinaryOp::Sub => Value::sub(l, r),
                    BinaryOp::Mul => Value::mul(l, r),
                    BinaryOp::Div => Value::div(l, r),
                    BinaryOp::Mod => Value::modulo(l, r),
                }
            }
            Ast::Pow {
                base,
                exponent,
                max_exponent,
            } => {
                let b = base.evaluate()?;
                let e = exponent.evaluate()?;
                Limits::check_exponent(*max_exponent, &e)?;
                Value::pow(b, e)
            }
            Ast::At { function, argument } => {
                let Value::Function(f) = function.evaluate()? else {
                    return Err(MathError::NotCallable(function.to_string().into()));
                };
                match argument.evaluate()? {
                    Value::Function(g) => Value::Function(f.compose(&g)),
                    v => f.call(&[v])?,
                }
            }
            Ast::Conditional { op, left, right } => {
                Value::relation(*op, left.evaluate()?, right.evaluate()?)
            }
            Ast::Interval {
                left_bracket,
                lower,
                upper,
                right_bracket,
            } => Value::interval(
                lower.evaluate()?,
                upper.evaluate()?,
                *left_bracket == '(',
                *right_bracket == ')',
            ),
            Ast::CompoundInterval { set, interval } => {
                Value::intersect(Value::Set(*set), interval.evaluate()?)
            }
            Ast::DefinedFunction { name, params, body } => {
                let names = params
                    .iter()
                    .map(|param| match param {
                        Ast::Variable(v) | Ast::Constant { name: v, .. } => Ok(v.clone()),
                        other => Err(MathError::InvalidFunctionArgument {
                            function: name.clone(),
                            argument: other.to_string().into(),
                        }),
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                // A parameter shadows a constant of the same name.
                let mut body = body.as_ref().clone();
                body.rebind_constants(&names);
                let targets = names.into_iter().map(Value::Symbol).collect();
                Value::Function(Function::defined(name, targets, body.evaluate()?))
            }
            Ast::FunctionCall { function, args } => {
                let values = args
                    .iter()
                    .map(Ast::evaluate)
                    .collect::<Result<Vec<_>, _>>()?;
                function.call(&values)?
            }
            Ast::Limit {
                target,
                approach,
                body,
            } => Value::limit(target, approach.evaluate()?, body.evaluate()?),
            Ast::Summation {
                var,
                lower,
                upper,
                body,
            } => Value::sum(var, lower.evaluate()?, upper.evaluate()?, body.evaluate()?),
            Ast::Product {
                var,
                lower,
                upper,
                body,
            } => Value::product(var, lower.evaluate()?, upper.evaluate()?, body.evaluate()?),
            Ast::BooleanResult(cond) => cond.evaluate()?,
        };
        Ok(value)
    }

    /// LaTeX for nodes that have a fixed rendering.
    pub fn to_latex(&self) -> Option<String> {
        match self {
            Ast::BooleanResult(cond) => match cond.evaluate().ok()?.as_bool()? {
                true => Some("\\text{True}".into()),
                false => Some("\\text{False}".into()),
            },
            _ => None,
        }
    }

    fn is_atom(&self) -> bool {
        matches!(
            self,
            Ast::Number { .. }
                | Ast::Variable(_)
                | Ast::Constant { .. }
                | Ast::Function(_)
                | Ast::Abs(_)
                | Ast::FunctionCall { .. }
        )
    }

    fn fmt_operand(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_atom() {
            write!(f, "{self}")
        } else {
            write!(f, "({self})")
        }
    }

    fn fmt_args(args: &[Ast], f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, arg) in args.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{arg}")?;
        }
        Ok(())
    }
}

fn set_alias(set: NumberSet) -> &'static str {
    match set {
        NumberSet::Complexes => "C",
        NumberSet::Reals => "R",
        NumberSet::Rationals => "Q",
        NumberSet::Integers => "Z",
        NumberSet::Whole => "W",
        NumberSet::Naturals => "N",
    }
}

impl fmt::Display for Ast {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ast::Number { literal, .. } => write!(f, "{literal}"),
            Ast::Variable(name) | Ast::Constant { name, .. } => write!(f, "{name}"),
            Ast::Function(function) => write!(f, "{}", function.name()),
            Ast::Pos(x) => {
                write!(f, "+")?;
                x.fmt_operand(f)
            }
            Ast::Neg(x) => {
                write!(f, "-")?;
                x.fmt_operand(f)
            }
            Ast::Fac { operand, .. } => {
                operand.fmt_operand(f)?;
                write!(f, "!")
            }
            Ast::Abs(x) => write!(f, "|{x}|"),
            Ast::Binary { op, left, right } => {
                left.fmt_operand(f)?;
                write!(f, " {} ", op.symbol())?;
                right.fmt_operand(f)
            }
            Ast::Pow { base, exponent, .. } => {
                base.fmt_operand(f)?;
                write!(f, "^")?;
                exponent.fmt_operand(f)
            }
            Ast::At { function, argument } => {
                function.fmt_operand(f)?;
                write!(f, "@")?;
                argument.fmt_operand(f)
            }
            Ast::Conditional { op, left, right } => {
                write!(f, "{left} {} {right}", op.symbol())
            }
            Ast::Interval {
                left_bracket,
                lower,
                upper,
                right_bracket,
            } => write!(f, "{left_bracket}{lower}, {upper}{right_bracket}"),
            Ast::CompoundInterval { set, interval } => write!(f, "{}|{interval}", set_alias(*set)),
            Ast::DefinedFunction { name, params, body } => {
                write!(f, "{name}(")?;
                Ast::fmt_args(params, f)?;
                write!(f, ") = {body}")
            }
            Ast::FunctionCall { function, args } => {
                write!(f, "{}(", function.name())?;
                Ast::fmt_args(args, f)?;
                write!(f, ")")
            }
            Ast::Limit {
                target,
                approach,
                body,
            } => {
                write!(f, "lim_({target} -> {approach}) ")?;
                body.fmt_operand(f)
            }
            Ast::Summation {
                var,
                lower,
                upper,
                body,
            } => {
                write!(f, "sum_({var} = {lower})^{{{upper}}} ")?;
                body.fmt_operand(f)
            }
            Ast::Product {
                var,
                lower,
                upper,
                body,
            } => {
                write!(f, "prod_({var} = {lower})^{{{upper}}} ")?;
                body.fmt_operand(f)
            }
            Ast::BooleanResult(cond) => write!(f, "{cond}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn num(n: i64) -> Ast {
        Ast::Number {
            literal: n.to_string().into(),
            value: Number::from(n),
        }
    }

    fn var(name: &str) -> Ast {
        Ast::Variable(name.into())
    }

    #[test]
    fn guards_reject_only_above_the_ceiling() {
        let limits = Limits {
            max_number: 10.0,
            ..Limits::default()
        };
        assert!(Ast::number("10", Number::from(10), &limits).is_ok());
        assert!(matches!(
            Ast::number("11", Number::from(11), &limits),
            Err(MathError::NumberLiteralOverflow { .. })
        ));
        assert!(Ast::pow(var("x"), num(3), 3.0).is_ok());
        assert!(Ast::pow(var("x"), Ast::Neg(Box::new(num(4))), 3.0).is_err());
        assert!(Ast::pow(var("x"), var("n"), 3.0).is_ok());
        assert!(Ast::fac(num(5), 5.0).is_ok());
        assert!(matches!(
            Ast::fac(num(10), 5.0),
            Err(MathError::FactorialOverflow { value, limit }) if value == 10.0 && limit == 5.0
        ));
    }

    #[test]
    fn guards_are_rechecked_on_evaluation() {
        let node = Ast::Pow {
            base: Box::new(num(2)),
            exponent: Box::new(num(100)),
            max_exponent: 10.0,
        };
        assert!(matches!(
            node.evaluate(),
            Err(MathError::ExponentOverflow { .. })
        ));
    }

    #[test]
    fn evaluates_children_first() {
        let node = Ast::binary(
            BinaryOp::Add,
            Ast::pow(var("x"), num(2), f64::INFINITY).unwrap(),
            Ast::binary(BinaryOp::Mul, num(2), var("x")),
        );
        let x = Value::symbol("x");
        assert_eq!(
            node.evaluate().unwrap(),
            Value::Add(vec![
                Value::pow(x.clone(), Value::int(2)),
                Value::Mul(vec![Value::int(2), x]),
            ])
        );
        assert_eq!(node.to_string(), "(x^2) + (2 * x)");
    }

    #[test]
    fn intervals_follow_their_brackets() {
        let node = Ast::Interval {
            left_bracket: '[',
            lower: Box::new(num(0)),
            upper: Box::new(num(1)),
            right_bracket: ')',
        };
        let Value::Interval(i) = node.evaluate().unwrap() else {
            panic!("expected an interval");
        };
        assert!(!i.left_open);
        assert!(i.right_open);
        assert_eq!(node.to_string(), "[0, 1)");
    }

    #[test]
    fn defined_functions_need_symbol_parameters() {
        let good = Ast::DefinedFunction {
            name: "f".into(),
            params: vec![var("x")],
            body: Box::new(Ast::pow(var("x"), num(2), f64::INFINITY).unwrap()),
        };
        let Value::Function(f) = good.evaluate().unwrap() else {
            panic!("expected a function");
        };
        assert_eq!(f.call(&[Value::int(3)]).unwrap(), Value::int(9));

        let bad = Ast::DefinedFunction {
            name: "g".into(),
            params: vec![num(2)],
            body: Box::new(var("x")),
        };
        assert!(matches!(
            bad.evaluate(),
            Err(MathError::InvalidFunctionArgument { .. })
        ));
    }

    #[test]
    fn constant_parameters_shadow_the_constant() {
        let k = || Ast::Constant {
            name: "k".into(),
            value: Value::Number(Number::Real(4.0)),
        };
        let def = Ast::DefinedFunction {
            name: "f".into(),
            params: vec![k()],
            body: Box::new(Ast::binary(BinaryOp::Mul, num(2), k())),
        };
        let Value::Function(f) = def.evaluate().unwrap() else {
            panic!("expected a function");
        };
        assert_eq!(f.call(&[Value::int(3)]).unwrap(), Value::int(6));
        assert!(def.free_symbols().is_empty());
    }

    #[test]
    fn bound_variables_are_not_free() {
        let sum = Ast::Summation {
            var: "k".into(),
            lower: Box::new(num(1)),
            upper: Box::new(var("n")),
            body: Box::new(Ast::binary(BinaryOp::Mul, var("k"), var("a"))),
        };
        assert_eq!(sum.free_symbols(), ["n", "a"]);

        let limit = Ast::Limit {
            target: "x".into(),
            approach: Box::new(var("y")),
            body: Box::new(Ast::binary(BinaryOp::Div, num(1), var("x"))),
        };
        assert_eq!(limit.free_symbols(), ["y"]);

        let outside = Ast::binary(BinaryOp::Add, var("x"), limit);
        assert_eq!(outside.free_symbols(), ["x", "y"]);
    }

    #[test]
    fn boolean_results_render_latex() {
        let cond = Ast::Conditional {
            op: Relation::Eq,
            left: Box::new(num(5)),
            right: Box::new(num(5)),
        };
        let node = Ast::BooleanResult(Box::new(cond));
        assert_eq!(node.evaluate().unwrap(), Value::Bool(true));
        assert_eq!(node.to_latex().as_deref(), Some("\\text{True}"));
        assert_eq!(num(1).to_latex(), None);
    }
}
