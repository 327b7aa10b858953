//! # Function, constant and symbol tables
//!
//! A [`Catalog`] is an immutable value shared by `Arc`. The builtin catalog
//! is built once; registering a user function or constant clones it on
//! write (`Arc::make_mut`), so parses that already hold the old catalog are
//! unaffected.

use crate::value::{Constant, Function, Value};
use indexmap::{IndexMap, IndexSet};
use once_cell::sync::Lazy;
use smartstring::alias::String;
use std::sync::Arc;

/// Builtin functions with their accepted argument counts.
const BUILTIN_FUNCTIONS: &[(&str, usize, usize)] = &[
    ("sin", 1, 1),
    ("cos", 1, 1),
    ("tan", 1, 1),
    ("cot", 1, 1),
    ("sec", 1, 1),
    ("csc", 1, 1),
    ("asin", 1, 1),
    ("acos", 1, 1),
    ("atan", 1, 1),
    ("sinh", 1, 1),
    ("cosh", 1, 1),
    ("tanh", 1, 1),
    ("ln", 1, 1),
    // log(x) is natural; log(b, x) is base b.
    ("log", 1, 2),
    ("exp", 1, 1),
    ("sqrt", 1, 1),
    ("abs", 1, 1),
    ("floor", 1, 1),
    ("ceiling", 1, 1),
];

/// Greek letter names accepted as single identifiers.
const GREEK_NAMES: &[&str] = &[
    "alpha", "beta", "gamma", "delta", "epsilon", "zeta", "eta", "theta", "iota", "kappa",
    "lambda", "mu", "nu", "xi", "omicron", "pi", "rho", "sigma", "tau", "upsilon", "phi", "chi",
    "psi", "omega",
];

pub fn is_greek_name(name: &str) -> bool {
    GREEK_NAMES.contains(&name)
}

/// Numeric value of a builtin applied to real arguments.
pub(crate) fn eval_builtin(name: &str, args: &[f64]) -> Option<f64> {
    let r = match (name, args) {
        ("sin", [x]) => x.sin(),
        ("cos", [x]) => x.cos(),
        ("tan", [x]) => x.tan(),
        ("cot", [x]) => x.tan().recip(),
        ("sec", [x]) => x.cos().recip(),
        ("csc", [x]) => x.sin().recip(),
        ("asin", [x]) => x.asin(),
        ("acos", [x]) => x.acos(),
        ("atan", [x]) => x.atan(),
        ("sinh", [x]) => x.sinh(),
        ("cosh", [x]) => x.cosh(),
        ("tanh", [x]) => x.tanh(),
        ("ln" | "log", [x]) => x.ln(),
        ("log", [b, x]) => x.ln() / b.ln(),
        ("exp", [x]) => x.exp(),
        ("sqrt", [x]) => x.sqrt(),
        ("abs", [x]) => x.abs(),
        ("floor", [x]) => x.floor(),
        ("ceiling", [x]) => x.ceil(),
        _ => return None,
    };
    (!r.is_nan()).then_some(r)
}

static BUILTIN: Lazy<Arc<Catalog>> = Lazy::new(|| {
    let mut catalog = Catalog::empty();
    for &(name, min, max) in BUILTIN_FUNCTIONS {
        catalog.insert_function(Function::builtin(name, min, max));
    }
    let pi = Value::Constant(Constant::Pi);
    let phi = Value::Constant(Constant::GoldenRatio);
    let tau = Value::mul(Value::int(2), pi.clone());
    for (name, value) in [
        ("e", Value::Constant(Constant::E)),
        ("i", Value::Constant(Constant::I)),
        ("pi", pi.clone()),
        ("π", pi),
        ("tau", tau.clone()),
        ("τ", tau),
        ("phi", phi.clone()),
        ("φ", phi),
        ("inf", Value::Constant(Constant::Infinity)),
    ] {
        catalog.insert_constant(name, value);
    }
    log::debug!(
        "builtin catalog: {} functions, {} constants",
        catalog.functions.len(),
        catalog.constants.len()
    );
    Arc::new(catalog)
});

/// Functions, constants and accepted multi-letter symbols, keyed by name.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    functions: IndexMap<String, Function>,
    constants: IndexMap<String, Value>,
    symbols: IndexSet<String>,
}

impl Catalog {
    pub fn empty() -> Self {
        Self::default()
    }

    /// The shared builtin catalog.
    pub fn builtin() -> Arc<Catalog> {
        Arc::clone(&BUILTIN)
    }

    pub fn function(&self, name: &str) -> Option<&Function> {
        self.functions.get(name)
    }

    pub fn constant(&self, name: &str) -> Option<&Value> {
        self.constants.get(name)
    }

    pub fn is_symbol(&self, name: &str) -> bool {
        self.symbols.contains(name)
    }

    /// Registers (or replaces) a function under its own name.
    pub fn insert_function(&mut self, function: Function) {
        self.functions.insert(function.name().into(), function);
    }

    pub fn insert_constant(&mut self, name: &str, value: Value) {
        self.constants.insert(name.into(), value);
    }

    /// Accepts `name` as one identifier instead of a product of letters.
    pub fn insert_symbol(&mut self, name: &str) {
        self.symbols.insert(name.into());
    }

    pub fn functions(&self) -> impl Iterator<Item = &Function> {
        self.functions.values()
    }

    pub fn constants(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.constants.iter().map(|(k, v)| (k.as_str(), v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_catalog_is_shared() {
        let a = Catalog::builtin();
        let b = Catalog::builtin();
        assert!(Arc::ptr_eq(&a, &b));
        assert!(a.function("sin").is_some());
        assert!(a.function("f").is_none());
        assert_eq!(a.constant("π"), Some(&Value::Constant(Constant::Pi)));
        assert_eq!(
            a.constant("tau"),
            Some(&Value::Mul(vec![Value::int(2), Value::Constant(Constant::Pi)]))
        );
    }

    #[test]
    fn registration_is_copy_on_write() {
        let shared = Catalog::builtin();
        let mut mine = Arc::clone(&shared);
        Arc::make_mut(&mut mine).insert_constant("c", Value::int(5));
        Arc::make_mut(&mut mine).insert_symbol("xy");
        assert_eq!(mine.constant("c"), Some(&Value::int(5)));
        assert!(mine.is_symbol("xy"));
        assert!(shared.constant("c").is_none());
        assert!(!shared.is_symbol("xy"));
    }

    #[test]
    fn builtins_evaluate_numerically() {
        assert_eq!(eval_builtin("sqrt", &[9.0]), Some(3.0));
        assert_eq!(eval_builtin("log", &[2.0, 8.0]).map(f64::round), Some(3.0));
        assert_eq!(eval_builtin("sqrt", &[-1.0]), None);
        assert_eq!(eval_builtin("nope", &[1.0]), None);
        assert!(is_greek_name("theta"));
        assert!(!is_greek_name("thetas"));
    }

    #[test]
    fn builtin_functions_apply_symbolically() {
        let catalog = Catalog::builtin();
        let sin = catalog.function("sin").unwrap();
        assert_eq!(
            sin.call(&[Value::symbol("x")]).unwrap(),
            Value::Apply("sin".into(), vec![Value::symbol("x")])
        );
        let log = catalog.function("log").unwrap();
        assert!(log.call(&[Value::int(2), Value::symbol("x")]).is_ok());
        assert!(log.call(&[]).is_err());
    }
}
