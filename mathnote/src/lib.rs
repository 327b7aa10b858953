//! # mathnote
//!
//! Parses free-form math notation (equations, inequalities, intervals,
//! limits, sums, products and function definitions) into an [`Ast`] and
//! lowers it to a symbolic [`Value`].
//!
//! The notation is forgiving in the ways hand-typed math is: `2x` and
//! `(x+1)(x-1)` multiply implicitly, `xyz` is `x*y*z`, `|x|` is an absolute
//! value while `R|[0, 1]` restricts a domain, and `log_2(8)` passes its
//! subscript as the first argument.
//!
//! ## Pipeline
//!
//! - [`lexer`] turns text into [`MathToken`]s with line/column positions.
//! - [`grammar`] holds the production table; the SLR(1) tables are built
//!   once by `mathnote-lr` and shared.
//! - [`parser`] runs the shift-reduce driver and builds [`Ast`] nodes,
//!   resolving identifiers against a [`Catalog`] and checking [`Limits`].
//! - [`ast`] evaluates trees into [`Value`]s.
//! - [`notation`] wraps it all: [`Notation`], [`Problem`], [`with_timeout`].
//!
//! ## Example
//!
//! ```rust
//! use mathnote::{Ast, Notation, Relation};
//!
//! let parsed = Notation::new().parse("x^2 - 2x - 1 = 0").unwrap();
//! assert!(matches!(parsed.root, Ast::Conditional { op: Relation::Eq, .. }));
//! assert_eq!(parsed.free_symbols(), ["x"]);
//! assert_eq!(parsed.evaluate().unwrap().to_string(), "x^2 - 2*x - 1 = 0");
//! ```
pub mod ast;
pub mod catalog;
pub mod error;
pub mod grammar;
pub mod lexer;
pub mod notation;
pub mod number;
pub mod parser;
pub mod state;
pub mod token;
pub mod value;

pub use ast::{Ast, BinaryOp};
pub use catalog::Catalog;
pub use error::MathError;
pub use grammar::{ProdID, TokenID};
pub use lexer::{Tokens, tokenize};
pub use notation::{Notation, Parsed, Prepared, Problem, with_timeout};
pub use number::Number;
pub use parser::{MathParser, parse, parse_str};
pub use state::{Limits, ParserState};
pub use token::{MathToken, TokenValue};
pub use value::{Constant, Function, Interval, NumberSet, Relation, Value};
