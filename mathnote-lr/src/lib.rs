//! # mathnote-lr
//!
//! Grammar-agnostic parsing machinery: SLR(1) table construction with
//! operator precedence, a shift-reduce driver that defers unresolved
//! conflicts to its caller, and a longest-match DFA scanner.
//!
//! Tables are built at initialization time from an explicit production list
//! instead of being generated ahead of time, and are immutable once built.
//!
//! ```rust
//! use mathnote_lr::{Action, Grammar, Prec, Production, Tables};
//!
//! // S' -> E ; E -> E + E ; E -> n
//! let grammar = Grammar::new(
//!     &["S'", "E", "+", "n", "$"],
//!     2,
//!     vec![
//!         Production::new(0, &[1]),
//!         Production::new(1, &[1, 2, 1]),
//!         Production::new(1, &[3]),
//!     ],
//!     vec![0],
//!     &[(2, Prec::left(1))],
//! )
//! .unwrap();
//! let tables = Tables::build(&grammar);
//! assert_eq!(tables.ambig_count(), 0);
//! assert!(matches!(tables.lookup(0, 3), Action::Shift(_)));
//! ```

pub mod grammar;
pub mod parser;
pub mod scanner;
pub mod slr;
pub mod span;

pub use grammar::{Assoc, Grammar, GrammarError, Prec, Production};
pub use parser::{Action, DriverError, Parser, ParserCtx, ParserStats, Tables, Token};
pub use scanner::{Match, ScanError, Scanner};
pub use span::{Cursor, Position, Span};
