//! # Notation grammar
//!
//! Symbol and production identifiers plus the static production table the
//! parse tables are built from. Tables are built on first use and shared by
//! every parse.
//!
//! Precedence, loosest to tightest:
//!
//! | level | tokens / productions                              | assoc    |
//! |-------|---------------------------------------------------|----------|
//! | 1     | `=` `!=` `<` `>`                                  | nonassoc |
//! | 2     | `+` `-`                                           | left     |
//! | 3     | `*` `/` `%`                                       | left     |
//! | 4     | unary sign                                        | right    |
//! | 5     | identifiers, limits, sums, products               | right    |
//! | 6     | implicit multiplication and the tokens that start it | left  |
//! | 7     | `@`                                               | right    |
//! | 8     | `^`                                               | right    |
//! | 9     | `!`                                               | left     |

use crate::MathError;
use mathnote_lr::{Grammar, GrammarError, Prec, Production, Tables};
use once_cell::sync::Lazy;
use std::fmt;

/// Grammar symbols: nonterminals first, then terminals, `End` last.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenID {
    Start,
    DefStart,
    Equation,
    Definition,
    Interval,
    Args,
    Expr,
    Unary,
    Group,
    Bound,
    Number,
    Ident,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,
    Fac,
    Subscript,
    Eq,
    Ne,
    Lt,
    Gt,
    Comma,
    Pipe,
    LParen,
    RParen,
    LBrack,
    RBrack,
    LBrace,
    RBrace,
    Limit,
    Sum,
    Prod,
    Arrow,
    At,
    End,
}

impl TokenID {
    pub const N_NONTERM: usize = 10;

    pub const ALL: [TokenID; 38] = [
        TokenID::Start,
        TokenID::DefStart,
        TokenID::Equation,
        TokenID::Definition,
        TokenID::Interval,
        TokenID::Args,
        TokenID::Expr,
        TokenID::Unary,
        TokenID::Group,
        TokenID::Bound,
        TokenID::Number,
        TokenID::Ident,
        TokenID::Add,
        TokenID::Sub,
        TokenID::Mul,
        TokenID::Div,
        TokenID::Mod,
        TokenID::Pow,
        TokenID::Fac,
        TokenID::Subscript,
        TokenID::Eq,
        TokenID::Ne,
        TokenID::Lt,
        TokenID::Gt,
        TokenID::Comma,
        TokenID::Pipe,
        TokenID::LParen,
        TokenID::RParen,
        TokenID::LBrack,
        TokenID::RBrack,
        TokenID::LBrace,
        TokenID::RBrace,
        TokenID::Limit,
        TokenID::Sum,
        TokenID::Prod,
        TokenID::Arrow,
        TokenID::At,
        TokenID::End,
    ];

    pub fn is_terminal(self) -> bool {
        self as usize >= Self::N_NONTERM
    }

    pub fn label(self) -> &'static str {
        match self {
            TokenID::Start => "Start",
            TokenID::DefStart => "DefStart",
            TokenID::Equation => "Equation",
            TokenID::Definition => "Definition",
            TokenID::Interval => "Interval",
            TokenID::Args => "Args",
            TokenID::Expr => "Expr",
            TokenID::Unary => "Unary",
            TokenID::Group => "Group",
            TokenID::Bound => "Bound",
            TokenID::Number => "NUMBER",
            TokenID::Ident => "IDENT",
            TokenID::Add => "ADD",
            TokenID::Sub => "SUB",
            TokenID::Mul => "MUL",
            TokenID::Div => "DIV",
            TokenID::Mod => "MOD",
            TokenID::Pow => "POW",
            TokenID::Fac => "FAC",
            TokenID::Subscript => "SUBSCRIPT",
            TokenID::Eq => "EQ",
            TokenID::Ne => "NE",
            TokenID::Lt => "LT",
            TokenID::Gt => "GT",
            TokenID::Comma => "COMMA",
            TokenID::Pipe => "PIPE",
            TokenID::LParen => "LPAREN",
            TokenID::RParen => "RPAREN",
            TokenID::LBrack => "LBRACK",
            TokenID::RBrack => "RBRACK",
            TokenID::LBrace => "LBRACE",
            TokenID::RBrace => "RBRACE",
            TokenID::Limit => "LIMIT",
            TokenID::Sum => "SUM",
            TokenID::Prod => "PROD",
            TokenID::Arrow => "ARROW",
            TokenID::At => "AT",
            TokenID::End => "END",
        }
    }
}

impl From<TokenID> for usize {
    fn from(id: TokenID) -> usize {
        id as usize
    }
}

impl fmt::Display for TokenID {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Productions, numbered per left-hand side in table order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProdID {
    Start,
    DefStart,
    Equation1,
    Equation2,
    Equation3,
    Equation4,
    Equation5,
    Equation6,
    Equation7,
    Equation8,
    Equation9,
    Definition1,
    Definition2,
    Interval1,
    Interval2,
    Interval3,
    Interval4,
    Args1,
    Args2,
    Expr1,
    Expr2,
    Expr3,
    Expr4,
    Expr5,
    Expr6,
    Expr7,
    Unary1,
    Unary2,
    Unary3,
    Unary4,
    Group1,
    Group2,
    Group3,
    Group4,
    Group5,
    Group6,
    Group7,
    Group8,
    Group9,
    Group10,
    Group11,
    Group12,
    Group13,
    Group14,
    Group15,
    Group16,
    Group17,
    Group18,
    Group19,
    Bound1,
    Bound2,
    Bound3,
    Bound4,
}

impl ProdID {
    /// Maps a production index from the tables back to its id.
    pub fn from_index(index: usize) -> Option<ProdID> {
        PRODUCTIONS.get(index).map(|p| p.0)
    }
}

pub const REL: u8 = 1;
pub const ADDITIVE: u8 = 2;
pub const MULTIPLICATIVE: u8 = 3;
pub const UNARY: u8 = 4;
pub const CALL: u8 = 5;
pub const IMPLICIT: u8 = 6;
pub const COMPOSE: u8 = 7;
pub const POWER: u8 = 8;
pub const FACTORIAL: u8 = 9;

const TOKEN_PREC: &[(TokenID, Prec)] = &[
    (TokenID::Eq, Prec::nonassoc(REL)),
    (TokenID::Ne, Prec::nonassoc(REL)),
    (TokenID::Lt, Prec::nonassoc(REL)),
    (TokenID::Gt, Prec::nonassoc(REL)),
    (TokenID::Add, Prec::left(ADDITIVE)),
    (TokenID::Sub, Prec::left(ADDITIVE)),
    (TokenID::Mul, Prec::left(MULTIPLICATIVE)),
    (TokenID::Div, Prec::left(MULTIPLICATIVE)),
    (TokenID::Mod, Prec::left(MULTIPLICATIVE)),
    (TokenID::Number, Prec::left(IMPLICIT)),
    (TokenID::Ident, Prec::left(IMPLICIT)),
    (TokenID::LParen, Prec::left(IMPLICIT)),
    (TokenID::LBrack, Prec::left(IMPLICIT)),
    (TokenID::LBrace, Prec::left(IMPLICIT)),
    (TokenID::Limit, Prec::left(IMPLICIT)),
    (TokenID::Sum, Prec::left(IMPLICIT)),
    (TokenID::Prod, Prec::left(IMPLICIT)),
    (TokenID::At, Prec::right(COMPOSE)),
    (TokenID::Pow, Prec::right(POWER)),
    (TokenID::Fac, Prec::left(FACTORIAL)),
];

const P_UNARY: Option<Prec> = Some(Prec::right(UNARY));
const P_CALL: Option<Prec> = Some(Prec::right(CALL));
const P_IMPLICIT: Option<Prec> = Some(Prec::left(IMPLICIT));

use TokenID as T;

type ProdRow = (ProdID, TokenID, &'static [TokenID], Option<Prec>);

/// The production table. Row `i` is production `i` of the tables; the two
/// goal productions come first.
pub const PRODUCTIONS: &[ProdRow] = &[
    (ProdID::Start, T::Start, &[T::Equation], None),
    (ProdID::DefStart, T::DefStart, &[T::Definition], None),
    (ProdID::Equation1, T::Equation, &[T::Expr], None),
    (ProdID::Equation2, T::Equation, &[T::Expr, T::Eq, T::Expr], None),
    (ProdID::Equation3, T::Equation, &[T::Expr, T::Ne, T::Expr], None),
    (ProdID::Equation4, T::Equation, &[T::Expr, T::Lt, T::Expr], None),
    (ProdID::Equation5, T::Equation, &[T::Expr, T::Gt, T::Expr], None),
    (ProdID::Equation6, T::Equation, &[T::Expr, T::Lt, T::Eq, T::Expr], None),
    (ProdID::Equation7, T::Equation, &[T::Expr, T::Gt, T::Eq, T::Expr], None),
    (ProdID::Equation8, T::Equation, &[T::Interval], None),
    (ProdID::Equation9, T::Equation, &[T::Ident, T::Pipe, T::Interval], None),
    (
        ProdID::Definition1,
        T::Definition,
        &[T::Ident, T::LParen, T::Args, T::RParen, T::Eq, T::Expr],
        None,
    ),
    (
        ProdID::Definition2,
        T::Definition,
        &[T::Ident, T::LParen, T::RParen, T::Eq, T::Expr],
        None,
    ),
    (
        ProdID::Interval1,
        T::Interval,
        &[T::LBrack, T::Expr, T::Comma, T::Expr, T::RBrack],
        None,
    ),
    (
        ProdID::Interval2,
        T::Interval,
        &[T::LBrack, T::Expr, T::Comma, T::Expr, T::RParen],
        None,
    ),
    (
        ProdID::Interval3,
        T::Interval,
        &[T::LParen, T::Expr, T::Comma, T::Expr, T::RBrack],
        None,
    ),
    (
        ProdID::Interval4,
        T::Interval,
        &[T::LParen, T::Expr, T::Comma, T::Expr, T::RParen],
        None,
    ),
    (ProdID::Args1, T::Args, &[T::Expr], None),
    (ProdID::Args2, T::Args, &[T::Args, T::Comma, T::Expr], None),
    (ProdID::Expr1, T::Expr, &[T::Group], None),
    (ProdID::Expr2, T::Expr, &[T::Unary], None),
    (ProdID::Expr3, T::Expr, &[T::Expr, T::Add, T::Expr], None),
    (ProdID::Expr4, T::Expr, &[T::Expr, T::Sub, T::Expr], None),
    (ProdID::Expr5, T::Expr, &[T::Expr, T::Mul, T::Expr], None),
    (ProdID::Expr6, T::Expr, &[T::Expr, T::Div, T::Expr], None),
    (ProdID::Expr7, T::Expr, &[T::Expr, T::Mod, T::Expr], None),
    (ProdID::Unary1, T::Unary, &[T::Add, T::Group], P_UNARY),
    (ProdID::Unary2, T::Unary, &[T::Sub, T::Group], P_UNARY),
    (ProdID::Unary3, T::Unary, &[T::Add, T::Unary], P_UNARY),
    (ProdID::Unary4, T::Unary, &[T::Sub, T::Unary], P_UNARY),
    (ProdID::Group1, T::Group, &[T::Group, T::Group], P_IMPLICIT),
    (ProdID::Group2, T::Group, &[T::Group, T::Pow, T::Group], None),
    (ProdID::Group3, T::Group, &[T::Group, T::Fac], None),
    (ProdID::Group4, T::Group, &[T::Number], None),
    (ProdID::Group5, T::Group, &[T::LParen, T::Expr, T::RParen], None),
    (ProdID::Group6, T::Group, &[T::LBrack, T::Expr, T::RBrack], None),
    (ProdID::Group7, T::Group, &[T::LBrace, T::Expr, T::RBrace], None),
    (ProdID::Group8, T::Group, &[T::Pipe, T::Expr, T::Pipe], None),
    (ProdID::Group9, T::Group, &[T::Ident], P_CALL),
    (ProdID::Group10, T::Group, &[T::Ident, T::Subscript, T::Number], P_CALL),
    (ProdID::Group11, T::Group, &[T::Ident, T::Subscript, T::Ident], P_CALL),
    (
        ProdID::Group12,
        T::Group,
        &[T::Ident, T::LParen, T::Args, T::RParen],
        None,
    ),
    (ProdID::Group13, T::Group, &[T::Ident, T::LParen, T::RParen], None),
    (
        ProdID::Group14,
        T::Group,
        &[T::Ident, T::Subscript, T::Number, T::LParen, T::Args, T::RParen],
        None,
    ),
    (
        ProdID::Group15,
        T::Group,
        &[T::Ident, T::Subscript, T::Ident, T::LParen, T::Args, T::RParen],
        None,
    ),
    (ProdID::Group16, T::Group, &[T::Ident, T::At, T::Group], None),
    (
        ProdID::Group17,
        T::Group,
        &[
            T::Limit,
            T::Subscript,
            T::LParen,
            T::Ident,
            T::Arrow,
            T::Expr,
            T::RParen,
            T::Group,
        ],
        P_CALL,
    ),
    (
        ProdID::Group18,
        T::Group,
        &[
            T::Sum,
            T::Subscript,
            T::LParen,
            T::Ident,
            T::Eq,
            T::Expr,
            T::RParen,
            T::Pow,
            T::Bound,
            T::Group,
        ],
        P_CALL,
    ),
    (
        ProdID::Group19,
        T::Group,
        &[
            T::Prod,
            T::Subscript,
            T::LParen,
            T::Ident,
            T::Eq,
            T::Expr,
            T::RParen,
            T::Pow,
            T::Bound,
            T::Group,
        ],
        P_CALL,
    ),
    (ProdID::Bound1, T::Bound, &[T::Number], None),
    (ProdID::Bound2, T::Bound, &[T::Ident], None),
    (ProdID::Bound3, T::Bound, &[T::LParen, T::Expr, T::RParen], None),
    (ProdID::Bound4, T::Bound, &[T::LBrace, T::Expr, T::RBrace], None),
];

/// Goal index of `Start -> Equation`.
pub const GOAL_EQUATION: usize = 0;
/// Goal index of `DefStart -> Definition`.
pub const GOAL_DEFINITION: usize = 1;

pub fn grammar() -> Result<Grammar, GrammarError> {
    let labels: Vec<&str> = TokenID::ALL.iter().map(|t| t.label()).collect();
    let prods = PRODUCTIONS
        .iter()
        .map(|&(_, lhs, rhs, prec)| {
            let rhs: Vec<usize> = rhs.iter().map(|&s| s.into()).collect();
            let prod = Production::new(lhs.into(), &rhs);
            match prec {
                Some(prec) => prod.with_prec(prec),
                None => prod,
            }
        })
        .collect();
    let token_prec: Vec<(usize, Prec)> = TOKEN_PREC.iter().map(|&(t, p)| (t.into(), p)).collect();
    Grammar::new(
        &labels,
        TokenID::N_NONTERM,
        prods,
        vec![ProdID::Start as usize, ProdID::DefStart as usize],
        &token_prec,
    )
}

static TABLES: Lazy<Result<Tables, GrammarError>> = Lazy::new(|| {
    let tables = grammar().map(|g| Tables::build(&g));
    if let Ok(t) = &tables {
        log::debug!(
            "notation tables: {} states, {} runtime ambiguities",
            t.state_count(),
            t.ambig_count()
        );
    }
    tables
});

/// The shared parse tables.
pub fn tables() -> Result<&'static Tables, MathError> {
    TABLES.as_ref().map_err(|e| MathError::Grammar(e.clone()))
}
