//! Grammar description consumed by the table builder.
//!
//! Symbols are plain indices. Nonterminals occupy `0..n_nonterm`, terminals
//! follow, and the last terminal is the end-of-stream marker. A grammar may
//! have several *goal* productions of the form `G -> X`; each one gets its own
//! start state and accepts on end-of-stream.

use smartstring::alias::String;
use thiserror::Error;

/// Associativity attached to a precedence level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Assoc {
    Left,
    Right,
    NonAssoc,
}

/// A precedence level; higher levels bind tighter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Prec {
    pub level: u8,
    pub assoc: Assoc,
}

impl Prec {
    pub const fn left(level: u8) -> Self {
        Self { level, assoc: Assoc::Left }
    }

    pub const fn right(level: u8) -> Self {
        Self { level, assoc: Assoc::Right }
    }

    pub const fn nonassoc(level: u8) -> Self {
        Self { level, assoc: Assoc::NonAssoc }
    }
}

/// A single production `lhs -> rhs`, optionally carrying an explicit
/// precedence tag (yacc's `%prec`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Production {
    pub lhs: usize,
    pub rhs: Vec<usize>,
    pub prec: Option<Prec>,
}

impl Production {
    pub fn new(lhs: usize, rhs: &[usize]) -> Self {
        Self {
            lhs,
            rhs: rhs.to_vec(),
            prec: None,
        }
    }

    pub fn with_prec(mut self, prec: Prec) -> Self {
        self.prec = Some(prec);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GrammarError {
    #[error("symbol {symbol} in production {prod} is out of range ({n_sym} symbols)")]
    SymbolOutOfRange {
        prod: usize,
        symbol: usize,
        n_sym: usize,
    },
    #[error("production {prod} has terminal {symbol} on its left-hand side")]
    TerminalLhs { prod: usize, symbol: usize },
    #[error("goal production {prod} must have exactly one right-hand side symbol")]
    BadGoal { prod: usize },
    #[error("grammar has no goal productions")]
    NoGoals,
    #[error("grammar has {labels} labels for {n_sym} symbols")]
    LabelCount { labels: usize, n_sym: usize },
}

/// A validated context-free grammar with operator precedence.
#[derive(Debug, Clone)]
pub struct Grammar {
    n_nonterm: usize,
    n_term: usize,
    prods: Vec<Production>,
    goals: Vec<usize>,
    token_prec: Vec<Option<Prec>>,
    labels: Vec<String>,
}

impl Grammar {
    /// Validates and assembles a grammar.
    ///
    /// `labels` names every symbol (nonterminals first). `goals` lists the
    /// indices of the goal productions; `token_prec` pairs terminals with
    /// their precedence.
    pub fn new(
        labels: &[&str],
        n_nonterm: usize,
        prods: Vec<Production>,
        goals: Vec<usize>,
        token_prec: &[(usize, Prec)],
    ) -> Result<Self, GrammarError> {
        let n_sym = labels.len();
        if n_nonterm > n_sym {
            return Err(GrammarError::LabelCount {
                labels: labels.len(),
                n_sym: n_nonterm,
            });
        }
        for (i, p) in prods.iter().enumerate() {
            if p.lhs >= n_nonterm {
                return Err(GrammarError::TerminalLhs {
                    prod: i,
                    symbol: p.lhs,
                });
            }
            if let Some(&symbol) = p.rhs.iter().find(|&&s| s >= n_sym) {
                return Err(GrammarError::SymbolOutOfRange {
                    prod: i,
                    symbol,
                    n_sym,
                });
            }
        }
        if goals.is_empty() {
            return Err(GrammarError::NoGoals);
        }
        for &g in &goals {
            if prods.get(g).is_none_or(|p| p.rhs.len() != 1) {
                return Err(GrammarError::BadGoal { prod: g });
            }
        }
        let mut prec = vec![None; n_sym];
        for &(sym, p) in token_prec {
            if sym < n_nonterm || sym >= n_sym {
                return Err(GrammarError::SymbolOutOfRange {
                    prod: usize::MAX,
                    symbol: sym,
                    n_sym,
                });
            }
            prec[sym] = Some(p);
        }
        Ok(Self {
            n_nonterm,
            n_term: n_sym - n_nonterm,
            prods,
            goals,
            token_prec: prec,
            labels: labels.iter().map(|&l| String::from(l)).collect(),
        })
    }

    pub fn n_nonterm(&self) -> usize {
        self.n_nonterm
    }

    pub fn n_term(&self) -> usize {
        self.n_term
    }

    /// Index of the end-of-stream terminal.
    pub fn eos(&self) -> usize {
        self.n_nonterm + self.n_term - 1
    }

    pub fn prods(&self) -> &[Production] {
        &self.prods
    }

    pub fn goals(&self) -> &[usize] {
        &self.goals
    }

    pub fn label(&self, sym: usize) -> &str {
        self.labels.get(sym).map(|s| s.as_str()).unwrap_or("?")
    }

    pub fn token_prec(&self, sym: usize) -> Option<Prec> {
        self.token_prec.get(sym).copied().flatten()
    }

    /// Precedence of a production: its explicit tag, otherwise the precedence
    /// of its rightmost terminal.
    pub fn prod_prec(&self, prod: usize) -> Option<Prec> {
        let p = &self.prods[prod];
        p.prec.or_else(|| {
            p.rhs
                .iter()
                .rev()
                .find(|&&s| s >= self.n_nonterm)
                .and_then(|&s| self.token_prec(s))
        })
    }

    /// Productions encoded as `[lhs, rhs...]` symbol vectors.
    pub fn encoded(&self) -> Vec<Vec<usize>> {
        self.prods
            .iter()
            .map(|p| std::iter::once(p.lhs).chain(p.rhs.iter().copied()).collect())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // S' -> E ; E -> E + E | n ; terminals: + n $
    fn tiny() -> Result<Grammar, GrammarError> {
        Grammar::new(
            &["S'", "E", "+", "n", "$"],
            2,
            vec![
                Production::new(0, &[1]),
                Production::new(1, &[1, 2, 1]),
                Production::new(1, &[3]),
            ],
            vec![0],
            &[(2, Prec::left(1))],
        )
    }

    #[test]
    fn builds_and_reports_shape() {
        let g = tiny().unwrap();
        assert_eq!(g.n_nonterm(), 2);
        assert_eq!(g.n_term(), 3);
        assert_eq!(g.eos(), 4);
        assert_eq!(g.label(2), "+");
        assert_eq!(g.encoded()[1], vec![1, 1, 2, 1]);
    }

    #[test]
    fn production_precedence_falls_back_to_rightmost_terminal() {
        let g = tiny().unwrap();
        assert_eq!(g.prod_prec(1), Some(Prec::left(1)));
        assert_eq!(g.prod_prec(2), None);
    }

    #[test]
    fn rejects_terminal_lhs() {
        let err = Grammar::new(
            &["S'", "n", "$"],
            1,
            vec![Production::new(1, &[1])],
            vec![0],
            &[],
        )
        .unwrap_err();
        assert_eq!(err, GrammarError::TerminalLhs { prod: 0, symbol: 1 });
    }

    #[test]
    fn rejects_bad_goal() {
        let err = Grammar::new(
            &["S'", "n", "$"],
            1,
            vec![Production::new(0, &[1, 1])],
            vec![0],
            &[],
        )
        .unwrap_err();
        assert_eq!(err, GrammarError::BadGoal { prod: 0 });
    }
}
