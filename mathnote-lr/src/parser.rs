//! Table-driven shift-reduce parsing.
//!
//! [`Tables`] are built once from a [`Grammar`] and are immutable afterwards,
//! so a single instance can back any number of concurrent parses. The
//! [`Parser`] trait supplies the driver loop; implementors provide tokens,
//! semantic actions for reductions, and a policy for the shift/reduce
//! ambiguities precedence could not settle.

use crate::grammar::{Grammar, Prec};
use crate::slr::{self, ConflictStats, Resolved};
use smartstring::alias::String;
use std::fmt::{Debug, Write};
use thiserror::Error;

/// A parser action as stored in [`Tables`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    Error,
    Accept,
    Shift(usize),
    Reduce(usize),
    Ambig(usize),
    Goto(usize),
}

/// Internal faults of the driver. These indicate a mismatch between the
/// tables and the semantic actions rather than bad input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DriverError {
    #[error("parser stack underflow")]
    StackUnderflow,
    #[error("no goto from state {state} on symbol {symbol}")]
    MissingGoto { state: usize, symbol: usize },
    #[error("reduction left {tokens} tokens for {states} states")]
    StackMismatch { tokens: usize, states: usize },
    #[error("unknown goal {0}")]
    UnknownGoal(usize),
    #[error("accepted with {0} tokens on the stack")]
    BadAccept(usize),
    #[error("unknown production {0}")]
    UnknownProduction(usize),
    #[error("symbol {symbol} on the parser stack carries no semantic value")]
    MissingValue { symbol: usize },
}

/// Symbols carried on the parser stack.
pub trait Token: Debug {
    type TokenID: Copy + Debug + Eq + Into<usize>;

    fn token_id(&self) -> Self::TokenID;
}

/// SLR(1) action/goto tables with precedence already applied.
#[derive(Debug, Clone)]
pub struct Tables {
    n_sym: usize,
    actions: Vec<Action>,
    ambigs: Vec<[Action; 2]>,
    lhs: Vec<usize>,
    rhs_len: Vec<usize>,
    prod_prec: Vec<Option<Prec>>,
    goals: Vec<usize>,
    conflicts: ConflictStats,
}

impl Tables {
    /// Builds the canonical LR(0) collection and resolves every cell.
    pub fn build(grammar: &Grammar) -> Self {
        let prods = grammar.encoded();
        let n_nonterm = grammar.n_nonterm();
        let n_term = grammar.n_term();
        let n_sym = n_nonterm + n_term;

        let c = slr::construct_set(&prods, grammar.goals(), n_nonterm, n_term);
        let (first, nullable) = slr::first_sets(&prods, n_nonterm, n_term);
        let start_syms: Vec<usize> = grammar.goals().iter().map(|&g| prods[g][0]).collect();
        let follow = slr::follow_sets(&prods, n_nonterm, n_term, &start_syms, &first, &nullable);
        let tab = slr::construct_slr(&c, &follow, &prods, grammar.goals(), n_nonterm, n_term);

        let mut conflicts = ConflictStats::default();
        let mut actions = Vec::with_capacity(tab.len() * n_sym);
        let mut ambigs = Vec::new();
        for (state, row) in tab.iter().enumerate() {
            for (sym, cell) in row.iter().enumerate() {
                let action = match slr::resolve_cell(grammar, state, sym, cell, &mut conflicts) {
                    Resolved::Empty | Resolved::Error => Action::Error,
                    Resolved::Accept => Action::Accept,
                    Resolved::Shift(s) => Action::Shift(s),
                    Resolved::Reduce(p) => Action::Reduce(p),
                    Resolved::Goto(s) => Action::Goto(s),
                    Resolved::Ambig { shift, reduce } => {
                        ambigs.push([Action::Shift(shift), Action::Reduce(reduce)]);
                        Action::Ambig(ambigs.len() - 1)
                    }
                };
                actions.push(action);
            }
        }
        log::debug!(
            "built tables: {} states, {} productions, {} resolved by precedence, {} ambiguities",
            tab.len(),
            prods.len(),
            conflicts.by_precedence,
            ambigs.len()
        );

        Self {
            n_sym,
            actions,
            ambigs,
            lhs: grammar.prods().iter().map(|p| p.lhs).collect(),
            rhs_len: grammar.prods().iter().map(|p| p.rhs.len()).collect(),
            prod_prec: (0..prods.len()).map(|p| grammar.prod_prec(p)).collect(),
            goals: grammar.goals().to_vec(),
            conflicts,
        }
    }

    /// Start state for the `goal`-th goal production.
    pub fn start_state(&self, goal: usize) -> Option<usize> {
        (goal < self.goals.len()).then_some(goal)
    }

    #[inline]
    pub fn lookup(&self, state: usize, sym: usize) -> Action {
        self.actions
            .get(state * self.n_sym + sym)
            .copied()
            .unwrap_or(Action::Error)
    }

    /// The `[shift, reduce]` pair behind an [`Action::Ambig`].
    #[inline]
    pub fn lookup_ambig(&self, ambig: usize) -> [Action; 2] {
        self.ambigs
            .get(ambig)
            .copied()
            .unwrap_or([Action::Error, Action::Error])
    }

    pub fn lhs(&self, prod: usize) -> usize {
        self.lhs[prod]
    }

    pub fn rhs_len(&self, prod: usize) -> usize {
        self.rhs_len[prod]
    }

    pub fn prod_prec(&self, prod: usize) -> Option<Prec> {
        self.prod_prec[prod]
    }

    pub fn state_count(&self) -> usize {
        self.actions.len() / self.n_sym
    }

    pub fn ambig_count(&self) -> usize {
        self.ambigs.len()
    }

    pub fn conflicts(&self) -> &ConflictStats {
        &self.conflicts
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParserStats {
    pub tokens: usize,
    pub shifts: usize,
    pub reductions: usize,
    pub ambigs: usize,
}

/// Parser stacks. `states` always holds one more entry than `tokens`.
#[derive(Debug)]
pub struct ParserCtx<T> {
    pub tokens: Vec<T>,
    pub states: Vec<usize>,
    pub stats: ParserStats,
}

impl<T> Default for ParserCtx<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> ParserCtx<T> {
    pub fn new() -> Self {
        Self {
            tokens: Vec::new(),
            states: Vec::new(),
            stats: ParserStats::default(),
        }
    }

    /// Returns a reference to the token counted from the end:
    /// 0 = last, 1 = second last, etc.
    pub fn tokens_peek(&self, index: usize) -> Option<&T> {
        let n = self.tokens.len();
        index.checked_add(1).and_then(|i| n.checked_sub(i)).map(|i| &self.tokens[i])
    }

    pub fn tokens_pop(&mut self) -> Result<T, DriverError> {
        self.tokens.pop().ok_or(DriverError::StackUnderflow)
    }

    pub fn tokens_push(&mut self, token: T) {
        self.tokens.push(token);
    }
}

impl<T: Debug> ParserCtx<T> {
    pub fn dump_state(&self, incoming: &T) {
        if self.states.is_empty() {
            log::trace!("<>");
            return;
        }
        let mut output = String::new();
        for (i, (token, state)) in self
            .tokens
            .iter()
            .chain(std::iter::once(incoming))
            .zip(self.states.iter())
            .enumerate()
        {
            let _ = write!(
                output,
                "<{:?}>  {}{:?}  ",
                state,
                if i == self.states.len() - 1 { "<-  " } else { "" },
                token,
            );
        }
        log::trace!("{}", output);
    }
}

/// A shift-reduce parser over shared [`Tables`].
///
/// `reduce` must pop exactly `rhs_len(prod)` tokens and push one token for
/// the production's left-hand side; the driver adjusts the state stack.
pub trait Parser {
    type Token: Token;
    type Error: From<DriverError>;

    fn tables(&self) -> &Tables;
    fn ctx(&self) -> &ParserCtx<Self::Token>;
    fn ctx_mut(&mut self) -> &mut ParserCtx<Self::Token>;

    /// Yields the next token; must keep yielding the end-of-stream token once
    /// the input is exhausted.
    fn next_token(&mut self) -> Result<Self::Token, Self::Error>;

    /// Picks one of the two actions behind an ambiguity.
    fn resolve_ambiguity(
        &mut self,
        ambig: usize,
        token: &Self::Token,
    ) -> Result<Action, Self::Error>;

    fn reduce(&mut self, prod: usize, token: &Self::Token) -> Result<(), Self::Error>;

    /// Builds the error reported when no action applies to `token`.
    fn unexpected(&mut self, token: Self::Token) -> Self::Error;

    fn stats(&self) -> ParserStats {
        self.ctx().stats.clone()
    }

    /// Parses one sentence of the `goal`-th goal symbol and returns the
    /// single token left on the stack.
    fn run(&mut self, goal: usize) -> Result<Self::Token, Self::Error> {
        let start = self
            .tables()
            .start_state(goal)
            .ok_or(DriverError::UnknownGoal(goal))?;
        self.ctx_mut().tokens.clear();
        self.ctx_mut().states.clear();
        self.ctx_mut().states.push(start);

        let mut state = start;
        let mut token = self.next_token()?;
        self.ctx_mut().stats.tokens += 1;
        if log::log_enabled!(log::Level::Trace) {
            self.ctx().dump_state(&token);
        }
        loop {
            let action = match self.tables().lookup(state, token.token_id().into()) {
                Action::Ambig(ambig) => {
                    log::trace!("Ambig {:?}", ambig);
                    self.ctx_mut().stats.ambigs += 1;
                    self.resolve_ambiguity(ambig, &token)?
                }
                action => action,
            };
            match action {
                Action::Shift(new_state) => {
                    log::trace!("Shift {:?}", new_state);
                    self.ctx_mut().tokens.push(token);
                    state = new_state;
                    self.ctx_mut().states.push(state);
                    self.ctx_mut().stats.shifts += 1;
                    token = self.next_token()?;
                    self.ctx_mut().stats.tokens += 1;
                }

                Action::Reduce(prod) => {
                    log::trace!("Reduce {:?}", prod);
                    self.reduce(prod, &token)?;
                    let rhs_len = self.tables().rhs_len(prod);
                    let lhs = self.tables().lhs(prod);
                    let ctx = self.ctx_mut();
                    let keep = ctx
                        .states
                        .len()
                        .checked_sub(rhs_len)
                        .filter(|&k| k > 0)
                        .ok_or(DriverError::StackUnderflow)?;
                    ctx.states.truncate(keep);
                    if ctx.tokens.len() != ctx.states.len() {
                        return Err(DriverError::StackMismatch {
                            tokens: ctx.tokens.len(),
                            states: ctx.states.len(),
                        }
                        .into());
                    }
                    let top = ctx.states[keep - 1];
                    let Action::Goto(new_state) = self.tables().lookup(top, lhs) else {
                        return Err(DriverError::MissingGoto {
                            state: top,
                            symbol: lhs,
                        }
                        .into());
                    };
                    state = new_state;
                    let ctx = self.ctx_mut();
                    ctx.states.push(state);
                    ctx.stats.reductions += 1;
                }

                Action::Accept => {
                    log::trace!("Accept");
                    let n = self.ctx().tokens.len();
                    if n != 1 {
                        return Err(DriverError::BadAccept(n).into());
                    }
                    return Ok(self.ctx_mut().tokens_pop()?);
                }

                Action::Error | Action::Ambig(_) | Action::Goto(_) => {
                    return Err(self.unexpected(token));
                }
            }

            if log::log_enabled!(log::Level::Trace) {
                self.ctx().dump_state(&token);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::Production;
    use std::vec::IntoIter;

    fn init_logger() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    // 0 S' -> E ; 1 E -> E + E ; 2 E -> E * E ; 3 E -> n ; 4 E -> E ^ E
    // symbols: S'=0 E=1 +=2 *=3 n=4 ^=5 $=6
    const E: usize = 1;
    const PLUS: usize = 2;
    const STAR: usize = 3;
    const NUM: usize = 4;
    const CARET: usize = 5;
    const END: usize = 6;

    fn tables(with_caret_prec: bool) -> Tables {
        let mut prec = vec![(PLUS, Prec::left(1)), (STAR, Prec::left(2))];
        if with_caret_prec {
            prec.push((CARET, Prec::right(3)));
        }
        let g = Grammar::new(
            &["S'", "E", "+", "*", "n", "^", "$"],
            2,
            vec![
                Production::new(0, &[E]),
                Production::new(E, &[E, PLUS, E]),
                Production::new(E, &[E, STAR, E]),
                Production::new(E, &[NUM]),
                Production::new(E, &[E, CARET, E]),
            ],
            vec![0],
            &prec,
        )
        .unwrap();
        Tables::build(&g)
    }

    #[derive(Debug, Clone, PartialEq)]
    struct XToken {
        id: usize,
        value: i64,
    }

    impl Token for XToken {
        type TokenID = usize;

        fn token_id(&self) -> usize {
            self.id
        }
    }

    #[derive(Debug, PartialEq, Eq, Error)]
    enum XError {
        #[error(transparent)]
        Driver(#[from] DriverError),
        #[error("unexpected token {0}")]
        Unexpected(usize),
    }

    struct XParser<'a> {
        tables: &'a Tables,
        input: IntoIter<XToken>,
        ctx: ParserCtx<XToken>,
        shift_on_ambig: bool,
    }

    impl<'a> XParser<'a> {
        fn new(tables: &'a Tables, src: &str) -> Self {
            let input: Vec<XToken> = src
                .chars()
                .filter(|c| !c.is_whitespace())
                .map(|c| match c {
                    '+' => XToken { id: PLUS, value: 0 },
                    '*' => XToken { id: STAR, value: 0 },
                    '^' => XToken { id: CARET, value: 0 },
                    d => XToken {
                        id: NUM,
                        value: d.to_digit(10).map(i64::from).unwrap_or(0),
                    },
                })
                .collect();
            Self {
                tables,
                input: input.into_iter(),
                ctx: ParserCtx::new(),
                shift_on_ambig: true,
            }
        }
    }

    impl Parser for XParser<'_> {
        type Token = XToken;
        type Error = XError;

        fn tables(&self) -> &Tables {
            self.tables
        }
        fn ctx(&self) -> &ParserCtx<XToken> {
            &self.ctx
        }
        fn ctx_mut(&mut self) -> &mut ParserCtx<XToken> {
            &mut self.ctx
        }

        fn next_token(&mut self) -> Result<XToken, XError> {
            Ok(self.input.next().unwrap_or(XToken { id: END, value: 0 }))
        }

        fn resolve_ambiguity(&mut self, ambig: usize, _token: &XToken) -> Result<Action, XError> {
            let [shift, reduce] = self.tables.lookup_ambig(ambig);
            Ok(if self.shift_on_ambig { shift } else { reduce })
        }

        fn reduce(&mut self, prod: usize, _token: &XToken) -> Result<(), XError> {
            match prod {
                1 | 2 | 4 => {
                    let rhs = self.ctx.tokens_pop()?;
                    self.ctx.tokens_pop()?;
                    let lhs = self.ctx.tokens_pop()?;
                    let value = match prod {
                        1 => lhs.value + rhs.value,
                        2 => lhs.value * rhs.value,
                        _ => lhs.value.pow(rhs.value as u32),
                    };
                    self.ctx.tokens_push(XToken { id: E, value });
                }
                3 => {
                    let mut n = self.ctx.tokens_pop()?;
                    n.id = E;
                    self.ctx.tokens_push(n);
                }
                _ => unreachable!(),
            }
            Ok(())
        }

        fn unexpected(&mut self, token: XToken) -> XError {
            XError::Unexpected(token.id)
        }
    }

    #[test]
    fn respects_precedence() {
        init_logger();
        let t = tables(true);
        assert_eq!(t.ambig_count(), 0);
        let mut p = XParser::new(&t, "1 + 2 * 3 + 4");
        assert_eq!(p.run(0).unwrap().value, 11);
        let mut p = XParser::new(&t, "2 ^ 3 ^ 2");
        assert_eq!(p.run(0).unwrap().value, 512);
        let stats = p.stats();
        assert_eq!(stats.shifts, 5);
        assert_eq!(stats.reductions, 5);
    }

    #[test]
    fn ambiguities_go_to_the_parser() {
        init_logger();
        let t = tables(false);
        assert!(t.ambig_count() > 0);
        let mut p = XParser::new(&t, "2 ^ 3 ^ 2");
        assert_eq!(p.run(0).unwrap().value, 512);
        let mut p = XParser::new(&t, "2 ^ 3 ^ 2");
        p.shift_on_ambig = false;
        assert_eq!(p.run(0).unwrap().value, 64);
        assert!(p.stats().ambigs > 0);
    }

    #[test]
    fn reports_unexpected_tokens() {
        init_logger();
        let t = tables(true);
        let mut p = XParser::new(&t, "1 + * 2");
        assert_eq!(p.run(0).unwrap_err(), XError::Unexpected(STAR));
        let mut p = XParser::new(&t, "1 +");
        assert_eq!(p.run(0).unwrap_err(), XError::Unexpected(END));
        let mut p = XParser::new(&t, "1");
        assert_eq!(p.run(7).unwrap_err(), XError::Driver(DriverError::UnknownGoal(7)));
    }

    #[test]
    fn peek_counts_from_the_top() {
        let mut ctx = ParserCtx::new();
        ctx.tokens_push(1);
        ctx.tokens_push(2);
        assert_eq!(ctx.tokens_peek(0), Some(&2));
        assert_eq!(ctx.tokens_peek(1), Some(&1));
        assert_eq!(ctx.tokens_peek(2), None);
        assert_eq!(ctx.tokens_pop(), Ok(2));
    }
}
