// LR(0) item machinery, FIRST/FOLLOW computations, and SLR(1) parse table
// construction with yacc-style precedence resolution.

use crate::grammar::{Assoc, Grammar};
use indexmap::IndexSet;
use std::collections::BTreeSet;

/// Represents an LR(0) item consisting of a production index and a dot position.
///
/// Productions are encoded as `[lhs, rhs...]`, so a dot of `1` sits before the
/// first right-hand side symbol.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct Item {
    /// The index of the production in the grammar.
    pub prod: usize,

    /// The position of the dot within the encoded production.
    pub dot: usize,
}

/// A set of LR(0) items
pub type ItemSet = BTreeSet<Item>;

/// The canonical collection of LR(0) item sets, indexed by state number.
pub type ItemSetSet = IndexSet<ItemSet>;

/// Computes the LR(0) *closure* of a set of items.
///
/// For each item whose dot precedes a nonterminal, adds the items for that
/// nonterminal's productions, repeating until nothing new appears.
pub fn closure(items: &ItemSet, prods: &[Vec<usize>], n_nonterm: usize) -> ItemSet {
    let mut c = items.clone();
    let mut work: Vec<Item> = items.iter().cloned().collect();
    while let Some(item) = work.pop() {
        let Some(&t) = prods[item.prod].get(item.dot) else {
            continue;
        };
        if t < n_nonterm {
            for (j, p) in prods.iter().enumerate() {
                if p[0] == t {
                    let new_item = Item { prod: j, dot: 1 };
                    if c.insert(new_item.clone()) {
                        work.push(new_item);
                    }
                }
            }
        }
    }
    c
}

/// Computes the LR(0) *goto* function for a given item set and grammar symbol.
///
/// Produces the closure of all items in `items` advanced past `sym`.
pub fn goto(items: &ItemSet, sym: usize, prods: &[Vec<usize>], n_nonterm: usize) -> ItemSet {
    let mut moved = ItemSet::new();
    for item in items {
        let p = &prods[item.prod];
        if item.dot < p.len() && p[item.dot] == sym {
            moved.insert(Item {
                prod: item.prod,
                dot: item.dot + 1,
            });
        }
    }
    closure(&moved, prods, n_nonterm)
}

/// Constructs the canonical collection of LR(0) item sets.
///
/// State `i` for `i < goals.len()` is the start state of `goals[i]`; the rest
/// are numbered in discovery order.
pub fn construct_set(
    prods: &[Vec<usize>],
    goals: &[usize],
    n_nonterm: usize,
    n_term: usize,
) -> ItemSetSet {
    let mut c = ItemSetSet::new();
    for &g in goals {
        let start = ItemSet::from([Item { prod: g, dot: 1 }]);
        c.insert(closure(&start, prods, n_nonterm));
    }
    let mut next = 0;
    while next < c.len() {
        let state = c[next].clone();
        for sym in 0..(n_nonterm + n_term) {
            let nxt = goto(&state, sym, prods, n_nonterm);
            if !nxt.is_empty() {
                c.insert(nxt);
            }
        }
        next += 1;
    }
    c
}

/// Computes FIRST sets and nullability for all grammar symbols.
pub fn first_sets(
    prods: &[Vec<usize>],
    n_nonterm: usize,
    n_term: usize,
) -> (Vec<BTreeSet<usize>>, Vec<bool>) {
    let n_sym = n_nonterm + n_term;
    let mut first: Vec<BTreeSet<usize>> = vec![BTreeSet::new(); n_sym];
    let mut nullable = vec![false; n_sym];
    for (t, set) in first.iter_mut().enumerate().skip(n_nonterm) {
        set.insert(t);
    }
    let mut changed = true;
    while changed {
        changed = false;
        for prod in prods {
            let lhs = prod[0];
            let mut all_nullable = true;
            for &sym in &prod[1..] {
                let first_sym = first[sym].clone();
                for f in first_sym {
                    if first[lhs].insert(f) {
                        changed = true;
                    }
                }
                if !nullable[sym] {
                    all_nullable = false;
                    break;
                }
            }
            if all_nullable && !nullable[lhs] {
                nullable[lhs] = true;
                changed = true;
            }
        }
    }
    (first, nullable)
}

/// Computes FOLLOW sets for all nonterminal symbols.
///
/// Every goal symbol in `start_syms` is followed by the end-of-stream marker,
/// the last terminal.
pub fn follow_sets(
    prods: &[Vec<usize>],
    n_nonterm: usize,
    n_term: usize,
    start_syms: &[usize],
    first: &[BTreeSet<usize>],
    nullable: &[bool],
) -> Vec<BTreeSet<usize>> {
    let eos = n_nonterm + n_term - 1;
    let mut follow: Vec<BTreeSet<usize>> = vec![BTreeSet::new(); n_nonterm];
    for &s in start_syms {
        follow[s].insert(eos);
    }
    let mut changed = true;
    while changed {
        changed = false;
        for prod in prods {
            let lhs = prod[0];
            let rhs = &prod[1..];
            for (i, &b) in rhs.iter().enumerate() {
                if b >= n_nonterm {
                    continue;
                }
                let mut beta_nullable = true;
                let mut first_beta = BTreeSet::new();
                for &sym in &rhs[i + 1..] {
                    first_beta.extend(first[sym].iter().copied());
                    if !nullable[sym] {
                        beta_nullable = false;
                        break;
                    }
                }
                for f in first_beta {
                    if follow[b].insert(f) {
                        changed = true;
                    }
                }
                if beta_nullable {
                    let follow_lhs = follow[lhs].clone();
                    for f in follow_lhs {
                        if follow[b].insert(f) {
                            changed = true;
                        }
                    }
                }
            }
        }
    }
    follow
}

/// Represents the type of parser action.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ActTyp {
    Accept = 1,
    Shift = 2,
    Reduce = 3,
    Goto = 5,
}

/// A raw parse action: a type plus a state or production index.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct Act {
    pub typ: ActTyp,
    pub val: usize,
}

impl Act {
    pub fn new(typ: ActTyp, val: usize) -> Self {
        Act { typ, val }
    }
}

/// An SLR(1) parse table before conflict resolution: one row per state, one
/// column per symbol, each cell holding every candidate action.
pub type Tab = Vec<Vec<BTreeSet<Act>>>;

/// Constructs an SLR(1) parse table from the canonical collection.
///
/// Completed goal items accept on end-of-stream; every other completed item
/// reduces on the FOLLOW set of its left-hand side.
pub fn construct_slr(
    c: &ItemSetSet,
    flw: &[BTreeSet<usize>],
    prods: &[Vec<usize>],
    goals: &[usize],
    n_nonterm: usize,
    n_term: usize,
) -> Tab {
    let n_sym = n_nonterm + n_term;
    let mut tab: Tab = vec![vec![BTreeSet::new(); n_sym]; c.len()];

    for (state, ssi) in c.iter().enumerate() {
        for sym in 0..n_nonterm {
            let nxt = goto(ssi, sym, prods, n_nonterm);
            if let Some(ns) = c.get_index_of(&nxt) {
                tab[state][sym].insert(Act::new(ActTyp::Goto, ns));
            }
        }
        for item in ssi {
            let p = &prods[item.prod];
            if item.dot < p.len() {
                let sym = p[item.dot];
                if sym >= n_nonterm {
                    let nxt = goto(ssi, sym, prods, n_nonterm);
                    if let Some(ns) = c.get_index_of(&nxt) {
                        tab[state][sym].insert(Act::new(ActTyp::Shift, ns));
                    }
                }
            } else if goals.contains(&item.prod) {
                tab[state][n_sym - 1].insert(Act::new(ActTyp::Accept, 0));
            } else {
                for &t in &flw[p[0]] {
                    tab[state][t].insert(Act::new(ActTyp::Reduce, item.prod));
                }
            }
        }
    }
    tab
}

/// Outcome of resolving a single table cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolved {
    Empty,
    Error,
    Accept,
    Shift(usize),
    Reduce(usize),
    Goto(usize),
    /// An unresolved shift/reduce pair, left for the parser to decide.
    Ambig { shift: usize, reduce: usize },
}

/// Counters collected while resolving conflicts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConflictStats {
    pub by_precedence: usize,
    pub reduce_reduce: usize,
    pub ambiguous: usize,
}

/// Resolves one cell using yacc rules.
///
/// Reduce/reduce conflicts keep the earliest production. A shift/reduce
/// conflict compares the production's precedence with the lookahead's; equal
/// levels fall back to associativity. If either side has no precedence the
/// pair is returned as [`Resolved::Ambig`].
pub fn resolve_cell(
    grammar: &Grammar,
    state: usize,
    sym: usize,
    cell: &BTreeSet<Act>,
    stats: &mut ConflictStats,
) -> Resolved {
    let mut shift = None;
    let mut reduce: Option<usize> = None;
    for act in cell {
        match act.typ {
            ActTyp::Goto => return Resolved::Goto(act.val),
            ActTyp::Accept => {
                if cell.len() > 1 {
                    log::warn!("state {state}: accept conflicts on {}", grammar.label(sym));
                }
                return Resolved::Accept;
            }
            ActTyp::Shift => shift = Some(act.val),
            ActTyp::Reduce => match reduce {
                None => reduce = Some(act.val),
                Some(kept) => {
                    stats.reduce_reduce += 1;
                    log::warn!(
                        "state {state}: reduce/reduce conflict on {} between productions {kept} and {}; keeping {kept}",
                        grammar.label(sym),
                        act.val
                    );
                }
            },
        }
    }
    match (shift, reduce) {
        (None, None) => Resolved::Empty,
        (Some(s), None) => Resolved::Shift(s),
        (None, Some(r)) => Resolved::Reduce(r),
        (Some(s), Some(r)) => match (grammar.prod_prec(r), grammar.token_prec(sym)) {
            (Some(pp), Some(tp)) => {
                stats.by_precedence += 1;
                if pp.level > tp.level {
                    Resolved::Reduce(r)
                } else if pp.level < tp.level {
                    Resolved::Shift(s)
                } else {
                    match pp.assoc {
                        Assoc::Left => Resolved::Reduce(r),
                        Assoc::Right => Resolved::Shift(s),
                        Assoc::NonAssoc => Resolved::Error,
                    }
                }
            }
            _ => {
                stats.ambiguous += 1;
                log::debug!(
                    "state {state}: shift/reduce on {} vs production {r} left to the parser",
                    grammar.label(sym)
                );
                Resolved::Ambig { shift: s, reduce: r }
            }
        },
    }
}
