//! Longest-match scanning with a multi-pattern DFA.
//!
//! All patterns are compiled into one anchored dense DFA. A scan walks the
//! DFA byte by byte from a given offset, remembers the last match state it
//! passed through and stops at the first dead state, so the longest match
//! wins. Patterns are expected not to match the same text.

use regex_automata::{
    Anchored, Input, MatchError, MatchKind,
    dfa::{Automaton, StartKind, dense},
};
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum ScanError {
    #[error("failed to build scanner: {0}")]
    Build(#[from] Box<dense::BuildError>),
    #[error("scanner failed: {0}")]
    Match(#[from] MatchError),
}

/// A single scanner match: the pattern index and the match length in bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Match {
    pub pattern: usize,
    pub len: usize,
}

#[derive(Debug, Clone)]
pub struct Scanner {
    dfa: dense::DFA<Vec<u32>>,
}

impl Scanner {
    /// Compiles `patterns`; pattern `i` is reported as [`Match::pattern`] `i`.
    pub fn new(patterns: &[&str]) -> Result<Self, ScanError> {
        let dfa = dense::Builder::new()
            .configure(
                dense::DFA::config()
                    .match_kind(MatchKind::All)
                    .start_kind(StartKind::Anchored),
            )
            .build_many(patterns)
            .map_err(Box::new)?;
        log::debug!(
            "built scanner DFA for {} patterns, {} bytes",
            patterns.len(),
            dfa.memory_usage()
        );
        Ok(Self { dfa })
    }

    /// Finds the longest match starting exactly at `at`.
    pub fn longest_match(&self, haystack: &[u8], at: usize) -> Result<Option<Match>, ScanError> {
        let dfa = &self.dfa;
        let rest = haystack.get(at..).unwrap_or_default();
        let mut state = dfa.start_state_forward(&Input::new(rest).anchored(Anchored::Yes))?;
        let mut last_match = None;

        // Match states are delayed by one byte: reaching one after byte `i`
        // means a match ended just before `i`.
        for (i, &b) in rest.iter().enumerate() {
            state = dfa.next_state(state, b);
            if dfa.is_special_state(state) {
                if dfa.is_match_state(state) {
                    log::trace!(
                        "MATCH: i={}, b={:?}, p={}",
                        i,
                        b as char,
                        dfa.match_pattern(state, 0).as_usize()
                    );
                    last_match = Some(Match {
                        pattern: dfa.match_pattern(state, 0).as_usize(),
                        len: i,
                    });
                } else if dfa.is_dead_state(state) || dfa.is_quit_state(state) {
                    log::trace!("DEAD: i={}, b={:?}", i, b as char);
                    return Ok(last_match);
                }
            }
        }
        state = dfa.next_eoi_state(state);
        if dfa.is_match_state(state) {
            last_match = Some(Match {
                pattern: dfa.match_pattern(state, 0).as_usize(),
                len: rest.len(),
            });
        }
        Ok(last_match)
    }
}
