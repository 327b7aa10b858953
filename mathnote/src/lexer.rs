//! # Notation tokenizer
//!
//! [`tokenize`] turns source text into a lazy stream of [`MathToken`]s
//! terminated by a single [`TokenID::End`]. All lexical rules are compiled
//! into one DFA; at each offset the longest match wins.
//!
//! Identifiers are maximal runs of ASCII or Greek letters. `lim`, `sum` and
//! `prod` (and `Σ`, `Π`) are keywords. `≤` and `≥` expand to two tokens
//! each, so they parse exactly like `<=` and `>=`.

use crate::{MathError, MathToken, TokenID};
use mathnote_lr::{Cursor, ScanError, Scanner, Span};
use once_cell::sync::Lazy;
use smartstring::alias::String;
use std::iter::FusedIterator;

#[derive(Debug, Clone, Copy)]
enum Rule {
    Whitespace,
    Number,
    Ident,
    Emit(TokenID),
    /// One character standing for two tokens.
    Pair(TokenID, TokenID),
}

const RULES: &[(&str, Rule)] = &[
    (r"\s+", Rule::Whitespace),
    (r"[0-9]+(\.[0-9]*)?|\.[0-9]+", Rule::Number),
    (r"[a-zA-Zα-ωΑ-Ω]+", Rule::Ident),
    (r"\+", Rule::Emit(TokenID::Add)),
    (r"-", Rule::Emit(TokenID::Sub)),
    (r"\*", Rule::Emit(TokenID::Mul)),
    (r"/", Rule::Emit(TokenID::Div)),
    (r"%", Rule::Emit(TokenID::Mod)),
    (r"\^", Rule::Emit(TokenID::Pow)),
    (r"!", Rule::Emit(TokenID::Fac)),
    (r"_", Rule::Emit(TokenID::Subscript)),
    (r"=", Rule::Emit(TokenID::Eq)),
    (r"!=|≠", Rule::Emit(TokenID::Ne)),
    (r"<", Rule::Emit(TokenID::Lt)),
    (r">", Rule::Emit(TokenID::Gt)),
    (r",", Rule::Emit(TokenID::Comma)),
    (r"\|", Rule::Emit(TokenID::Pipe)),
    (r"\(", Rule::Emit(TokenID::LParen)),
    (r"\)", Rule::Emit(TokenID::RParen)),
    (r"\[", Rule::Emit(TokenID::LBrack)),
    (r"\]", Rule::Emit(TokenID::RBrack)),
    (r"\{", Rule::Emit(TokenID::LBrace)),
    (r"\}", Rule::Emit(TokenID::RBrace)),
    (r"->|→", Rule::Emit(TokenID::Arrow)),
    (r"@", Rule::Emit(TokenID::At)),
    (r"∑", Rule::Emit(TokenID::Sum)),
    (r"∏", Rule::Emit(TokenID::Prod)),
    (r"≤", Rule::Pair(TokenID::Lt, TokenID::Eq)),
    (r"≥", Rule::Pair(TokenID::Gt, TokenID::Eq)),
];

static SCANNER: Lazy<Result<Scanner, ScanError>> = Lazy::new(|| {
    let patterns: Vec<&str> = RULES.iter().map(|(p, _)| *p).collect();
    Scanner::new(&patterns)
});

fn scanner() -> Result<&'static Scanner, MathError> {
    SCANNER.as_ref().map_err(|e| MathError::Scan(e.clone()))
}

fn keyword(ident: &str) -> Option<TokenID> {
    match ident {
        "lim" => Some(TokenID::Limit),
        "sum" | "Σ" => Some(TokenID::Sum),
        "prod" | "Π" => Some(TokenID::Prod),
        _ => None,
    }
}

/// Starts tokenizing `text`. Every call returns a fresh stream.
pub fn tokenize(text: &str) -> Tokens<'_> {
    Tokens {
        text,
        cursor: Cursor::new(),
        pending: None,
        done: false,
    }
}

/// The token stream returned by [`tokenize`]. Fused: after `End` or an
/// error it only yields `None`.
#[derive(Debug, Clone)]
pub struct Tokens<'a> {
    text: &'a str,
    cursor: Cursor,
    pending: Option<MathToken>,
    done: bool,
}

impl Tokens<'_> {
    fn scan(&mut self) -> Result<MathToken, MathError> {
        let scanner = scanner()?;
        loop {
            let at = self.cursor.offset;
            if at >= self.text.len() {
                self.done = true;
                let here = self.cursor.position;
                return Ok(MathToken::new(TokenID::End, "", Span::new(here, here)));
            }
            let found = scanner
                .longest_match(self.text.as_bytes(), at)?
                .filter(|m| m.len > 0)
                .and_then(|m| RULES.get(m.pattern).map(|(_, rule)| (m.len, *rule)));
            let Some((len, rule)) = found else {
                let mut text = String::new();
                if let Some(c) = self.text[at..].chars().next() {
                    text.push(c);
                }
                return Err(MathError::Lex {
                    text,
                    position: self.cursor.position,
                });
            };
            let lexeme = &self.text[at..at + len];
            let span = self.cursor.advance(lexeme);
            let token_id = match rule {
                Rule::Whitespace => continue,
                Rule::Number => TokenID::Number,
                Rule::Ident => keyword(lexeme).unwrap_or(TokenID::Ident),
                Rule::Emit(id) => id,
                Rule::Pair(first, second) => {
                    self.pending = Some(MathToken::new(second, lexeme, span));
                    first
                }
            };
            log::trace!("token {} {:?} @ {}", token_id, lexeme, span.start);
            return Ok(MathToken::new(token_id, lexeme, span));
        }
    }
}

impl Iterator for Tokens<'_> {
    type Item = Result<MathToken, MathError>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(token) = self.pending.take() {
            return Some(Ok(token));
        }
        if self.done {
            return None;
        }
        let result = self.scan();
        if result.is_err() {
            self.done = true;
        }
        Some(result)
    }
}

impl FusedIterator for Tokens<'_> {}

#[cfg(test)]
mod tests {
    use super::*;
    use mathnote_lr::Position;

    fn init_logger() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn kinds(text: &str) -> Vec<TokenID> {
        tokenize(text).map(|t| t.unwrap().kind()).collect()
    }

    #[test]
    fn numbers_and_identifiers() {
        init_logger();
        assert_eq!(
            kinds("3.14x + .5yz"),
            [
                TokenID::Number,
                TokenID::Ident,
                TokenID::Add,
                TokenID::Number,
                TokenID::Ident,
                TokenID::End
            ]
        );
        let lexemes: Vec<std::string::String> = tokenize("2.5αβ")
            .map(|t| t.unwrap().lexeme.to_string())
            .collect();
        assert_eq!(lexemes, ["2.5", "αβ", ""]);
    }

    #[test]
    fn keywords_and_arrows() {
        assert_eq!(
            kinds("lim_(x->0) limx"),
            [
                TokenID::Limit,
                TokenID::Subscript,
                TokenID::LParen,
                TokenID::Ident,
                TokenID::Arrow,
                TokenID::Number,
                TokenID::RParen,
                TokenID::Ident,
                TokenID::End
            ]
        );
        assert_eq!(
            kinds("∑ Σ sum ∏ prod x→y")[..5],
            [
                TokenID::Sum,
                TokenID::Sum,
                TokenID::Sum,
                TokenID::Prod,
                TokenID::Prod
            ]
        );
        assert_eq!(kinds("x→y")[1], TokenID::Arrow);
    }

    #[test]
    fn relational_spellings() {
        assert_eq!(kinds("a != b")[1], TokenID::Ne);
        assert_eq!(kinds("a ≠ b")[1], TokenID::Ne);
        assert_eq!(
            kinds("a ≤ b"),
            [
                TokenID::Ident,
                TokenID::Lt,
                TokenID::Eq,
                TokenID::Ident,
                TokenID::End
            ]
        );
        assert_eq!(
            kinds("a >= b"),
            [
                TokenID::Ident,
                TokenID::Gt,
                TokenID::Eq,
                TokenID::Ident,
                TokenID::End
            ]
        );
        assert_eq!(kinds("3!"), [TokenID::Number, TokenID::Fac, TokenID::End]);
    }

    #[test]
    fn bang_equals_is_not_equal() {
        // Longest match: `3!=7` compares, it does not take a factorial.
        assert_eq!(
            kinds("3!=7"),
            [
                TokenID::Number,
                TokenID::Ne,
                TokenID::Number,
                TokenID::End
            ]
        );
        assert_eq!(
            kinds("3! = 7"),
            [
                TokenID::Number,
                TokenID::Fac,
                TokenID::Eq,
                TokenID::Number,
                TokenID::End
            ]
        );
        assert_eq!(
            kinds("(3!)=7"),
            [
                TokenID::LParen,
                TokenID::Number,
                TokenID::Fac,
                TokenID::RParen,
                TokenID::Eq,
                TokenID::Number,
                TokenID::End
            ]
        );
    }

    #[test]
    fn positions_are_one_based_characters() {
        let tokens: Vec<MathToken> = tokenize("αβ +\n x").collect::<Result<_, _>>().unwrap();
        assert_eq!(tokens[0].position(), Position::new(1, 1));
        assert_eq!(tokens[1].position(), Position::new(1, 4));
        assert_eq!(tokens[2].position(), Position::new(2, 2));
        assert_eq!(tokens[3].kind(), TokenID::End);
    }

    #[test]
    fn unknown_characters_fail_and_fuse() {
        let mut tokens = tokenize("x $ y");
        assert_eq!(tokens.next().unwrap().unwrap().kind(), TokenID::Ident);
        match tokens.next() {
            Some(Err(MathError::Lex { text, position })) => {
                assert_eq!(text.as_str(), "$");
                assert_eq!(position, Position::new(1, 3));
            }
            other => panic!("expected a lex error, got {other:?}"),
        }
        assert!(tokens.next().is_none());
    }

    #[test]
    fn tokenizing_is_restartable() {
        let a: Vec<TokenID> = kinds("x^2");
        let b: Vec<TokenID> = kinds("x^2");
        assert_eq!(a, b);
        assert_eq!(kinds(""), [TokenID::End]);
    }
}
