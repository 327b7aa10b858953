//! # Notation tokens
//!
//! [`MathToken`] is both what the tokenizer yields and what the parser keeps
//! on its stack. Lexical tokens carry their source text in `lexeme`; tokens
//! produced by reductions carry the phrase they stand for in `value`.
use crate::{Ast, TokenID};
use mathnote_lr::{Position, Span, Token};
use smartstring::alias::String;

/// The payload of a parser-stack token.
#[derive(Debug, Clone, Default)]
pub enum TokenValue {
    /// Lexical tokens and punctuation.
    #[default]
    None,
    /// A reduced expression, equation, interval or definition.
    Ast(Ast),
    /// A reduced argument list.
    Args(Vec<Ast>),
}

/// A token with its kind, source text and source span.
///
/// ```rust
/// # use mathnote::{MathToken, TokenID, tokenize};
/// let tokens: Vec<MathToken> = tokenize("2x").collect::<Result<_, _>>().unwrap();
/// assert_eq!(tokens[1].kind(), TokenID::Ident);
/// assert_eq!(tokens[1].lexeme.as_str(), "x");
/// assert_eq!(tokens[1].position().column, 2);
/// ```
#[derive(Debug, Clone)]
pub struct MathToken {
    pub token_id: TokenID,
    pub lexeme: String,
    pub value: TokenValue,
    pub span: Span,
}

impl MathToken {
    pub fn new(token_id: TokenID, lexeme: &str, span: Span) -> Self {
        Self {
            token_id,
            lexeme: lexeme.into(),
            value: TokenValue::None,
            span,
        }
    }

    pub fn kind(&self) -> TokenID {
        self.token_id
    }

    /// Where the token starts.
    pub fn position(&self) -> Position {
        self.span.start
    }

    pub fn merge_span(&mut self, other: &Span) {
        self.span = self.span.merge(other);
    }
}

impl Token for MathToken {
    type TokenID = TokenID;

    fn token_id(&self) -> TokenID {
        self.token_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sp(sl: usize, sc: usize, el: usize, ec: usize) -> Span {
        Span::new(Position::new(sl, sc), Position::new(el, ec))
    }

    #[test]
    fn accessors() {
        let t = MathToken::new(TokenID::Number, "42", sp(1, 3, 1, 5));
        assert_eq!(t.token_id(), TokenID::Number);
        assert_eq!(t.kind(), TokenID::Number);
        assert_eq!(t.position(), Position::new(1, 3));
        assert!(matches!(t.value, TokenValue::None));
    }

    #[test]
    fn merge_span_expands_to_cover_both() {
        let mut t = MathToken::new(TokenID::Expr, "", sp(1, 5, 1, 10));
        t.merge_span(&sp(1, 2, 1, 7));
        assert_eq!(t.span, sp(1, 2, 1, 10));
    }

    #[test]
    fn merge_span_other_within_self_no_change() {
        let mut t = MathToken::new(TokenID::Group, "", sp(2, 2, 2, 10));
        t.merge_span(&sp(2, 4, 2, 7));
        assert_eq!(t.span, sp(2, 2, 2, 10));
    }
}
