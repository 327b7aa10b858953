//! # Notation parser
//!
//! [`MathParser`] couples the shared SLR(1) tables with the notation's
//! semantic actions. Each reduction builds an [`Ast`] node, applying the
//! identifier rules, the function-vs-product rules and the overflow guards
//! as it goes.
//!
//! ## Pipes
//!
//! `|` both delimits absolute values and separates a number set from an
//! interval (`R|[0, 1]`). Precedence cannot settle every shift/reduce choice
//! on a `|` lookahead, so those cells are left to [`MathParser`]:
//!
//! - a reduction that binds at least as tightly as implicit multiplication
//!   always reduces;
//! - a lone identifier at the start of the input is a set name only if the
//!   rest of the input is a single bracketed pair containing a top-level
//!   comma;
//! - otherwise a `|` closes an absolute value when one is open on the stack,
//!   and opens a new one when none is.
//!
//! The parser buffers the whole token stream up front so the second rule
//! can look past the `|`.

use crate::ast::{Ast, BinaryOp};
use crate::catalog::is_greek_name;
use crate::grammar::{self, GOAL_DEFINITION, GOAL_EQUATION, IMPLICIT, PRODUCTIONS, ProdID};
use crate::value::{NumberSet, Relation};
use crate::{MathError, MathToken, Number, ParserState, TokenID, TokenValue, tokenize};
use mathnote_lr::{Action, DriverError, Parser, ParserCtx, Span, Tables};
use smartstring::alias::String;
use std::collections::VecDeque;

/// Parses `text` with `state`. Shorthand for [`parse`] over [`tokenize`].
pub fn parse_str(text: &str, state: &mut ParserState) -> Result<Ast, MathError> {
    parse(tokenize(text), state)
}

/// Parses one equation (or one definition when `state.defining` is set).
///
/// A root relation that evaluates to a boolean is wrapped in
/// [`Ast::BooleanResult`].
pub fn parse<I>(tokens: I, state: &mut ParserState) -> Result<Ast, MathError>
where
    I: IntoIterator<Item = Result<MathToken, MathError>>,
{
    let tables = grammar::tables()?;
    let input: VecDeque<MathToken> = tokens.into_iter().collect::<Result<_, _>>()?;
    let goal = if state.defining {
        GOAL_DEFINITION
    } else {
        GOAL_EQUATION
    };
    let mut parser = MathParser::new(tables, input, state);
    let mut root = parser.run(goal)?;
    log::debug!("parse stats: {:?}", parser.stats());
    let ast = take_ast(&mut root)?;
    Ok(classify(ast))
}

fn classify(ast: Ast) -> Ast {
    if matches!(ast, Ast::Conditional { .. })
        && ast.evaluate().ok().and_then(|v| v.as_bool()).is_some()
    {
        return Ast::BooleanResult(Box::new(ast));
    }
    ast
}

fn take_ast(token: &mut MathToken) -> Result<Ast, MathError> {
    match std::mem::take(&mut token.value) {
        TokenValue::Ast(ast) => Ok(ast),
        _ => Err(DriverError::MissingValue {
            symbol: token.token_id.into(),
        }
        .into()),
    }
}

fn take_args(token: &mut MathToken) -> Result<Vec<Ast>, MathError> {
    match std::mem::take(&mut token.value) {
        TokenValue::Args(args) => Ok(args),
        _ => Err(DriverError::MissingValue {
            symbol: token.token_id.into(),
        }
        .into()),
    }
}

pub struct MathParser<'a> {
    tables: &'a Tables,
    input: VecDeque<MathToken>,
    end: MathToken,
    ctx: ParserCtx<MathToken>,
    state: &'a mut ParserState,
}

impl<'a> MathParser<'a> {
    pub fn new(tables: &'a Tables, input: VecDeque<MathToken>, state: &'a mut ParserState) -> Self {
        let end_at = input
            .iter()
            .rev()
            .find(|t| t.token_id != TokenID::End)
            .map(|t| t.span.end)
            .unwrap_or_default();
        Self {
            tables,
            input,
            end: MathToken::new(TokenID::End, "", Span::new(end_at, end_at)),
            ctx: ParserCtx::new(),
            state,
        }
    }

    fn pop_n(&mut self, n: usize) -> Result<Vec<MathToken>, MathError> {
        let at = self
            .ctx
            .tokens
            .len()
            .checked_sub(n)
            .ok_or(DriverError::StackUnderflow)?;
        Ok(self.ctx.tokens.split_off(at))
    }

    /// Number of `|` on the stack that may still be closed, not counting the
    /// one after a leading set name.
    fn open_pipes(&self) -> usize {
        let set_prefix = self
            .ctx
            .tokens
            .first()
            .is_some_and(|t| t.token_id == TokenID::Ident);
        self.ctx
            .tokens
            .iter()
            .enumerate()
            .filter(|(i, t)| t.token_id == TokenID::Pipe && !(*i == 1 && set_prefix))
            .count()
    }

    /// Whether the input after the current `|` is one bracketed pair with a
    /// top-level comma, followed by the end of input.
    fn pipe_opens_interval(&self) -> bool {
        let mut rest = self.input.iter().map(|t| t.token_id);
        if !matches!(
            self.input.front().map(|t| t.token_id),
            Some(TokenID::LBrack | TokenID::LParen)
        ) {
            return false;
        }
        let mut depth = 0usize;
        let mut comma = false;
        while let Some(id) = rest.next() {
            match id {
                TokenID::LBrack | TokenID::LParen | TokenID::LBrace => depth += 1,
                TokenID::RBrack | TokenID::RParen | TokenID::RBrace => {
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        return comma && matches!(rest.next(), Some(TokenID::End) | None);
                    }
                }
                TokenID::Comma if depth == 1 => comma = true,
                _ => {}
            }
        }
        false
    }

    fn number(&self, token: &MathToken) -> Result<Ast, MathError> {
        let value = Number::from_literal(&token.lexeme).ok_or_else(|| MathError::Lex {
            text: token.lexeme.clone(),
            position: token.position(),
        })?;
        Ast::number(&token.lexeme, value, &self.state.limits)
    }

    /// A single letter or accepted name, optionally subscripted.
    fn letter(&mut self, name: &str, subscript: Option<&str>) -> Ast {
        let full: String = match subscript {
            Some(sub) => format!("{name}_{sub}").into(),
            None => {
                if let Some(value) = self.state.catalog.constant(name) {
                    return Ast::Constant {
                        name: name.into(),
                        value: value.clone(),
                    };
                }
                name.into()
            }
        };
        self.state.variables.push(full.clone());
        Ast::Variable(full)
    }

    /// Resolves an identifier to one variable or constant, or to a product
    /// of its letters. The subscript attaches to the last letter.
    fn identifier(&mut self, name: &str, subscript: Option<&str>) -> Ast {
        let catalog = &self.state.catalog;
        let whole = name.chars().count() == 1
            || catalog.constant(name).is_some()
            || catalog.is_symbol(name)
            || is_greek_name(name);
        if whole {
            return self.letter(name, subscript);
        }
        let letters: Vec<char> = name.chars().collect();
        let mut product: Option<Ast> = None;
        for (i, c) in letters.iter().enumerate() {
            let mut letter = String::new();
            letter.push(*c);
            let sub = if i + 1 == letters.len() { subscript } else { None };
            let node = self.letter(&letter, sub);
            product = Some(match product {
                Some(acc) => Ast::binary(BinaryOp::Mul, acc, node),
                None => node,
            });
        }
        product.unwrap_or_else(|| Ast::Variable(name.into()))
    }

    /// `name(args)` or `name_sub(args)`: a call when `name` is a known
    /// function, otherwise implicit multiplication by the single argument.
    fn call(
        &mut self,
        name: &str,
        subscript: Option<&MathToken>,
        mut args: Vec<Ast>,
    ) -> Result<Ast, MathError> {
        if let Some(function) = self.state.catalog.function(name).cloned() {
            if let Some(sub) = subscript {
                let lead = match sub.token_id {
                    TokenID::Number => self.number(sub)?,
                    _ => self.identifier(&sub.lexeme, None),
                };
                args.insert(0, lead);
            }
            function.check_arity(args.len())?;
            return Ok(Ast::FunctionCall { function, args });
        }
        let count = args.len();
        let (Some(arg), 1) = (args.pop(), count) else {
            return Err(MathError::InvalidFunctionCall {
                name: name.into(),
                count,
            });
        };
        let lhs = self.identifier(name, subscript.map(|t| t.lexeme.as_str()));
        Ok(Ast::binary(BinaryOp::Mul, lhs, arg))
    }

    fn reduce_prod(
        &mut self,
        id: ProdID,
        rhs: &mut [MathToken],
        below: Option<TokenID>,
    ) -> Result<TokenValue, MathError> {
        use ProdID as P;
        let limits = self.state.limits;
        let ast = match id {
            P::Start | P::DefStart | P::Equation1 | P::Equation8 | P::Expr1 | P::Expr2 => {
                take_ast(&mut rhs[0])?
            }
            P::Equation2 | P::Equation3 | P::Equation4 | P::Equation5 => {
                let op = match id {
                    P::Equation2 => Relation::Eq,
                    P::Equation3 => Relation::Ne,
                    P::Equation4 => Relation::Lt,
                    _ => Relation::Gt,
                };
                Ast::Conditional {
                    op,
                    left: Box::new(take_ast(&mut rhs[0])?),
                    right: Box::new(take_ast(&mut rhs[2])?),
                }
            }
            P::Equation6 | P::Equation7 => Ast::Conditional {
                op: if id == P::Equation6 {
                    Relation::Le
                } else {
                    Relation::Ge
                },
                left: Box::new(take_ast(&mut rhs[0])?),
                right: Box::new(take_ast(&mut rhs[3])?),
            },
            P::Equation9 => {
                // IDENT | Interval
                let name = rhs[0].lexeme.clone();
                let set = NumberSet::lookup(&name).ok_or(MathError::InvalidDomain { name })?;
                Ast::CompoundInterval {
                    set,
                    interval: Box::new(take_ast(&mut rhs[2])?),
                }
            }
            P::Definition1 | P::Definition2 => {
                // IDENT ( Args ) = Expr | IDENT ( ) = Expr
                let (params, body) = match id {
                    P::Definition1 => (take_args(&mut rhs[2])?, take_ast(&mut rhs[5])?),
                    _ => (Vec::new(), take_ast(&mut rhs[4])?),
                };
                Ast::DefinedFunction {
                    name: rhs[0].lexeme.clone(),
                    params,
                    body: Box::new(body),
                }
            }
            P::Interval1 | P::Interval2 | P::Interval3 | P::Interval4 => {
                let (left_bracket, right_bracket) = match id {
                    P::Interval1 => ('[', ']'),
                    P::Interval2 => ('[', ')'),
                    P::Interval3 => ('(', ']'),
                    _ => ('(', ')'),
                };
                Ast::Interval {
                    left_bracket,
                    lower: Box::new(take_ast(&mut rhs[1])?),
                    upper: Box::new(take_ast(&mut rhs[3])?),
                    right_bracket,
                }
            }
            P::Args1 => return Ok(TokenValue::Args(vec![take_ast(&mut rhs[0])?])),
            P::Args2 => {
                let mut args = take_args(&mut rhs[0])?;
                args.push(take_ast(&mut rhs[2])?);
                return Ok(TokenValue::Args(args));
            }
            P::Expr3 | P::Expr4 | P::Expr5 | P::Expr6 | P::Expr7 => {
                let op = match id {
                    P::Expr3 => BinaryOp::Add,
                    P::Expr4 => BinaryOp::Sub,
                    P::Expr5 => BinaryOp::Mul,
                    P::Expr6 => BinaryOp::Div,
                    _ => BinaryOp::Mod,
                };
                Ast::binary(op, take_ast(&mut rhs[0])?, take_ast(&mut rhs[2])?)
            }
            P::Unary1 | P::Unary3 => Ast::Pos(Box::new(take_ast(&mut rhs[1])?)),
            P::Unary2 | P::Unary4 => Ast::Neg(Box::new(take_ast(&mut rhs[1])?)),
            P::Group1 => {
                // Group Group
                Ast::binary(BinaryOp::Mul, take_ast(&mut rhs[0])?, take_ast(&mut rhs[1])?)
            }
            P::Group2 => Ast::pow(
                take_ast(&mut rhs[0])?,
                take_ast(&mut rhs[2])?,
                limits.max_exponent,
            )?,
            P::Group3 => Ast::fac(take_ast(&mut rhs[0])?, limits.max_factorial)?,
            P::Group4 | P::Bound1 => self.number(&rhs[0])?,
            P::Group5 | P::Group6 | P::Group7 | P::Bound3 | P::Bound4 => take_ast(&mut rhs[1])?,
            P::Group8 => Ast::Abs(Box::new(take_ast(&mut rhs[1])?)),
            P::Group9 => {
                // IDENT; right after `@` a function name is a function reference
                let name = rhs[0].lexeme.clone();
                let reference = match below {
                    Some(TokenID::At) => self.state.catalog.function(&name).cloned(),
                    _ => None,
                };
                match reference {
                    Some(function) => Ast::Function(function),
                    None => self.identifier(&name, None),
                }
            }
            P::Group10 | P::Group11 => {
                // IDENT _ NUMBER | IDENT _ IDENT
                let (name, sub) = (rhs[0].lexeme.clone(), rhs[2].lexeme.clone());
                self.identifier(&name, Some(&sub))
            }
            P::Group12 => {
                let args = take_args(&mut rhs[2])?;
                self.call(&rhs[0].lexeme, None, args)?
            }
            P::Group13 => self.call(&rhs[0].lexeme, None, Vec::new())?,
            P::Group14 | P::Group15 => {
                // IDENT _ (NUMBER|IDENT) ( Args )
                let args = take_args(&mut rhs[4])?;
                self.call(&rhs[0].lexeme, Some(&rhs[2]), args)?
            }
            P::Group16 => {
                // IDENT @ Group
                let name = rhs[0].lexeme.clone();
                let Some(function) = self.state.catalog.function(&name).cloned() else {
                    return Err(MathError::UnknownFunction { name });
                };
                Ast::At {
                    function: Box::new(Ast::Function(function)),
                    argument: Box::new(take_ast(&mut rhs[2])?),
                }
            }
            P::Group17 => {
                // lim _ ( IDENT -> Expr ) Group
                Ast::Limit {
                    target: rhs[3].lexeme.clone(),
                    approach: Box::new(take_ast(&mut rhs[5])?),
                    body: Box::new(take_ast(&mut rhs[7])?),
                }
            }
            P::Group18 | P::Group19 => {
                // (sum|prod) _ ( IDENT = Expr ) ^ Bound Group
                let var = rhs[3].lexeme.clone();
                let lower = Box::new(take_ast(&mut rhs[5])?);
                let upper = Box::new(take_ast(&mut rhs[8])?);
                let body = Box::new(take_ast(&mut rhs[9])?);
                if id == P::Group18 {
                    Ast::Summation {
                        var,
                        lower,
                        upper,
                        body,
                    }
                } else {
                    Ast::Product {
                        var,
                        lower,
                        upper,
                        body,
                    }
                }
            }
            P::Bound2 => {
                let name = rhs[0].lexeme.clone();
                self.identifier(&name, None)
            }
        };
        Ok(TokenValue::Ast(ast))
    }
}

impl Parser for MathParser<'_> {
    type Token = MathToken;
    type Error = MathError;

    fn tables(&self) -> &Tables {
        self.tables
    }

    fn ctx(&self) -> &ParserCtx<MathToken> {
        &self.ctx
    }

    fn ctx_mut(&mut self) -> &mut ParserCtx<MathToken> {
        &mut self.ctx
    }

    fn next_token(&mut self) -> Result<MathToken, MathError> {
        Ok(self.input.pop_front().unwrap_or_else(|| self.end.clone()))
    }

    fn resolve_ambiguity(&mut self, ambig: usize, token: &MathToken) -> Result<Action, MathError> {
        let [shift, reduce] = self.tables.lookup_ambig(ambig);
        let Action::Reduce(prod) = reduce else {
            return Ok(shift);
        };
        let action = if token.token_id != TokenID::Pipe {
            log::warn!("unexpected ambiguity on {}; shifting", token.token_id);
            shift
        } else if self
            .tables
            .prod_prec(prod)
            .is_some_and(|p| p.level >= IMPLICIT)
        {
            reduce
        } else if ProdID::from_index(prod) == Some(ProdID::Group9) && self.ctx.tokens.len() == 1 {
            if self.pipe_opens_interval() {
                shift
            } else {
                reduce
            }
        } else if self.open_pipes() > 0 {
            reduce
        } else {
            shift
        };
        log::debug!(
            "PIPE @ {} vs {:?}: {:?}",
            token.position(),
            ProdID::from_index(prod),
            action
        );
        Ok(action)
    }

    fn reduce(&mut self, prod: usize, _token: &MathToken) -> Result<(), MathError> {
        let id = ProdID::from_index(prod).ok_or(DriverError::UnknownProduction(prod))?;
        let lhs = PRODUCTIONS[prod].1;
        let n = self.tables.rhs_len(prod);
        let below = self.ctx.tokens_peek(n).map(|t| t.token_id);
        let mut rhs = self.pop_n(n)?;
        let mut token = MathToken::new(lhs, "", self.end.span);
        if let (Some(first), Some(last)) = (rhs.first(), rhs.last()) {
            token.span = first.span;
            token.merge_span(&last.span);
        }
        token.value = self.reduce_prod(id, &mut rhs, below)?;
        self.ctx.tokens_push(token);
        Ok(())
    }

    fn unexpected(&mut self, token: MathToken) -> MathError {
        if token.token_id == TokenID::End {
            return MathError::UnexpectedEnd {
                position: token.position(),
            };
        }
        MathError::Syntax {
            kind: token.token_id,
            lexeme: token.lexeme,
            position: token.span.start,
        }
    }
}
