//! Expression parsing.
//!
//! Precedence, loosest first: `or`; `and`; equality; comparison; additive;
//! multiplicative; unary; `^`. Exponentiation is right-associative and binds
//! tighter than unary operators on its left, so `-2 ^ 2` is `-(2 ^ 2)`.

use pinky_lexer::token::TokenKind;
use pinky_types::ast::{BinOp, Expr, ExprKind, Ident, UnOp};
use pinky_types::PinkyError;

use crate::parser::Parser;

impl Parser {
    /// Parse a full expression.
    pub(crate) fn parse_expr(&mut self) -> Result<Expr, PinkyError> {
        self.parse_or()
    }

    fn parse_or(&mut self) -> Result<Expr, PinkyError> {
        let mut left = self.parse_and()?;
        while self.check(&TokenKind::Or) {
            let span = self.advance().span;
            let right = self.parse_and()?;
            left = Expr::new(
                ExprKind::Binary {
                    op: BinOp::Or,
                    left: Box::new(left),
                    right: Box::new(right),
                },
                span,
            );
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Expr, PinkyError> {
        let mut left = self.parse_equality()?;
        while self.check(&TokenKind::And) {
            let span = self.advance().span;
            let right = self.parse_equality()?;
            left = Expr::new(
                ExprKind::Binary {
                    op: BinOp::And,
                    left: Box::new(left),
                    right: Box::new(right),
                },
                span,
            );
        }
        Ok(left)
    }

    fn parse_equality(&mut self) -> Result<Expr, PinkyError> {
        let mut left = self.parse_comparison()?;
        loop {
            let op = match self.peek_kind() {
                TokenKind::EqEq => BinOp::Eq,
                TokenKind::NotEq => BinOp::Ne,
                _ => return Ok(left),
            };
            let span = self.advance().span;
            let right = self.parse_comparison()?;
            left = Expr::new(
                ExprKind::Binary {
                    op,
                    left: Box::new(left),
                    right: Box::new(right),
                },
                span,
            );
        }
    }

    fn parse_comparison(&mut self) -> Result<Expr, PinkyError> {
        let mut left = self.parse_additive()?;
        loop {
            let op = match self.peek_kind() {
                TokenKind::Lt => BinOp::Lt,
                TokenKind::Le => BinOp::Le,
                TokenKind::Gt => BinOp::Gt,
                TokenKind::Ge => BinOp::Ge,
                _ => return Ok(left),
            };
            let span = self.advance().span;
            let right = self.parse_additive()?;
            left = Expr::new(
                ExprKind::Binary {
                    op,
                    left: Box::new(left),
                    right: Box::new(right),
                },
                span,
            );
        }
    }

    fn parse_additive(&mut self) -> Result<Expr, PinkyError> {
        let mut left = self.parse_multiplicative()?;
        loop {
            let op = match self.peek_kind() {
                TokenKind::Plus => BinOp::Add,
                TokenKind::Minus => BinOp::Sub,
                _ => return Ok(left),
            };
            let span = self.advance().span;
            let right = self.parse_multiplicative()?;
            left = Expr::new(
                ExprKind::Binary {
                    op,
                    left: Box::new(left),
                    right: Box::new(right),
                },
                span,
            );
        }
    }

    fn parse_multiplicative(&mut self) -> Result<Expr, PinkyError> {
        let mut left = self.parse_unary()?;
        loop {
            let op = match self.peek_kind() {
                TokenKind::Star => BinOp::Mul,
                TokenKind::Slash => BinOp::Div,
                TokenKind::Percent => BinOp::Mod,
                _ => return Ok(left),
            };
            let span = self.advance().span;
            let right = self.parse_unary()?;
            left = Expr::new(
                ExprKind::Binary {
                    op,
                    left: Box::new(left),
                    right: Box::new(right),
                },
                span,
            );
        }
    }

    fn parse_unary(&mut self) -> Result<Expr, PinkyError> {
        let op = match self.peek_kind() {
            TokenKind::Minus => Some(UnOp::Neg),
            TokenKind::Plus => Some(UnOp::Pos),
            TokenKind::Tilde => Some(UnOp::Not),
            _ => None,
        };
        let Some(op) = op else {
            return self.parse_power();
        };
        let span = self.advance().span;
        let operand = self.parse_unary()?;
        Ok(Expr::new(
            ExprKind::Unary {
                op,
                operand: Box::new(operand),
            },
            span,
        ))
    }

    fn parse_power(&mut self) -> Result<Expr, PinkyError> {
        let left = self.parse_primary()?;
        if self.check(&TokenKind::Caret) {
            let span = self.advance().span;
            // Right-associative: the exponent re-enters at unary level.
            let right = self.parse_unary()?;
            return Ok(Expr::new(
                ExprKind::Binary {
                    op: BinOp::Pow,
                    left: Box::new(left),
                    right: Box::new(right),
                },
                span,
            ));
        }
        Ok(left)
    }

    fn parse_primary(&mut self) -> Result<Expr, PinkyError> {
        let span = self.current_span();
        match self.peek_kind().clone() {
            TokenKind::Number(n) => {
                self.advance();
                Ok(Expr::new(ExprKind::Number(n), span))
            }
            TokenKind::Str(s) => {
                self.advance();
                Ok(Expr::new(ExprKind::Str(s), span))
            }
            TokenKind::True => {
                self.advance();
                Ok(Expr::new(ExprKind::Bool(true), span))
            }
            TokenKind::False => {
                self.advance();
                Ok(Expr::new(ExprKind::Bool(false), span))
            }
            TokenKind::Nil => {
                self.advance();
                Ok(Expr::new(ExprKind::Nil, span))
            }
            TokenKind::LParen => {
                self.advance();
                let inner = self.parse_expr()?;
                self.expect(&TokenKind::RParen)?;
                Ok(Expr::new(ExprKind::Grouping(Box::new(inner)), span))
            }
            TokenKind::Ident(name) => {
                self.advance();
                if self.check(&TokenKind::LParen) {
                    let args = self.parse_call_args()?;
                    Ok(Expr::new(
                        ExprKind::Call {
                            name: Ident::new(name, span),
                            args,
                        },
                        span,
                    ))
                } else {
                    Ok(Expr::new(ExprKind::Ident(name), span))
                }
            }
            other => Err(self.error(format!("expected expression, got '{other}'"))),
        }
    }

    /// Parse `( a1, …, an )` call arguments; the `(` is the current token.
    fn parse_call_args(&mut self) -> Result<Vec<Expr>, PinkyError> {
        self.expect(&TokenKind::LParen)?;
        let mut args = Vec::new();
        if !self.check(&TokenKind::RParen) {
            loop {
                args.push(self.parse_expr()?);
                if !self.eat(&TokenKind::Comma) {
                    break;
                }
            }
        }
        self.expect(&TokenKind::RParen)?;
        Ok(args)
    }
}
