//! Statement parsing.

use pinky_lexer::token::TokenKind;
use pinky_types::ast::{ElifBranch, Stmt};
use pinky_types::PinkyError;

use crate::parser::Parser;

impl Parser {
    /// Parse a single statement.
    pub(crate) fn parse_stmt(&mut self) -> Result<Stmt, PinkyError> {
        match self.peek_kind().clone() {
            TokenKind::Print => {
                let span = self.advance().span;
                let expr = self.parse_expr()?;
                Ok(Stmt::Print { expr, span })
            }
            TokenKind::Println => {
                let span = self.advance().span;
                let expr = self.parse_expr()?;
                Ok(Stmt::Println { expr, span })
            }
            TokenKind::Local => {
                self.advance();
                let name = self.expect_ident()?;
                self.expect(&TokenKind::Assign)?;
                let value = self.parse_expr()?;
                Ok(Stmt::LocalAssign { name, value })
            }
            TokenKind::If => self.parse_if(),
            TokenKind::While => self.parse_while(),
            TokenKind::For => self.parse_for(),
            TokenKind::Func => self.parse_func(),
            TokenKind::Ret => {
                let span = self.advance().span;
                let expr = self.parse_expr()?;
                Ok(Stmt::Ret { expr, span })
            }
            TokenKind::Ident(_) if *self.look_ahead(1) == TokenKind::Assign => {
                let name = self.expect_ident()?;
                self.expect(&TokenKind::Assign)?;
                let value = self.parse_expr()?;
                Ok(Stmt::Assign { name, value })
            }
            _ => {
                let expr = self.parse_expr()?;
                Ok(Stmt::Expr(expr))
            }
        }
    }

    /// Parse statements until one of the given terminators (not consumed).
    fn parse_block(&mut self, terminators: &[TokenKind]) -> Result<Vec<Stmt>, PinkyError> {
        let mut stmts = Vec::new();
        loop {
            if self.at_end() {
                return Err(self.error("unexpected end of input, expected 'end'"));
            }
            if terminators.iter().any(|t| self.check(t)) {
                return Ok(stmts);
            }
            stmts.push(self.parse_stmt()?);
        }
    }

    /// `if cond then … [elif cond then …]* [else …] end`
    fn parse_if(&mut self) -> Result<Stmt, PinkyError> {
        let span = self.expect(&TokenKind::If)?.span;
        let cond = self.parse_expr()?;
        self.expect(&TokenKind::Then)?;
        let then_body =
            self.parse_block(&[TokenKind::Elif, TokenKind::Else, TokenKind::End])?;

        let mut elifs = Vec::new();
        while self.check(&TokenKind::Elif) {
            let elif_span = self.advance().span;
            let elif_cond = self.parse_expr()?;
            self.expect(&TokenKind::Then)?;
            let body =
                self.parse_block(&[TokenKind::Elif, TokenKind::Else, TokenKind::End])?;
            elifs.push(ElifBranch {
                cond: elif_cond,
                body,
                span: elif_span,
            });
        }

        let else_body = if self.eat(&TokenKind::Else) {
            Some(self.parse_block(&[TokenKind::End])?)
        } else {
            None
        };
        self.expect(&TokenKind::End)?;

        Ok(Stmt::If {
            cond,
            then_body,
            elifs,
            else_body,
            span,
        })
    }

    /// `while cond do … end`
    fn parse_while(&mut self) -> Result<Stmt, PinkyError> {
        let span = self.expect(&TokenKind::While)?.span;
        let cond = self.parse_expr()?;
        self.expect(&TokenKind::Do)?;
        let body = self.parse_block(&[TokenKind::End])?;
        self.expect(&TokenKind::End)?;
        Ok(Stmt::While { cond, body, span })
    }

    /// `for i := start, stop[, step] do … end`
    fn parse_for(&mut self) -> Result<Stmt, PinkyError> {
        let span = self.expect(&TokenKind::For)?.span;
        let var = self.expect_ident()?;
        self.expect(&TokenKind::Assign)?;
        let start = self.parse_expr()?;
        self.expect(&TokenKind::Comma)?;
        let stop = self.parse_expr()?;
        let step = if self.eat(&TokenKind::Comma) {
            Some(self.parse_expr()?)
        } else {
            None
        };
        self.expect(&TokenKind::Do)?;
        let body = self.parse_block(&[TokenKind::End])?;
        self.expect(&TokenKind::End)?;
        Ok(Stmt::For {
            var,
            start,
            stop,
            step,
            body,
            span,
        })
    }

    /// `func name(p1, …, pn) … end`
    fn parse_func(&mut self) -> Result<Stmt, PinkyError> {
        let span = self.expect(&TokenKind::Func)?.span;
        let name = self.expect_ident()?;
        self.expect(&TokenKind::LParen)?;
        let mut params = Vec::new();
        if !self.check(&TokenKind::RParen) {
            loop {
                params.push(self.expect_ident()?);
                if !self.eat(&TokenKind::Comma) {
                    break;
                }
            }
        }
        self.expect(&TokenKind::RParen)?;
        let body = self.parse_block(&[TokenKind::End])?;
        self.expect(&TokenKind::End)?;
        Ok(Stmt::FuncDecl {
            name,
            params,
            body,
            span,
        })
    }
}
