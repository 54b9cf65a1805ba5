//! Core parser infrastructure: token cursor and error helpers.

use pinky_lexer::token::{Token, TokenKind};
use pinky_types::ast::Program;
use pinky_types::{PinkyError, Span};

/// The Pinky parser.
///
/// Consumes a token stream produced by the lexer and builds an AST.
/// Fails fast: the first syntax problem aborts the parse.
pub struct Parser {
    /// The token stream (ends with `Eof`).
    tokens: Vec<Token>,
    /// Current index into `tokens`.
    pos: usize,
}

impl Parser {
    /// Create a new parser from a token stream.
    pub fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, pos: 0 }
    }

    /// Parse a complete program.
    pub fn parse(mut self) -> Result<Program, PinkyError> {
        let mut stmts = Vec::new();
        while !self.at_end() {
            stmts.push(self.parse_stmt()?);
        }
        Ok(Program { stmts })
    }

    // ── Token cursor ─────────────────────────────────────────────────────

    /// Returns the current token without advancing.
    pub(crate) fn peek(&self) -> &Token {
        self.tokens.get(self.pos).unwrap_or_else(|| {
            self.tokens
                .last()
                .expect("token stream should end with Eof")
        })
    }

    /// Returns the kind of the current token.
    pub(crate) fn peek_kind(&self) -> &TokenKind {
        &self.peek().kind
    }

    /// Advance the cursor by one and return the consumed token.
    pub(crate) fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        token
    }

    /// Returns the span of the current token.
    pub(crate) fn current_span(&self) -> Span {
        self.peek().span
    }

    /// Returns `true` if the current token is `Eof`.
    pub(crate) fn at_end(&self) -> bool {
        matches!(self.peek_kind(), TokenKind::Eof)
    }

    /// Check if the current token matches the given kind exactly.
    pub(crate) fn check(&self, kind: &TokenKind) -> bool {
        self.peek_kind() == kind
    }

    /// If the current token matches, advance and return `true`.
    pub(crate) fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Look ahead by `n` tokens from the current position.
    pub(crate) fn look_ahead(&self, n: usize) -> &TokenKind {
        self.tokens
            .get(self.pos + n)
            .map(|t| &t.kind)
            .unwrap_or(&TokenKind::Eof)
    }

    // ── Expect helpers ───────────────────────────────────────────────────

    /// Expect a specific token kind, consuming it, or fail.
    pub(crate) fn expect(&mut self, expected: &TokenKind) -> Result<Token, PinkyError> {
        if self.check(expected) {
            Ok(self.advance())
        } else {
            Err(self.error(format!(
                "expected '{expected}', got '{}'",
                self.peek_kind()
            )))
        }
    }

    /// Expect an identifier, consuming it.
    pub(crate) fn expect_ident(&mut self) -> Result<pinky_types::ast::Ident, PinkyError> {
        match self.peek_kind().clone() {
            TokenKind::Ident(name) => {
                let token = self.advance();
                Ok(pinky_types::ast::Ident::new(name, token.span))
            }
            other => Err(self.error(format!("expected identifier, got '{other}'"))),
        }
    }

    /// Build a parse error at the current token.
    pub(crate) fn error(&self, message: impl Into<String>) -> PinkyError {
        PinkyError::parse(message, self.current_span())
    }
}
