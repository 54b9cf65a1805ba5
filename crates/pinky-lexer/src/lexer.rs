//! Core Pinky lexer — converts source text to a token stream.
//!
//! - Newlines are plain whitespace; the grammar is self-delimiting.
//! - `--` starts a comment running to end of line.
//! - Strings are delimited by `"` or `'`, carry no escape sequences and may
//!   not span lines.
//! - Fails fast: the first lexical problem aborts the scan.

use pinky_types::{PinkyError, SourceFile, Span};

use crate::token::{Token, TokenKind};

/// The Pinky lexer.
pub struct Lexer<'src> {
    /// The full source text as bytes.
    source: &'src [u8],
    /// Current byte offset into `source`.
    pos: usize,
    /// Current line number (1-based).
    line: u32,
    /// Current column number (1-based).
    col: u32,
}

impl<'src> Lexer<'src> {
    /// Create a new lexer for the given source file.
    pub fn new(source_file: &'src SourceFile) -> Self {
        Self {
            source: source_file.source.as_bytes(),
            pos: 0,
            line: 1,
            col: 1,
        }
    }

    /// Lex the entire source into a token stream ending with [`TokenKind::Eof`].
    pub fn lex(mut self) -> Result<Vec<Token>, PinkyError> {
        let mut tokens = Vec::new();
        loop {
            let token = self.scan_token()?;
            let is_eof = token.kind == TokenKind::Eof;
            tokens.push(token);
            if is_eof {
                break;
            }
        }
        Ok(tokens)
    }

    // ── Character-level helpers ──────────────────────────────────────────

    fn peek(&self) -> Option<u8> {
        self.source.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.source.get(self.pos + offset).copied()
    }

    fn advance(&mut self) -> Option<u8> {
        let ch = self.source.get(self.pos).copied()?;
        self.pos += 1;
        if ch == b'\n' {
            self.line += 1;
            self.col = 1;
        } else {
            self.col += 1;
        }
        Some(ch)
    }

    /// Skip whitespace (including newlines) and `--` comments.
    fn skip_trivia(&mut self) {
        loop {
            match self.peek() {
                Some(b' ') | Some(b'\t') | Some(b'\r') | Some(b'\n') => {
                    self.advance();
                }
                Some(b'-') if self.peek_at(1) == Some(b'-') => {
                    while let Some(ch) = self.peek() {
                        if ch == b'\n' {
                            break;
                        }
                        self.advance();
                    }
                }
                _ => break,
            }
        }
    }

    // ── Token scanning ───────────────────────────────────────────────────

    fn scan_token(&mut self) -> Result<Token, PinkyError> {
        self.skip_trivia();

        let line = self.line;
        let col = self.col;
        let start = self.pos;

        let ch = match self.advance() {
            Some(ch) => ch,
            None => return Ok(Token::new(TokenKind::Eof, Span::point(line, col))),
        };

        let kind = match ch {
            b'+' => TokenKind::Plus,
            b'-' => TokenKind::Minus,
            b'*' => TokenKind::Star,
            b'/' => TokenKind::Slash,
            b'%' => TokenKind::Percent,
            b'^' => TokenKind::Caret,
            b'(' => TokenKind::LParen,
            b')' => TokenKind::RParen,
            b',' => TokenKind::Comma,
            b'~' => {
                if self.peek() == Some(b'=') {
                    self.advance();
                    TokenKind::NotEq
                } else {
                    TokenKind::Tilde
                }
            }
            b'<' => {
                if self.peek() == Some(b'=') {
                    self.advance();
                    TokenKind::Le
                } else {
                    TokenKind::Lt
                }
            }
            b'>' => {
                if self.peek() == Some(b'=') {
                    self.advance();
                    TokenKind::Ge
                } else {
                    TokenKind::Gt
                }
            }
            b'=' => {
                if self.peek() == Some(b'=') {
                    self.advance();
                    TokenKind::EqEq
                } else {
                    return Err(PinkyError::token(
                        "unexpected character '=' (assignment is ':=')",
                        Span::new(line, col, 1),
                    ));
                }
            }
            b':' => {
                if self.peek() == Some(b'=') {
                    self.advance();
                    TokenKind::Assign
                } else {
                    return Err(PinkyError::token(
                        "unexpected character ':'",
                        Span::new(line, col, 1),
                    ));
                }
            }
            b'"' | b'\'' => return self.scan_string(ch, line, col),
            b'0'..=b'9' => return self.scan_number(start, line, col),
            b'a'..=b'z' | b'A'..=b'Z' | b'_' => return Ok(self.scan_word(start, line, col)),
            other => {
                return Err(PinkyError::token(
                    format!("unexpected character '{}'", other as char),
                    Span::new(line, col, 1),
                ));
            }
        };

        let len = (self.pos - start) as u32;
        Ok(Token::new(kind, Span::new(line, col, len)))
    }

    /// Scan a string literal. The opening quote has been consumed.
    fn scan_string(&mut self, quote: u8, line: u32, col: u32) -> Result<Token, PinkyError> {
        let content_start = self.pos;
        loop {
            match self.peek() {
                None | Some(b'\n') => {
                    return Err(PinkyError::token(
                        "unterminated string literal",
                        Span::new(line, col, (self.pos - content_start + 1) as u32),
                    ));
                }
                Some(ch) if ch == quote => {
                    let text = std::str::from_utf8(&self.source[content_start..self.pos])
                        .expect("source text is valid UTF-8")
                        .to_string();
                    self.advance();
                    let len = (text.len() + 2) as u32;
                    return Ok(Token::new(TokenKind::Str(text), Span::new(line, col, len)));
                }
                Some(_) => {
                    self.advance();
                }
            }
        }
    }

    /// Scan a number literal. The first digit has been consumed.
    fn scan_number(&mut self, start: usize, line: u32, col: u32) -> Result<Token, PinkyError> {
        while matches!(self.peek(), Some(b'0'..=b'9')) {
            self.advance();
        }
        if self.peek() == Some(b'.') && matches!(self.peek_at(1), Some(b'0'..=b'9')) {
            self.advance();
            while matches!(self.peek(), Some(b'0'..=b'9')) {
                self.advance();
            }
        }
        let text = std::str::from_utf8(&self.source[start..self.pos])
            .expect("digits are valid UTF-8");
        let value: f64 = text.parse().map_err(|_| {
            PinkyError::token(
                format!("invalid number literal '{text}'"),
                Span::new(line, col, text.len() as u32),
            )
        })?;
        Ok(Token::new(
            TokenKind::Number(value),
            Span::new(line, col, text.len() as u32),
        ))
    }

    /// Scan an identifier or keyword. The first character has been consumed.
    fn scan_word(&mut self, start: usize, line: u32, col: u32) -> Token {
        while matches!(
            self.peek(),
            Some(b'a'..=b'z') | Some(b'A'..=b'Z') | Some(b'0'..=b'9') | Some(b'_')
        ) {
            self.advance();
        }
        let text = std::str::from_utf8(&self.source[start..self.pos])
            .expect("identifier bytes are valid UTF-8");
        let span = Span::new(line, col, text.len() as u32);
        match TokenKind::keyword(text) {
            Some(kind) => Token::new(kind, span),
            None => Token::new(TokenKind::Ident(text.to_string()), span),
        }
    }
}
