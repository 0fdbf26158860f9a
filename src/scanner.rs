//! One-pass streaming lexer: raw source text in, flat token sequence out.
//!
//! The scanner never fails as a whole.  Unexpected characters and
//! unterminated strings are reported to the [`Diagnostics`] collector and
//! scanning continues with the next byte, so one pass can surface several
//! lexical errors.  The returned sequence is always terminated by exactly
//! one `EOF` token.
//!
//! Multi-character operators (`!=`, `==`, `<=`, `>=`) use maximal munch.
//! Line comments are discarded, string literals may span lines, numbers are
//! decimal `f64` with an optional fractional part, and keywords are looked
//! up in a compile-time perfect-hash map.

use log::{debug, info};
use memchr::memchr;
use phf::phf_map;

use crate::error::{Diagnostics, LoxError};
use crate::token::{Token, TokenType};

// Static keyword map (compile-time perfect hash).
static KEYWORDS: phf::Map<&'static str, TokenType> = phf_map! {
    "and"    => TokenType::AND,
    "class"  => TokenType::CLASS,
    "else"   => TokenType::ELSE,
    "false"  => TokenType::FALSE,
    "fun"    => TokenType::FUN,
    "for"    => TokenType::FOR,
    "if"     => TokenType::IF,
    "nil"    => TokenType::NIL,
    "or"     => TokenType::OR,
    "print"  => TokenType::PRINT,
    "return" => TokenType::RETURN,
    "super"  => TokenType::SUPER,
    "this"   => TokenType::THIS,
    "true"   => TokenType::TRUE,
    "var"    => TokenType::VAR,
    "while"  => TokenType::WHILE,
};

/// Single-pass scanner over one source string.
pub struct Scanner<'a> {
    source: &'a str,
    src: &'a [u8],  // byte view of `source` for O(1) peeking
    start: usize,   // index of the first byte of the current lexeme
    curr: usize,    // index one past the last byte examined
    line: usize,    // 1-based line counter ('\n' increments)
    tokens: Vec<Token>,
}

impl<'a> Scanner<'a> {
    /// Create a new scanner over `source`.
    #[inline]
    pub fn new(source: &'a str) -> Self {
        info!("Scanner created over {} bytes", source.len());

        Self {
            source,
            src: source.as_bytes(),
            start: 0,
            curr: 0,
            line: 1,
            tokens: Vec::new(),
        }
    }

    /// Scan the whole input, reporting errors to `diagnostics`.
    ///
    /// Always returns a token list ending in `EOF`, even when errors were
    /// reported along the way.
    pub fn scan_tokens(mut self, diagnostics: &mut Diagnostics) -> Vec<Token> {
        while !self.is_at_end() {
            self.start = self.curr;
            self.scan_token(diagnostics);
        }

        self.tokens.push(Token::new(TokenType::EOF, "", self.line));

        info!("Scanned {} tokens", self.tokens.len());

        self.tokens
    }

    // ───────────────────────── primitive helpers ────────────────────────

    #[inline(always)]
    fn is_at_end(&self) -> bool {
        self.curr >= self.src.len()
    }

    /// Advance one byte and return it.  Callers guard with [`is_at_end`].
    #[inline(always)]
    fn advance(&mut self) -> u8 {
        let b = self.src[self.curr];
        self.curr += 1;
        b
    }

    /// Peek at the current byte without consuming it.  Returns `0` past EOF
    /// to avoid branching at call-site.
    #[inline(always)]
    fn peek(&self) -> u8 {
        if self.is_at_end() {
            0
        } else {
            self.src[self.curr]
        }
    }

    /// Peek one byte beyond [`peek`].  Safe at EOF.
    #[inline(always)]
    fn peek_next(&self) -> u8 {
        if self.curr + 1 >= self.src.len() {
            0
        } else {
            self.src[self.curr + 1]
        }
    }

    /// Conditionally consume a byte **iff** it matches `expected`.
    #[inline(always)]
    fn match_byte(&mut self, expected: u8) -> bool {
        if !self.is_at_end() && self.peek() == expected {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Emit a token whose lexeme is `source[start..curr]`.
    fn add_token(&mut self, token_type: TokenType) {
        let lexeme = &self.source[self.start..self.curr];

        debug!("Scanned token ({:?}) on line {}", token_type, self.line);

        self.tokens.push(Token::new(token_type, lexeme, self.line));
    }

    // ───────────────────────── core lexing ─────────────────────────────

    /// Scan a single token starting at `self.start`.  Whitespace and
    /// comments emit nothing; errors are reported and skipped.
    fn scan_token(&mut self, diagnostics: &mut Diagnostics) {
        let b = self.advance();

        match b {
            // ── single-character punctuators ──────────────────────────────
            b'(' => self.add_token(TokenType::LEFT_PAREN),
            b')' => self.add_token(TokenType::RIGHT_PAREN),
            b'{' => self.add_token(TokenType::LEFT_BRACE),
            b'}' => self.add_token(TokenType::RIGHT_BRACE),
            b',' => self.add_token(TokenType::COMMA),
            b'.' => self.add_token(TokenType::DOT),
            b'-' => self.add_token(TokenType::MINUS),
            b'+' => self.add_token(TokenType::PLUS),
            b';' => self.add_token(TokenType::SEMICOLON),
            b'*' => self.add_token(TokenType::STAR),

            // ── two-character operators (maximal munch) ──────────────────
            b'!' => {
                let tt = if self.match_byte(b'=') {
                    TokenType::BANG_EQUAL
                } else {
                    TokenType::BANG
                };

                self.add_token(tt);
            }

            b'=' => {
                let tt = if self.match_byte(b'=') {
                    TokenType::EQUAL_EQUAL
                } else {
                    TokenType::EQUAL
                };

                self.add_token(tt);
            }

            b'<' => {
                let tt = if self.match_byte(b'=') {
                    TokenType::LESS_EQUAL
                } else {
                    TokenType::LESS
                };

                self.add_token(tt);
            }

            b'>' => {
                let tt = if self.match_byte(b'=') {
                    TokenType::GREATER_EQUAL
                } else {
                    TokenType::GREATER
                };

                self.add_token(tt);
            }

            // ── whitespace / newline ─────────────────────────────────────
            b' ' | b'\r' | b'\t' => {}

            b'\n' => {
                self.line += 1;
            }

            // ── comments (// … until newline) ────────────────────────────
            b'/' => {
                if self.match_byte(b'/') {
                    // Fast-forward to the next newline with `memchr`; the
                    // newline itself is left for the next scan_token call.
                    if let Some(pos) = memchr(b'\n', &self.src[self.curr..]) {
                        self.curr += pos;
                    } else {
                        self.curr = self.src.len();
                    }
                } else {
                    self.add_token(TokenType::SLASH);
                }
            }

            // ── string literal " … " ─────────────────────────────────────
            b'"' => self.scan_string(diagnostics),

            // ── number literal (digit-leading) ───────────────────────────
            b'0'..=b'9' => self.scan_number(),

            // ── identifiers / keywords ───────────────────────────────────
            b'a'..=b'z' | b'A'..=b'Z' | b'_' => self.scan_identifier(),

            // ── unexpected character ─────────────────────────────────────
            _ => {
                diagnostics.report(LoxError::lex(
                    self.line,
                    format!("Unexpected character: {}", b as char),
                ));
            }
        }
    }

    /// Scan a double-quoted string literal.  Strings may span lines; an
    /// unterminated string at EOF is reported, not fatal.
    fn scan_string(&mut self, diagnostics: &mut Diagnostics) {
        while !self.is_at_end() && self.peek() != b'"' {
            if self.advance() == b'\n' {
                self.line += 1;
            }
        }

        if self.is_at_end() {
            diagnostics.report(LoxError::lex(self.line, "Unterminated string."));
            return;
        }

        self.advance(); // closing quote

        // Literal value excludes the surrounding quotes.
        let value = self.source[self.start + 1..self.curr - 1].to_owned();

        self.add_token(TokenType::STRING(value));
    }

    /// Scan a numeric literal (`123`, `3.14`).  The fraction is optional
    /// and requires a digit after the dot, so `123.` scans as `123` `.`.
    fn scan_number(&mut self) {
        while self.peek().is_ascii_digit() {
            self.advance();
        }

        if self.peek() == b'.' && self.peek_next().is_ascii_digit() {
            self.advance(); // consume "."

            while self.peek().is_ascii_digit() {
                self.advance();
            }
        }

        let lexeme = &self.source[self.start..self.curr];
        let n: f64 = lexeme.parse().unwrap_or(0.0); // digits checked above

        self.add_token(TokenType::NUMBER(n));
    }

    /// Scan an identifier and decide whether it is a keyword.
    fn scan_identifier(&mut self) {
        while {
            let c: u8 = self.peek();
            c.is_ascii_alphanumeric() || c == b'_'
        } {
            self.advance();
        }

        let lexeme = &self.source[self.start..self.curr];

        let tt: TokenType = KEYWORDS.get(lexeme).cloned().unwrap_or(TokenType::IDENTIFIER);

        self.add_token(tt);
    }
}
