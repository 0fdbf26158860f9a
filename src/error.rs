//! Centralised error hierarchy and diagnostic collector for the interpreter.
//!
//! All pipeline stages (scanner, parser, resolver, evaluator) convert their
//! failure modes into a [`LoxError`] and hand it to a [`Diagnostics`]
//! collector owned by the caller.  This enables a uniform `Result<T>` alias
//! throughout the crate and ergonomic inter-operation with `anyhow` at the
//! binary edge, while still preserving rich diagnostic detail.
//!
//! The module **does not** print diagnostics itself: the CLI renders the
//! collected errors and picks the process exit code.

use log::info;
use thiserror::Error;

use crate::token::{Token, TokenType};

/// Canonical error type used throughout the interpreter.
#[derive(Debug, Clone, Error)]
#[non_exhaustive]
pub enum LoxError {
    /// Lexical (scanner) error with source line information.
    #[error("[line {line}] Error: {message}")]
    Lex {
        /// Human-readable description.
        message: String,

        /// 1-based line where the error occurred.
        line: usize,
    },

    /// Syntactic (parser) error, anchored at an offending token.
    #[error("[line {line}] Error{location}: {message}")]
    Parse {
        message: String,
        line: usize,

        /// ` at 'lexeme'`, or ` at end` for the EOF token.
        location: String,
    },

    /// Static-analysis (resolver) failure: scope or context misuse.
    #[error("[line {line}] Error{location}: {message}")]
    Resolve {
        message: String,
        line: usize,
        location: String,
    },

    /// Runtime evaluation error.  Halts interpretation.
    #[error("{message}\n[line {line}]")]
    Runtime { message: String, line: usize },
}

/// Renders the ` at '…'` suffix used by parse and resolve diagnostics.
fn locate(token: &Token) -> String {
    if token.token_type == TokenType::EOF {
        " at end".to_string()
    } else {
        format!(" at '{}'", token.lexeme)
    }
}

impl LoxError {
    /// Helper constructor for the **scanner**.
    pub fn lex<S: Into<String>>(line: usize, msg: S) -> Self {
        let message: String = msg.into();

        info!("Creating Lex error: line={}, msg={}", line, message);

        LoxError::Lex { message, line }
    }

    /// Helper constructor for the **parser**.
    pub fn parse<S: Into<String>>(token: &Token, msg: S) -> Self {
        let message: String = msg.into();

        info!("Creating Parse error: line={}, msg={}", token.line, message);

        LoxError::Parse {
            message,
            line: token.line,
            location: locate(token),
        }
    }

    /// Helper constructor for the **resolver**.
    pub fn resolve<S: Into<String>>(token: &Token, msg: S) -> Self {
        let message: String = msg.into();

        info!("Creating Resolve error: line={}, msg={}", token.line, message);

        LoxError::Resolve {
            message,
            line: token.line,
            location: locate(token),
        }
    }

    /// Helper constructor for the **evaluator**.
    pub fn runtime<S: Into<String>>(token: &Token, msg: S) -> Self {
        let message: String = msg.into();

        info!("Creating Runtime error: line={}, msg={}", token.line, message);

        LoxError::Runtime {
            message,
            line: token.line,
        }
    }
}

/// Crate-wide `Result` alias.
pub type Result<T> = std::result::Result<T, LoxError>;

/// Collects every error reported during one interpreter session.
///
/// Scanner, parser, and resolver keep going after reporting, so a single
/// pass can surface multiple independent errors; the evaluator reports at
/// most one.  The two flags gate execution (any static error suppresses it)
/// and drive the conventional exit codes (65 vs. 70) at the CLI.
#[derive(Debug, Default)]
pub struct Diagnostics {
    errors: Vec<LoxError>,
    had_error: bool,
    had_runtime_error: bool,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an error, updating the stage flags.
    pub fn report(&mut self, error: LoxError) {
        match error {
            LoxError::Runtime { .. } => self.had_runtime_error = true,
            _ => self.had_error = true,
        }

        self.errors.push(error);
    }

    /// All errors reported so far, in order.
    pub fn errors(&self) -> &[LoxError] {
        &self.errors
    }

    /// Did any scan/parse/resolve error occur?
    pub fn had_error(&self) -> bool {
        self.had_error
    }

    /// Did a runtime error occur?
    pub fn had_runtime_error(&self) -> bool {
        self.had_runtime_error
    }

    /// Clear collected errors and flags between interactive submissions.
    pub fn reset(&mut self) {
        info!("Resetting diagnostics ({} stale errors)", self.errors.len());

        self.errors.clear();
        self.had_error = false;
        self.had_runtime_error = false;
    }
}
