//! Error types for the interpreter.
//!
//! Lex and parse failures surface before a run starts; runtime errors are
//! fatal to the current run and reported once through the host boundary.

use std::fmt;
use thiserror::Error;

/// Result type for runtime operations.
pub type Result<T> = std::result::Result<T, RuntimeError>;

/// A malformed token in one source line.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LexError {
    #[error("unterminated string literal")]
    UnterminatedString,
    #[error("unrecognized character {0:?}")]
    UnrecognizedChar(char),
}

/// A grammar violation, located at a source line when one is known.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub struct ParseError {
    pub line: Option<u16>,
    pub reason: String,
}

impl ParseError {
    /// A parse failure at a numbered line.
    pub fn at(line: u16, reason: impl Into<String>) -> Self {
        Self {
            line: Some(line),
            reason: reason.into(),
        }
    }

    /// A parse failure before the line number is known.
    pub fn unnumbered(reason: impl Into<String>) -> Self {
        Self {
            line: None,
            reason: reason.into(),
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.line {
            Some(line) => write!(f, "line {}: {}", line, self.reason),
            None => write!(f, "{}", self.reason),
        }
    }
}

/// Errors a running BASIC program can raise.
///
/// Display text matches the classic interpreter messages; the run loop
/// prefixes `?` and appends ` ERROR IN LINE n` when reporting.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuntimeError {
    #[error("TYPE MISMATCH")]
    TypeMismatch,
    #[error("NEXT WITHOUT FOR")]
    NextWithoutFor,
    #[error("WEND WITHOUT WHILE")]
    WendWithoutWhile,
    #[error("WHILE WITHOUT WEND")]
    WhileWithoutWend,
    #[error("RETURN WITHOUT GOSUB")]
    ReturnWithoutGosub,
    #[error("OUT OF DATA")]
    OutOfData,
    #[error("BAD SUBSCRIPT")]
    Subscript,
    #[error("REDIMENSIONED ARRAY")]
    Redimension,
    #[error("DIVISION BY ZERO")]
    DivisionByZero,
    #[error("ILLEGAL QUANTITY")]
    IllegalQuantity,
    #[error("UNDEFINED FUNCTION {0}")]
    UnknownFunction(String),
    #[error("WRONG ARGUMENT COUNT")]
    Arity,
    #[error("UNDEFINED LINE {0}")]
    UndefinedLine(u16),
}

/// Umbrella error for loading and running a program.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error("{0}")]
    Lex(#[from] LexError),
    #[error("{0}")]
    Parse(#[from] ParseError),
    #[error("{0}")]
    Runtime(#[from] RuntimeError),
}
