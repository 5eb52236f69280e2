//! The interpreter's error taxonomy.
//!
//! Lexing and parsing errors abort the current line; evaluation errors abort
//! the operation; in both cases the interpreter moves on to the next line
//! and the process exits non-zero at the end. Warnings are log events, not
//! errors.

use std::fmt;

use ravel_objects::ObjectError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum InterpError {
    #[error("lex error: {0}")]
    Lex(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("type error: {0}")]
    Type(String),

    #[error("plan error: {0}")]
    Plan(String),

    #[error("evaluation error: {0}")]
    Eval(#[from] ObjectError),

    #[error("unknown identifier `{0}`")]
    Ref(String),
}

/// An error pinned to its source line.
#[derive(Debug)]
pub struct LineError {
    pub line: usize,
    pub error: InterpError,
}

impl fmt::Display for LineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: {}", self.line, self.error)
    }
}

impl std::error::Error for LineError {}

pub type Result<T> = std::result::Result<T, InterpError>;
