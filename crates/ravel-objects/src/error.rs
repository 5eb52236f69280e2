//! Error types for the object kernels.

use thiserror::Error;

/// Depth cap for recursive descent over expression trees.
pub const DEPTH_LIMIT: usize = 512;

/// State cap for subset constructions and product automata.
pub const STATE_LIMIT: usize = 1 << 14;

/// Term cap for monoid construction.
pub const MONOID_TERM_LIMIT: usize = 10_000;

#[derive(Debug, Error)]
pub enum ObjectError {
    #[error("cannot parse regular expression at position {pos}: {reason}")]
    RegexParse { pos: usize, reason: String },

    #[error("expression nesting exceeds the depth limit of {limit}")]
    TooDeep { limit: usize },

    #[error("construction exceeded the state limit of {limit}")]
    StateLimit { limit: usize },

    #[error("monoid construction exceeded the term limit of {limit}")]
    MonoidLimit { limit: usize },

    #[error("the empty language has no regular expression")]
    EmptyLanguage,

    #[error("cannot read rewrite rules from {path}: {source}")]
    RuleFile {
        path: String,
        source: std::io::Error,
    },

    #[error("malformed rewrite rule on line {line}")]
    RuleSyntax { line: usize },
}

pub type Result<T> = std::result::Result<T, ObjectError>;
