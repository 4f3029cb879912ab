//! Crate-wide error type.
//!
//! Every fallible operation in this crate funnels into [`Error`], whose
//! variants name the error *kinds* described in the engine's design
//! rather than the individual types that produce them, following the
//! shape of `oxide_orm::error::OrmError` and `oxide_migrate::error::MigrateError`.

use crate::lexer::LexError;
use crate::parser::ParseError;

/// All ways a statement can fail to lex, parse, or execute.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Malformed number or operator at the character level.
    #[error("lex error: {0}")]
    Lex(#[from] LexError),

    /// Unexpected token or premature end of input.
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    /// Unknown table, unknown column, or a duplicate name.
    #[error("name error: {0}")]
    Name(String),

    /// Missing/duplicate primary key, bad foreign-key target, illegal ALTER.
    #[error("schema error: {0}")]
    Schema(String),

    /// A value failed to parse into its declared type, or two
    /// incompatible types were compared.
    #[error("type error: {0}")]
    Type(String),

    /// NOT_NULL/UNIQUE/PRIMARY_KEY breach, or a foreign-key value with
    /// no match in the referenced table.
    #[error("constraint violation: {0}")]
    Constraint(String),

    /// A statement used an operator or query kind the engine doesn't
    /// implement.
    #[error("unsupported: {0}")]
    Unsupported(String),
}

/// Shorthand used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
