//! error — typed error taxonomy for the MALH engine.
//!
//! Library functions return `Result<T, MalhError>`. Callers that want
//! free-form context (the CLI layer, mostly) convert via `?` into
//! `anyhow::Error`, which picks up the `std::error::Error` impl
//! `thiserror` derives and lets `.context(...)` add path/operation
//! detail on top.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum MalhError {
    #[error("I/O failure: {0}")]
    IoFailure(#[from] std::io::Error),

    #[error("malformed tuple (expected {expected} fields): {line:?}")]
    MalformedTuple { line: String, expected: usize },

    #[error("malformed query (expected {expected} terms): {query:?}")]
    MalformedQuery { query: String, expected: usize },

    #[error("malformed choice vector {descriptor:?}: {reason}")]
    MalformedChoiceVector { descriptor: String, reason: String },

    #[error("tuple too large ({len} bytes, max {max})")]
    OversizedTuple { len: usize, max: usize },

    #[error("relation {name:?} already exists")]
    RelationExists { name: String },

    #[error("relation {name:?} not found")]
    RelationMissing { name: String },

    #[error("invalid configuration: {reason}")]
    InvalidConfiguration { reason: String },
}

pub type Result<T> = std::result::Result<T, MalhError>;
