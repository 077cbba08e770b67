// src/error.rs
//! The crate-wide error type,
use thiserror::Error;

/// Every way a parse, CFG build, or analysis pass over a function can fail.
#[derive(Debug, Error)]
pub enum TacmirError {
    #[error("parse error at line {line}: {message}")]
    Parse { message: String, line: usize },

    #[error("CFG construction failed for function `{function}`: {message}")]
    CfgConstruction { function: String, message: String },

    #[error("evaluation error: {message}")]
    Evaluation { message: String },

    #[error("SSA inconsistency: {message}")]
    SsaInconsistency { message: String },

    #[error("unimplemented: {0}")]
    Unimplemented(&'static str),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
