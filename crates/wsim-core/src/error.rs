//! Framework error type.
//!
//! Sub-crates define their own error enums and either convert into `WsimError`
//! via `From` impls or wrap it as one variant.  Both patterns are acceptable;
//! prefer whichever keeps error sites clean.

use thiserror::Error;

use crate::NodeId;

/// The top-level error type for `wsim-core` and a common base for sub-crates.
#[derive(Debug, Error)]
pub enum WsimError {
    #[error("node {0} not found")]
    NodeNotFound(NodeId),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Shorthand result type for all `wsim-*` crates.
pub type WsimResult<T> = Result<T, WsimError>;
