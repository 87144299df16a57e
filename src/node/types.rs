//! Node errors.

use thiserror::Error;

pub use crate::config::schema::NodeConfig;

#[derive(Debug, Error)]
pub enum NodeError {
    /// An endpoint URL from config could not be parsed.
    #[error("invalid node URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    /// Every configured endpoint failed or timed out.
    #[error("{method} failed on all {endpoints} node endpoint(s): {last}")]
    Unavailable {
        method: &'static str,
        endpoints: usize,
        last: String,
    },

    /// The node serves a different chain than configured.
    #[error("node serves chain {actual}, expected {expected}")]
    WrongChain { expected: u64, actual: u64 },

    /// Key loading or signing failed.
    #[error("account error: {0}")]
    Account(String),
}

pub type NodeResult<T> = Result<T, NodeError>;
