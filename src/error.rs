//! Error types for agent construction and weight persistence.
//!
//! Both kinds are fatal for the agent that raised them: a misconfigured agent
//! is never built, and a weight table is never left half-loaded.

use std::path::PathBuf;

use thiserror::Error;

/// Invalid agent configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid name: {0}")]
    InvalidName(String),

    #[error("invalid role: {0}")]
    InvalidRole(String),

    #[error("unknown agent: {0}")]
    UnknownAgent(String),

    #[error("invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },

    #[error("malformed option: {0}")]
    Malformed(String),

    #[error(transparent)]
    Weights(#[from] WeightError),
}

/// Failure to read or write a weight file.
#[derive(Debug, Error)]
pub enum WeightError {
    #[error("cannot access weight file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("weight file has {found} tables, expected {expected}")]
    TableCount { expected: usize, found: usize },

    #[error("weight table {index} has {found} entries, expected {expected}")]
    TableSize {
        index: usize,
        expected: usize,
        found: usize,
    },
}
