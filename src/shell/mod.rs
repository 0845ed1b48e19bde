//! Shell execution engine: retry, fallback, and recovery around a single
//! mapped or scripted command.

pub mod executor;

pub use executor::{ExecutionOutcome, ShellEngine};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ShellError {
    #[error("no primary or fallback command configured for this mapping")]
    NoCommandConfigured,

    #[error("io error while executing command: {0}")]
    Io(#[from] std::io::Error),
}
