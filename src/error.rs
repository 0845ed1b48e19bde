//! The crate-wide error type.
//!
//! Every fallible module's own error converts into `MomError` via `#[from]`;
//! `cli::try_run` is the single place that collects one and decides the
//! process exit code.

use thiserror::Error;

/// Main error type that encompasses all possible errors in the system.
/// One variant per module error that `cli::try_run` can actually encounter,
/// plus `InvalidInput` for the CLI's own usage-validation failures.
#[derive(Debug, Error)]
pub enum MomError {
    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    #[error("Script discovery error: {0}")]
    Discovery(#[from] crate::discovery::DiscoveryError),

    #[error("Shell operation error: {0}")]
    Shell(#[from] crate::shell::ShellError),

    #[error("TOML serialization error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    #[error("Invalid input: {message}")]
    InvalidInput { message: String },
}

/// Result type alias for mom operations
pub type MomResult<T> = Result<T, MomError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_wraps_the_underlying_shell_error() {
        let shell_err = crate::shell::ShellError::NoCommandConfigured;
        let err = MomError::from(shell_err);
        assert!(err.to_string().starts_with("Shell operation error:"));
    }

    #[test]
    fn invalid_input_formats_its_message() {
        let err = MomError::InvalidInput { message: "bad verb".to_string() };
        assert_eq!(err.to_string(), "Invalid input: bad verb");
    }
}
