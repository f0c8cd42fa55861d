//! Error types for GitHub gateway operations.

use crate::gateway::Operation;
use std::time::Duration;

/// Result type for gateway operations.
pub type GatewayResult<T> = Result<T, GatewayError>;

/// Failure of a single command execution, before it is attributed to an operation.
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    /// `gh auth status` reported no usable session.
    #[error("GitHub CLI is not authenticated. Run `gh auth login` to authenticate, then retry")]
    NotAuthenticated,

    /// An identifier failed the allowed-character check.
    #[error("Invalid input format: {0:?}")]
    InvalidInput(String),

    /// The executable could not be started at all.
    #[error("Failed to launch {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// Waiting on the child or reading its output failed.
    #[error("Failed to collect output of {program}: {source}")]
    Io {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The command ran longer than the configured timeout and was killed.
    #[error("Command timed out after {0:?}")]
    Timeout(Duration),

    /// The command exited with a non-zero status.
    #[error("{}", failure_message(.code, .stderr))]
    Failed { code: Option<i32>, stderr: String },

    /// Standard output exceeded the configured ceiling.
    #[error("Command output exceeded {limit} bytes")]
    OutputTooLarge { limit: usize },

    /// Standard output was not valid UTF-8.
    #[error("Command output is not valid UTF-8")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),
}

fn failure_message(code: &Option<i32>, stderr: &str) -> String {
    let stderr = stderr.trim();
    match (*code, stderr.is_empty()) {
        (Some(code), true) => format!("Command exited with status {}", code),
        (None, true) => "Command terminated by signal".to_string(),
        (_, false) => stderr.to_string(),
    }
}

/// A command failure attributed to the gateway operation that caused it.
#[derive(Debug, thiserror::Error)]
#[error("Failed to {}: {source}", .operation.failure_label())]
pub struct GatewayError {
    pub operation: Operation,
    #[source]
    pub source: CommandError,
}

impl GatewayError {
    pub fn new(operation: Operation, source: CommandError) -> Self {
        Self { operation, source }
    }

    /// The caller has to authenticate out-of-band before retrying.
    pub fn is_auth_error(&self) -> bool {
        matches!(self.source, CommandError::NotAuthenticated)
    }

    /// The request was rejected before any command ran.
    pub fn is_invalid_input(&self) -> bool {
        matches!(self.source, CommandError::InvalidInput(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_prefix() {
        let err = GatewayError::new(
            Operation::MergePr,
            CommandError::Failed {
                code: Some(1),
                stderr: "Pull request is not mergeable\n".to_string(),
            },
        );

        assert_eq!(
            err.to_string(),
            "Failed to merge PR: Pull request is not mergeable"
        );
    }

    #[test]
    fn test_auth_error_mentions_login() {
        let err = GatewayError::new(Operation::GetPrInfo, CommandError::NotAuthenticated);

        assert!(err.is_auth_error());
        assert!(err.to_string().starts_with("Failed to get PR info: "));
        assert!(err.to_string().contains("gh auth login"));
    }

    #[test]
    fn test_failed_without_stderr() {
        let err = CommandError::Failed {
            code: Some(4),
            stderr: "  ".to_string(),
        };
        assert_eq!(err.to_string(), "Command exited with status 4");

        let err = CommandError::Failed {
            code: None,
            stderr: String::new(),
        };
        assert_eq!(err.to_string(), "Command terminated by signal");
    }

    #[test]
    fn test_invalid_input_names_value() {
        let err = GatewayError::new(
            Operation::ListIssues,
            CommandError::InvalidInput("acme; rm -rf /".to_string()),
        );

        assert!(err.is_invalid_input());
        assert_eq!(
            err.to_string(),
            "Failed to list issues: Invalid input format: \"acme; rm -rf /\""
        );
    }
}
