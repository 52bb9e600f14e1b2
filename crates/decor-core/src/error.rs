use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::descriptor::CommandKind;

/// A descriptor's variant has no registered executor.
///
/// This is a configuration error and aborts the whole run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unsupported command: no executor registered for '{kind}'")]
pub struct UnsupportedCommandError {
    pub kind: CommandKind,
}

impl UnsupportedCommandError {
    pub fn new(kind: CommandKind) -> Self {
        Self { kind }
    }
}

/// Errors reported by leaf executors.
///
/// The phase executor records these as a Failed outcome for the descriptor.
#[derive(Debug, Error)]
pub enum ExecutionError {
    #[error("{0}")]
    Failed(String),

    #[error("Timed out after {after_ms} ms: {message}")]
    Timeout { after_ms: u64, message: String },

    #[error("Missing {field} for {kind}")]
    MissingField {
        kind: CommandKind,
        field: &'static str,
    },

    #[error("No command configured for {0}")]
    NotConfigured(CommandKind),

    #[error("IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

impl ExecutionError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ExecutionError::Io {
            path: path.into(),
            source,
        }
    }

    pub fn timeout(after: Duration, message: impl Into<String>) -> Self {
        ExecutionError::Timeout {
            after_ms: after.as_millis() as u64,
            message: message.into(),
        }
    }

    /// Returns true if a wait exceeded its timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self, ExecutionError::Timeout { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsupported_message_names_kind() {
        let err = UnsupportedCommandError::new(CommandKind::EtlRun);
        assert!(err.to_string().contains("etl-run"));
    }

    #[test]
    fn test_timeout_is_execution_error() {
        let err = ExecutionError::timeout(Duration::from_millis(1500), "service MyService");
        assert!(err.is_timeout());
        assert_eq!(err.to_string(), "Timed out after 1500 ms: service MyService");
        assert!(!ExecutionError::Failed("boom".to_string()).is_timeout());
    }
}
