use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::descriptor::{Command as DeclaredCommand, CommandKind, Descriptor, ProcessRun};
use crate::dispatch::CommandExecutor;
use crate::error::ExecutionError;

/// Launches executables.
///
/// A timeout of 0 starts the process and returns immediately. Otherwise the
/// process must exit successfully within the timeout or it is killed.
#[derive(Debug, Default)]
pub struct ProcessExecutor;

impl ProcessExecutor {
    pub fn new() -> Self {
        Self
    }

    async fn run(&self, cmd: &ProcessRun, timeout_ms: u64) -> Result<(), ExecutionError> {
        let args = split_arguments(cmd.argument.as_deref())?;

        let mut command = Command::new(&cmd.full_path);
        command
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());

        let mut child = command.spawn().map_err(|source| ExecutionError::Spawn {
            program: cmd.full_path.clone(),
            source,
        })?;

        if timeout_ms == 0 {
            debug!(program = %cmd.full_path, pid = ?child.id(), "process started without waiting");
            return Ok(());
        }

        let limit = Duration::from_millis(timeout_ms);
        let status = match tokio::time::timeout(limit, child.wait()).await {
            Ok(status) => status.map_err(|source| ExecutionError::Spawn {
                program: cmd.full_path.clone(),
                source,
            })?,
            Err(_) => {
                warn!(program = %cmd.full_path, timeout_ms, "process exceeded timeout, killing");
                if let Err(e) = child.kill().await {
                    warn!(program = %cmd.full_path, error = %e, "failed to kill process");
                }
                return Err(ExecutionError::timeout(limit, cmd.full_path.clone()));
            }
        };

        if status.success() {
            Ok(())
        } else {
            Err(ExecutionError::Failed(format!(
                "{} exited with {}",
                cmd.full_path,
                status
                    .code()
                    .map_or_else(|| "signal".to_string(), |c| c.to_string())
            )))
        }
    }
}

/// Splits an argument line the way a POSIX shell would, honouring quotes.
fn split_arguments(argument: Option<&str>) -> Result<Vec<String>, ExecutionError> {
    let Some(argument) = argument else {
        return Ok(Vec::new());
    };
    shell_words::split(argument)
        .map_err(|e| ExecutionError::Failed(format!("invalid argument '{argument}': {e}")))
}

#[async_trait]
impl CommandExecutor for ProcessExecutor {
    fn name(&self) -> &'static str {
        "process"
    }

    fn supported_kinds(&self) -> &[CommandKind] {
        &[CommandKind::ProcessRun]
    }

    async fn execute(&self, descriptor: &Descriptor) -> Result<(), ExecutionError> {
        match &descriptor.command {
            DeclaredCommand::ProcessRun(cmd) => self.run(cmd, descriptor.timeout_ms()).await,
            other => Err(ExecutionError::Failed(format!(
                "process executor cannot run {}",
                other.kind()
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quoted_argument_stays_whole() {
        let args = split_arguments(Some(r#"-f "My File.csv""#)).unwrap();
        assert_eq!(args, vec!["-f", "My File.csv"]);
    }

    #[test]
    fn test_no_argument() {
        assert!(split_arguments(None).unwrap().is_empty());
        assert!(split_arguments(Some("  ")).unwrap().is_empty());
    }

    #[test]
    fn test_unterminated_quote_fails() {
        let err = split_arguments(Some("-f \"open")).unwrap_err();
        assert!(err.to_string().contains("invalid argument"));
    }
}
