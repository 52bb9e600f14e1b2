//! Configured external commands with placeholders.

use std::process::{Output, Stdio};
use std::time::Duration;

use tokio::process::Command;
use tracing::debug;

use crate::error::ExecutionError;

/// An argv template such as `["psql", "{connection}", "-f", "{file}"]`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandTemplate {
    argv: Vec<String>,
}

impl CommandTemplate {
    pub fn new(argv: Vec<String>) -> Self {
        Self { argv }
    }

    /// Returns true if the template names a program.
    pub fn is_configured(&self) -> bool {
        self.argv.first().is_some_and(|program| !program.trim().is_empty())
    }

    /// Substitutes `{key}` placeholders, returning the program and its arguments.
    pub fn render(&self, values: &[(&str, &str)]) -> Option<(String, Vec<String>)> {
        if !self.is_configured() {
            return None;
        }

        let mut rendered = self.argv.iter().map(|arg| {
            values.iter().fold(arg.clone(), |acc, (key, value)| {
                acc.replace(&format!("{{{key}}}"), value)
            })
        });

        let program = rendered.next()?;
        Some((program, rendered.collect()))
    }
}

/// Runs `program` to completion and captures its output.
///
/// A `timeout_ms` of 0 waits without limit. On timeout the child is killed.
pub(crate) async fn run_to_completion(
    program: &str,
    args: &[String],
    timeout_ms: u64,
) -> Result<Output, ExecutionError> {
    debug!(program, ?args, timeout_ms, "running external command");

    let mut command = Command::new(program);
    command
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let child = command.spawn().map_err(|source| ExecutionError::Spawn {
        program: program.to_string(),
        source,
    })?;

    let output = if timeout_ms == 0 {
        child.wait_with_output().await
    } else {
        let limit = Duration::from_millis(timeout_ms);
        match tokio::time::timeout(limit, child.wait_with_output()).await {
            Ok(result) => result,
            Err(_) => return Err(ExecutionError::timeout(limit, program.to_string())),
        }
    };

    output.map_err(|source| ExecutionError::Spawn {
        program: program.to_string(),
        source,
    })
}

/// Turns a nonzero exit into an [`ExecutionError::Failed`].
pub(crate) fn ensure_success(program: &str, output: &Output) -> Result<(), ExecutionError> {
    if output.status.success() {
        return Ok(());
    }

    let stderr = String::from_utf8_lossy(&output.stderr);
    let detail = stderr.trim();
    let code = output
        .status
        .code()
        .map_or_else(|| "signal".to_string(), |c| c.to_string());

    Err(ExecutionError::Failed(if detail.is_empty() {
        format!("{program} exited with {code}")
    } else {
        format!("{program} exited with {code}: {detail}")
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn template(argv: &[&str]) -> CommandTemplate {
        CommandTemplate::new(argv.iter().map(|s| s.to_string()).collect())
    }

    #[test]
    fn test_render_substitutes_placeholders() {
        let t = template(&["sqlcmd", "-S", "{connection}", "-Q", "TRUNCATE TABLE {table}"]);
        let (program, args) = t
            .render(&[("connection", "local"), ("table", "Users")])
            .unwrap();
        assert_eq!(program, "sqlcmd");
        assert_eq!(args, vec!["-S", "local", "-Q", "TRUNCATE TABLE Users"]);
    }

    #[test]
    fn test_unconfigured_template() {
        assert!(!CommandTemplate::default().is_configured());
        assert!(template(&[" "]).render(&[]).is_none());
    }

    #[test]
    fn test_unknown_placeholder_is_left_alone() {
        let t = template(&["run", "{other}"]);
        let (_, args) = t.render(&[("table", "Users")]).unwrap();
        assert_eq!(args, vec!["{other}"]);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_nonzero_exit_fails() {
        let output = run_to_completion("sh", &["-c".to_string(), "echo nope >&2; exit 3".to_string()], 0)
            .await
            .unwrap();
        let err = ensure_success("sh", &output).unwrap_err();
        assert_eq!(err.to_string(), "sh exited with 3: nope");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_timeout_kills_child() {
        let err = run_to_completion("sleep", &["5".to_string()], 50).await.unwrap_err();
        assert!(err.is_timeout());
    }
}
