use async_trait::async_trait;

use super::data::require_connection;
use super::template::{ensure_success, run_to_completion, CommandTemplate};
use crate::config::BatchConfig;
use crate::descriptor::{Command, CommandKind, Descriptor};
use crate::dispatch::CommandExecutor;
use crate::error::ExecutionError;

/// Runs script files against a data source.
#[derive(Debug, Clone, Default)]
pub struct BatchExecutor {
    run: CommandTemplate,
}

impl BatchExecutor {
    pub fn from_config(config: &BatchConfig) -> Self {
        Self {
            run: CommandTemplate::new(config.run.clone()),
        }
    }
}

#[async_trait]
impl CommandExecutor for BatchExecutor {
    fn name(&self) -> &'static str {
        "batch"
    }

    fn supported_kinds(&self) -> &[CommandKind] {
        &[CommandKind::BatchRun]
    }

    async fn execute(&self, descriptor: &Descriptor) -> Result<(), ExecutionError> {
        let Command::BatchRun(cmd) = &descriptor.command else {
            return Err(ExecutionError::Failed(format!(
                "batch executor cannot run {}",
                descriptor.kind()
            )));
        };

        let connection = require_connection(CommandKind::BatchRun, cmd.connection_string.as_deref())?;
        if !tokio::fs::try_exists(&cmd.full_path).await.unwrap_or(false) {
            return Err(ExecutionError::Failed(format!(
                "batch file not found: {}",
                cmd.full_path
            )));
        }

        let (program, args) = self
            .run
            .render(&[("connection", connection), ("file", cmd.full_path.as_str())])
            .ok_or(ExecutionError::NotConfigured(CommandKind::BatchRun))?;
        let output = run_to_completion(&program, &args, descriptor.timeout_ms()).await?;
        ensure_success(&program, &output)
    }
}
