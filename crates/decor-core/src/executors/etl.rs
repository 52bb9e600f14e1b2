use async_trait::async_trait;

use super::template::{ensure_success, run_to_completion, CommandTemplate};
use crate::config::EtlConfig;
use crate::descriptor::{Command, CommandKind, Descriptor};
use crate::dispatch::CommandExecutor;
use crate::error::ExecutionError;

/// Runs ETL packages through a configured runner.
#[derive(Debug, Clone, Default)]
pub struct EtlExecutor {
    run: CommandTemplate,
}

impl EtlExecutor {
    pub fn from_config(config: &EtlConfig) -> Self {
        Self {
            run: CommandTemplate::new(config.run.clone()),
        }
    }
}

#[async_trait]
impl CommandExecutor for EtlExecutor {
    fn name(&self) -> &'static str {
        "etl"
    }

    fn supported_kinds(&self) -> &[CommandKind] {
        &[CommandKind::EtlRun]
    }

    async fn execute(&self, descriptor: &Descriptor) -> Result<(), ExecutionError> {
        let Command::EtlRun(cmd) = &descriptor.command else {
            return Err(ExecutionError::Failed(format!(
                "etl executor cannot run {}",
                descriptor.kind()
            )));
        };

        let (program, args) = self
            .run
            .render(&[
                ("server", cmd.server.as_deref().unwrap_or_default()),
                ("path", cmd.path.as_str()),
                ("name", cmd.name.as_str()),
                ("connection", cmd.connection_string.as_deref().unwrap_or_default()),
            ])
            .ok_or(ExecutionError::NotConfigured(CommandKind::EtlRun))?;
        let output = run_to_completion(&program, &args, descriptor.timeout_ms()).await?;
        ensure_success(&program, &output)
    }
}
