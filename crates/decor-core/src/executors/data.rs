use async_trait::async_trait;

use super::template::{ensure_success, run_to_completion, CommandTemplate};
use crate::config::DataConfig;
use crate::descriptor::{Command, CommandKind, Descriptor};
use crate::dispatch::CommandExecutor;
use crate::error::ExecutionError;

/// Resets and loads tables through a configured database client.
#[derive(Debug, Clone, Default)]
pub struct DataExecutor {
    reset: CommandTemplate,
    load: CommandTemplate,
}

impl DataExecutor {
    pub fn from_config(config: &DataConfig) -> Self {
        Self {
            reset: CommandTemplate::new(config.reset.clone()),
            load: CommandTemplate::new(config.load.clone()),
        }
    }
}

/// Returns the connection string or the error naming the missing field.
pub(crate) fn require_connection(
    kind: CommandKind,
    value: Option<&str>,
) -> Result<&str, ExecutionError> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or(ExecutionError::MissingField {
            kind,
            field: "connection-string",
        })
}

#[async_trait]
impl CommandExecutor for DataExecutor {
    fn name(&self) -> &'static str {
        "data-manipulation"
    }

    fn supported_kinds(&self) -> &[CommandKind] {
        &[CommandKind::TableReset, CommandKind::TableLoad]
    }

    async fn execute(&self, descriptor: &Descriptor) -> Result<(), ExecutionError> {
        let kind = descriptor.kind();
        let (template, values) = match &descriptor.command {
            Command::TableReset(cmd) => {
                let connection = require_connection(kind, cmd.connection_string.as_deref())?;
                (
                    &self.reset,
                    vec![("connection", connection), ("table", cmd.table_name.as_str())],
                )
            }
            Command::TableLoad(cmd) => {
                let connection = require_connection(kind, cmd.connection_string.as_deref())?;
                (
                    &self.load,
                    vec![
                        ("connection", connection),
                        ("table", cmd.table_name.as_str()),
                        ("file", cmd.source_file.as_str()),
                    ],
                )
            }
            other => {
                return Err(ExecutionError::Failed(format!(
                    "data executor cannot run {}",
                    other.kind()
                )))
            }
        };

        let (program, args) = template
            .render(&values)
            .ok_or(ExecutionError::NotConfigured(kind))?;
        let output = run_to_completion(&program, &args, descriptor.timeout_ms()).await?;
        ensure_success(&program, &output)
    }
}
