use std::path::Path;

use async_trait::async_trait;
use tracing::debug;

use crate::descriptor::{Command, CommandKind, Descriptor, FileTransfer};
use crate::dispatch::CommandExecutor;
use crate::error::ExecutionError;

/// Deletes, copies, and moves files.
#[derive(Debug, Default)]
pub struct FileExecutor;

impl FileExecutor {
    pub fn new() -> Self {
        Self
    }

    async fn delete(&self, path: &Path) -> Result<(), ExecutionError> {
        tokio::fs::remove_file(path)
            .await
            .map_err(|e| ExecutionError::io(path, e))
    }

    async fn copy(&self, transfer: &FileTransfer) -> Result<(), ExecutionError> {
        let source = Path::new(&transfer.source_full_path);
        let destination = Path::new(&transfer.full_path);
        ensure_parent(destination).await?;

        tokio::fs::copy(source, destination)
            .await
            .map_err(|e| ExecutionError::io(source, e))?;
        Ok(())
    }

    async fn move_file(&self, transfer: &FileTransfer) -> Result<(), ExecutionError> {
        let source = Path::new(&transfer.source_full_path);
        let destination = Path::new(&transfer.full_path);
        ensure_parent(destination).await?;

        // rename fails across file systems; fall back to copy + delete
        if tokio::fs::rename(source, destination).await.is_err() {
            self.copy(transfer).await?;
            self.delete(source).await?;
        }
        Ok(())
    }
}

async fn ensure_parent(path: &Path) -> Result<(), ExecutionError> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| ExecutionError::io(parent, e)),
        _ => Ok(()),
    }
}

#[async_trait]
impl CommandExecutor for FileExecutor {
    fn name(&self) -> &'static str {
        "file"
    }

    fn supported_kinds(&self) -> &[CommandKind] {
        &[CommandKind::FileDelete, CommandKind::FileCopy, CommandKind::FileMove]
    }

    async fn execute(&self, descriptor: &Descriptor) -> Result<(), ExecutionError> {
        debug!(kind = %descriptor.kind(), target = %descriptor.command.label(), "file manipulation");
        match &descriptor.command {
            Command::FileDelete(cmd) => self.delete(Path::new(&cmd.full_path)).await,
            Command::FileCopy(cmd) => self.copy(cmd).await,
            Command::FileMove(cmd) => self.move_file(cmd).await,
            other => Err(ExecutionError::Failed(format!(
                "file executor cannot run {}",
                other.kind()
            ))),
        }
    }
}
