//! Capability trait implemented by every leaf executor.

use async_trait::async_trait;

use crate::descriptor::{CommandKind, Descriptor};
use crate::error::ExecutionError;

/// A capability able to execute one or more leaf command kinds.
///
/// Executors receive descriptors whose defaults are already resolved, so
/// `timeout` is always set and inherited connection strings are filled in.
/// Execution is synchronous from the caller's point of view: the returned
/// future completes once the external action has finished or its timeout
/// has elapsed.
///
/// # Example Implementation
///
/// ```ignore
/// #[async_trait]
/// impl CommandExecutor for FileExecutor {
///     fn name(&self) -> &'static str { "file" }
///     fn supported_kinds(&self) -> &[CommandKind] { &[CommandKind::FileDelete] }
///     async fn execute(&self, descriptor: &Descriptor) -> Result<(), ExecutionError> {
///         // delete the file...
///     }
/// }
/// ```
#[async_trait]
pub trait CommandExecutor: Send + Sync {
    /// Human-readable capability name.
    fn name(&self) -> &'static str;

    /// Command kinds this executor handles.
    fn supported_kinds(&self) -> &[CommandKind];

    /// Execute a resolved descriptor.
    async fn execute(&self, descriptor: &Descriptor) -> Result<(), ExecutionError>;

    /// Check if this executor handles the given kind.
    fn can_execute(&self, kind: CommandKind) -> bool {
        self.supported_kinds().contains(&kind)
    }
}
