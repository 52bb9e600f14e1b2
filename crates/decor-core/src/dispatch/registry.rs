//! Registry mapping command kinds to executors.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use super::traits::CommandExecutor;
use crate::config::Config;
use crate::descriptor::{Command, CommandGroup, CommandKind};
use crate::error::UnsupportedCommandError;
use crate::executors::{
    BatchExecutor, DataExecutor, EtlExecutor, FileExecutor, ProcessExecutor, ServiceExecutor,
};

/// What a command resolves to.
pub enum Dispatch<'c> {
    /// Groups are executed by the phase executor itself.
    Group(&'c CommandGroup),
    /// Leaf commands are executed by a registered capability.
    Executor(Arc<dyn CommandExecutor>),
}

impl fmt::Debug for Dispatch<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dispatch::Group(group) => f
                .debug_tuple("Group")
                .field(&group.commands.len())
                .finish(),
            Dispatch::Executor(executor) => f.debug_tuple("Executor").field(&executor.name()).finish(),
        }
    }
}

/// Registry of leaf executors.
///
/// Each command kind maps to exactly one executor; registering a second
/// executor for a kind replaces the first.
#[derive(Default)]
pub struct DispatchRegistry {
    /// Kind to executor mapping.
    executors: HashMap<CommandKind, Arc<dyn CommandExecutor>>,
}

impl DispatchRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with all built-in executors.
    pub fn with_builtins(config: &Config) -> Self {
        let mut registry = Self::new();

        registry.register(Arc::new(FileExecutor::new()));
        registry.register(Arc::new(ProcessExecutor::new()));
        registry.register(Arc::new(ServiceExecutor::from_config(
            &config.service,
            &config.execution,
        )));
        registry.register(Arc::new(DataExecutor::from_config(&config.data)));
        registry.register(Arc::new(BatchExecutor::from_config(&config.batch)));
        registry.register(Arc::new(EtlExecutor::from_config(&config.etl)));

        registry
    }

    /// Register an executor for its supported kinds.
    pub fn register(&mut self, executor: Arc<dyn CommandExecutor>) {
        for kind in executor.supported_kinds() {
            self.executors.insert(*kind, Arc::clone(&executor));
        }
    }

    /// Resolve a command to its group or executor.
    pub fn resolve<'c>(&self, command: &'c Command) -> Result<Dispatch<'c>, UnsupportedCommandError> {
        if let Command::Group(group) = command {
            return Ok(Dispatch::Group(group));
        }

        self.executor_for(command.kind())
            .map(Dispatch::Executor)
            .ok_or_else(|| UnsupportedCommandError::new(command.kind()))
    }

    /// Get the executor registered for a kind.
    pub fn executor_for(&self, kind: CommandKind) -> Option<Arc<dyn CommandExecutor>> {
        self.executors.get(&kind).cloned()
    }

    /// Check if a command kind can be dispatched.
    pub fn supports(&self, kind: CommandKind) -> bool {
        kind == CommandKind::Group || self.executors.contains_key(&kind)
    }

    /// List registered kinds, sorted.
    pub fn registered_kinds(&self) -> Vec<CommandKind> {
        let mut kinds: Vec<_> = self.executors.keys().copied().collect();
        kinds.sort();
        kinds
    }

    /// List registered executors with the kinds they handle.
    pub fn list_executors(&self) -> Vec<(&'static str, &[CommandKind])> {
        // Deduplicate executors (one executor may serve several kinds)
        let mut seen = std::collections::HashSet::new();
        let mut result = Vec::new();

        for executor in self.executors.values() {
            let name = executor.name();
            if seen.insert(name) {
                result.push((name, executor.supported_kinds()));
            }
        }

        result.sort_by_key(|(name, _)| *name);
        result
    }
}

impl fmt::Debug for DispatchRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DispatchRegistry")
            .field("kinds", &self.registered_kinds())
            .finish()
    }
}
