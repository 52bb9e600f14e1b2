//! Shared fixtures for integration tests.
#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use decor_core::descriptor::{
    FileDelete, ProcessRun, ServiceTarget, TableLoad, TableReset,
};
use decor_core::{
    Command, CommandExecutor, CommandGroup, CommandId, CommandKind, Defaults, DefaultsChain,
    DefaultsResolver, Descriptor, DispatchRegistry, ExecutionError, ExecutionScope, GroupKey,
    PhaseExecutor, PhaseKind, RunOnceTracker,
};

/// Executor that records every call and fails for selected labels.
pub struct RecordingExecutor {
    kinds: Vec<CommandKind>,
    failing: HashSet<String>,
    delay: Option<Duration>,
    calls: Mutex<Vec<Descriptor>>,
}

impl RecordingExecutor {
    pub fn new(kinds: &[CommandKind]) -> Self {
        Self {
            kinds: kinds.to_vec(),
            failing: HashSet::new(),
            delay: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Handles every leaf kind.
    pub fn all() -> Self {
        let kinds: Vec<_> = CommandKind::ALL
            .into_iter()
            .filter(|k| *k != CommandKind::Group)
            .collect();
        Self::new(&kinds)
    }

    pub fn failing_on(mut self, label: &str) -> Self {
        self.failing.insert(label.to_string());
        self
    }

    pub fn with_delay(mut self, ms: u64) -> Self {
        self.delay = Some(Duration::from_millis(ms));
        self
    }

    /// Resolved descriptors received, in call order.
    pub fn calls(&self) -> Vec<Descriptor> {
        self.calls.lock().unwrap().clone()
    }

    pub fn labels(&self) -> Vec<String> {
        self.calls().iter().map(|d| d.command.label()).collect()
    }

    pub fn count(&self, label: &str) -> usize {
        self.labels().iter().filter(|l| *l == label).count()
    }
}

#[async_trait]
impl CommandExecutor for RecordingExecutor {
    fn name(&self) -> &'static str {
        "recording"
    }

    fn supported_kinds(&self) -> &[CommandKind] {
        &self.kinds
    }

    async fn execute(&self, descriptor: &Descriptor) -> Result<(), ExecutionError> {
        self.calls.lock().unwrap().push(descriptor.clone());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let label = descriptor.command.label();
        if self.failing.contains(&label) {
            return Err(ExecutionError::Failed(format!("{label} failed")));
        }
        Ok(())
    }
}

pub fn registry_with(executor: Arc<RecordingExecutor>) -> Arc<DispatchRegistry> {
    let mut registry = DispatchRegistry::new();
    registry.register(executor);
    Arc::new(registry)
}

pub fn phase_executor(executor: Arc<RecordingExecutor>) -> PhaseExecutor {
    PhaseExecutor::new(
        registry_with(executor),
        Arc::new(RunOnceTracker::new()),
        DefaultsResolver::default(),
    )
}

pub fn empty_chain() -> DefaultsChain<'static> {
    static EMPTY: Defaults = Defaults {
        connection_string: None,
        timeout: None,
        base_path: None,
    };
    DefaultsChain::root(&EMPTY)
}

/// Scope of a phase declared directly on a top-level test.
pub fn scope(kind: PhaseKind) -> ExecutionScope<'static> {
    ExecutionScope::new(GroupKey::suite(), CommandId::phase("test[0]", kind), empty_chain())
}

pub fn delete(path: &str) -> Descriptor {
    Descriptor::new(Command::FileDelete(FileDelete {
        full_path: path.to_string(),
    }))
}

pub fn exe(path: &str) -> Descriptor {
    Descriptor::new(Command::ProcessRun(ProcessRun {
        full_path: path.to_string(),
        argument: None,
    }))
}

pub fn start(service: &str) -> Descriptor {
    Descriptor::new(Command::ServiceStart(ServiceTarget {
        service_name: service.to_string(),
    }))
}

pub fn stop(service: &str) -> Descriptor {
    Descriptor::new(Command::ServiceStop(ServiceTarget {
        service_name: service.to_string(),
    }))
}

pub fn reset(table: &str) -> Descriptor {
    Descriptor::new(Command::TableReset(TableReset {
        connection_string: None,
        table_name: table.to_string(),
    }))
}

pub fn load(table: &str, file: &str) -> Descriptor {
    Descriptor::new(Command::TableLoad(TableLoad {
        connection_string: None,
        table_name: table.to_string(),
        source_file: file.to_string(),
    }))
}

pub fn group(children: Vec<Descriptor>) -> Descriptor {
    Descriptor::new(Command::Group(CommandGroup::new(children)))
}

pub fn sequential(children: Vec<Descriptor>) -> Descriptor {
    Descriptor::new(Command::Group(CommandGroup::sequential(children)))
}
