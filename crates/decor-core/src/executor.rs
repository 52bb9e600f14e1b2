//! Phase execution.
//!
//! Walks a phase's descriptor tree in declaration order, resolving defaults
//! and dispatching each descriptor. Groups recurse: parallel groups fan out
//! and join, sequential groups stop at their first failure.

use std::sync::Arc;
use std::time::Instant;

use futures::future::{join_all, BoxFuture, FutureExt};
use tracing::{debug, info, warn};

use crate::defaults::DefaultsResolver;
use crate::descriptor::{CommandGroup, Descriptor};
use crate::dispatch::{Dispatch, DispatchRegistry};
use crate::error::UnsupportedCommandError;
use crate::outcome::{CommandOutcome, PhaseResult, ABORTED_REASON, ALREADY_RUN_REASON};
use crate::phase::{Phase, PhaseKind};
use crate::run_once::{RunOnceKey, RunOnceTracker};
use crate::scope::{CommandId, ExecutionScope};

/// Executes Setup and Cleanup phases.
///
/// Leaf failures become Failed outcomes; only an unsupported command kind
/// aborts execution with an error.
#[derive(Debug, Clone)]
pub struct PhaseExecutor {
    registry: Arc<DispatchRegistry>,
    tracker: Arc<RunOnceTracker>,
    resolver: DefaultsResolver,
}

impl PhaseExecutor {
    pub fn new(
        registry: Arc<DispatchRegistry>,
        tracker: Arc<RunOnceTracker>,
        resolver: DefaultsResolver,
    ) -> Self {
        Self {
            registry,
            tracker,
            resolver,
        }
    }

    pub fn registry(&self) -> &DispatchRegistry {
        &self.registry
    }

    pub fn tracker(&self) -> &Arc<RunOnceTracker> {
        &self.tracker
    }

    pub fn resolver(&self) -> &DefaultsResolver {
        &self.resolver
    }

    /// Executes `phase` within `scope`.
    ///
    /// The result holds one outcome per top-level descriptor, in declaration
    /// order. A Setup phase skips the descriptors after its first failure; a
    /// Cleanup phase runs them all.
    pub async fn execute(
        &self,
        kind: PhaseKind,
        phase: &Phase,
        scope: &ExecutionScope<'_>,
    ) -> Result<PhaseResult, UnsupportedCommandError> {
        debug!(phase = %scope.phase, group = %scope.group, commands = phase.len(), "executing {}", kind.display_name());

        let mut result = PhaseResult::new(kind, scope.phase.clone());
        let mut failed = false;

        for (index, descriptor) in phase.commands.iter().enumerate() {
            let id = scope.phase.child(index);
            if failed && kind.stops_on_failure() {
                result
                    .outcomes
                    .push(CommandOutcome::skipped(id, descriptor.kind(), ABORTED_REASON));
                continue;
            }

            let outcome = self.run_descriptor(descriptor, id, scope).await?;
            failed |= outcome.is_failed();
            result.outcomes.push(outcome);
        }

        if result.is_success() {
            debug!(phase = %scope.phase, "{} succeeded", kind.display_name());
        } else {
            warn!(phase = %scope.phase, failures = result.failures().len(), "{} failed", kind.display_name());
        }
        Ok(result)
    }

    /// Executes one descriptor, recursing into groups.
    fn run_descriptor<'a>(
        &'a self,
        descriptor: &'a Descriptor,
        id: CommandId,
        scope: &'a ExecutionScope<'a>,
    ) -> BoxFuture<'a, Result<CommandOutcome, UnsupportedCommandError>> {
        async move {
            let resolved = self.resolver.resolve(descriptor, &scope.defaults);
            let dispatch = self.registry.resolve(&descriptor.command)?;
            let kind = descriptor.kind();

            if resolved.is_run_once() {
                let key = RunOnceKey::new(scope.group.clone(), id.clone());
                if !self.tracker.try_claim(&key) {
                    debug!(command = %id, %kind, group = %scope.group, "run-once command already executed, skipping");
                    return Ok(CommandOutcome::skipped(id, kind, ALREADY_RUN_REASON));
                }
            }

            let started = Instant::now();
            match dispatch {
                Dispatch::Group(group) => self.run_group(group, id, scope, started).await,
                Dispatch::Executor(executor) => {
                    let target = resolved.command.label();
                    debug!(command = %id, %kind, executor = executor.name(), %target, "executing command");

                    match executor.execute(&resolved).await {
                        Ok(()) => {
                            info!(command = %id, %kind, %target, elapsed_ms = started.elapsed().as_millis() as u64, "command succeeded");
                            Ok(CommandOutcome::succeeded(id, kind, started.elapsed()))
                        }
                        Err(err) => {
                            warn!(command = %id, %kind, %target, error = %err, timeout = err.is_timeout(), "command failed");
                            Ok(CommandOutcome::failed(id, kind, err.to_string(), started.elapsed()))
                        }
                    }
                }
            }
        }
        .boxed()
    }

    async fn run_group<'a>(
        &'a self,
        group: &'a CommandGroup,
        id: CommandId,
        scope: &'a ExecutionScope<'a>,
        started: Instant,
    ) -> Result<CommandOutcome, UnsupportedCommandError> {
        let children = if group.is_parallel() {
            let pending = group
                .commands
                .iter()
                .enumerate()
                .map(|(index, child)| self.run_descriptor(child, id.child(index), scope));

            // Every child runs to completion; failures are aggregated afterwards
            join_all(pending)
                .await
                .into_iter()
                .collect::<Result<Vec<_>, _>>()?
        } else {
            let mut outcomes = Vec::with_capacity(group.commands.len());
            let mut failed = false;

            for (index, child) in group.commands.iter().enumerate() {
                let child_id = id.child(index);
                if failed {
                    outcomes.push(CommandOutcome::skipped(child_id, child.kind(), ABORTED_REASON));
                    continue;
                }

                let outcome = self.run_descriptor(child, child_id, scope).await?;
                failed |= outcome.is_failed();
                outcomes.push(outcome);
            }
            outcomes
        };

        Ok(CommandOutcome::group(id, children, started.elapsed()))
    }
}
