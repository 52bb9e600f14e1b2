use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;
use tracing::{debug, info};

use super::template::{ensure_success, run_to_completion, CommandTemplate};
use crate::config::{ExecutionConfig, ServiceConfig};
use crate::descriptor::{Command, CommandKind, Descriptor};
use crate::dispatch::CommandExecutor;
use crate::error::ExecutionError;

/// State a service command drives towards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ServiceState {
    Running,
    Stopped,
}

/// Starts and stops OS services through configured control commands.
///
/// After issuing the control command the executor polls the status command
/// until the service reaches the target state or the timeout elapses. A
/// running check issues one status query and fails if the service is down.
#[derive(Debug, Clone)]
pub struct ServiceExecutor {
    start: CommandTemplate,
    stop: CommandTemplate,
    status: CommandTemplate,
    running_marker: String,
    poll_interval: Duration,
}

impl ServiceExecutor {
    pub fn from_config(service: &ServiceConfig, execution: &ExecutionConfig) -> Self {
        Self {
            start: CommandTemplate::new(service.start.clone()),
            stop: CommandTemplate::new(service.stop.clone()),
            status: CommandTemplate::new(service.status.clone()),
            running_marker: service.running_marker.clone(),
            poll_interval: Duration::from_millis(execution.service_poll_interval_ms.max(1)),
        }
    }

    async fn is_running(&self, service: &str, budget_ms: u64) -> Result<bool, ExecutionError> {
        let Some((program, args)) = self.status.render(&[("service", service)]) else {
            // Without a status command the control command's exit code is all we have
            return Ok(false);
        };

        let output = run_to_completion(&program, &args, budget_ms).await?;
        if !output.status.success() {
            return Ok(false);
        }
        if self.running_marker.is_empty() {
            return Ok(true);
        }
        Ok(String::from_utf8_lossy(&output.stdout).contains(&self.running_marker))
    }

    /// Issues the control command and waits for `target`.
    ///
    /// Every status query and the control command share one deadline of
    /// `timeout_ms`; 0 means no limit and no waiting after the control command.
    async fn drive(
        &self,
        kind: CommandKind,
        service: &str,
        target: ServiceState,
        timeout_ms: u64,
    ) -> Result<(), ExecutionError> {
        let control = match target {
            ServiceState::Running => &self.start,
            ServiceState::Stopped => &self.stop,
        };
        let (program, args) = control
            .render(&[("service", service)])
            .ok_or(ExecutionError::NotConfigured(kind))?;

        let started = Instant::now();
        let limit = Duration::from_millis(timeout_ms);
        let deadline = (timeout_ms > 0).then(|| started + limit);
        let expired = || {
            ExecutionError::timeout(limit, format!("service {service} did not reach {target:?}"))
        };
        let bounded = |err: ExecutionError| if err.is_timeout() { expired() } else { err };

        let polls_status = self.status.is_configured();
        if polls_status {
            let budget = remaining(deadline).ok_or_else(expired)?;
            if self.reached(service, target, budget).await.map_err(bounded)? {
                debug!(service, ?target, "service already in target state");
                return Ok(());
            }
        }

        let budget = remaining(deadline).ok_or_else(expired)?;
        let output = run_to_completion(&program, &args, budget)
            .await
            .map_err(bounded)?;
        ensure_success(&program, &output)?;

        let Some(deadline) = deadline.filter(|_| polls_status) else {
            return Ok(());
        };

        loop {
            let budget = remaining(Some(deadline)).ok_or_else(expired)?;
            if self.reached(service, target, budget).await.map_err(bounded)? {
                info!(
                    service,
                    ?target,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "service reached target state"
                );
                return Ok(());
            }
            tokio::time::sleep_until(deadline.min(Instant::now() + self.poll_interval)).await;
        }
    }

    /// Asserts that `service` is running with a single status query.
    async fn check_running(&self, service: &str, timeout_ms: u64) -> Result<(), ExecutionError> {
        if !self.status.is_configured() {
            return Err(ExecutionError::NotConfigured(CommandKind::ServiceRunning));
        }

        let running = self.is_running(service, timeout_ms).await.map_err(|err| {
            if err.is_timeout() {
                ExecutionError::timeout(
                    Duration::from_millis(timeout_ms),
                    format!("status of service {service} not known"),
                )
            } else {
                err
            }
        })?;

        if running {
            debug!(service, "service running check passed");
            Ok(())
        } else {
            Err(ExecutionError::Failed(format!("service {service} is not running")))
        }
    }

    async fn reached(
        &self,
        service: &str,
        target: ServiceState,
        budget_ms: u64,
    ) -> Result<bool, ExecutionError> {
        let running = self.is_running(service, budget_ms).await?;
        Ok(match target {
            ServiceState::Running => running,
            ServiceState::Stopped => !running,
        })
    }
}

/// Milliseconds left before `deadline` (0 when unbounded), or `None` once it passed.
fn remaining(deadline: Option<Instant>) -> Option<u64> {
    let Some(deadline) = deadline else {
        return Some(0);
    };
    let left = deadline.saturating_duration_since(Instant::now());
    if left.is_zero() {
        None
    } else {
        Some((left.as_millis() as u64).max(1))
    }
}

#[async_trait]
impl CommandExecutor for ServiceExecutor {
    fn name(&self) -> &'static str {
        "service"
    }

    fn supported_kinds(&self) -> &[CommandKind] {
        &[
            CommandKind::ServiceStart,
            CommandKind::ServiceStop,
            CommandKind::ServiceRunning,
        ]
    }

    async fn execute(&self, descriptor: &Descriptor) -> Result<(), ExecutionError> {
        let timeout_ms = descriptor.timeout_ms();
        match &descriptor.command {
            Command::ServiceStart(cmd) => {
                self.drive(CommandKind::ServiceStart, &cmd.service_name, ServiceState::Running, timeout_ms)
                    .await
            }
            Command::ServiceStop(cmd) => {
                self.drive(CommandKind::ServiceStop, &cmd.service_name, ServiceState::Stopped, timeout_ms)
                    .await
            }
            Command::ServiceRunning(cmd) => self.check_running(&cmd.service_name, timeout_ms).await,
            other => Err(ExecutionError::Failed(format!(
                "service executor cannot run {}",
                other.kind()
            ))),
        }
    }
}
