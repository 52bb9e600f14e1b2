use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::descriptor::CommandKind;
use crate::phase::PhaseKind;
use crate::scope::CommandId;

/// Reason recorded for commands that never started because an earlier one failed.
pub const ABORTED_REASON: &str = "aborted after earlier failure";

/// Reason recorded for run-once commands that already executed.
pub const ALREADY_RUN_REASON: &str = "already executed for this group";

/// Terminal state of one descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CommandStatus {
    Succeeded,
    Failed,
    Skipped,
}

/// Result of executing (or skipping) one descriptor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandOutcome {
    pub id: CommandId,
    pub kind: CommandKind,
    pub status: CommandStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Outcomes of a group's children, in declaration order.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<CommandOutcome>,
    #[serde(with = "millis")]
    pub elapsed: Duration,
}

impl CommandOutcome {
    pub fn succeeded(id: CommandId, kind: CommandKind, elapsed: Duration) -> Self {
        Self {
            id,
            kind,
            status: CommandStatus::Succeeded,
            reason: None,
            children: Vec::new(),
            elapsed,
        }
    }

    pub fn failed(id: CommandId, kind: CommandKind, reason: impl Into<String>, elapsed: Duration) -> Self {
        Self {
            id,
            kind,
            status: CommandStatus::Failed,
            reason: Some(reason.into()),
            children: Vec::new(),
            elapsed,
        }
    }

    pub fn skipped(id: CommandId, kind: CommandKind, reason: impl Into<String>) -> Self {
        Self {
            id,
            kind,
            status: CommandStatus::Skipped,
            reason: Some(reason.into()),
            children: Vec::new(),
            elapsed: Duration::ZERO,
        }
    }

    /// Group outcome: Failed if any child failed.
    pub fn group(id: CommandId, children: Vec<CommandOutcome>, elapsed: Duration) -> Self {
        let failures = children.iter().filter(|c| c.is_failed()).count();
        let (status, reason) = if failures == 0 {
            (CommandStatus::Succeeded, None)
        } else {
            (
                CommandStatus::Failed,
                Some(format!("{failures} of {} commands failed", children.len())),
            )
        };

        Self {
            id,
            kind: CommandKind::Group,
            status,
            reason,
            children,
            elapsed,
        }
    }

    pub fn is_failed(&self) -> bool {
        self.status == CommandStatus::Failed
    }

    pub fn is_skipped(&self) -> bool {
        self.status == CommandStatus::Skipped
    }

    /// This outcome and all nested outcomes, depth first.
    pub fn flatten(&self) -> Vec<&CommandOutcome> {
        let mut all = vec![self];
        for child in &self.children {
            all.extend(child.flatten());
        }
        all
    }
}

/// Outcomes of one executed phase, in declaration order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhaseResult {
    pub kind: PhaseKind,
    pub phase: CommandId,
    pub outcomes: Vec<CommandOutcome>,
}

impl PhaseResult {
    pub fn new(kind: PhaseKind, phase: CommandId) -> Self {
        Self {
            kind,
            phase,
            outcomes: Vec::new(),
        }
    }

    /// Returns true if no top-level command failed.
    pub fn is_success(&self) -> bool {
        !self.outcomes.iter().any(CommandOutcome::is_failed)
    }

    /// Failed leaf and group outcomes at any depth.
    pub fn failures(&self) -> Vec<&CommandOutcome> {
        self.outcomes
            .iter()
            .flat_map(CommandOutcome::flatten)
            .filter(|o| o.is_failed())
            .collect()
    }

    /// Looks up an outcome at any depth by identity.
    pub fn find(&self, id: &str) -> Option<&CommandOutcome> {
        self.outcomes
            .iter()
            .flat_map(CommandOutcome::flatten)
            .find(|o| o.id.as_str() == id)
    }
}

mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
