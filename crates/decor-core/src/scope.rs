//! Identities and execution scopes.
//!
//! Identities are positional paths into the suite document, so the same
//! declared command keeps the same identity every time it is executed.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::defaults::DefaultsChain;
use crate::phase::PhaseKind;

/// Positional identity of a descriptor, e.g. `group[0]/setup/1/2`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommandId(String);

impl CommandId {
    /// Identity of a phase within a scope, the prefix of its commands.
    pub fn phase(scope: &str, kind: PhaseKind) -> Self {
        CommandId(format!("{}/{}", scope, kind.as_str()))
    }

    /// Identity of the `index`-th child.
    pub fn child(&self, index: usize) -> Self {
        CommandId(format!("{}/{}", self.0, index))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for CommandId {
    fn from(value: &str) -> Self {
        CommandId(value.to_string())
    }
}

impl fmt::Display for CommandId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identity of the group a command executes for.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupKey(String);

impl GroupKey {
    /// Key used for tests declared outside any group.
    pub const SUITE: &'static str = "suite";

    pub fn suite() -> Self {
        GroupKey(Self::SUITE.to_string())
    }

    pub fn new(key: impl Into<String>) -> Self {
        GroupKey(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Everything a phase needs to know about where it runs.
#[derive(Debug, Clone)]
pub struct ExecutionScope<'a> {
    /// Enclosing group, used for run-once bookkeeping.
    pub group: GroupKey,
    /// Identity prefix of the phase's commands.
    pub phase: CommandId,
    /// Defaults visible from this scope, nearest first.
    pub defaults: DefaultsChain<'a>,
}

impl<'a> ExecutionScope<'a> {
    pub fn new(group: GroupKey, phase: CommandId, defaults: DefaultsChain<'a>) -> Self {
        Self {
            group,
            phase,
            defaults,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_id_paths() {
        let phase = CommandId::phase("group[0]", PhaseKind::Setup);
        assert_eq!(phase.as_str(), "group[0]/setup");
        assert_eq!(phase.child(1).child(2).as_str(), "group[0]/setup/1/2");
    }

    #[test]
    fn test_suite_group_key() {
        assert_eq!(GroupKey::suite().as_str(), "suite");
    }
}
