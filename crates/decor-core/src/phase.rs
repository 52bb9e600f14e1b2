use serde::{Deserialize, Serialize};

use crate::descriptor::Descriptor;

/// Which half of a test's decoration a phase is.
///
/// Setup always runs before the test body, Cleanup always after it:
/// Setup → (body) → Cleanup
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PhaseKind {
    /// Prepares the environment; stops at its first failing command
    #[default]
    Setup,
    /// Tears the environment down; runs every command regardless of failures
    Cleanup,
}

impl PhaseKind {
    /// Returns true if a failed top-level command aborts the rest of the phase.
    pub fn stops_on_failure(&self) -> bool {
        match self {
            PhaseKind::Setup => true,
            PhaseKind::Cleanup => false,
        }
    }

    /// Returns the name used in command identities.
    pub fn as_str(&self) -> &'static str {
        match self {
            PhaseKind::Setup => "setup",
            PhaseKind::Cleanup => "cleanup",
        }
    }

    /// Returns a human-readable name for the phase.
    pub fn display_name(&self) -> &'static str {
        match self {
            PhaseKind::Setup => "Setup",
            PhaseKind::Cleanup => "Cleanup",
        }
    }
}

/// An ordered sequence of top-level descriptors.
///
/// Declaration order is significant: it is the sequence the author intends.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Phase {
    pub commands: Vec<Descriptor>,
}

impl Phase {
    pub fn new(commands: Vec<Descriptor>) -> Self {
        Self { commands }
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }
}

impl FromIterator<Descriptor> for Phase {
    fn from_iter<I: IntoIterator<Item = Descriptor>>(iter: I) -> Self {
        Phase::new(iter.into_iter().collect())
    }
}
