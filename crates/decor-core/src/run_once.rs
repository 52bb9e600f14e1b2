//! Run-once bookkeeping for one suite run.

use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard};

use crate::scope::{CommandId, GroupKey};

/// Identifies one run-once command within its enclosing group.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RunOnceKey {
    pub group: GroupKey,
    pub command: CommandId,
}

impl RunOnceKey {
    pub fn new(group: GroupKey, command: CommandId) -> Self {
        Self { group, command }
    }
}

/// Remembers which run-once commands already executed.
///
/// Scoped to one suite run: create one per run (or [`clear`](Self::clear) it)
/// and share it through an `Arc`. Claims are atomic, so concurrent first
/// accesses to the same key yield exactly one winner.
#[derive(Debug, Default)]
pub struct RunOnceTracker {
    done: Mutex<HashSet<RunOnceKey>>,
}

impl RunOnceTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks `key` as done. Returns true if this call claimed it, false if
    /// it was already claimed.
    pub fn try_claim(&self, key: &RunOnceKey) -> bool {
        let mut done = self.lock();
        if done.contains(key) {
            return false;
        }
        done.insert(key.clone())
    }

    pub fn is_done(&self, key: &RunOnceKey) -> bool {
        self.lock().contains(key)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Forgets every claim. Called at the start of a suite run.
    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> MutexGuard<'_, HashSet<RunOnceKey>> {
        // A panic while holding the lock cannot leave the set half-updated
        self.done.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
