//! Core types for declarative reconciliation

use serde::{Deserialize, Serialize};

/// Outcome of one or more reconciliation passes.
///
/// Accumulated as operations succeed; a failure later in the pass leaves
/// everything recorded so far in place.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    /// Whether any operation changed (or, in a dry run, would change) the remote side
    pub changed: bool,
    /// One line per applied or previewed operation, in execution order
    pub messages: Vec<String>,
}

impl Report {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an operation that changed the remote side
    pub fn record_change(&mut self, message: impl Into<String>) {
        self.changed = true;
        self.messages.push(message.into());
    }

    /// Record a message without marking the report as changed
    pub fn note(&mut self, message: impl Into<String>) {
        self.messages.push(message.into());
    }

    /// Merge another report into this one
    pub fn merge(&mut self, other: Report) {
        self.changed |= other.changed;
        self.messages.extend(other.messages);
    }

    /// Merge a nested report, prefixing each of its messages with `scope`
    pub fn merge_scoped(&mut self, scope: &str, other: Report) {
        self.changed |= other.changed;
        self.messages.extend(
            other
                .messages
                .into_iter()
                .map(|message| format!("{scope}: {message}")),
        );
    }

    pub fn is_empty(&self) -> bool {
        !self.changed && self.messages.is_empty()
    }
}
