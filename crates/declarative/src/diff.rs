//! Plan computation for one reconciliation pass

use crate::resource::{Identity, Resource};
use std::fmt;

/// What a pass does with one resource
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    /// Declared but not observed
    Create,
    /// Declared and observed, observed side is stale
    Update,
    /// Declared and observed, nothing to change on the item itself
    Keep,
    /// Observed but no longer declared
    Delete,
}

impl OperationKind {
    /// Whether this operation mutates the remote side
    pub fn is_change(&self) -> bool {
        !matches!(self, Self::Keep)
    }

    /// Verb used in report messages once the operation ran
    pub fn past_tense(&self) -> &'static str {
        match self {
            Self::Create => "created",
            Self::Update => "updated",
            Self::Keep => "kept",
            Self::Delete => "deleted",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Keep => "keep",
            Self::Delete => "delete",
        };
        write!(f, "{s}")
    }
}

/// A single planned operation, borrowing the items it acts on
#[derive(Debug)]
pub enum Operation<'a, D, O> {
    Create { desired: &'a D },
    Update { desired: &'a D, observed: &'a O },
    Keep { desired: &'a D, observed: &'a O },
    Delete { observed: &'a O },
}

impl<D, O> Operation<'_, D, O>
where
    D: Resource,
    O: Resource,
{
    pub fn kind(&self) -> OperationKind {
        match self {
            Self::Create { .. } => OperationKind::Create,
            Self::Update { .. } => OperationKind::Update,
            Self::Keep { .. } => OperationKind::Keep,
            Self::Delete { .. } => OperationKind::Delete,
        }
    }

    /// Description of the item the operation targets.
    ///
    /// Uses the desired side when there is one, so messages show the
    /// declared spelling and values.
    pub fn description(&self) -> String {
        match self {
            Self::Create { desired }
            | Self::Update { desired, .. }
            | Self::Keep { desired, .. } => desired.description(),
            Self::Delete { observed } => observed.description(),
        }
    }
}

/// Ordered operations for one pass.
///
/// Desired items come first in input order, then orphaned observed items in
/// input order.
#[derive(Debug)]
pub struct Plan<'a, D, O> {
    pub operations: Vec<Operation<'a, D, O>>,
}

impl<D, O> Plan<'_, D, O>
where
    D: Resource,
    O: Resource,
{
    /// Count operations per kind
    pub fn summary(&self) -> PlanSummary {
        let mut summary = PlanSummary::default();
        for op in &self.operations {
            match op.kind() {
                OperationKind::Create => summary.creates += 1,
                OperationKind::Update => summary.updates += 1,
                OperationKind::Keep => summary.unchanged += 1,
                OperationKind::Delete => summary.deletes += 1,
            }
        }
        summary
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }
}

/// Plan summary statistics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlanSummary {
    pub creates: usize,
    pub updates: usize,
    pub deletes: usize,
    pub unchanged: usize,
}

impl PlanSummary {
    /// Total number of mutating operations
    pub fn total_changes(&self) -> usize {
        self.creates + self.updates + self.deletes
    }

    pub fn has_changes(&self) -> bool {
        self.total_changes() > 0
    }
}

/// Match `desired` against `observed` and plan the operations.
///
/// Each desired item is matched to the first observed item with the same
/// identity. A match becomes an update when `needs_update` says the observed
/// side is stale, a keep otherwise. Observed items that no desired item
/// claims are deleted.
pub fn plan<'a, D, O, F>(desired: &'a [D], observed: &'a [O], needs_update: F) -> Plan<'a, D, O>
where
    D: Resource,
    O: Resource,
    F: Fn(&D, &O) -> bool,
{
    let desired_ids: Vec<Identity> = desired.iter().map(Resource::identity).collect();
    let observed_ids: Vec<Identity> = observed.iter().map(Resource::identity).collect();

    let mut operations = Vec::with_capacity(desired.len() + observed.len());

    for (item, id) in desired.iter().zip(&desired_ids) {
        let op = match observed_ids.iter().position(|candidate| candidate == id) {
            Some(index) => {
                let current = &observed[index];
                if needs_update(item, current) {
                    Operation::Update {
                        desired: item,
                        observed: current,
                    }
                } else {
                    Operation::Keep {
                        desired: item,
                        observed: current,
                    }
                }
            }
            None => Operation::Create { desired: item },
        };
        log::trace!("plan: {} {} {id}", op.kind(), item.resource_type());
        operations.push(op);
    }

    for (item, id) in observed.iter().zip(&observed_ids) {
        if !desired_ids.contains(id) {
            log::trace!("plan: delete {} {id}", item.resource_type());
            operations.push(Operation::Delete { observed: item });
        }
    }

    Plan { operations }
}
