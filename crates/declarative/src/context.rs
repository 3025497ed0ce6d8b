//! Apply context and the handler trait
//!
//! The engine never talks to a remote system itself. A [`Handler`]
//! implementation performs the side effects for one resource kind, which
//! keeps the diff logic free of any HTTP or storage dependency.

use crate::types::Report;

/// Options shared by every operation of a pass
#[derive(Debug, Clone, Copy, Default)]
pub struct ApplyContext {
    /// Don't make changes, only report what would happen
    pub dry_run: bool,
}

impl ApplyContext {
    pub fn new(dry_run: bool) -> Self {
        Self { dry_run }
    }
}

/// Kind-specific side of a reconciliation pass.
///
/// `D` is the declared item type, `O` the observed one. Mutating methods are
/// only called outside dry runs. [`Handler::nested`] is called for every
/// declared item that survives the pass (created, updated or kept), dry run
/// or not, after the item's own operation has been recorded.
pub trait Handler<D, O> {
    /// Error that aborts the pass
    type Error;

    /// Create a declared item that was not observed
    fn create(&mut self, desired: &D, ctx: &ApplyContext) -> Result<(), Self::Error>;

    /// Bring a stale observed item in line with its declaration
    fn update(&mut self, desired: &D, observed: &O, ctx: &ApplyContext)
    -> Result<(), Self::Error>;

    /// Remove an observed item that is no longer declared
    fn delete(&mut self, observed: &O, ctx: &ApplyContext) -> Result<(), Self::Error>;

    /// Reconcile resources that live under a declared item.
    ///
    /// `observed` is `None` when the item was just created, or would have
    /// been in a dry run. Nested changes go into `report`.
    fn nested(
        &mut self,
        _desired: &D,
        _observed: Option<&O>,
        _ctx: &ApplyContext,
        _report: &mut Report,
    ) -> Result<(), Self::Error> {
        Ok(())
    }
}
