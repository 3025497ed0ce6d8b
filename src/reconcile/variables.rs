//! Pipeline and deployment variables

use bitbucket::{Client, ObservedVariable, Result, Variable, VariableAction};
use declarative::{ApplyContext, Handler, Report, converge, plan};

/// Where a set of variables lives
#[derive(Debug, Clone, Copy)]
pub enum VariableScope<'a> {
    /// Repository pipeline variables
    Repository,
    /// Deployment variables of the environment with this uuid
    Environment(&'a str),
}

struct VariableHandler<'a> {
    client: &'a Client,
    scope: VariableScope<'a>,
}

impl VariableHandler<'_> {
    fn manage(&self, action: VariableAction<'_>) -> Result<()> {
        match self.scope {
            VariableScope::Repository => self.client.manage_variable(action)?,
            VariableScope::Environment(environment) => self
                .client
                .manage_environment_variable(environment, action)?,
        };
        Ok(())
    }
}

impl Handler<Variable, ObservedVariable> for VariableHandler<'_> {
    type Error = bitbucket::Error;

    fn create(&mut self, desired: &Variable, _: &ApplyContext) -> Result<()> {
        self.manage(VariableAction::Create(desired))
    }

    fn update(&mut self, desired: &Variable, observed: &ObservedVariable, _: &ApplyContext) -> Result<()> {
        self.manage(VariableAction::Update {
            variable: desired,
            uuid: &observed.uuid,
        })
    }

    fn delete(&mut self, observed: &ObservedVariable, _: &ApplyContext) -> Result<()> {
        self.manage(VariableAction::Delete {
            uuid: &observed.uuid,
        })
    }
}

/// List the variables of `scope` and converge them to `desired`
pub fn reconcile(
    client: &Client,
    scope: VariableScope<'_>,
    desired: &[Variable],
    ctx: &ApplyContext,
    report: &mut Report,
) -> Result<()> {
    let observed = match scope {
        VariableScope::Repository => client.list_variables()?,
        VariableScope::Environment(environment) => client.list_environment_variables(environment)?,
    };
    converge_with(client, scope, desired, &observed, ctx, report)
}

/// Converge `desired` against an already known `observed` set
pub fn converge_with(
    client: &Client,
    scope: VariableScope<'_>,
    desired: &[Variable],
    observed: &[ObservedVariable],
    ctx: &ApplyContext,
    report: &mut Report,
) -> Result<()> {
    let plan = plan(desired, observed, Variable::is_stale);
    let summary = plan.summary();
    log::debug!(
        "{scope:?} variables: {} to create, {} to update, {} to delete, {} unchanged",
        summary.creates,
        summary.updates,
        summary.deletes,
        summary.unchanged
    );

    let mut handler = VariableHandler { client, scope };
    converge(&plan, &mut handler, ctx, report)
}
