//! Deployment environments and their variables
//!
//! An environment has nothing to update itself. Matching one only reconciles
//! its variables, and only when the declaration lists them.

use super::variables::{self, VariableScope};
use bitbucket::{
    Client, Environment, EnvironmentAction, ObservedEnvironment, Result, created_uuid,
};
use declarative::{ApplyContext, Handler, Report, converge, plan};
use serde_json::{Map, Value};

struct EnvironmentHandler<'a> {
    client: &'a Client,
    /// response body of the environment created by the last `create`
    created: Option<Map<String, Value>>,
}

impl Handler<Environment, ObservedEnvironment> for EnvironmentHandler<'_> {
    type Error = bitbucket::Error;

    fn create(&mut self, desired: &Environment, _: &ApplyContext) -> Result<()> {
        let body = self.client.manage_environment(EnvironmentAction::Create {
            name: &desired.name,
            category: desired.category,
        })?;
        self.created = Some(body);
        Ok(())
    }

    /// Environments have no mutable fields, so the diff never plans an update.
    fn update(
        &mut self,
        desired: &Environment,
        _: &ObservedEnvironment,
        _: &ApplyContext,
    ) -> Result<()> {
        log::debug!("environment {} has nothing to update", desired.name);
        Ok(())
    }

    fn delete(&mut self, observed: &ObservedEnvironment, _: &ApplyContext) -> Result<()> {
        self.client.manage_environment(EnvironmentAction::Delete {
            uuid: &observed.uuid,
        })?;
        Ok(())
    }

    fn nested(
        &mut self,
        desired: &Environment,
        observed: Option<&ObservedEnvironment>,
        ctx: &ApplyContext,
        report: &mut Report,
    ) -> Result<()> {
        let created = self.created.take();
        let Some(declared) = &desired.variables else {
            return Ok(());
        };

        let mut nested = Report::new();
        let result = match observed {
            Some(environment) => variables::reconcile(
                self.client,
                VariableScope::Environment(&environment.uuid),
                declared,
                ctx,
                &mut nested,
            ),
            // fresh environment: nothing to list. In a dry run it does not
            // exist yet and no request is made, so the uuid stays unknown.
            None => {
                let uuid = match &created {
                    Some(body) => created_uuid(body)?,
                    None => String::new(),
                };
                variables::converge_with(
                    self.client,
                    VariableScope::Environment(&uuid),
                    declared,
                    &[],
                    ctx,
                    &mut nested,
                )
            }
        };

        report.merge_scoped(&format!("environment {}", desired.name), nested);
        result
    }
}

/// Converge environments, and the variables they declare, to `desired`
pub fn reconcile(
    client: &Client,
    desired: &[Environment],
    ctx: &ApplyContext,
    report: &mut Report,
) -> Result<()> {
    let observed = client.list_environments()?;
    let plan = plan(desired, &observed, |_, _| false);
    log::debug!(
        "environments: {} change(s) of {} observed",
        plan.summary().total_changes(),
        observed.len()
    );

    let mut handler = EnvironmentHandler {
        client,
        created: None,
    };
    converge(&plan, &mut handler, ctx, report)
}
