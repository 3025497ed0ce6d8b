//! Repository permissions
//!
//! Users and groups are listed from separate endpoints, so each subject kind
//! is its own pass over the same declaration list.

use bitbucket::{Client, Permission, PermissionAction, PermissionGrant, Result, Subject};
use declarative::{ApplyContext, Handler, Report, converge, plan};

struct PermissionHandler<'a> {
    client: &'a Client,
}

impl Handler<Permission, PermissionGrant> for PermissionHandler<'_> {
    type Error = bitbucket::Error;

    fn create(&mut self, desired: &Permission, _: &ApplyContext) -> Result<()> {
        self.client.manage_permission(
            desired.subject,
            &desired.name,
            PermissionAction::Promote(desired.level),
        )?;
        Ok(())
    }

    fn update(&mut self, desired: &Permission, _: &PermissionGrant, ctx: &ApplyContext) -> Result<()> {
        self.create(desired, ctx)
    }

    fn delete(&mut self, observed: &PermissionGrant, _: &ApplyContext) -> Result<()> {
        self.client
            .manage_permission(observed.subject, &observed.name, PermissionAction::Demote)?;
        Ok(())
    }
}

/// Converge user and group grants to `desired`
pub fn reconcile(
    client: &Client,
    desired: &[Permission],
    ctx: &ApplyContext,
    report: &mut Report,
) -> Result<()> {
    let mut handler = PermissionHandler { client };

    for subject in Subject::ALL {
        let wanted: Vec<Permission> = desired
            .iter()
            .filter(|p| p.subject == subject)
            .cloned()
            .collect();
        let observed = client.list_permissions(subject)?;

        let plan = plan(&wanted, &observed, Permission::differs_from);
        log::debug!(
            "{subject} permissions: {} change(s) of {} grant(s)",
            plan.summary().total_changes(),
            observed.len()
        );
        converge(&plan, &mut handler, ctx, report)?;
    }

    Ok(())
}
