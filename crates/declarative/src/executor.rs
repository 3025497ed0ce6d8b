//! Execution engine - converges a plan through a handler

use crate::context::{ApplyContext, Handler};
use crate::diff::{Operation, Plan};
use crate::resource::Resource;
use crate::types::Report;

/// Run every operation of `plan` in order.
///
/// Each successful create, update or delete marks `report` as changed and
/// records a message. The first handler error stops the pass and is
/// returned as is; operations already applied stay applied and stay in
/// `report`.
///
/// In a dry run the mutating handler methods are skipped and a
/// "would ..." message is recorded instead.
pub fn converge<D, O, H>(
    plan: &Plan<'_, D, O>,
    handler: &mut H,
    ctx: &ApplyContext,
    report: &mut Report,
) -> Result<(), H::Error>
where
    D: Resource,
    O: Resource,
    H: Handler<D, O>,
{
    for op in &plan.operations {
        let kind = op.kind();
        let description = op.description();

        if kind.is_change() {
            if ctx.dry_run {
                log::debug!("dry run: would {kind} {description}");
                report.record_change(format!("would {kind} {description}"));
            } else {
                match op {
                    Operation::Create { desired } => handler.create(desired, ctx)?,
                    Operation::Update { desired, observed } => {
                        handler.update(desired, observed, ctx)?;
                    }
                    Operation::Delete { observed } => handler.delete(observed, ctx)?,
                    Operation::Keep { .. } => {}
                }
                log::info!("{} {description}", kind.past_tense());
                report.record_change(format!("{} {description}", kind.past_tense()));
            }
        }

        match op {
            Operation::Create { desired } => handler.nested(desired, None, ctx, report)?,
            Operation::Update { desired, observed } | Operation::Keep { desired, observed } => {
                handler.nested(desired, Some(*observed), ctx, report)?;
            }
            Operation::Delete { .. } => {}
        }
    }

    Ok(())
}
