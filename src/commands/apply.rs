//! `apply` and `diff` - converge the repository to the desired state

use anyhow::{Context as AnyhowContext, Result, bail};
use declarative::{ApplyContext, Report};

use crate::Context;
use crate::cli::Section;
use crate::reconcile;
use crate::ui;

/// Sections to run: all of them when none were picked, otherwise the
/// picked ones in canonical order without repeats
fn selected(only: &[Section]) -> Vec<Section> {
    if only.is_empty() {
        return Section::ALL.to_vec();
    }
    Section::ALL
        .into_iter()
        .filter(|section| only.contains(section))
        .collect()
}

fn failure_context(changed: bool, dry_run: bool) -> &'static str {
    match (changed, dry_run) {
        (false, _) => "Reconciliation stopped before any change",
        (true, false) => "Reconciliation stopped; the changes listed above were applied",
        (true, true) => "Dry run stopped; nothing was applied",
    }
}

pub fn run(ctx: &Context, only: &[Section], dry_run: bool, json: bool) -> Result<()> {
    let (config, path) = super::load_config(ctx)?;
    let client = super::connect(ctx, &config)?;
    let sections = selected(only);

    if !json && !ctx.quiet {
        ui::header(&format!("{}/{}", config.workspace, config.repository));
        ui::kv("config", &path.display().to_string());
        ui::kv(
            "sections",
            &sections
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", "),
        );
        if ctx.verbose > 0 {
            ui::kv("api", config.api_url());
        }
        if dry_run {
            ui::info("Dry run - no changes will be made");
        }
        println!();
    }

    if !client.repository_exists()? {
        bail!("`{}` repository does not exist", config.repository);
    }

    let apply_ctx = ApplyContext::new(dry_run);
    let mut report = Report::new();
    let result = reconcile::run(&client, &config, &sections, &apply_ctx, &mut report);

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        ui::print_report(&report, dry_run);
    }

    if let Err(err) = result {
        ui::dim(err.category().advice());
        return Err(err).context(failure_context(report.changed, dry_run));
    }

    Ok(())
}
