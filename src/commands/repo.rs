//! `repo` - bring the repository itself to the declared state

use anyhow::{Result, bail};
use bitbucket::Client;
use declarative::{ApplyContext, Report};

use crate::Context;
use crate::config::{RepositorySettings, RepositoryState};
use crate::ui;

pub fn run(ctx: &Context, yes: bool, dry_run: bool) -> Result<()> {
    let (config, _) = super::load_config(ctx)?;
    let Some(settings) = &config.repository_settings else {
        bail!("No [repository_settings] section in the config, nothing to do");
    };
    let client = super::connect(ctx, &config)?;

    if !ctx.quiet {
        ui::header(&format!("{}/{}", config.workspace, config.repository));
    }

    let mut report = Report::new();
    let apply_ctx = ApplyContext::new(dry_run);
    let result = ensure(&client, settings, &apply_ctx, &mut report, |prompt| {
        if yes {
            Ok(true)
        } else {
            confirm_proceed(prompt)
        }
    });

    ui::print_report(&report, dry_run);
    result
}

/// Create or delete the repository and enable Pipelines as declared.
///
/// `confirm` is asked before the repository is deleted.
fn ensure<F>(
    client: &Client,
    settings: &RepositorySettings,
    ctx: &ApplyContext,
    report: &mut Report,
    confirm: F,
) -> Result<()>
where
    F: FnOnce(&str) -> Result<bool>,
{
    let slug = client.endpoints().repo_slug().to_string();
    let exists = client.repository_exists()?;

    match settings.state {
        RepositoryState::Present => {
            if !exists {
                let Some(project_key) = settings.project_key.as_deref() else {
                    bail!("`{slug}` repository does not exist and no project_key is set to create it");
                };
                if ctx.dry_run {
                    report.record_change(format!("would create repository {slug} in {project_key}"));
                } else {
                    client.create_repository(project_key)?;
                    log::info!("created repository {slug}");
                    report.record_change(format!("created repository {slug} in {project_key}"));
                }
            }

            if settings.pipelines {
                let enabled = exists && client.pipelines_enabled()?;
                if enabled {
                    log::debug!("pipelines already enabled on {slug}");
                } else if ctx.dry_run {
                    report.record_change("would enable pipelines");
                } else {
                    client.enable_pipelines()?;
                    report.record_change("enabled pipelines");
                }
            }
        }
        RepositoryState::Absent => {
            if !exists {
                return Ok(());
            }
            if ctx.dry_run {
                report.record_change(format!("would delete repository {slug}"));
                return Ok(());
            }
            if !confirm(&format!("Delete repository {slug}? This cannot be undone"))? {
                ui::warn("Aborted");
                return Ok(());
            }
            client.delete_repository()?;
            log::info!("deleted repository {slug}");
            report.record_change(format!("deleted repository {slug}"));
        }
    }

    Ok(())
}

/// Confirm with user
fn confirm_proceed(prompt: &str) -> Result<bool> {
    use dialoguer::Confirm;

    let confirmed = Confirm::new()
        .with_prompt(prompt)
        .default(false)
        .interact()?;

    Ok(confirmed)
}
