//! Reconciliation of the declared repository configuration
//!
//! Each resource kind is listed once, diffed against its declaration with
//! [`declarative::plan`] and converged through a kind-specific handler.

pub mod environments;
pub mod permissions;
pub mod variables;

#[cfg(test)]
pub mod fake;

use crate::cli::Section;
use crate::config::SyncConfig;
use bitbucket::{Client, Result};
use declarative::{ApplyContext, Report};
use variables::VariableScope;

/// Reconcile the selected sections of `config`, in the given order.
///
/// Sections the configuration leaves out are skipped. Changes are recorded
/// in `report` as they happen, so it stays accurate when an error aborts the
/// run midway.
pub fn run(
    client: &Client,
    config: &SyncConfig,
    sections: &[Section],
    ctx: &ApplyContext,
    report: &mut Report,
) -> Result<()> {
    for section in sections {
        match section {
            Section::Permissions => match &config.permissions {
                Some(desired) => permissions::reconcile(client, desired, ctx, report)?,
                None => log::info!("no permissions declared, skipping"),
            },
            Section::Variables => match &config.variables {
                Some(desired) => {
                    variables::reconcile(client, VariableScope::Repository, desired, ctx, report)?;
                }
                None => log::info!("no variables declared, skipping"),
            },
            Section::Environments => match &config.environments {
                Some(desired) => environments::reconcile(client, desired, ctx, report)?,
                None => log::info!("no environments declared, skipping"),
            },
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use bitbucket::Subject;
    use super::fake::FakeBitbucket;

    const DESIRED: &str = r#"
workspace = "acme"
repository = "widgets"

[[permissions]]
type = "group"
name = "devs"
level = "write"

[[variables]]
name = "DB"
value = "x"

[[environments]]
name = "Prod"
type = "Production"

[[environments.variables]]
name = "DB"
value = "prod-db"
"#;

    fn apply(fake: &FakeBitbucket, config: &SyncConfig, sections: &[Section]) -> Report {
        let mut report = Report::new();
        run(
            &fake.client(),
            config,
            sections,
            &ApplyContext::default(),
            &mut report,
        )
        .unwrap();
        report
    }

    #[test]
    fn test_full_run_converges_then_idles() {
        let fake = FakeBitbucket::new();
        fake.grant(Subject::Group, "devs", "read");
        fake.grant(Subject::Group, "qa", "admin");
        fake.add_variable("LEGACY", "1", false);
        let config = SyncConfig::parse(DESIRED).unwrap();

        let first = apply(&fake, &config, &Section::ALL);
        assert!(first.changed);
        assert_eq!(
            first.messages,
            [
                "updated group permission devs (write)",
                "deleted group permission qa (admin)",
                "created variable DB",
                "deleted variable LEGACY",
                "created environment Prod (Production)",
                "environment Prod: created variable DB",
            ]
        );

        fake.clear_calls();
        let second = apply(&fake, &config, &Section::ALL);
        assert!(!second.changed);
        assert!(second.messages.is_empty());
        assert!(fake.calls().is_empty());
    }

    #[test]
    fn test_only_selected_sections_run() {
        let fake = FakeBitbucket::new();
        fake.add_variable("LEGACY", "1", false);
        let config = SyncConfig::parse(DESIRED).unwrap();

        let report = apply(&fake, &config, &[Section::Permissions]);

        assert_eq!(report.messages, ["created group permission devs (write)"]);
        assert_eq!(fake.variables().len(), 1);
    }

    #[test]
    fn test_undeclared_section_untouched() {
        let fake = FakeBitbucket::new();
        fake.grant(Subject::User, "alice", "admin");
        let config =
            SyncConfig::parse("workspace = \"acme\"\nrepository = \"widgets\"\nvariables = []\n")
                .unwrap();

        let report = apply(&fake, &config, &Section::ALL);

        assert!(!report.changed);
        assert_eq!(fake.grants(Subject::User).len(), 1);
    }

    #[test]
    fn test_error_keeps_changes_made_before_it() {
        let fake = FakeBitbucket::new();
        fake.reject("POST deployments_config", 500);
        let config = SyncConfig::parse(DESIRED).unwrap();

        let mut report = Report::new();
        let err = run(
            &fake.client(),
            &config,
            &Section::ALL,
            &ApplyContext::default(),
            &mut report,
        )
        .unwrap_err();

        assert_eq!(err.status(), Some(500));
        assert!(report.changed);
        assert_eq!(
            report.messages,
            [
                "created group permission devs (write)",
                "created variable DB",
                "created environment Prod (Production)",
            ]
        );
        assert_eq!(fake.environments().len(), 1);
    }
}
