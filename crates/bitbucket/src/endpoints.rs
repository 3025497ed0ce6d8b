//! URL templates for the Bitbucket 2.0 API.

use crate::error::{Error, Result};
use crate::types::Subject;
use url::Url;

/// Default API root.
pub const DEFAULT_API_URL: &str = "https://api.bitbucket.org/2.0";

/// Builds resource URLs for one repository.
///
/// Every variable component is pushed as a path segment, so names and
/// `{uuid}` identifiers are percent-encoded.
#[derive(Debug, Clone)]
pub struct Endpoints {
    base: Url,
    workspace: String,
    repo_slug: String,
}

impl Endpoints {
    /// Create endpoints for `workspace/repo_slug` under `base`.
    ///
    /// # Errors
    ///
    /// Fails if `base` is not an absolute http(s) URL.
    pub fn new(
        base: &str,
        workspace: impl Into<String>,
        repo_slug: impl Into<String>,
    ) -> Result<Self> {
        let invalid = |message: String| Error::InvalidUrl {
            url: base.to_string(),
            message,
        };
        let parsed = Url::parse(base).map_err(|e| invalid(e.to_string()))?;
        if parsed.cannot_be_a_base() || !matches!(parsed.scheme(), "http" | "https") {
            return Err(invalid("expected an http(s) API root".to_string()));
        }
        Ok(Self {
            base: parsed,
            workspace: workspace.into(),
            repo_slug: repo_slug.into(),
        })
    }

    /// Workspace slug.
    #[must_use]
    pub fn workspace(&self) -> &str {
        &self.workspace
    }

    /// Repository slug.
    #[must_use]
    pub fn repo_slug(&self) -> &str {
        &self.repo_slug
    }

    fn build(&self, prefix: &[&str], tail: &[&str], trailing_slash: bool) -> String {
        let mut url = self.base.clone();
        url.set_query(None);
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty();
            segments.extend(prefix);
            segments.extend(tail);
            if trailing_slash {
                segments.push("");
            }
        }
        url.into()
    }

    fn repo(&self, tail: &[&str], trailing_slash: bool) -> String {
        self.build(
            &["repositories", &self.workspace, &self.repo_slug],
            tail,
            trailing_slash,
        )
    }

    /// `/repositories/{ws}/{repo}`
    #[must_use]
    pub fn repository(&self) -> String {
        self.repo(&[], false)
    }

    /// `/repositories/{ws}/{repo}/permissions-config/{users|groups}`
    ///
    /// Listing for one subject kind. Pagination follows `next` links.
    #[must_use]
    pub fn permissions(&self, subject: Subject) -> String {
        self.repo(&["permissions-config", subject.plural()], false)
    }

    /// `/repositories/{ws}/{repo}/permissions-config/{users|groups}/{name}`
    #[must_use]
    pub fn permission(&self, subject: Subject, name: &str) -> String {
        self.repo(&["permissions-config", subject.plural(), name], false)
    }

    /// `/repositories/{ws}/{repo}/pipelines_config`
    #[must_use]
    pub fn pipelines_config(&self) -> String {
        self.repo(&["pipelines_config"], false)
    }

    /// `/repositories/{ws}/{repo}/pipelines_config/variables/`
    #[must_use]
    pub fn variables(&self) -> String {
        self.repo(&["pipelines_config", "variables"], true)
    }

    /// `/repositories/{ws}/{repo}/pipelines_config/variables/{uuid}`
    #[must_use]
    pub fn variable(&self, uuid: &str) -> String {
        self.repo(&["pipelines_config", "variables", uuid], false)
    }

    /// `/repositories/{ws}/{repo}/environments/`
    #[must_use]
    pub fn environments(&self) -> String {
        self.repo(&["environments"], true)
    }

    /// `/repositories/{ws}/{repo}/environments/{uuid}`
    #[must_use]
    pub fn environment(&self, uuid: &str) -> String {
        self.repo(&["environments", uuid], false)
    }

    /// `/repositories/{ws}/{repo}/deployments_config/environments/{env}/variables`
    #[must_use]
    pub fn environment_variables(&self, environment: &str) -> String {
        self.repo(
            &["deployments_config", "environments", environment, "variables"],
            false,
        )
    }

    /// `/repositories/{ws}/{repo}/deployments_config/environments/{env}/variables/{var}`
    #[must_use]
    pub fn environment_variable(&self, environment: &str, variable: &str) -> String {
        self.repo(
            &[
                "deployments_config",
                "environments",
                environment,
                "variables",
                variable,
            ],
            false,
        )
    }
}
