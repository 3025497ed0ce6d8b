use anyhow::{Context, Result, bail};
use bitbucket::{DEFAULT_API_URL, Environment, Permission, RetryPolicy, Variable};
use declarative::{Identity, Resource};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// File looked up in the working directory when no path is given
pub const DEFAULT_FILE_NAME: &str = "reposync.toml";

/// Get the user config directory path
pub fn config_dir() -> Result<PathBuf> {
    let base = dirs::config_dir().context("Could not determine config directory")?;
    Ok(base.join("reposync"))
}

/// Resolve the desired-state file: explicit path, `./reposync.toml`, then
/// `<config dir>/reposync/config.toml`
pub fn resolve_path(explicit: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = explicit {
        return Ok(expand(path));
    }

    let local = PathBuf::from(DEFAULT_FILE_NAME);
    if local.exists() {
        return Ok(local);
    }

    let global = config_dir()?.join("config.toml");
    if global.exists() {
        return Ok(global);
    }

    bail!(
        "No {DEFAULT_FILE_NAME} in the current directory and no {}; pass --config",
        global.display()
    )
}

fn expand(path: &Path) -> PathBuf {
    let raw = path.to_string_lossy();
    PathBuf::from(shellexpand::tilde(&raw).as_ref())
}

// ============================================================================
// Desired state
// ============================================================================

/// Desired state of one repository.
///
/// A section left out of the file is not reconciled at all; an empty list
/// removes everything of that kind.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SyncConfig {
    pub workspace: String,
    pub repository: String,
    /// API root, defaults to Bitbucket Cloud
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub repository_settings: Option<RepositorySettings>,
    #[serde(default)]
    pub permissions: Option<Vec<Permission>>,
    #[serde(default)]
    pub variables: Option<Vec<Variable>>,
    #[serde(default)]
    pub environments: Option<Vec<Environment>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HttpConfig {
    /// Attempts per request when no response arrives
    #[serde(default = "default_retries")]
    pub retries: u32,
    /// Pause between attempts
    #[serde(default = "default_sleep_secs")]
    pub sleep_secs: u64,
    /// Timeout of a single attempt
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_retries() -> u32 {
    3
}

fn default_sleep_secs() -> u64 {
    5
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            retries: default_retries(),
            sleep_secs: default_sleep_secs(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RepositoryState {
    #[default]
    Present,
    Absent,
}

/// Bootstrap settings used by `reposync repo`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RepositorySettings {
    /// Project the repository is created in
    #[serde(default)]
    pub project_key: Option<String>,
    #[serde(default)]
    pub state: RepositoryState,
    /// Enable Pipelines on a present repository
    #[serde(default = "default_pipelines")]
    pub pipelines: bool,
}

fn default_pipelines() -> bool {
    true
}

impl SyncConfig {
    /// Load and validate a desired-state file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Could not read {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("Invalid config {}", path.display()))
    }

    /// Parse and validate TOML content
    pub fn parse(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject empty names and duplicate identities
    pub fn validate(&self) -> Result<()> {
        if self.workspace.trim().is_empty() {
            bail!("`workspace` must not be empty");
        }
        if self.repository.trim().is_empty() {
            bail!("`repository` must not be empty");
        }

        if let Some(permissions) = &self.permissions {
            ensure_unique("permissions", permissions)?;
        }
        if let Some(variables) = &self.variables {
            ensure_unique("variables", variables)?;
        }
        if let Some(environments) = &self.environments {
            ensure_unique("environments", environments)?;
            for environment in environments {
                if let Some(variables) = &environment.variables {
                    ensure_unique(&format!("environment {} variables", environment.name), variables)?;
                }
            }
        }
        Ok(())
    }

    /// API root in use
    pub fn api_url(&self) -> &str {
        self.url.as_deref().unwrap_or(DEFAULT_API_URL)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.http.retries, Duration::from_secs(self.http.sleep_secs))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.http.timeout_secs)
    }
}

fn ensure_unique<R: Resource>(section: &str, items: &[R]) -> Result<()> {
    let mut seen: HashSet<Identity> = HashSet::new();
    for item in items {
        let identity = item.identity();
        if identity.parts().iter().any(String::is_empty) {
            bail!("{section}: {} has an empty name", item.description());
        }
        if !seen.insert(identity) {
            bail!(
                "{section}: {} is declared more than once (names are case-insensitive)",
                item.description()
            );
        }
    }
    Ok(())
}
