//! Wire and declaration types for the resources this crate manages.
//!
//! Declared types (`Permission`, `Variable`, `Environment`) are what a user
//! writes in a configuration file. Observed types are decoded from API
//! listings and carry the server-assigned `uuid` where one exists.

use crate::error::{Error, Result};
use declarative::{Identity, Resource};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Who a repository permission is granted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Subject {
    /// A workspace member, named by nickname.
    User,
    /// A workspace group, named by slug.
    Group,
}

impl Subject {
    /// Every subject kind, in reconciliation order.
    pub const ALL: [Subject; 2] = [Subject::User, Subject::Group];

    /// Lowercase name, as used in configuration files.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Group => "group",
        }
    }

    /// Path segment of the permissions-config endpoints.
    #[must_use]
    pub fn plural(&self) -> &'static str {
        match self {
            Self::User => "users",
            Self::Group => "groups",
        }
    }

    /// Field of a listing entry that names the subject.
    fn name_field(self) -> &'static str {
        match self {
            Self::User => "nickname",
            Self::Group => "slug",
        }
    }
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Repository permission level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    /// Full control.
    Admin,
    /// Push access.
    Write,
    /// Clone and view.
    Read,
}

impl Level {
    /// Wire value of the level.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Write => "write",
            Self::Read => "read",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A declared permission grant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permission {
    /// Kind of grantee.
    #[serde(rename = "type")]
    pub subject: Subject,
    /// User nickname or group slug.
    pub name: String,
    /// Granted level.
    #[serde(alias = "perm")]
    pub level: Level,
}

impl Permission {
    /// Declare a grant.
    pub fn new(subject: Subject, name: impl Into<String>, level: Level) -> Self {
        Self {
            subject,
            name: name.into(),
            level,
        }
    }

    /// Whether `grant` carries a different level, ignoring case.
    #[must_use]
    pub fn differs_from(&self, grant: &PermissionGrant) -> bool {
        !self.level.as_str().eq_ignore_ascii_case(&grant.level)
    }
}

/// A permission grant as listed by the API.
///
/// The level stays a raw string: the API may report levels a declaration
/// cannot express, and those must still be demoted or promoted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PermissionGrant {
    /// Kind of grantee.
    pub subject: Subject,
    /// User nickname or group slug.
    pub name: String,
    /// Level as reported.
    pub level: String,
}

impl PermissionGrant {
    /// Decode one entry of a permissions-config listing.
    ///
    /// Users are named by `user.nickname`, groups by `group.slug`.
    pub fn from_listing(subject: Subject, value: &Value) -> Result<Self> {
        let name = value
            .get(subject.as_str())
            .and_then(|s| s.get(subject.name_field()))
            .and_then(Value::as_str)
            .ok_or_else(|| {
                Error::InvalidResponse(format!(
                    "{subject} permission entry without `{}.{}`",
                    subject.as_str(),
                    subject.name_field()
                ))
            })?;
        let level = value
            .get("permission")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                Error::InvalidResponse(format!("{subject} permission `{name}` without a level"))
            })?;

        Ok(Self {
            subject,
            name: name.to_string(),
            level: level.to_string(),
        })
    }
}

/// A declared pipeline or deployment variable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variable {
    /// Variable name, sent as `key`.
    #[serde(alias = "key")]
    pub name: String,
    /// Plain value.
    pub value: String,
    /// Whether the server should hide the value once stored.
    #[serde(default)]
    pub secured: bool,
}

impl Variable {
    /// Declare an unsecured variable.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            secured: false,
        }
    }

    /// Set the secured flag.
    #[must_use]
    pub fn secured(mut self, secured: bool) -> Self {
        self.secured = secured;
        self
    }

    /// Whether `observed` must be rewritten.
    ///
    /// A secured observed variable never exposes its value, so it is always
    /// considered stale. A plain one is stale only when its value differs;
    /// a flag change alone does not trigger an update, turning a plain
    /// variable into a secured one takes a delete first.
    #[must_use]
    pub fn is_stale(&self, observed: &ObservedVariable) -> bool {
        observed.secured || observed.value.as_deref() != Some(self.value.as_str())
    }
}

/// A variable as listed by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObservedVariable {
    /// Server-assigned id, braces included.
    pub uuid: String,
    /// Variable name.
    #[serde(rename = "key")]
    pub name: String,
    /// Absent for secured variables.
    #[serde(default)]
    pub value: Option<String>,
    /// Whether the value is hidden.
    #[serde(default)]
    pub secured: bool,
}

/// Deployment environment category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    /// Pre-production.
    Staging,
    /// Testing.
    Test,
    /// Production.
    Production,
}

impl Category {
    /// Name as the API spells it.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Staging => "Staging",
            Self::Test => "Test",
            Self::Production => "Production",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A declared deployment environment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Environment {
    /// Environment name.
    pub name: String,
    /// Environment category, `type` in configuration files.
    #[serde(rename = "type")]
    pub category: Category,
    /// `None` leaves the environment's variables alone; `Some(vec![])`
    /// removes all of them.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variables: Option<Vec<Variable>>,
}

impl Environment {
    /// Declare an environment without managing its variables.
    pub fn new(name: impl Into<String>, category: Category) -> Self {
        Self {
            name: name.into(),
            category,
            variables: None,
        }
    }

    /// Manage the environment's variables.
    #[must_use]
    pub fn with_variables(mut self, variables: Vec<Variable>) -> Self {
        self.variables = Some(variables);
        self
    }
}

/// An environment as listed by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObservedEnvironment {
    /// Server-assigned id, braces included.
    pub uuid: String,
    /// Environment name.
    pub name: String,
    /// Category wrapper.
    pub environment_type: EnvironmentType,
}

impl ObservedEnvironment {
    /// Category name as reported; compared case-insensitively.
    #[must_use]
    pub fn category(&self) -> &str {
        &self.environment_type.name
    }
}

/// `environment_type` object of an environment listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvironmentType {
    /// Category name.
    pub name: String,
}

impl Resource for Permission {
    fn identity(&self) -> Identity {
        Identity::new([self.subject.as_str(), self.name.as_str()])
    }

    fn resource_type(&self) -> &'static str {
        "permission"
    }

    fn description(&self) -> String {
        format!("{} permission {} ({})", self.subject, self.name, self.level)
    }
}

impl Resource for PermissionGrant {
    fn identity(&self) -> Identity {
        Identity::new([self.subject.as_str(), self.name.as_str()])
    }

    fn resource_type(&self) -> &'static str {
        "permission"
    }

    fn description(&self) -> String {
        format!("{} permission {} ({})", self.subject, self.name, self.level)
    }
}

impl Resource for Variable {
    fn identity(&self) -> Identity {
        Identity::name(&self.name)
    }

    fn resource_type(&self) -> &'static str {
        "variable"
    }

    fn description(&self) -> String {
        format!("variable {}", self.name)
    }
}

impl Resource for ObservedVariable {
    fn identity(&self) -> Identity {
        Identity::name(&self.name)
    }

    fn resource_type(&self) -> &'static str {
        "variable"
    }

    fn description(&self) -> String {
        format!("variable {}", self.name)
    }
}

impl Resource for Environment {
    fn identity(&self) -> Identity {
        Identity::new([self.name.as_str(), self.category.as_str()])
    }

    fn resource_type(&self) -> &'static str {
        "environment"
    }

    fn description(&self) -> String {
        format!("environment {} ({})", self.name, self.category)
    }
}

impl Resource for ObservedEnvironment {
    fn identity(&self) -> Identity {
        Identity::new([self.name.as_str(), self.category()])
    }

    fn resource_type(&self) -> &'static str {
        "environment"
    }

    fn description(&self) -> String {
        format!("environment {} ({})", self.name, self.category())
    }
}
