//! Typed operations on repository resources.
//!
//! Every mutating call takes a closed action enum and maps the response
//! status onto an outcome the same way for every resource kind:
//!
//! | status | create | update | delete |
//! |--------|--------|--------|--------|
//! | 200    | ok     | ok     | ok     |
//! | 201    | ok     | -      | -      |
//! | 204    | -      | -      | ok     |
//! | 400    | [`Error::Validation`] | | |
//! | 401    | [`Error::Permission`] | | |
//! | 409    | [`Error::Conflict`] | [`Error::Conflict`] | [`Error::Conflict`] |
//!
//! Anything else is an [`Error::Upstream`] carrying status and body.

use crate::backend::Method;
use crate::endpoints::Endpoints;
use crate::error::{Error, Result};
use crate::paginate::{Pagination, list_all};
use crate::transport::{Response, Transport};
use crate::types::{
    Category, Level, ObservedEnvironment, ObservedVariable, PermissionGrant, Subject, Variable,
};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value, json};

/// Change to a permission grant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionAction {
    /// Grant `level`, creating the grant if needed.
    Promote(Level),
    /// Remove the grant.
    Demote,
}

/// Change to a repository or deployment variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariableAction<'a> {
    /// Create from a declaration.
    Create(&'a Variable),
    /// Overwrite the variable `uuid` with a declaration.
    Update {
        /// New contents.
        variable: &'a Variable,
        /// Target variable.
        uuid: &'a str,
    },
    /// Remove the variable `uuid`.
    Delete {
        /// Target variable.
        uuid: &'a str,
    },
}

/// Change to a deployment environment. Environments have no updatable fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvironmentAction<'a> {
    /// Create an environment.
    Create {
        /// Environment name.
        name: &'a str,
        /// Environment category.
        category: Category,
    },
    /// Remove the environment `uuid`.
    Delete {
        /// Target environment.
        uuid: &'a str,
    },
}

/// Outcome family a status is mapped for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Verb {
    Create,
    Update,
    Delete,
}

/// Map a response onto success or a typed error.
///
/// `what` names the target in error messages, e.g. "variable `DB`".
fn expect_success(response: Response, verb: Verb, what: &str) -> Result<Map<String, Value>> {
    match (verb, response.status) {
        (_, 200) | (Verb::Create, 201) | (Verb::Delete, 204) => Ok(response.body),
        (Verb::Create, 400) => Err(Error::Validation {
            message: format!("{what} was not created due to a validation error"),
        }),
        (Verb::Create, 401) => Err(Error::Permission {
            message: format!(
                "the authenticated user has insufficient permissions to create {what}"
            ),
        }),
        (_, 409) => Err(Error::Conflict {
            message: format!("{what} already exists"),
        }),
        (_, status) => Err(Error::upstream(status, &response.body)),
    }
}

fn decode_all<T: DeserializeOwned>(values: Vec<Value>) -> Result<Vec<T>> {
    values
        .into_iter()
        .map(|value| serde_json::from_value(value).map_err(Error::from))
        .collect()
}

/// Server-assigned `uuid` of a created resource.
pub fn created_uuid(body: &Map<String, Value>) -> Result<String> {
    body.get("uuid")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| Error::InvalidResponse("created resource carries no uuid".to_string()))
}

fn variable_payload(variable: &Variable, uuid: Option<&str>) -> Value {
    let mut payload = json!({
        "key": variable.name,
        "value": variable.value,
        "secured": variable.secured,
    });
    if let Some(uuid) = uuid {
        payload["uuid"] = Value::String(uuid.to_string());
    }
    payload
}

/// Client for the resources of one repository.
pub struct Client {
    transport: Transport,
    endpoints: Endpoints,
}

impl Client {
    /// Create a client issuing requests through `transport`.
    pub fn new(transport: Transport, endpoints: Endpoints) -> Self {
        Self {
            transport,
            endpoints,
        }
    }

    /// URL templates in use.
    #[must_use]
    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    fn call(
        &self,
        method: Method,
        url: &str,
        body: Option<&Value>,
        verb: Verb,
        what: &str,
    ) -> Result<Map<String, Value>> {
        let response = self.transport.send(method, url, &[], body)?;
        expect_success(response, verb, what)
    }

    fn repository_name(&self) -> String {
        format!("`{}` repository", self.endpoints.repo_slug())
    }

    // Repository

    /// Whether the repository exists.
    pub fn repository_exists(&self) -> Result<bool> {
        let response = self.transport.get(&self.endpoints.repository())?;
        match response.status {
            200 => Ok(true),
            404 => Ok(false),
            401 | 403 => Err(Error::Permission {
                message: format!(
                    "the authenticated user has insufficient permissions to see {}",
                    self.repository_name()
                ),
            }),
            status => Err(Error::upstream(status, &response.body)),
        }
    }

    /// Create the repository as a private repository of `project_key`.
    pub fn create_repository(&self, project_key: &str) -> Result<Map<String, Value>> {
        let body = json!({
            "project": {"key": project_key},
            "is_private": true,
        });
        self.call(
            Method::Post,
            &self.endpoints.repository(),
            Some(&body),
            Verb::Create,
            &self.repository_name(),
        )
    }

    /// Delete the repository.
    pub fn delete_repository(&self) -> Result<()> {
        let response = self
            .transport
            .send(Method::Delete, &self.endpoints.repository(), &[], None)?;
        match response.status {
            200 | 204 => Ok(()),
            401 | 403 => Err(Error::Permission {
                message: format!(
                    "the authenticated user has insufficient permissions to delete {}",
                    self.repository_name()
                ),
            }),
            404 => Err(Error::NotFound(format!(
                "{} does not exist",
                self.repository_name()
            ))),
            status => Err(Error::upstream(status, &response.body)),
        }
    }

    /// Whether Pipelines is enabled. A repository never configured reports 404.
    pub fn pipelines_enabled(&self) -> Result<bool> {
        let response = self.transport.get(&self.endpoints.pipelines_config())?;
        match response.status {
            200 => Ok(response
                .get("enabled")
                .and_then(Value::as_bool)
                .unwrap_or(false)),
            404 => Ok(false),
            status => Err(Error::upstream(status, &response.body)),
        }
    }

    /// Enable Pipelines on the repository.
    pub fn enable_pipelines(&self) -> Result<Map<String, Value>> {
        self.call(
            Method::Put,
            &self.endpoints.pipelines_config(),
            Some(&json!({"enabled": true})),
            Verb::Update,
            "pipelines configuration",
        )
    }

    // Permissions

    /// Grants of one subject kind on the repository.
    pub fn list_permissions(&self, subject: Subject) -> Result<Vec<PermissionGrant>> {
        let values = list_all(
            &self.transport,
            &self.endpoints.permissions(subject),
            Pagination::Next,
        )?;
        values
            .iter()
            .map(|value| PermissionGrant::from_listing(subject, value))
            .collect()
    }

    /// Promote or demote a user's or group's grant.
    ///
    /// Promotion is a `PUT` that creates the grant when it is missing, so
    /// it accepts the create statuses.
    pub fn manage_permission(
        &self,
        subject: Subject,
        name: &str,
        action: PermissionAction,
    ) -> Result<Map<String, Value>> {
        let url = self.endpoints.permission(subject, name);
        let what = format!("{subject} permission for `{name}`");
        match action {
            PermissionAction::Promote(level) => self.call(
                Method::Put,
                &url,
                Some(&json!({"permission": level.as_str()})),
                Verb::Create,
                &what,
            ),
            PermissionAction::Demote => self.call(Method::Delete, &url, None, Verb::Delete, &what),
        }
    }

    // Repository variables

    /// Pipeline variables of the repository.
    pub fn list_variables(&self) -> Result<Vec<ObservedVariable>> {
        let values = list_all(
            &self.transport,
            &self.endpoints.variables(),
            Pagination::PageCount,
        )?;
        decode_all(values)
    }

    /// Create, update or delete a pipeline variable.
    pub fn manage_variable(&self, action: VariableAction<'_>) -> Result<Map<String, Value>> {
        self.apply_variable(
            action,
            &self.endpoints.variables(),
            |uuid| self.endpoints.variable(uuid),
        )
    }

    // Environments

    /// Deployment environments of the repository.
    pub fn list_environments(&self) -> Result<Vec<ObservedEnvironment>> {
        let values = list_all(
            &self.transport,
            &self.endpoints.environments(),
            Pagination::Next,
        )?;
        decode_all(values)
    }

    /// Create or delete a deployment environment.
    ///
    /// The body returned on creation carries the new environment's `uuid`,
    /// see [`created_uuid`].
    pub fn manage_environment(&self, action: EnvironmentAction<'_>) -> Result<Map<String, Value>> {
        match action {
            EnvironmentAction::Create { name, category } => {
                let body = json!({
                    "name": name,
                    "type": "deployment_environment_type",
                    "environment_type": {
                        "type": "deployment_environment_type",
                        "name": category.as_str(),
                    },
                });
                self.call(
                    Method::Post,
                    &self.endpoints.environments(),
                    Some(&body),
                    Verb::Create,
                    &format!("environment `{name}`"),
                )
            }
            EnvironmentAction::Delete { uuid } => self.call(
                Method::Delete,
                &self.endpoints.environment(uuid),
                None,
                Verb::Delete,
                &format!("environment {uuid}"),
            ),
        }
    }

    // Environment variables

    /// Deployment variables of one environment.
    pub fn list_environment_variables(&self, environment: &str) -> Result<Vec<ObservedVariable>> {
        let values = list_all(
            &self.transport,
            &self.endpoints.environment_variables(environment),
            Pagination::PageCount,
        )?;
        decode_all(values)
    }

    /// Create, update or delete a deployment variable of `environment`.
    pub fn manage_environment_variable(
        &self,
        environment: &str,
        action: VariableAction<'_>,
    ) -> Result<Map<String, Value>> {
        self.apply_variable(
            action,
            &self.endpoints.environment_variables(environment),
            |uuid| self.endpoints.environment_variable(environment, uuid),
        )
    }

    fn apply_variable(
        &self,
        action: VariableAction<'_>,
        collection: &str,
        item: impl Fn(&str) -> String,
    ) -> Result<Map<String, Value>> {
        match action {
            VariableAction::Create(variable) => self.call(
                Method::Post,
                collection,
                Some(&variable_payload(variable, None)),
                Verb::Create,
                &format!("variable `{}`", variable.name),
            ),
            VariableAction::Update { variable, uuid } => self.call(
                Method::Put,
                &item(uuid),
                Some(&variable_payload(variable, Some(uuid))),
                Verb::Update,
                &format!("variable `{}`", variable.name),
            ),
            VariableAction::Delete { uuid } => self.call(
                Method::Delete,
                &item(uuid),
                None,
                Verb::Delete,
                &format!("variable {uuid}"),
            ),
        }
    }
}
