//! In-memory Bitbucket used by the reconciler tests.
//!
//! Serves the permission, variable and environment endpoints of a single
//! repository with real pagination (two items per page), and records every
//! mutating call as `"<METHOD> <path below the repository>"`.

use bitbucket::backend::{HttpClient, HttpRequest, RawResponse};
use bitbucket::{Client, Endpoints, Method, RetryPolicy, Subject, Transport};
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use url::Url;

pub const BASE: &str = "https://api.example.com/2.0";
const REPO_PREFIX: [&str; 4] = ["2.0", "repositories", "acme", "widgets"];
const PAGE_SIZE: usize = 2;

#[derive(Debug, Clone)]
struct StoredVariable {
    uuid: String,
    key: String,
    value: String,
    secured: bool,
}

impl StoredVariable {
    fn to_json(&self) -> Value {
        let mut value = json!({
            "type": "pipeline_variable",
            "uuid": self.uuid,
            "key": self.key,
            "secured": self.secured,
        });
        if !self.secured {
            value["value"] = Value::String(self.value.clone());
        }
        value
    }
}

#[derive(Debug, Clone)]
struct StoredEnvironment {
    uuid: String,
    name: String,
    category: String,
}

#[derive(Default)]
struct State {
    users: Vec<(String, String)>,
    groups: Vec<(String, String)>,
    variables: Vec<StoredVariable>,
    environments: Vec<StoredEnvironment>,
    environment_variables: HashMap<String, Vec<StoredVariable>>,
    next_id: u32,
    calls: Vec<String>,
    rejections: Vec<(String, u16)>,
}

impl State {
    fn uuid(&mut self) -> String {
        self.next_id += 1;
        format!("{{{}}}", self.next_id)
    }

    fn grants(&mut self, subject: &str) -> Option<&mut Vec<(String, String)>> {
        match subject {
            "users" => Some(&mut self.users),
            "groups" => Some(&mut self.groups),
            _ => None,
        }
    }
}

/// Fake API shared between the test and the client under test.
#[derive(Clone, Default)]
pub struct FakeBitbucket {
    state: Arc<Mutex<State>>,
}

impl FakeBitbucket {
    pub fn new() -> Self {
        Self::default()
    }

    /// Client pointed at this fake, without retry pauses.
    pub fn client(&self) -> Client {
        let transport = Transport::new(Box::new(self.clone()))
            .with_retry(RetryPolicy::new(1, Duration::ZERO));
        let endpoints = Endpoints::new(BASE, "acme", "widgets").unwrap();
        Client::new(transport, endpoints)
    }

    pub fn grant(&self, subject: Subject, name: &str, level: &str) {
        let mut state = self.state.lock().unwrap();
        state
            .grants(subject.plural())
            .unwrap()
            .push((name.to_string(), level.to_string()));
    }

    pub fn add_variable(&self, key: &str, value: &str, secured: bool) -> String {
        let mut state = self.state.lock().unwrap();
        let uuid = state.uuid();
        state.variables.push(StoredVariable {
            uuid: uuid.clone(),
            key: key.to_string(),
            value: value.to_string(),
            secured,
        });
        uuid
    }

    pub fn add_environment(&self, name: &str, category: &str) -> String {
        let mut state = self.state.lock().unwrap();
        let uuid = state.uuid();
        state.environments.push(StoredEnvironment {
            uuid: uuid.clone(),
            name: name.to_string(),
            category: category.to_string(),
        });
        state.environment_variables.insert(uuid.clone(), Vec::new());
        uuid
    }

    pub fn add_environment_variable(&self, environment: &str, key: &str, value: &str) -> String {
        let mut state = self.state.lock().unwrap();
        let uuid = state.uuid();
        state
            .environment_variables
            .entry(environment.to_string())
            .or_default()
            .push(StoredVariable {
                uuid: uuid.clone(),
                key: key.to_string(),
                value: value.to_string(),
                secured: false,
            });
        uuid
    }

    /// Mutating calls in order.
    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    /// Answer `status` to mutating calls starting with `prefix`.
    pub fn reject(&self, prefix: &str, status: u16) {
        let mut state = self.state.lock().unwrap();
        state.rejections.push((prefix.to_string(), status));
    }

    pub fn clear_calls(&self) {
        self.state.lock().unwrap().calls.clear();
    }

    /// `(name, level)` grants of one subject kind.
    pub fn grants(&self, subject: Subject) -> Vec<(String, String)> {
        let mut state = self.state.lock().unwrap();
        state.grants(subject.plural()).unwrap().clone()
    }

    /// `(key, value)` of the repository variables.
    pub fn variables(&self) -> Vec<(String, String)> {
        let state = self.state.lock().unwrap();
        state
            .variables
            .iter()
            .map(|v| (v.key.clone(), v.value.clone()))
            .collect()
    }

    /// `(uuid, name, category)` of the environments.
    pub fn environments(&self) -> Vec<(String, String, String)> {
        let state = self.state.lock().unwrap();
        state
            .environments
            .iter()
            .map(|e| (e.uuid.clone(), e.name.clone(), e.category.clone()))
            .collect()
    }

    /// `(key, value)` of one environment's variables.
    pub fn environment_variables(&self, environment: &str) -> Vec<(String, String)> {
        let state = self.state.lock().unwrap();
        state
            .environment_variables
            .get(environment)
            .map(|vars| {
                vars.iter()
                    .map(|v| (v.key.clone(), v.value.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }
}

fn decode_segment(segment: &str) -> String {
    segment
        .replace("%7B", "{")
        .replace("%7D", "}")
        .replace("%20", " ")
}

fn respond(status: u16, body: &Value) -> RawResponse {
    RawResponse {
        status,
        body: body.to_string(),
    }
}

fn not_found() -> RawResponse {
    respond(404, &json!({"type": "error", "error": {"message": "Not found"}}))
}

fn page_number(url: &Url) -> usize {
    url.query_pairs()
        .find(|(key, _)| key == "page")
        .and_then(|(_, value)| value.parse().ok())
        .unwrap_or(1)
}

/// Page with a `next` link while items remain.
fn next_page(url: &Url, items: &[Value]) -> RawResponse {
    let page = page_number(url);
    let start = (page - 1) * PAGE_SIZE;
    let values: Vec<Value> = items.iter().skip(start).take(PAGE_SIZE).cloned().collect();
    let mut body = json!({"values": values, "pagelen": PAGE_SIZE, "page": page});
    if start + PAGE_SIZE < items.len() {
        let mut next = url.clone();
        next.query_pairs_mut()
            .clear()
            .append_pair("page", &(page + 1).to_string());
        body["next"] = Value::String(next.to_string());
    }
    respond(200, &body)
}

/// Page with `size`/`pagelen` accounting and no `next` link.
fn counted_page(url: &Url, items: &[Value]) -> RawResponse {
    let page = page_number(url);
    let start = (page - 1) * PAGE_SIZE;
    let values: Vec<Value> = items.iter().skip(start).take(PAGE_SIZE).cloned().collect();
    let pagelen = values.len();
    respond(
        200,
        &json!({"values": values, "pagelen": pagelen, "size": items.len(), "page": page}),
    )
}

fn body_json(request: &HttpRequest) -> Value {
    request
        .body
        .as_deref()
        .and_then(|bytes| serde_json::from_slice(bytes).ok())
        .unwrap_or(Value::Null)
}

fn stored_variable(uuid: String, body: &Value) -> StoredVariable {
    StoredVariable {
        uuid,
        key: body["key"].as_str().unwrap_or_default().to_string(),
        value: body["value"].as_str().unwrap_or_default().to_string(),
        secured: body["secured"].as_bool().unwrap_or(false),
    }
}

/// List, create, update or delete inside one variable collection.
fn variable_route(
    vars: &mut Vec<StoredVariable>,
    new_uuid: String,
    method: Method,
    item: Option<&str>,
    url: &Url,
    body: &Value,
) -> RawResponse {
    match (method, item) {
        (Method::Get, None) => {
            let items: Vec<Value> = vars.iter().map(StoredVariable::to_json).collect();
            counted_page(url, &items)
        }
        (Method::Post, None) => {
            let key = body["key"].as_str().unwrap_or_default();
            if vars.iter().any(|v| v.key == key) {
                return respond(409, &json!({"error": {"message": "key already exists"}}));
            }
            let var = stored_variable(new_uuid, body);
            let created = var.to_json();
            vars.push(var);
            respond(201, &created)
        }
        (Method::Put, Some(uuid)) => match vars.iter_mut().find(|v| v.uuid == uuid) {
            Some(var) => {
                *var = stored_variable(uuid.to_string(), body);
                respond(200, &var.to_json())
            }
            None => not_found(),
        },
        (Method::Delete, Some(uuid)) => {
            let before = vars.len();
            vars.retain(|v| v.uuid != uuid);
            if vars.len() < before {
                respond(204, &Value::Null)
            } else {
                not_found()
            }
        }
        _ => not_found(),
    }
}

impl FakeBitbucket {
    fn route(&self, request: &HttpRequest) -> RawResponse {
        let Ok(url) = Url::parse(&request.url) else {
            return not_found();
        };
        let segments: Vec<String> = url
            .path_segments()
            .map(|s| s.map(decode_segment).collect())
            .unwrap_or_default();
        if segments.len() < REPO_PREFIX.len() || segments[..4] != REPO_PREFIX {
            return not_found();
        }
        let rest: Vec<&str> = segments[4..].iter().map(String::as_str).collect();
        let body = body_json(request);

        let mut state = self.state.lock().unwrap();
        if request.method != Method::Get {
            let call = format!("{} {}", request.method, rest.join("/"));
            let rejected = state
                .rejections
                .iter()
                .find(|(prefix, _)| call.starts_with(prefix.as_str()))
                .map(|(_, status)| *status);
            state.calls.push(call);
            if let Some(status) = rejected {
                return respond(status, &json!({"error": {"message": "rejected by test"}}));
            }
        }

        match (request.method, rest.as_slice()) {
            (Method::Get, []) => respond(200, &json!({"slug": "widgets"})),

            (Method::Get, ["permissions-config", kind]) => {
                let field = if *kind == "users" { "user" } else { "group" };
                let name_key = if *kind == "users" { "nickname" } else { "slug" };
                let Some(grants) = state.grants(kind) else {
                    return not_found();
                };
                let items: Vec<Value> = grants
                    .iter()
                    .map(|(name, level)| json!({"permission": level, field: {name_key: name}}))
                    .collect();
                next_page(&url, &items)
            }
            (Method::Put, ["permissions-config", kind, name]) => {
                let level = body["permission"].as_str().unwrap_or_default().to_string();
                let Some(grants) = state.grants(kind) else {
                    return not_found();
                };
                let status = match grants.iter_mut().find(|(n, _)| n.as_str() == *name) {
                    Some(grant) => {
                        grant.1 = level.clone();
                        200
                    }
                    None => {
                        grants.push(((*name).to_string(), level.clone()));
                        201
                    }
                };
                respond(status, &json!({"permission": level}))
            }
            (Method::Delete, ["permissions-config", kind, name]) => {
                let Some(grants) = state.grants(kind) else {
                    return not_found();
                };
                let before = grants.len();
                grants.retain(|(n, _)| n.as_str() != *name);
                if grants.len() < before {
                    respond(204, &Value::Null)
                } else {
                    not_found()
                }
            }

            (method, ["pipelines_config", "variables", item]) => {
                let new_uuid = state.uuid();
                let item = (!item.is_empty()).then_some(*item);
                variable_route(&mut state.variables, new_uuid, method, item, &url, &body)
            }

            (Method::Get, ["environments", ""]) => {
                let items: Vec<Value> = state
                    .environments
                    .iter()
                    .map(|e| {
                        json!({
                            "uuid": e.uuid,
                            "name": e.name,
                            "environment_type": {"type": "deployment_environment_type", "name": e.category},
                        })
                    })
                    .collect();
                next_page(&url, &items)
            }
            (Method::Post, ["environments", ""]) => {
                let uuid = state.uuid();
                let environment = StoredEnvironment {
                    uuid: uuid.clone(),
                    name: body["name"].as_str().unwrap_or_default().to_string(),
                    category: body["environment_type"]["name"]
                        .as_str()
                        .unwrap_or_default()
                        .to_string(),
                };
                let created = json!({
                    "uuid": uuid,
                    "name": environment.name,
                    "environment_type": {"name": environment.category},
                });
                state.environments.push(environment);
                state.environment_variables.insert(uuid, Vec::new());
                respond(201, &created)
            }
            (Method::Delete, ["environments", uuid]) => {
                let before = state.environments.len();
                state.environments.retain(|e| e.uuid != *uuid);
                state.environment_variables.remove(*uuid);
                if state.environments.len() < before {
                    respond(204, &Value::Null)
                } else {
                    not_found()
                }
            }

            (method, ["deployments_config", "environments", env, "variables", item @ ..]) => {
                let new_uuid = state.uuid();
                let Some(vars) = state.environment_variables.get_mut(*env) else {
                    return not_found();
                };
                variable_route(vars, new_uuid, method, item.first().copied(), &url, &body)
            }

            _ => not_found(),
        }
    }
}

impl HttpClient for FakeBitbucket {
    fn execute(&self, request: &HttpRequest) -> Result<RawResponse, String> {
        Ok(self.route(request))
    }
}
