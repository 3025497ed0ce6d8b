//! # bitbucket
//!
//! Blocking client for the parts of the Bitbucket Cloud 2.0 API that hold
//! repository configuration.
//!
//! This crate provides functionality for:
//! - Sending authenticated requests with bounded retry on connection failure
//! - Draining paginated listings (`next` links or `size`/`pagelen` counting)
//! - Managing permissions, pipeline variables, deployment environments and
//!   deployment variables through typed actions
//! - Creating and deleting the repository itself and enabling Pipelines
//!
//! ## Example
//!
//! ```no_run
//! use bitbucket::{Client, Credentials, Endpoints, Transport, DEFAULT_API_URL};
//! use bitbucket::backend::http::UreqClient;
//!
//! let transport = Transport::new(Box::new(UreqClient::default()))
//!     .with_credentials(Some(Credentials::new("alice", "app-password")));
//! let endpoints = Endpoints::new(DEFAULT_API_URL, "acme", "widgets")?;
//! let client = Client::new(transport, endpoints);
//!
//! for variable in client.list_variables()? {
//!     println!("{} (secured: {})", variable.name, variable.secured);
//! }
//! # Ok::<(), bitbucket::Error>(())
//! ```
//!
//! ## Testing
//!
//! [`backend::MockClient`] replays scripted responses and records every
//! request, so code built on [`Client`] can be tested without network access.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod backend;
pub mod client;
pub mod endpoints;
pub mod error;
pub mod paginate;
pub mod transport;
pub mod types;

pub use backend::{HttpClient, Method, MockClient};
pub use client::{Client, EnvironmentAction, PermissionAction, VariableAction, created_uuid};
pub use endpoints::{DEFAULT_API_URL, Endpoints};
pub use error::{Error, ErrorCategory, Result};
pub use paginate::{Pagination, list_all};
pub use transport::{Credentials, Response, RetryPolicy, Transport};
pub use types::{
    Category, Environment, Level, ObservedEnvironment, ObservedVariable, Permission,
    PermissionGrant, Subject, Variable,
};
