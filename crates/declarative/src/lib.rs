//! # Declarative
//!
//! A small engine for declarative state reconciliation.
//!
//! Callers hand over what they *want* (desired items) and what a remote
//! system *has* (observed items). The engine matches the two lists by a
//! case-insensitive identity key, produces a [`Plan`] of closed
//! [`Operation`]s and converges it through a [`Handler`] that performs the
//! actual create/update/delete calls.
//!
//! ## Core Concepts
//!
//! - **Resource**: anything with a stable [`Identity`] and a description
//! - **Plan**: the ordered create/update/keep/delete operations for one pass
//! - **Handler**: the kind-specific side of a pass (HTTP calls, nested passes)
//! - **Report**: `changed` flag plus human-readable messages, never rolled back
//!
//! ## Example
//!
//! ```
//! use declarative::{plan, converge, ApplyContext, Handler, Identity, Report, Resource};
//!
//! #[derive(Debug)]
//! struct Group { name: String, level: String }
//!
//! impl Resource for Group {
//!     fn identity(&self) -> Identity { Identity::name(&self.name) }
//!     fn resource_type(&self) -> &'static str { "group" }
//!     fn description(&self) -> String { format!("group {} ({})", self.name, self.level) }
//! }
//!
//! struct Remote { calls: Vec<String> }
//!
//! impl Handler<Group, Group> for Remote {
//!     type Error = std::convert::Infallible;
//!
//!     fn create(&mut self, d: &Group, _: &ApplyContext) -> Result<(), Self::Error> {
//!         self.calls.push(format!("create {}", d.name));
//!         Ok(())
//!     }
//!     fn update(&mut self, d: &Group, _: &Group, _: &ApplyContext) -> Result<(), Self::Error> {
//!         self.calls.push(format!("update {}", d.name));
//!         Ok(())
//!     }
//!     fn delete(&mut self, o: &Group, _: &ApplyContext) -> Result<(), Self::Error> {
//!         self.calls.push(format!("delete {}", o.name));
//!         Ok(())
//!     }
//! }
//!
//! let desired = vec![Group { name: "Devs".into(), level: "write".into() }];
//! let observed = vec![
//!     Group { name: "devs".into(), level: "read".into() },
//!     Group { name: "qa".into(), level: "admin".into() },
//! ];
//!
//! let plan = plan(&desired, &observed, |d, o| d.level != o.level);
//! let mut remote = Remote { calls: Vec::new() };
//! let mut report = Report::new();
//! converge(&plan, &mut remote, &ApplyContext::default(), &mut report).unwrap();
//!
//! assert_eq!(remote.calls, ["update Devs", "delete qa"]);
//! assert!(report.changed);
//! ```

pub mod context;
pub mod diff;
pub mod executor;
pub mod resource;
pub mod types;

// Re-export main types at crate root
pub use context::{ApplyContext, Handler};
pub use diff::{Operation, OperationKind, Plan, PlanSummary, plan};
pub use executor::converge;
pub use resource::{Identity, Resource};
pub use types::Report;
