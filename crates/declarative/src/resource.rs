//! Resource identity
//!
//! Desired state never carries server-assigned ids, so desired and observed
//! items are matched on human keys instead (a name, or a name plus a
//! category). Keys compare case-insensitively.

use std::fmt;

/// Case-insensitive identity key of a resource.
///
/// Every part is lowercased on construction, so two identities are equal
/// exactly when all their parts match ignoring case.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identity(Vec<String>);

impl Identity {
    /// Build an identity from one or more key parts.
    pub fn new<I, S>(parts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self(
            parts
                .into_iter()
                .map(|part| part.as_ref().to_lowercase())
                .collect(),
        )
    }

    /// Identity made of a single name.
    pub fn name(name: &str) -> Self {
        Self::new([name])
    }

    /// The normalized key parts.
    pub fn parts(&self) -> &[String] {
        &self.0
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join("/"))
    }
}

/// Something that can be declared and observed.
///
/// Desired and observed sides of a pass may be different types (a declared
/// permission carries a typed level, an observed one a raw string) as long
/// as both produce comparable identities.
pub trait Resource: fmt::Debug {
    /// Key used to match desired items against observed items.
    fn identity(&self) -> Identity;

    /// Resource type category, e.g. "variable" or "environment".
    fn resource_type(&self) -> &'static str;

    /// Human-readable description used in report messages.
    fn description(&self) -> String;
}
