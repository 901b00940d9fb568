//! Capabilities: what may be done (`can`) to which resource (`with`),
//! optionally narrowed by caveats (`nb`).

use std::fmt;

use serde::{Deserialize, Serialize};

/// An action identifier such as `store/add`, or `*` for any action.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Ability(String);

impl Ability {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The part before the last `/`, if any (`store` for `store/add`).
    pub fn namespace(&self) -> Option<&str> {
        self.0.rsplit_once('/').map(|(namespace, _)| namespace)
    }
}

impl From<&str> for Ability {
    fn from(value: &str) -> Self {
        Ability(value.to_string())
    }
}

impl From<String> for Ability {
    fn from(value: String) -> Self {
        Ability(value)
    }
}

impl fmt::Display for Ability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The URI (usually a DID) a capability applies to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Resource(String);

impl Resource {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Resource {
    fn from(value: &str) -> Self {
        Resource(value.to_string())
    }
}

impl From<String> for Resource {
    fn from(value: String) -> Self {
        Resource(value)
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A single capability with caveats of type `C`.
///
/// Absent caveats are omitted from the encoded form rather than written as
/// null.
// Field order is the canonical DAG-CBOR key order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Capability<C> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nb: Option<C>,
    pub can: Ability,
    pub with: Resource,
}

impl<C> Capability<C> {
    pub fn new(can: impl Into<Ability>, with: impl Into<Resource>, nb: C) -> Self {
        Capability {
            nb: Some(nb),
            can: can.into(),
            with: with.into(),
        }
    }

    /// A capability without caveats.
    pub fn unrestricted(can: impl Into<Ability>, with: impl Into<Resource>) -> Self {
        Capability {
            nb: None,
            can: can.into(),
            with: with.into(),
        }
    }

    /// Getter for the ability
    pub fn can(&self) -> &Ability {
        &self.can
    }

    /// Getter for the resource
    pub fn with(&self) -> &Resource {
        &self.with
    }

    /// Getter for the caveats
    pub fn nb(&self) -> Option<&C> {
        self.nb.as_ref()
    }
}
