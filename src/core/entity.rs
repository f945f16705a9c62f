use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Opaque reference to an entity living outside the accounting engine.
///
/// An entity is identified by a kind tag (e.g. `"person"`, `"supplier"`,
/// `"invoice"`) and an identifier unique within that kind. The engine never
/// interprets either part: it only compares, hashes and displays them.
///
/// Entity references are used for account tree owners, transaction issuers
/// and transaction references.
///
/// # Examples
///
/// ```
/// use accounting_engine::core::entity::EntityRef;
///
/// let alice = EntityRef::new("person", "alice");
/// assert_eq!(alice.to_string(), "person:alice");
/// assert_eq!("person:alice".parse::<EntityRef>().unwrap(), alice);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EntityRef {
    kind: String,
    id: String,
}

/// Identity of an economic subject owning an account tree or issuing transactions.
pub type OwnerId = EntityRef;

impl EntityRef {
    pub fn new(kind: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            id: id.into(),
        }
    }

    /// The kind tag of the referenced entity.
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// The identifier of the referenced entity within its kind.
    pub fn id(&self) -> &str {
        &self.id
    }
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.id)
    }
}

/// Error returned when parsing an entity reference that is not `kind:id`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid entity reference '{0}': expected \"kind:id\"")]
pub struct ParseEntityRefError(String);

impl FromStr for EntityRef {
    type Err = ParseEntityRefError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once(':') {
            Some((kind, id)) if !kind.is_empty() && !id.is_empty() => Ok(Self::new(kind, id)),
            _ => Err(ParseEntityRefError(s.to_string())),
        }
    }
}

impl TryFrom<String> for EntityRef {
    type Error = ParseEntityRefError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<EntityRef> for String {
    fn from(value: EntityRef) -> Self {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_equality() {
        let a = EntityRef::new("person", "alice");
        let b = EntityRef::new("person", "alice");
        let c = EntityRef::new("supplier", "alice");
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_entity_parse() {
        let parsed: EntityRef = "gas:42".parse().unwrap();
        assert_eq!(parsed.kind(), "gas");
        assert_eq!(parsed.id(), "42");

        // only the first colon separates kind from id
        let parsed: EntityRef = "order:2024:17".parse().unwrap();
        assert_eq!(parsed.id(), "2024:17");
    }

    #[test]
    fn test_entity_parse_rejects_garbage() {
        assert!("alice".parse::<EntityRef>().is_err());
        assert!(":alice".parse::<EntityRef>().is_err());
        assert!("person:".parse::<EntityRef>().is_err());
    }

    #[test]
    fn test_entity_serializes_as_string() {
        let json = serde_json::to_string(&EntityRef::new("person", "bob")).unwrap();
        assert_eq!(json, "\"person:bob\"");
        let back: EntityRef = serde_json::from_str(&json).unwrap();
        assert_eq!(back, EntityRef::new("person", "bob"));
    }
}
