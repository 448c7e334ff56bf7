//! Opaque string identifiers.
//!
//! Generated ids are `<prefix>-<uuid v4>`; any explicit string is accepted so
//! fixtures and replays can pin ids.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub const PREFIX: &'static str = $prefix;

            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Fresh random id with this type's prefix.
            pub fn generate() -> Self {
                Self(format!("{}-{}", $prefix, Uuid::new_v4()))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_string())
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }
    };
}

string_id!(
    /// Identifier of a [`crate::Claim`].
    ClaimId,
    "claim"
);
string_id!(
    /// Identifier of an [`crate::Argument`]; the root argument's id doubles as
    /// the framework's root claim id.
    ArgumentId,
    "arg"
);
string_id!(
    /// Identifier of a [`crate::Relation`].
    RelationId,
    "rel"
);
string_id!(
    /// Identifier of a [`crate::Source`].
    SourceId,
    "src"
);
string_id!(
    /// Identifier of a [`crate::Contestation`].
    ContestationId,
    "contest"
);
string_id!(
    /// Identifier of a sealed [`crate::AuditTrace`].
    TraceId,
    "trace"
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_ids_carry_prefix() {
        let id = ArgumentId::generate();
        assert!(id.as_str().starts_with("arg-"));
        assert_eq!(id.as_str().len(), "arg-".len() + 36);
        assert_ne!(id, ArgumentId::generate());
        assert!(TraceId::generate().as_str().starts_with("trace-"));
    }

    #[test]
    fn test_ids_serialize_as_plain_strings() {
        let id = RelationId::from("rel-1");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"rel-1\"");
        let back: RelationId = serde_json::from_str("\"rel-1\"").unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn test_ids_order_lexicographically() {
        let mut ids = vec![ArgumentId::from("arg-c"), ArgumentId::from("arg-a")];
        ids.sort();
        assert_eq!(ids[0].as_str(), "arg-a");
    }
}
