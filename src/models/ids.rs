use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Declares a UUID-backed identifier newtype.
///
/// Identifiers render as hyphenated lowercase strings, both in JSON and as
/// redb keys.
macro_rules! record_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Generate a fresh random identifier
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Parse an identifier from its string form
            pub fn parse(s: &str) -> Option<Self> {
                Uuid::parse_str(s).ok().map(Self)
            }

            /// Storage key for this identifier
            pub fn key(&self) -> String {
                self.0.to_string()
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }
    };
}

record_id!(
    /// Identifier of a user record
    UserId
);
record_id!(
    /// Identifier of a post record
    PostId
);
record_id!(
    /// Identifier of a notification record
    NotificationId
);
record_id!(
    /// Identifier of a login session
    SessionId
);
record_id!(
    /// Identifier of a history entry
    HistoryId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_roundtrips_display() {
        let id = PostId::new();
        assert_eq!(PostId::parse(&id.to_string()), Some(id));
        assert_eq!(id.key(), id.to_string());
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(UserId::parse("not-a-uuid").is_none());
        assert!(UserId::parse("").is_none());
    }

    #[test]
    fn test_ids_serialize_as_strings() {
        let id = UserId::new();
        let json = serde_json::to_value(id).unwrap();
        assert_eq!(json, serde_json::Value::String(id.to_string()));
    }
}
