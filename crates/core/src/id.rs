//! Strongly-typed identifiers.
//!
//! Every entity gets its own UUID newtype so a child id can never be passed
//! where a chore id is expected.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

macro_rules! uuid_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Generate a fresh random id.
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            pub fn as_uuid(&self) -> &Uuid {
                &self.0
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

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(s.trim()).map(Self)
            }
        }
    };
}

uuid_id!(
    /// Identity of a chore definition.
    ChoreId
);
uuid_id!(
    /// Identity of a single child's instance of a chore.
    AssignmentId
);
uuid_id!(
    /// Identity of a manual balance adjustment.
    AdjustmentId
);
uuid_id!(
    /// A child user.
    ChildId
);
uuid_id!(
    /// A parent user.
    ParentId
);
uuid_id!(
    /// The family a chore is scoped to.
    FamilyId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_and_display_agree() {
        let id = ChoreId::new();
        let parsed: ChoreId = id.to_string().parse().unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn garbage_does_not_parse() {
        assert!("not-a-uuid".parse::<ChildId>().is_err());
    }

    #[test]
    fn serializes_as_bare_string() {
        let id = AssignmentId::new();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{id}\""));
    }
}
