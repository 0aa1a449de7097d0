//! String-keyed ID newtypes for mapping entities.
//!
//! Every entity in a mapping session is addressed by a caller-chosen string
//! ID. The newtypes keep component IDs from being passed where FPGA IDs are
//! expected. They order lexicographically, which the engine relies on for
//! deterministic tie-breaking.

use serde::{Deserialize, Serialize};

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Creates an ID from any string-like value.
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Returns the ID as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.pad(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl std::borrow::Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }
    };
}

define_id!(
    /// ID of a logical component in the design.
    ComponentId
);

define_id!(
    /// ID of a physical FPGA in the platform.
    FpgaId
);

define_id!(
    /// ID of a group of co-located components.
    GroupId
);

define_id!(
    /// ID of a cluster (board) of FPGAs.
    ClusterId
);

define_id!(
    /// ID of a logical connection between two components.
    ConnectionId
);

define_id!(
    /// ID of a physical link between two FPGAs.
    LinkId
);
