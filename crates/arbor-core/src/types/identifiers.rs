//! Id types shared by the mining crates.
//!
//! Tree and node ids come from the external corpus and stay plain `i64`;
//! negative node ids mark indirect (embedded) relationships.

use serde::{Deserialize, Serialize};

/// Id of a tree in the corpus (the id of its root node).
pub type TreeId = i64;

/// Id of a node in the corpus.
pub type NodeId = i64;

/// Id of a cluster within one mining run, assigned from 1 in input order.
pub type ClusterId = u32;

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(pub u32);

        impl $name {
            pub fn new(raw: u32) -> Self {
                Self(raw)
            }

            pub fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl From<u32> for $name {
            fn from(raw: u32) -> Self {
                Self(raw)
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}#{}", stringify!($name), self.0)
            }
        }
    };
}

define_id!(
    /// Handle of a pattern inside a `PatternArena`.
    PatternId
);
