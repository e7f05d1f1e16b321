//! Opaque identifier newtypes for the audit data model.
//!
//! Wrapping `Uuid` per entity keeps a `ChunkId` from being accidentally passed
//! where a `PageId` is expected — the invariants in the data model assume
//! these are distinguishable at the type level, not just by convention.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

macro_rules! opaque_id {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

opaque_id!(SiteId);
opaque_id!(RunId);
opaque_id!(PageId);
opaque_id!(ChunkId);
opaque_id!(QuestionId);
opaque_id!(ConfigId);
opaque_id!(ExperimentId);
