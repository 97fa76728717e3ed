use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Implements a newtype wrapper around a `String`, the way `stor-port` wraps
/// each resource id: `Display`, `Deref<Target = str>`, and conversions from
/// `&str`/`String`.
macro_rules! string_id {
    ($Id:ident, $doc:literal) => {
        #[doc = $doc]
        #[derive(
            Serialize, Deserialize, Default, Debug, Clone, Eq, PartialEq, Hash, PartialOrd, Ord,
        )]
        pub struct $Id(String);
        impl std::ops::Deref for $Id {
            type Target = str;
            fn deref(&self) -> &Self::Target {
                &self.0
            }
        }
        impl Display for $Id {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
        impl From<&str> for $Id {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }
        impl From<String> for $Id {
            fn from(value: String) -> Self {
                Self(value)
            }
        }
        impl AsRef<str> for $Id {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

string_id!(PoolSetName, "Name of a poolset");
string_id!(FilesystemName, "Name of a CephFS filesystem");
string_id!(CrushRuleName, "Name of a CRUSH rule");
string_id!(CrushRoot, "Name of a CRUSH subtree root node");

/// Stable integer identifier of a pool, as assigned by the OSD map.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct PoolId(pub u64);
impl Display for PoolId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
impl From<u64> for PoolId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

/// Placement-seed part of a PG identifier, rendered in hex (`PgId`'s `ps`).
pub type PlacementSeed = u32;

/// Identifies a single placement group as `{pool_id}.{ps:x}`.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct PgId {
    pub pool_id: PoolId,
    pub ps: PlacementSeed,
}

impl PgId {
    pub fn new(pool_id: PoolId, ps: PlacementSeed) -> Self {
        Self { pool_id, ps }
    }
}

impl Display for PgId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{:x}", self.pool_id.0, self.ps)
    }
}

/// Identifier of an OSD (storage daemon) in the CRUSH hierarchy.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct OsdId(pub u64);
impl Display for OsdId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "osd.{}", self.0)
    }
}
impl From<u64> for OsdId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}
