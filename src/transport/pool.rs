use super::ids::{CrushRuleName, PoolId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A pool as it appears in a single OSD-map snapshot.
///
/// Derived from the map during a [`crate::cluster_view::ClusterView`] refresh;
/// immutable for the lifetime of that snapshot (spec §3: "Derived from OSD map
/// snapshot; immutable inside a tick").
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PoolRef {
    pub pool_id: PoolId,
    pub pool_name: String,
    pub pg_num: u32,
    pub pgp_num: u32,
    pub crush_rule_id: u32,
    pub replication_size: u32,
    pub application_metadata: BTreeSet<String>,
}

impl PoolRef {
    /// Effective per-logical-byte cost after replication/EC overhead.
    ///
    /// For replicated pools this is simply the replication size; an
    /// erasure-coded pool would report `(k+m)/k` instead, but EC profile
    /// lookups are the CRUSH/osdmap collaborator's concern, not ours.
    pub fn raw_used_rate(&self) -> f64 {
        self.replication_size as f64
    }

    pub fn has_application(&self, tag: &str) -> bool {
        self.application_metadata.contains(tag)
    }
}

/// Well-known application tags used to decide pool adoption/recipe behavior.
pub mod app_tag {
    pub const CEPHFS: &str = "cephfs";
    pub const RGW: &str = "rgw";
    pub const RADOS: &str = "rados";
    pub const RBD: &str = "rbd";
}

/// A CRUSH placement rule, only the parts the accountant needs.
#[derive(Debug, Clone, PartialEq)]
pub struct CrushRule {
    pub rule_id: u32,
    pub rule_name: CrushRuleName,
    pub root: String,
}

/// Per-pool usage statistics as reported by `df`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PoolStats {
    pub bytes_used: u64,
}
